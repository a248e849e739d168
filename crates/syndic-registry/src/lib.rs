//! Ciphernode membership and committee selection.
//!
//! Registered operators live in an append-only Merkle membership tree.
//! Each job gets a committee drawn by ticket-weighted sortition: operators
//! submit ticket numbers during a submission window, every ticket is scored
//! against the job seed, and the top scores form the committee.

pub mod committee;
pub mod config;
pub mod error;
pub mod events;
pub mod registry;
pub mod sortition;
pub mod tree;

pub use committee::{
    Committee, CommitteeMember, CommitteeStage, CommitteeViability, FinalizeOutcome, MemberStatus,
    TicketSubmission,
};
pub use config::RegistryConfig;
pub use error::{RegistryError, Result};
pub use events::{RegistryEvent, RegistryEventKind};
pub use registry::{MembershipRegistry, RegistryStats, StakeView};
pub use sortition::ticket_score;
pub use tree::MembershipTree;
