//! Fault adjudication and stake slashing.
//!
//! Two lanes lead to a slash. Lane A is proof-based and permissionless:
//! anyone may submit a fault attestation signed by the accused node together
//! with the proof bytes the node produced; if the registered verifier
//! reports the proof invalid, the slash executes immediately. Lane B is
//! evidence-based: an authorized slasher files a proposal, the accused may
//! appeal during a policy-defined window, and the slash executes only after
//! the window passes without an upheld appeal.
//!
//! Slashed funds accumulate per job so settlement can route them to the
//! requester and the surviving committee members.

pub mod adjudicator;
pub mod attestation;
pub mod config;
pub mod error;
pub mod events;
pub mod policy;
pub mod proposal;

pub use adjudicator::{
    FaultAdjudicator, FaultProofVerifier, JobFailureSink, SlashStats, SlashedFunds,
};
pub use attestation::FaultAttestation;
pub use config::SlashConfig;
pub use error::{Result, SlashError};
pub use events::{SlashEvent, SlashEventKind};
pub use policy::{default_policies, ProofKind, SlashPolicy};
pub use proposal::{ProposalStatus, SlashLane, SlashProposal};
