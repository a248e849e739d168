//! Job lifecycle and settlement.
//!
//! A job walks Requested, CommitteeFinalized, KeyPublished, Activated,
//! CiphertextReady, Complete; Failed absorbs from any non-terminal stage.
//! Every stage carries a deadline taken from the external clock passed by
//! callers. Settlement splits the escrowed payment by how far the job got,
//! routes accumulated slashed funds, and leaves pull-based claims for the
//! requester and the surviving committee members.

pub mod config;
pub mod error;
pub mod events;
pub mod job;
pub mod manager;
pub mod settlement;
pub mod verifier;

pub use config::{JobsConfig, WorkSchedule};
pub use error::{JobError, Result};
pub use events::{JobEvent, JobEventKind};
pub use job::{Job, JobStage};
pub use manager::{JobManager, JobStats};
pub use settlement::{NodeShare, Settlement};
pub use verifier::{DecryptionVerifier, JobVerifiers, ProgramVerifier};
