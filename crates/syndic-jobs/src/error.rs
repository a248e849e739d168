use crate::job::JobStage;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, JobError>;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("Job not found")]
    JobNotFound,

    #[error("Job already reached a terminal stage")]
    JobTerminal,

    #[error("Job is at stage {actual}, operation requires {expected}")]
    StageMismatch { expected: JobStage, actual: JobStage },

    #[error("Stage deadline {deadline} passed, now {now}")]
    DeadlinePassed { deadline: i64, now: i64 },

    #[error("Stage deadline {deadline} not reached, now {now}")]
    DeadlineNotReached { deadline: i64, now: i64 },

    #[error("Caller is not the job requester")]
    NotRequester,

    #[error("Invalid committee threshold {m}/{n}")]
    InvalidThreshold { m: u32, n: u32 },

    #[error("Configured {name} window must be positive, got {secs}")]
    InvalidWindow { name: &'static str, secs: i64 },

    #[error("Fee arithmetic overflow")]
    AmountOverflow,

    #[error("Output proof failed verification")]
    ProofInvalid,

    #[error("Verifier call failed: {0}")]
    VerifierCallFailed(String),

    #[error("No verifiers registered for this job")]
    VerifierNotSet,

    #[error("No settlement recorded for this job")]
    DistributionNotFound,

    #[error("Share already claimed")]
    AlreadyClaimed,

    #[error("Nothing to claim")]
    NothingToClaim,

    #[error("Caller is not authorized")]
    Unauthorized,

    #[error("Token transfer failed: {0}")]
    TransferFailed(String),

    #[error(transparent)]
    Registry(#[from] syndic_registry::RegistryError),

    #[error(transparent)]
    Stake(#[from] syndic_stake::StakeError),
}
