use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Operator is already a tree member")]
    MemberExists,

    #[error("Operator is not a tree member")]
    MemberNotFound,

    #[error("Membership proof does not match the current tree")]
    InvalidMembershipProof,

    #[error("Committee already opened for this job")]
    CommitteeExists,

    #[error("No committee opened for this job")]
    CommitteeNotFound,

    #[error("Committee is no longer accepting submissions")]
    CommitteeClosed,

    #[error("Submission window closed at {deadline}, now {now}")]
    SubmissionWindowClosed { deadline: i64, now: i64 },

    #[error("Submission window still open until {deadline}, now {now}")]
    SubmissionWindowOpen { deadline: i64, now: i64 },

    #[error("Operator already submitted a ticket for this job")]
    AlreadySubmitted,

    #[error("Ticket {ticket} outside the snapshot balance of {balance}")]
    TicketOutOfRange { ticket: u64, balance: u64 },

    #[error("Operator is not eligible for sortition")]
    NotEligible,

    #[error("Operator was not selected into this committee")]
    NotCommitteeMember,

    #[error("Committee is not finalized")]
    CommitteeNotFinalized,

    #[error("Committee public key already published")]
    KeyAlreadyPublished,

    #[error("Committee public key is empty")]
    InvalidPublicKey,

    #[error("Invalid committee threshold {m}/{n}")]
    InvalidThreshold { m: u32, n: u32 },

    #[error("Stake ledger unavailable: {0}")]
    StakeUnavailable(String),
}
