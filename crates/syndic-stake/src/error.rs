use syndic_types::TokenAmount;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StakeError {
    #[error("Amount must be greater than zero")]
    ZeroAmount,

    #[error("Zero address")]
    ZeroAddress,

    #[error("Amount overflow")]
    AmountOverflow,

    #[error("Insufficient balance: needed {needed}, available {available}")]
    InsufficientBalance {
        needed: TokenAmount,
        available: TokenAmount,
    },

    #[error("Exit already in progress")]
    ExitInProgress,

    #[error("No exit pending")]
    NoExitPending,

    #[error("Exit not ready: unlocks at {unlock_at}, now {now}")]
    ExitNotReady { unlock_at: i64, now: i64 },

    #[error("Already registered")]
    AlreadyRegistered,

    #[error("Not registered")]
    NotRegistered,

    #[error("Not licensed: required bond {required}, bonded {bonded}")]
    NotLicensed {
        required: TokenAmount,
        bonded: TokenAmount,
    },

    #[error("Ciphernode is banned")]
    CiphernodeBanned,

    #[error("Insufficient slashed funds: requested {requested}, available {available}")]
    InsufficientSlashedFunds {
        requested: TokenAmount,
        available: TokenAmount,
    },

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Token transfer failed: {0}")]
    TransferFailed(String),

    #[error("Membership update rejected: {0}")]
    MembershipRejected(String),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, StakeError>;
