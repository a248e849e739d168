use thiserror::Error;

pub type Result<T> = std::result::Result<T, SlashError>;

#[derive(Error, Debug)]
pub enum SlashError {
    #[error("No slash policy for this fault reason")]
    PolicyNotFound,

    #[error("Slash policy is disabled")]
    PolicyDisabled,

    #[error("Policy requires an evidence proposal, not a fault proof")]
    PolicyNotProofBased,

    #[error("Policy requires a fault proof, not an evidence proposal")]
    PolicyNotEvidenceBased,

    #[error("Invalid slash policy: {0}")]
    InvalidPolicy(String),

    #[error("Attestation proof kind does not match the policy")]
    ProofKindMismatch,

    #[error("Attestation bound to chain {attested}, expected {expected}")]
    ChainMismatch { attested: u64, expected: u64 },

    #[error("Attestation bound to job {attested}, expected {expected}")]
    JobMismatch { attested: u64, expected: u64 },

    #[error("Submitted bytes do not match the attested digests")]
    DigestMismatch,

    #[error("Attestation signature does not verify against the accused")]
    SignerMismatch,

    #[error("Fault proof verified as valid; nothing to slash")]
    ProofIsValid,

    #[error("No verifier registered for this proof kind")]
    VerifierNotSet,

    #[error("Verifier call failed: {0}")]
    VerifierCallFailed(String),

    #[error("Evidence must not be empty")]
    EmptyEvidence,

    #[error("Slash proposal not found")]
    ProposalNotFound,

    #[error("Slash already executed")]
    AlreadyExecuted,

    #[error("Appeal window open until {executable_at}, now {now}")]
    AppealWindowActive { executable_at: i64, now: i64 },

    #[error("Appeal window closed at {executable_at}, now {now}")]
    AppealWindowClosed { executable_at: i64, now: i64 },

    #[error("An appeal is pending on this proposal")]
    AppealPending,

    #[error("Appeal was upheld; the slash is void")]
    AppealUpheld,

    #[error("Proposal already appealed")]
    AlreadyAppealed,

    #[error("Appeal already resolved")]
    AlreadyResolved,

    #[error("Proposal has no pending appeal")]
    NotAppealed,

    #[error("Only the accused operator may appeal")]
    OnlyAccused,

    #[error("Caller is not authorized")]
    Unauthorized,

    #[error("Operator is already banned")]
    CiphernodeBanned,

    #[error(transparent)]
    Registry(#[from] syndic_registry::RegistryError),

    #[error(transparent)]
    Stake(#[from] syndic_stake::StakeError),
}
