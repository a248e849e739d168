use serde::{Deserialize, Serialize};
use std::fmt;

/// Operator fault classes adjudicated by the slashing policy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FaultReason {
    /// Faulty contribution during distributed key generation.
    KeyGenFault,
    /// Published an invalid decryption share.
    DecryptionFault,
    /// Published a ciphertext output whose correctness proof fails.
    InvalidOutput,
    /// Failed to participate while selected and active.
    Unavailability,
    /// Signed two conflicting artifacts for the same job.
    Equivocation,
}

impl fmt::Display for FaultReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FaultReason::KeyGenFault => "keygen-fault",
            FaultReason::DecryptionFault => "decryption-fault",
            FaultReason::InvalidOutput => "invalid-output",
            FaultReason::Unavailability => "unavailability",
            FaultReason::Equivocation => "equivocation",
        };
        write!(f, "{}", s)
    }
}

/// Terminal failure classification recorded on a failed job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobFailureReason {
    /// Sortition closed with fewer than `m` submissions.
    CommitteeSelectionFailed,
    /// No committee finalized before the request deadline.
    CommitteeFormationTimeout,
    /// Committee never published its aggregated key in time.
    KeyPublishTimeout,
    /// Job was never activated before the input deadline.
    ActivationTimeout,
    /// Ciphertext output missed the compute deadline.
    ComputeTimeout,
    /// Plaintext output missed the decryption deadline.
    DecryptionTimeout,
    /// Expulsions dropped the committee below quorum.
    CommitteeBelowQuorum(FaultReason),
}

impl fmt::Display for JobFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobFailureReason::CommitteeSelectionFailed => write!(f, "committee-selection-failed"),
            JobFailureReason::CommitteeFormationTimeout => write!(f, "committee-formation-timeout"),
            JobFailureReason::KeyPublishTimeout => write!(f, "key-publish-timeout"),
            JobFailureReason::ActivationTimeout => write!(f, "activation-timeout"),
            JobFailureReason::ComputeTimeout => write!(f, "compute-timeout"),
            JobFailureReason::DecryptionTimeout => write!(f, "decryption-timeout"),
            JobFailureReason::CommitteeBelowQuorum(fault) => {
                write!(f, "committee-below-quorum({})", fault)
            }
        }
    }
}
