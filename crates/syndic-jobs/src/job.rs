use serde::{Deserialize, Serialize};
use std::fmt;
use syndic_types::{AccountId, Digest, JobFailureReason, JobId, Threshold, TokenAmount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStage {
    Requested,
    CommitteeFinalized,
    KeyPublished,
    Activated,
    CiphertextReady,
    Complete,
    Failed,
}

impl JobStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStage::Complete | JobStage::Failed)
    }
}

impl fmt::Display for JobStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStage::Requested => "requested",
            JobStage::CommitteeFinalized => "committee-finalized",
            JobStage::KeyPublished => "key-published",
            JobStage::Activated => "activated",
            JobStage::CiphertextReady => "ciphertext-ready",
            JobStage::Complete => "complete",
            JobStage::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// One encrypted-computation job. `deadline` always refers to the current
/// stage; advancing a stage resets it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    pub requester: AccountId,
    pub threshold: Threshold,
    pub seed: Digest,
    pub payment: TokenAmount,
    pub stage: JobStage,
    pub requested_at: i64,
    pub deadline: i64,
    pub ciphertext_digest: Option<Digest>,
    pub plaintext_digest: Option<Digest>,
    pub failure: Option<JobFailureReason>,
    pub failure_stage: Option<JobStage>,
}

impl Job {
    pub fn new(
        id: JobId,
        requester: AccountId,
        threshold: Threshold,
        seed: Digest,
        payment: TokenAmount,
        now: i64,
        deadline: i64,
    ) -> Self {
        Self {
            id,
            requester,
            threshold,
            seed,
            payment,
            stage: JobStage::Requested,
            requested_at: now,
            deadline,
            ciphertext_digest: None,
            plaintext_digest: None,
            failure: None,
            failure_stage: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.stage.is_terminal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_stages() {
        assert!(JobStage::Complete.is_terminal());
        assert!(JobStage::Failed.is_terminal());
        assert!(!JobStage::Requested.is_terminal());
        assert!(!JobStage::CiphertextReady.is_terminal());
    }

    #[test]
    fn test_stage_display() {
        assert_eq!(JobStage::KeyPublished.to_string(), "key-published");
        assert_eq!(JobStage::Failed.to_string(), "failed");
    }
}
