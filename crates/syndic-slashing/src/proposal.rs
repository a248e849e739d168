use serde::{Deserialize, Serialize};
use syndic_types::{AccountId, Digest, FaultReason, JobId, ProposalId, TokenAmount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlashLane {
    /// Instant, permissionless, backed by an invalid fault proof.
    Proof,
    /// Authorized proposal with an appeal window.
    Evidence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProposalStatus {
    Pending,
    Appealed,
    AppealUpheld,
    AppealRejected,
    Executed,
}

/// One slash in flight or settled. Amounts are snapshotted from the policy
/// at creation; `applied_*` record what the ledger actually debited, which
/// can be less when the stake was already drained. `job` carries the
/// committee context; a job-independent slash leaves it `None` and touches
/// no committee and no settlement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlashProposal {
    pub id: ProposalId,
    pub lane: SlashLane,
    pub accused: AccountId,
    pub proposer: AccountId,
    pub job: Option<JobId>,
    pub reason: FaultReason,
    pub ticket_amount: TokenAmount,
    pub license_amount: TokenAmount,
    pub ban: bool,
    pub affects_committee: bool,
    pub proof_digest: Option<Digest>,
    pub evidence_digest: Option<Digest>,
    pub appeal_digest: Option<Digest>,
    pub resolution_digest: Option<Digest>,
    pub status: ProposalStatus,
    pub created_at: i64,
    pub executable_at: i64,
    pub executed_at: Option<i64>,
    pub applied_ticket: TokenAmount,
    pub applied_license: TokenAmount,
}

impl SlashProposal {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            ProposalStatus::Executed | ProposalStatus::AppealUpheld
        )
    }
}
