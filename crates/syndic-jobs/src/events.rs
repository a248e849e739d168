use serde::{Deserialize, Serialize};
use syndic_types::{AccountId, Digest, JobFailureReason, JobId, Threshold, TokenAmount};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobEventKind {
    Requested {
        threshold: Threshold,
        payment: TokenAmount,
        deadline: i64,
    },
    CommitteeFinalized {
        members: Vec<AccountId>,
    },
    KeyPublished,
    Activated {
        deadline: i64,
    },
    CiphertextPublished {
        digest: Digest,
    },
    Completed,
    Failed {
        reason: JobFailureReason,
    },
    Settled {
        work_bps: u16,
        requester_refund: TokenAmount,
        per_node: TokenAmount,
        nodes: usize,
        protocol_fees: TokenAmount,
    },
    RefundClaimed {
        amount: TokenAmount,
    },
    RewardClaimed {
        amount: TokenAmount,
    },
    ProtocolFeesWithdrawn {
        amount: TokenAmount,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobEvent {
    pub job: JobId,
    pub actor: AccountId,
    pub kind: JobEventKind,
    pub timestamp: i64,
}

impl JobEvent {
    pub fn new(job: JobId, actor: AccountId, kind: JobEventKind) -> Self {
        Self {
            job,
            actor,
            kind,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}
