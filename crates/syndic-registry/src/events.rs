use serde::{Deserialize, Serialize};
use syndic_types::{AccountId, Digest, JobId, Threshold};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistryEventKind {
    MemberAdded {
        leaf_index: u64,
        root: Digest,
    },
    MemberRemoved {
        root: Digest,
    },
    CommitteeOpened {
        job: JobId,
        threshold: Threshold,
        deadline: i64,
    },
    TicketSubmitted {
        job: JobId,
        ticket_number: u64,
        score: Digest,
    },
    CommitteeFinalized {
        job: JobId,
        members: Vec<AccountId>,
    },
    CommitteeFailed {
        job: JobId,
        submitted: usize,
        required: u32,
    },
    KeyPublished {
        job: JobId,
    },
    MemberExpelled {
        job: JobId,
        active_count: u32,
        threshold_m: u32,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistryEvent {
    pub operator: AccountId,
    pub kind: RegistryEventKind,
    pub timestamp: i64,
}

impl RegistryEvent {
    pub fn new(operator: AccountId, kind: RegistryEventKind) -> Self {
        Self {
            operator,
            kind,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}
