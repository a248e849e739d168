use crate::proposal::SlashLane;
use serde::{Deserialize, Serialize};
use syndic_types::{AccountId, FaultReason, JobId, ProposalId, TokenAmount};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlashEventKind {
    ProposalCreated {
        id: ProposalId,
        lane: SlashLane,
        job: Option<JobId>,
        reason: FaultReason,
    },
    SlashExecuted {
        id: ProposalId,
        job: Option<JobId>,
        ticket: TokenAmount,
        license: TokenAmount,
        banned: bool,
    },
    AppealFiled {
        id: ProposalId,
    },
    AppealResolved {
        id: ProposalId,
        upheld: bool,
    },
    CommitteeUnviable {
        job: JobId,
        active_count: u32,
        threshold_m: u32,
    },
    PolicyUpdated {
        reason: FaultReason,
    },
    BanUpdated {
        banned: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashEvent {
    pub operator: AccountId,
    pub kind: SlashEventKind,
    pub timestamp: i64,
}

impl SlashEvent {
    pub fn new(operator: AccountId, kind: SlashEventKind) -> Self {
        Self {
            operator,
            kind,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}
