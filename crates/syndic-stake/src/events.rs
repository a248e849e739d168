use serde::{Deserialize, Serialize};
use syndic_types::{AccountId, FaultReason, TokenAmount};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakePool {
    Ticket,
    License,
}

/// Balance-delta and status events recorded by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StakeEventKind {
    Bond {
        amount: TokenAmount,
    },
    Unbond {
        amount: TokenAmount,
        unlock_at: i64,
    },
    TicketAdded {
        amount: TokenAmount,
    },
    TicketRemoved {
        amount: TokenAmount,
        unlock_at: i64,
    },
    Registered,
    DeregistrationRequested {
        ticket: TokenAmount,
        license: TokenAmount,
        unlock_at: i64,
    },
    ExitClaimed {
        ticket: TokenAmount,
        license: TokenAmount,
    },
    SlashApplied {
        pool: StakePool,
        requested: TokenAmount,
        applied: TokenAmount,
        reason: FaultReason,
    },
    SlashedFundsRouted {
        ticket: TokenAmount,
        license: TokenAmount,
    },
    SlashedFundsWithdrawn {
        ticket: TokenAmount,
        license: TokenAmount,
    },
    ActivationChanged {
        active: bool,
    },
    BanUpdated {
        banned: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeEvent {
    pub operator: AccountId,
    pub kind: StakeEventKind,
    pub timestamp: i64,
}

impl StakeEvent {
    pub fn new(operator: AccountId, kind: StakeEventKind) -> Self {
        Self {
            operator,
            kind,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }
}
