use serde::{Deserialize, Serialize};
use syndic_slashing::SlashedFunds;
use syndic_types::{AccountId, JobId, TokenAmount};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeShare {
    pub operator: AccountId,
    pub amount: TokenAmount,
    pub claimed: bool,
}

/// Final money split for a settled job. Written exactly once, when the job
/// reaches Complete or Failed; claims only flip the `claimed` flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settlement {
    pub job: JobId,
    pub work_bps: u16,
    pub requester: AccountId,
    pub requester_refund: TokenAmount,
    pub requester_claimed: bool,
    pub node_shares: Vec<NodeShare>,
    pub protocol_fees: TokenAmount,
    pub slashed_routed: SlashedFunds,
    pub settled_at: i64,
}

impl Settlement {
    pub fn node_share(&self, operator: &AccountId) -> Option<&NodeShare> {
        self.node_shares.iter().find(|s| &s.operator == operator)
    }

    pub fn nodes_total(&self) -> TokenAmount {
        self.node_shares.iter().map(|s| s.amount).sum()
    }

    /// Everything this settlement pays out, across all parties.
    pub fn total(&self) -> TokenAmount {
        self.requester_refund
            .saturating_add(self.nodes_total())
            .saturating_add(self.protocol_fees)
    }
}
