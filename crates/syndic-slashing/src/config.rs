use serde::{Deserialize, Serialize};
use syndic_types::AccountId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlashConfig {
    /// Chain identifier fault attestations must be bound to.
    pub chain_id: u64,
    /// Accounts allowed to file evidence-based slash proposals and resolve
    /// appeals.
    pub authorized_slashers: Vec<AccountId>,
    /// Accounts allowed to manage policies and the ban list.
    pub governance: Vec<AccountId>,
}

impl SlashConfig {
    pub fn is_authorized_slasher(&self, caller: &AccountId) -> bool {
        self.authorized_slashers.contains(caller)
    }

    pub fn is_governance(&self, caller: &AccountId) -> bool {
        self.governance.contains(caller)
    }
}

impl Default for SlashConfig {
    fn default() -> Self {
        Self {
            chain_id: 1,
            authorized_slashers: Vec::new(),
            governance: Vec::new(),
        }
    }
}
