use serde::{Deserialize, Serialize};
use syndic_jobs::JobsConfig;
use syndic_registry::RegistryConfig;
use syndic_slashing::SlashConfig;
use syndic_stake::LedgerConfig;
use syndic_types::AccountId;

/// Parameters for every subsystem the engine wires together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    pub ledger: LedgerConfig,
    pub registry: RegistryConfig,
    pub slashing: SlashConfig,
    pub jobs: JobsConfig,
}

impl EngineConfig {
    /// Grant the same governance set to every subsystem that has one.
    pub fn with_governance(mut self, accounts: Vec<AccountId>) -> Self {
        self.ledger.governance = accounts.clone();
        self.slashing.governance = accounts.clone();
        self.jobs.governance = accounts;
        self
    }

    pub fn with_slashers(mut self, accounts: Vec<AccountId>) -> Self {
        self.slashing.authorized_slashers = accounts;
        self
    }

    /// Point slashed-fund withdrawals and protocol fees at one treasury.
    pub fn with_treasury(mut self, treasury: AccountId) -> Self {
        self.ledger.treasury = treasury;
        self.jobs.treasury = treasury;
        self
    }

    pub fn with_chain_id(mut self, chain_id: u64) -> Self {
        self.slashing.chain_id = chain_id;
        self
    }
}
