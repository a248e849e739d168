use serde::{Deserialize, Serialize};
use syndic_types::{AccountId, TokenAmount};

/// Stake ledger parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Full license bond expected from an operator.
    pub required_license_bond: TokenAmount,
    /// Fraction of the required bond (basis points) that keeps a
    /// registered operator licensed. 10_000 means the full bond.
    pub active_license_bps: u16,
    /// Minimum ticket balance for an operator to count as active.
    pub min_ticket_balance: TokenAmount,
    /// Delay between requesting an exit and funds becoming claimable.
    pub exit_delay_secs: i64,
    /// Destination for withdrawn slashed funds and protocol fees.
    pub treasury: AccountId,
    /// Accounts allowed to withdraw slashed funds.
    pub governance: Vec<AccountId>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            required_license_bond: TokenAmount::from_units(1_000),
            active_license_bps: 10_000,
            min_ticket_balance: TokenAmount::from_units(100),
            exit_delay_secs: 7 * 24 * 3600,
            treasury: AccountId::from_bytes([0xEE; 32]),
            governance: Vec::new(),
        }
    }
}

impl LedgerConfig {
    /// Bond level below which a registered operator loses its license.
    pub fn license_floor(&self) -> TokenAmount {
        self.required_license_bond.mul_bps(self.active_license_bps)
    }

    pub fn is_governance(&self, account: &AccountId) -> bool {
        self.governance.contains(account)
    }
}
