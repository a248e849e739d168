use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use syndic_types::{AccountId, TokenAmount};
use tokio::sync::RwLock;
use tracing::debug;

/// Fungible transfer capability consumed by the ledger and settlement.
/// Transfers are assumed atomic; an error means nothing moved.
#[async_trait]
pub trait TokenTransfer: Send + Sync {
    /// Pull `amount` from `from` into protocol custody.
    async fn transfer_in(&self, from: AccountId, amount: TokenAmount) -> Result<()>;
    /// Pay `amount` out of protocol custody to `to`.
    async fn transfer_out(&self, to: AccountId, amount: TokenAmount) -> Result<()>;
    async fn balance_of(&self, account: AccountId) -> Result<TokenAmount>;
}

/// In-memory token with a single protocol vault, for tests and local runs.
pub struct MemoryToken {
    balances: Arc<RwLock<HashMap<AccountId, TokenAmount>>>,
    vault: Arc<RwLock<TokenAmount>>,
}

impl Default for MemoryToken {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryToken {
    pub fn new() -> Self {
        Self {
            balances: Arc::new(RwLock::new(HashMap::new())),
            vault: Arc::new(RwLock::new(TokenAmount::ZERO)),
        }
    }

    pub async fn mint(&self, account: AccountId, amount: TokenAmount) {
        let mut balances = self.balances.write().await;
        let balance = balances.entry(account).or_insert(TokenAmount::ZERO);
        *balance = balance.saturating_add(amount);
    }

    /// Total held in protocol custody. Useful for conservation checks.
    pub async fn vault_balance(&self) -> TokenAmount {
        *self.vault.read().await
    }
}

#[async_trait]
impl TokenTransfer for MemoryToken {
    async fn transfer_in(&self, from: AccountId, amount: TokenAmount) -> Result<()> {
        let mut balances = self.balances.write().await;
        let balance = balances.get(&from).copied().unwrap_or(TokenAmount::ZERO);
        if balance < amount {
            bail!(
                "insufficient token balance: account {} has {}, needs {}",
                from,
                balance,
                amount
            );
        }
        balances.insert(from, balance.saturating_sub(amount));

        let mut vault = self.vault.write().await;
        *vault = vault.saturating_add(amount);

        debug!(from = %from, amount = %amount, "Token transfer into custody");
        Ok(())
    }

    async fn transfer_out(&self, to: AccountId, amount: TokenAmount) -> Result<()> {
        let mut vault = self.vault.write().await;
        if *vault < amount {
            bail!("vault underfunded: holds {}, needs {}", *vault, amount);
        }
        *vault = vault.saturating_sub(amount);
        drop(vault);

        let mut balances = self.balances.write().await;
        let balance = balances.entry(to).or_insert(TokenAmount::ZERO);
        *balance = balance.saturating_add(amount);

        debug!(to = %to, amount = %amount, "Token transfer out of custody");
        Ok(())
    }

    async fn balance_of(&self, account: AccountId) -> Result<TokenAmount> {
        let balances = self.balances.read().await;
        Ok(balances.get(&account).copied().unwrap_or(TokenAmount::ZERO))
    }
}
