use crate::ledger::OperatorAccount;
use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use syndic_types::{AccountId, TokenAmount};
use tokio::sync::RwLock;
use tracing::debug;

/// Persistence seam for the stake ledger. The ledger performs all
/// invariant checks; the store only reads and writes records.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn get_account(&self, operator: AccountId) -> Result<Option<OperatorAccount>>;
    async fn put_account(&self, account: OperatorAccount) -> Result<()>;
    async fn all_accounts(&self) -> Result<Vec<OperatorAccount>>;

    /// Accumulated slashed funds as (ticket pool, license pool).
    async fn slashed_funds(&self) -> Result<(TokenAmount, TokenAmount)>;
    async fn set_slashed_funds(&self, ticket: TokenAmount, license: TokenAmount) -> Result<()>;
}

pub struct MemoryLedgerStore {
    accounts: Arc<RwLock<HashMap<AccountId, OperatorAccount>>>,
    slashed: Arc<RwLock<(TokenAmount, TokenAmount)>>,
}

impl Default for MemoryLedgerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self {
            accounts: Arc::new(RwLock::new(HashMap::new())),
            slashed: Arc::new(RwLock::new((TokenAmount::ZERO, TokenAmount::ZERO))),
        }
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn get_account(&self, operator: AccountId) -> Result<Option<OperatorAccount>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.get(&operator).cloned())
    }

    async fn put_account(&self, account: OperatorAccount) -> Result<()> {
        let mut accounts = self.accounts.write().await;
        debug!(
            operator = %account.operator,
            ticket = %account.ticket_balance,
            license = %account.license_bond,
            registered = account.registered,
            "Account stored"
        );
        accounts.insert(account.operator, account);
        Ok(())
    }

    async fn all_accounts(&self) -> Result<Vec<OperatorAccount>> {
        let accounts = self.accounts.read().await;
        Ok(accounts.values().cloned().collect())
    }

    async fn slashed_funds(&self) -> Result<(TokenAmount, TokenAmount)> {
        Ok(*self.slashed.read().await)
    }

    async fn set_slashed_funds(&self, ticket: TokenAmount, license: TokenAmount) -> Result<()> {
        let mut slashed = self.slashed.write().await;
        *slashed = (ticket, license);
        Ok(())
    }
}
