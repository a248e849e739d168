use crate::config::LedgerConfig;
use crate::error::{Result, StakeError};
use crate::events::{StakeEvent, StakeEventKind, StakePool};
use crate::store::LedgerStore;
use crate::token::TokenTransfer;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use syndic_types::{AccountId, FaultReason, MembershipProof, TokenAmount};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Downstream membership maintenance invoked on register/deregister.
/// Implemented by the membership registry; wired at genesis.
#[async_trait]
pub trait MembershipHook: Send + Sync {
    async fn insert_member(&self, operator: AccountId) -> anyhow::Result<()>;
    async fn remove_member(
        &self,
        operator: AccountId,
        proof: &MembershipProof,
    ) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingExit {
    pub ticket: TokenAmount,
    pub license: TokenAmount,
    pub unlock_at: i64,
}

impl PendingExit {
    pub fn is_empty(&self) -> bool {
        self.ticket.is_zero() && self.license.is_zero()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatorAccount {
    pub operator: AccountId,
    pub ticket_balance: TokenAmount,
    pub license_bond: TokenAmount,
    pub registered: bool,
    pub banned: bool,
    pub pending_exit: Option<PendingExit>,
}

impl OperatorAccount {
    pub fn new(operator: AccountId) -> Self {
        Self {
            operator,
            ticket_balance: TokenAmount::ZERO,
            license_bond: TokenAmount::ZERO,
            registered: false,
            banned: false,
            pending_exit: None,
        }
    }

    pub fn is_licensed(&self, config: &LedgerConfig) -> bool {
        self.license_bond >= config.license_floor()
    }

    /// Active: registered, not banned, licensed, and holding at least the
    /// minimum ticket balance.
    pub fn is_active(&self, config: &LedgerConfig) -> bool {
        self.registered
            && !self.banned
            && self.is_licensed(config)
            && self.ticket_balance >= config.min_ticket_balance
    }

    fn exit_outstanding(&self) -> bool {
        matches!(&self.pending_exit, Some(p) if !p.is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerStats {
    pub operators: usize,
    pub registered: usize,
    pub active: usize,
    pub banned: usize,
    pub total_ticket_balance: TokenAmount,
    pub total_license_bond: TokenAmount,
    pub pending_ticket: TokenAmount,
    pub pending_license: TokenAmount,
    pub slashed_ticket_pool: TokenAmount,
    pub slashed_license_pool: TokenAmount,
}

/// Stake accounting for all operators: license bonds gating eligibility,
/// consumable ticket balances funding work, a timed exit queue, and the
/// slashed-funds accumulators. Never reads a wall clock - every time-gated
/// operation takes `now` from the caller.
pub struct StakeLedger {
    store: Arc<dyn LedgerStore>,
    token: Arc<dyn TokenTransfer>,
    config: LedgerConfig,
    membership: RwLock<Option<Arc<dyn MembershipHook>>>,
    events: RwLock<Vec<StakeEvent>>,
    // Serializes read-modify-write cycles against the store.
    gate: Mutex<()>,
}

impl StakeLedger {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        token: Arc<dyn TokenTransfer>,
        config: LedgerConfig,
    ) -> Self {
        Self {
            store,
            token,
            config,
            membership: RwLock::new(None),
            events: RwLock::new(Vec::new()),
            gate: Mutex::new(()),
        }
    }

    pub fn config(&self) -> &LedgerConfig {
        &self.config
    }

    pub async fn set_membership_hook(&self, hook: Arc<dyn MembershipHook>) {
        let mut membership = self.membership.write().await;
        *membership = Some(hook);
    }

    /// Increase an operator's license bond, pulling funds into custody.
    pub async fn bond(&self, operator: AccountId, amount: TokenAmount) -> Result<()> {
        if operator.is_zero() {
            return Err(StakeError::ZeroAddress);
        }
        if amount.is_zero() {
            return Err(StakeError::ZeroAmount);
        }

        let _guard = self.gate.lock().await;
        let mut account = self.load_or_new(operator).await?;
        if account.exit_outstanding() {
            return Err(StakeError::ExitInProgress);
        }
        let new_bond = account
            .license_bond
            .checked_add(amount)
            .ok_or(StakeError::AmountOverflow)?;

        self.token
            .transfer_in(operator, amount)
            .await
            .map_err(|e| StakeError::TransferFailed(e.to_string()))?;

        let was_active = account.is_active(&self.config);
        account.license_bond = new_bond;
        let now_active = account.is_active(&self.config);
        self.store.put_account(account).await?;

        info!(
            operator = %operator,
            amount = %amount,
            bond_after = %new_bond,
            "🔗 License bond increased"
        );
        self.record(operator, StakeEventKind::Bond { amount }).await;
        if was_active != now_active {
            self.record_activation(operator, now_active).await;
        }
        Ok(())
    }

    /// Decrease the license bond; the amount enters the exit queue and
    /// becomes claimable after the exit delay.
    pub async fn unbond(&self, operator: AccountId, amount: TokenAmount, now: i64) -> Result<()> {
        if amount.is_zero() {
            return Err(StakeError::ZeroAmount);
        }

        let _guard = self.gate.lock().await;
        let mut account = self.load_or_new(operator).await?;
        if account.license_bond < amount {
            return Err(StakeError::InsufficientBalance {
                needed: amount,
                available: account.license_bond,
            });
        }

        let was_active = account.is_active(&self.config);
        account.license_bond = account.license_bond.saturating_sub(amount);
        let unlock_at = now + self.config.exit_delay_secs;
        Self::enqueue_exit(&mut account, TokenAmount::ZERO, amount, unlock_at);
        let now_active = account.is_active(&self.config);
        self.store.put_account(account).await?;

        info!(
            operator = %operator,
            amount = %amount,
            unlock_at = unlock_at,
            "🔓 License bond unbonded into exit queue"
        );
        self.record(operator, StakeEventKind::Unbond { amount, unlock_at })
            .await;
        if was_active != now_active {
            self.record_activation(operator, now_active).await;
        }
        Ok(())
    }

    /// Top up the consumable ticket pool, pulling funds into custody.
    pub async fn add_ticket_balance(&self, operator: AccountId, amount: TokenAmount) -> Result<()> {
        if operator.is_zero() {
            return Err(StakeError::ZeroAddress);
        }
        if amount.is_zero() {
            return Err(StakeError::ZeroAmount);
        }

        let _guard = self.gate.lock().await;
        let mut account = self.load_or_new(operator).await?;
        if account.exit_outstanding() {
            return Err(StakeError::ExitInProgress);
        }
        let new_balance = account
            .ticket_balance
            .checked_add(amount)
            .ok_or(StakeError::AmountOverflow)?;

        self.token
            .transfer_in(operator, amount)
            .await
            .map_err(|e| StakeError::TransferFailed(e.to_string()))?;

        let was_active = account.is_active(&self.config);
        account.ticket_balance = new_balance;
        let now_active = account.is_active(&self.config);
        self.store.put_account(account).await?;

        info!(
            operator = %operator,
            amount = %amount,
            tickets_after = %new_balance,
            "🎫 Ticket balance increased"
        );
        self.record(operator, StakeEventKind::TicketAdded { amount })
            .await;
        if was_active != now_active {
            self.record_activation(operator, now_active).await;
        }
        Ok(())
    }

    /// Move tickets into the exit queue.
    pub async fn remove_ticket_balance(
        &self,
        operator: AccountId,
        amount: TokenAmount,
        now: i64,
    ) -> Result<()> {
        if amount.is_zero() {
            return Err(StakeError::ZeroAmount);
        }

        let _guard = self.gate.lock().await;
        let mut account = self.load_or_new(operator).await?;
        if account.ticket_balance < amount {
            return Err(StakeError::InsufficientBalance {
                needed: amount,
                available: account.ticket_balance,
            });
        }

        let was_active = account.is_active(&self.config);
        account.ticket_balance = account.ticket_balance.saturating_sub(amount);
        let unlock_at = now + self.config.exit_delay_secs;
        Self::enqueue_exit(&mut account, amount, TokenAmount::ZERO, unlock_at);
        let now_active = account.is_active(&self.config);
        self.store.put_account(account).await?;

        info!(
            operator = %operator,
            amount = %amount,
            unlock_at = unlock_at,
            "🎫 Ticket balance withdrawn into exit queue"
        );
        self.record(
            operator,
            StakeEventKind::TicketRemoved { amount, unlock_at },
        )
        .await;
        if was_active != now_active {
            self.record_activation(operator, now_active).await;
        }
        Ok(())
    }

    /// Register a licensed operator, inserting it into the membership tree.
    pub async fn register(&self, operator: AccountId) -> Result<()> {
        if operator.is_zero() {
            return Err(StakeError::ZeroAddress);
        }

        let _guard = self.gate.lock().await;
        let mut account = self.load_or_new(operator).await?;
        if account.banned {
            return Err(StakeError::CiphernodeBanned);
        }
        if account.registered {
            return Err(StakeError::AlreadyRegistered);
        }
        if account.exit_outstanding() {
            return Err(StakeError::ExitInProgress);
        }
        if !account.is_licensed(&self.config) {
            return Err(StakeError::NotLicensed {
                required: self.config.license_floor(),
                bonded: account.license_bond,
            });
        }

        // A fully claimed exit from a prior deregistration cycle leaves an
        // empty record behind; registration starts a fresh cycle.
        if account.pending_exit.is_some() {
            account.pending_exit = None;
        }

        if let Some(hook) = self.membership_hook().await {
            hook.insert_member(operator)
                .await
                .map_err(|e| StakeError::MembershipRejected(e.to_string()))?;
        } else {
            debug!(operator = %operator, "No membership hook wired; skipping tree insert");
        }

        let was_active = account.is_active(&self.config);
        account.registered = true;
        let now_active = account.is_active(&self.config);
        self.store.put_account(account).await?;

        info!(operator = %operator, "✅ Operator registered");
        self.record(operator, StakeEventKind::Registered).await;
        if was_active != now_active {
            self.record_activation(operator, now_active).await;
        }
        Ok(())
    }

    /// Deregister: the full ticket and license balances move into the exit
    /// queue and the operator leaves the membership tree. The membership
    /// proof must match the current tree state or the whole operation fails.
    pub async fn deregister(
        &self,
        operator: AccountId,
        proof: &MembershipProof,
        now: i64,
    ) -> Result<()> {
        let _guard = self.gate.lock().await;
        let mut account = match self.store.get_account(operator).await? {
            Some(account) if account.registered => account,
            _ => return Err(StakeError::NotRegistered),
        };

        if let Some(hook) = self.membership_hook().await {
            hook.remove_member(operator, proof)
                .await
                .map_err(|e| StakeError::MembershipRejected(e.to_string()))?;
        } else {
            debug!(operator = %operator, "No membership hook wired; skipping tree removal");
        }

        let was_active = account.is_active(&self.config);
        let ticket = account.ticket_balance;
        let license = account.license_bond;
        let unlock_at = now + self.config.exit_delay_secs;

        account.ticket_balance = TokenAmount::ZERO;
        account.license_bond = TokenAmount::ZERO;
        account.registered = false;
        Self::enqueue_exit(&mut account, ticket, license, unlock_at);
        self.store.put_account(account).await?;

        info!(
            operator = %operator,
            ticket = %ticket,
            license = %license,
            unlock_at = unlock_at,
            "📤 Deregistration requested"
        );
        self.record(
            operator,
            StakeEventKind::DeregistrationRequested {
                ticket,
                license,
                unlock_at,
            },
        )
        .await;
        if was_active {
            self.record_activation(operator, false).await;
        }
        Ok(())
    }

    /// Claim queued exit funds once the delay has elapsed. Partial claims
    /// subtract from the pending amounts; they do not zero them.
    pub async fn claim_exits(
        &self,
        operator: AccountId,
        max_ticket: TokenAmount,
        max_license: TokenAmount,
        now: i64,
    ) -> Result<(TokenAmount, TokenAmount)> {
        let _guard = self.gate.lock().await;
        let mut account = self
            .store
            .get_account(operator)
            .await?
            .ok_or(StakeError::NoExitPending)?;

        let pending = match &account.pending_exit {
            Some(p) if !p.is_empty() => p.clone(),
            _ => return Err(StakeError::NoExitPending),
        };
        if now < pending.unlock_at {
            return Err(StakeError::ExitNotReady {
                unlock_at: pending.unlock_at,
                now,
            });
        }

        let claim_ticket = max_ticket.min(pending.ticket);
        let claim_license = max_license.min(pending.license);
        let total = claim_ticket
            .checked_add(claim_license)
            .ok_or(StakeError::AmountOverflow)?;
        if total.is_zero() {
            return Ok((TokenAmount::ZERO, TokenAmount::ZERO));
        }

        self.token
            .transfer_out(operator, total)
            .await
            .map_err(|e| StakeError::TransferFailed(e.to_string()))?;

        account.pending_exit = Some(PendingExit {
            ticket: pending.ticket.saturating_sub(claim_ticket),
            license: pending.license.saturating_sub(claim_license),
            unlock_at: pending.unlock_at,
        });
        self.store.put_account(account).await?;

        info!(
            operator = %operator,
            ticket = %claim_ticket,
            license = %claim_license,
            "💸 Exit claimed"
        );
        self.record(
            operator,
            StakeEventKind::ExitClaimed {
                ticket: claim_ticket,
                license: claim_license,
            },
        )
        .await;
        Ok((claim_ticket, claim_license))
    }

    /// Slash the ticket pool, flooring at zero. The applied amount lands in
    /// the slashed-funds accumulator and is returned to the caller.
    pub async fn slash_ticket(
        &self,
        operator: AccountId,
        amount: TokenAmount,
        reason: FaultReason,
    ) -> Result<TokenAmount> {
        self.slash(operator, amount, reason, StakePool::Ticket).await
    }

    /// Slash the license bond, flooring at zero.
    pub async fn slash_license(
        &self,
        operator: AccountId,
        amount: TokenAmount,
        reason: FaultReason,
    ) -> Result<TokenAmount> {
        self.slash(operator, amount, reason, StakePool::License).await
    }

    async fn slash(
        &self,
        operator: AccountId,
        amount: TokenAmount,
        reason: FaultReason,
        pool: StakePool,
    ) -> Result<TokenAmount> {
        if amount.is_zero() {
            return Ok(TokenAmount::ZERO);
        }

        let _guard = self.gate.lock().await;
        let mut account = self.load_or_new(operator).await?;
        let balance = match pool {
            StakePool::Ticket => account.ticket_balance,
            StakePool::License => account.license_bond,
        };
        let applied = amount.min(balance);

        let was_active = account.is_active(&self.config);
        match pool {
            StakePool::Ticket => {
                account.ticket_balance = balance.saturating_sub(applied);
            }
            StakePool::License => {
                account.license_bond = balance.saturating_sub(applied);
            }
        }
        let now_active = account.is_active(&self.config);

        let (slashed_ticket, slashed_license) = self.store.slashed_funds().await?;
        let (new_ticket, new_license) = match pool {
            StakePool::Ticket => (
                slashed_ticket
                    .checked_add(applied)
                    .ok_or(StakeError::AmountOverflow)?,
                slashed_license,
            ),
            StakePool::License => (
                slashed_ticket,
                slashed_license
                    .checked_add(applied)
                    .ok_or(StakeError::AmountOverflow)?,
            ),
        };

        self.store.put_account(account).await?;
        self.store.set_slashed_funds(new_ticket, new_license).await?;

        info!(
            operator = %operator,
            pool = ?pool,
            requested = %amount,
            applied = %applied,
            reason = %reason,
            "⚔️ Stake slashed"
        );
        self.record(
            operator,
            StakeEventKind::SlashApplied {
                pool,
                requested: amount,
                applied,
                reason,
            },
        )
        .await;
        if was_active != now_active {
            self.record_activation(operator, now_active).await;
        }
        Ok(applied)
    }

    /// Remove routed amounts from the slashed-funds accumulators without a
    /// token movement; settlement pays them out through its own claims.
    pub async fn consume_slashed(&self, ticket: TokenAmount, license: TokenAmount) -> Result<()> {
        if ticket.is_zero() && license.is_zero() {
            return Ok(());
        }

        let _guard = self.gate.lock().await;
        let (slashed_ticket, slashed_license) = self.store.slashed_funds().await?;
        if ticket > slashed_ticket {
            return Err(StakeError::InsufficientSlashedFunds {
                requested: ticket,
                available: slashed_ticket,
            });
        }
        if license > slashed_license {
            return Err(StakeError::InsufficientSlashedFunds {
                requested: license,
                available: slashed_license,
            });
        }
        self.store
            .set_slashed_funds(
                slashed_ticket.saturating_sub(ticket),
                slashed_license.saturating_sub(license),
            )
            .await?;

        debug!(ticket = %ticket, license = %license, "Slashed funds routed to settlement");
        let mut events = self.events.write().await;
        events.push(StakeEvent::new(
            AccountId::zero(),
            StakeEventKind::SlashedFundsRouted { ticket, license },
        ));
        Ok(())
    }

    /// Governance withdrawal of unrouted slashed funds to the treasury.
    pub async fn withdraw_slashed_funds(
        &self,
        caller: AccountId,
        ticket: TokenAmount,
        license: TokenAmount,
    ) -> Result<()> {
        if !self.config.is_governance(&caller) {
            return Err(StakeError::Unauthorized);
        }

        let _guard = self.gate.lock().await;
        let (slashed_ticket, slashed_license) = self.store.slashed_funds().await?;
        if ticket > slashed_ticket {
            return Err(StakeError::InsufficientSlashedFunds {
                requested: ticket,
                available: slashed_ticket,
            });
        }
        if license > slashed_license {
            return Err(StakeError::InsufficientSlashedFunds {
                requested: license,
                available: slashed_license,
            });
        }
        let total = ticket
            .checked_add(license)
            .ok_or(StakeError::AmountOverflow)?;
        if total.is_zero() {
            return Ok(());
        }

        self.token
            .transfer_out(self.config.treasury, total)
            .await
            .map_err(|e| StakeError::TransferFailed(e.to_string()))?;
        self.store
            .set_slashed_funds(
                slashed_ticket.saturating_sub(ticket),
                slashed_license.saturating_sub(license),
            )
            .await?;

        info!(
            caller = %caller,
            ticket = %ticket,
            license = %license,
            treasury = %self.config.treasury,
            "🏛️ Slashed funds withdrawn to treasury"
        );
        let mut events = self.events.write().await;
        events.push(StakeEvent::new(
            caller,
            StakeEventKind::SlashedFundsWithdrawn { ticket, license },
        ));
        Ok(())
    }

    /// Set or clear the ban flag. Returns whether the flag changed.
    pub async fn set_banned(&self, operator: AccountId, banned: bool) -> Result<bool> {
        let _guard = self.gate.lock().await;
        let mut account = self.load_or_new(operator).await?;
        if account.banned == banned {
            return Ok(false);
        }

        let was_active = account.is_active(&self.config);
        account.banned = banned;
        let now_active = account.is_active(&self.config);
        self.store.put_account(account).await?;

        warn!(operator = %operator, banned = banned, "🚫 Ban flag updated");
        self.record(operator, StakeEventKind::BanUpdated { banned })
            .await;
        if was_active != now_active {
            self.record_activation(operator, now_active).await;
        }
        Ok(true)
    }

    pub async fn account(&self, operator: AccountId) -> Result<Option<OperatorAccount>> {
        Ok(self.store.get_account(operator).await?)
    }

    pub async fn is_registered(&self, operator: AccountId) -> bool {
        matches!(
            self.store.get_account(operator).await,
            Ok(Some(account)) if account.registered
        )
    }

    pub async fn is_banned(&self, operator: AccountId) -> bool {
        matches!(
            self.store.get_account(operator).await,
            Ok(Some(account)) if account.banned
        )
    }

    pub async fn is_active(&self, operator: AccountId) -> bool {
        matches!(
            self.store.get_account(operator).await,
            Ok(Some(account)) if account.is_active(&self.config)
        )
    }

    /// Active operators with their ticket balances; the sortition
    /// eligibility snapshot is taken from this view.
    pub async fn active_operators(&self) -> Result<Vec<(AccountId, TokenAmount)>> {
        let accounts = self.store.all_accounts().await?;
        Ok(accounts
            .into_iter()
            .filter(|a| a.is_active(&self.config))
            .map(|a| (a.operator, a.ticket_balance))
            .collect())
    }

    pub async fn slashed_funds(&self) -> Result<(TokenAmount, TokenAmount)> {
        Ok(self.store.slashed_funds().await?)
    }

    pub async fn stats(&self) -> Result<LedgerStats> {
        let accounts = self.store.all_accounts().await?;
        let (slashed_ticket_pool, slashed_license_pool) = self.store.slashed_funds().await?;

        let mut stats = LedgerStats {
            operators: accounts.len(),
            slashed_ticket_pool,
            slashed_license_pool,
            ..Default::default()
        };
        for account in &accounts {
            if account.registered {
                stats.registered += 1;
            }
            if account.banned {
                stats.banned += 1;
            }
            if account.is_active(&self.config) {
                stats.active += 1;
            }
            stats.total_ticket_balance =
                stats.total_ticket_balance.saturating_add(account.ticket_balance);
            stats.total_license_bond =
                stats.total_license_bond.saturating_add(account.license_bond);
            if let Some(pending) = &account.pending_exit {
                stats.pending_ticket = stats.pending_ticket.saturating_add(pending.ticket);
                stats.pending_license = stats.pending_license.saturating_add(pending.license);
            }
        }
        Ok(stats)
    }

    pub async fn events(&self) -> Vec<StakeEvent> {
        self.events.read().await.clone()
    }

    async fn membership_hook(&self) -> Option<Arc<dyn MembershipHook>> {
        self.membership.read().await.clone()
    }

    async fn load_or_new(&self, operator: AccountId) -> Result<OperatorAccount> {
        Ok(self
            .store
            .get_account(operator)
            .await?
            .unwrap_or_else(|| OperatorAccount::new(operator)))
    }

    fn enqueue_exit(
        account: &mut OperatorAccount,
        ticket: TokenAmount,
        license: TokenAmount,
        unlock_at: i64,
    ) {
        let (prev_ticket, prev_license) = match &account.pending_exit {
            Some(p) => (p.ticket, p.license),
            None => (TokenAmount::ZERO, TokenAmount::ZERO),
        };
        account.pending_exit = Some(PendingExit {
            ticket: prev_ticket.saturating_add(ticket),
            license: prev_license.saturating_add(license),
            unlock_at,
        });
    }

    async fn record(&self, operator: AccountId, kind: StakeEventKind) {
        let mut events = self.events.write().await;
        events.push(StakeEvent::new(operator, kind));
    }

    async fn record_activation(&self, operator: AccountId, active: bool) {
        info!(operator = %operator, active = active, "🔄 Activation changed");
        self.record(operator, StakeEventKind::ActivationChanged { active })
            .await;
    }
}
