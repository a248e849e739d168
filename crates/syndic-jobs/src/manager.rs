use crate::config::JobsConfig;
use crate::error::{JobError, Result};
use crate::events::{JobEvent, JobEventKind};
use crate::job::{Job, JobStage};
use crate::settlement::{NodeShare, Settlement};
use crate::verifier::JobVerifiers;
use async_trait::async_trait;
use prometheus::IntCounter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use syndic_registry::{FinalizeOutcome, MembershipRegistry};
use syndic_slashing::{FaultAdjudicator, JobFailureSink};
use syndic_stake::{StakeLedger, TokenTransfer};
use syndic_types::{AccountId, Digest, JobFailureReason, JobId, Threshold, TokenAmount};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobStats {
    pub jobs: usize,
    pub active: usize,
    pub complete: usize,
    pub failed: usize,
    pub total_escrowed: TokenAmount,
    pub protocol_fees: TokenAmount,
}

/// Drives jobs through their stages and settles them.
///
/// All timing comes from the `now` passed by callers; the manager never
/// reads a clock. A job settles exactly once, on the transition into
/// Complete or Failed, and every payout afterwards is a pull-based claim.
pub struct JobManager {
    config: JobsConfig,
    token: Arc<dyn TokenTransfer>,
    ledger: Arc<StakeLedger>,
    registry: Arc<MembershipRegistry>,
    adjudicator: Arc<FaultAdjudicator>,
    jobs: RwLock<HashMap<JobId, Job>>,
    verifiers: RwLock<HashMap<JobId, JobVerifiers>>,
    settlements: RwLock<HashMap<JobId, Settlement>>,
    protocol_fees: RwLock<TokenAmount>,
    next_job: AtomicU64,
    events: RwLock<Vec<JobEvent>>,
    // Serializes stage transitions and settlement commits.
    gate: Mutex<()>,
    jobs_requested: Option<Arc<IntCounter>>,
    jobs_completed: Option<Arc<IntCounter>>,
    jobs_failed: Option<Arc<IntCounter>>,
}

impl JobManager {
    pub fn new(
        config: JobsConfig,
        token: Arc<dyn TokenTransfer>,
        ledger: Arc<StakeLedger>,
        registry: Arc<MembershipRegistry>,
        adjudicator: Arc<FaultAdjudicator>,
    ) -> Self {
        Self {
            config,
            token,
            ledger,
            registry,
            adjudicator,
            jobs: RwLock::new(HashMap::new()),
            verifiers: RwLock::new(HashMap::new()),
            settlements: RwLock::new(HashMap::new()),
            protocol_fees: RwLock::new(TokenAmount::ZERO),
            next_job: AtomicU64::new(0),
            events: RwLock::new(Vec::new()),
            gate: Mutex::new(()),
            jobs_requested: None,
            jobs_completed: None,
            jobs_failed: None,
        }
    }

    /// Attach metric counters. Call before sharing the manager.
    pub fn set_metrics(
        &mut self,
        jobs_requested: Option<Arc<IntCounter>>,
        jobs_completed: Option<Arc<IntCounter>>,
        jobs_failed: Option<Arc<IntCounter>>,
    ) {
        self.jobs_requested = jobs_requested;
        self.jobs_completed = jobs_completed;
        self.jobs_failed = jobs_failed;
    }

    pub fn config(&self) -> &JobsConfig {
        &self.config
    }

    /// Open a new job: escrow the fee and start sortition for its
    /// committee.
    pub async fn request_job(
        &self,
        requester: AccountId,
        threshold: Threshold,
        seed: Digest,
        verifiers: JobVerifiers,
        now: i64,
    ) -> Result<JobId> {
        if !threshold.is_valid() {
            return Err(JobError::InvalidThreshold {
                m: threshold.m,
                n: threshold.n,
            });
        }
        if let Some((name, secs)) = self.config.invalid_window() {
            return Err(JobError::InvalidWindow { name, secs });
        }
        let fee = self
            .config
            .job_fee(threshold.n)
            .ok_or(JobError::AmountOverflow)?;

        let _guard = self.gate.lock().await;
        self.token
            .transfer_in(requester, fee)
            .await
            .map_err(|e| JobError::TransferFailed(e.to_string()))?;

        let id = JobId::new(self.next_job.fetch_add(1, Ordering::SeqCst));
        let deadline = now + self.config.request_window_secs;
        if let Err(e) = self
            .registry
            .open_committee(id, seed, threshold, Some(deadline), now)
            .await
        {
            // Sortition refused the job; release the escrow before failing.
            if let Err(refund_err) = self.token.transfer_out(requester, fee).await {
                warn!(
                    job = %id,
                    error = %refund_err,
                    "Escrow release failed after committee rejection"
                );
            }
            return Err(e.into());
        }

        let job = Job::new(id, requester, threshold, seed, fee, now, deadline);
        self.jobs.write().await.insert(id, job);
        self.verifiers.write().await.insert(id, verifiers);

        if let Some(counter) = &self.jobs_requested {
            counter.inc();
        }
        info!(
            job = %id,
            requester = %requester,
            threshold = %threshold,
            fee = %fee,
            deadline = deadline,
            "📥 Job requested"
        );
        self.record(
            id,
            requester,
            JobEventKind::Requested {
                threshold,
                payment: fee,
                deadline,
            },
        )
        .await;
        Ok(id)
    }

    /// Close sortition for the job. A full committee advances the job; a
    /// shortfall fails and settles it with zero work done.
    pub async fn finalize_committee(&self, job_id: JobId, now: i64) -> Result<FinalizeOutcome> {
        let _guard = self.gate.lock().await;
        self.require_stage(job_id, JobStage::Requested).await?;

        let outcome = self.registry.finalize_committee(job_id, now).await?;
        match &outcome {
            FinalizeOutcome::Finalized { members } => {
                let deadline = now + self.config.key_publish_window_secs;
                self.advance(job_id, JobStage::CommitteeFinalized, deadline)
                    .await;
                info!(
                    job = %job_id,
                    members = members.len(),
                    deadline = deadline,
                    "🏛️ Job committee finalized"
                );
                self.record(
                    job_id,
                    AccountId::zero(),
                    JobEventKind::CommitteeFinalized {
                        members: members.clone(),
                    },
                )
                .await;
            }
            FinalizeOutcome::QuorumNotReached {
                submitted,
                required,
            } => {
                debug!(
                    job = %job_id,
                    submitted = submitted,
                    required = required,
                    "Committee selection fell short"
                );
                self.fail_locked(job_id, JobFailureReason::CommitteeSelectionFailed, now)
                    .await?;
            }
        }
        Ok(outcome)
    }

    /// Record the committee public key, published by one of its members.
    pub async fn publish_key(
        &self,
        publisher: AccountId,
        job_id: JobId,
        key: Vec<u8>,
        now: i64,
    ) -> Result<()> {
        let _guard = self.gate.lock().await;
        let deadline = self.require_stage(job_id, JobStage::CommitteeFinalized).await?;
        if now > deadline {
            return Err(JobError::DeadlinePassed { deadline, now });
        }

        self.registry
            .publish_committee_key(publisher, job_id, key)
            .await?;
        let next_deadline = now + self.config.activation_window_secs;
        self.advance(job_id, JobStage::KeyPublished, next_deadline)
            .await;

        info!(job = %job_id, publisher = %publisher, "🔑 Job key published");
        self.record(job_id, publisher, JobEventKind::KeyPublished)
            .await;
        Ok(())
    }

    /// The requester starts the computation once the key is up.
    pub async fn activate(&self, caller: AccountId, job_id: JobId, now: i64) -> Result<()> {
        let _guard = self.gate.lock().await;
        let deadline = {
            let jobs = self.jobs.read().await;
            let job = jobs.get(&job_id).ok_or(JobError::JobNotFound)?;
            if job.requester != caller {
                return Err(JobError::NotRequester);
            }
            if job.is_terminal() {
                return Err(JobError::JobTerminal);
            }
            if job.stage != JobStage::KeyPublished {
                return Err(JobError::StageMismatch {
                    expected: JobStage::KeyPublished,
                    actual: job.stage,
                });
            }
            job.deadline
        };
        if now > deadline {
            return Err(JobError::DeadlinePassed { deadline, now });
        }

        let next_deadline = now + self.config.compute_window_secs;
        self.advance(job_id, JobStage::Activated, next_deadline).await;

        info!(job = %job_id, deadline = next_deadline, "▶️ Job activated");
        self.record(
            job_id,
            caller,
            JobEventKind::Activated {
                deadline: next_deadline,
            },
        )
        .await;
        Ok(())
    }

    /// A committee member publishes the encrypted computation output with
    /// its correctness proof.
    pub async fn publish_ciphertext(
        &self,
        caller: AccountId,
        job_id: JobId,
        ciphertext: &[u8],
        proof: &[u8],
        now: i64,
    ) -> Result<()> {
        let _guard = self.gate.lock().await;
        let deadline = self.require_stage(job_id, JobStage::Activated).await?;
        if now > deadline {
            return Err(JobError::DeadlinePassed { deadline, now });
        }
        self.require_active_member(job_id, &caller).await?;

        let verifiers = self.verifiers_for(job_id).await?;
        match verifiers.program.verify(job_id, ciphertext, proof).await {
            Err(e) => return Err(JobError::VerifierCallFailed(e.to_string())),
            Ok(false) => return Err(JobError::ProofInvalid),
            Ok(true) => {}
        }

        let digest = Digest::of(ciphertext);
        let next_deadline = now + self.config.decryption_window_secs;
        {
            let mut jobs = self.jobs.write().await;
            if let Some(job) = jobs.get_mut(&job_id) {
                job.ciphertext_digest = Some(digest);
                job.stage = JobStage::CiphertextReady;
                job.deadline = next_deadline;
            }
        }

        info!(job = %job_id, publisher = %caller, digest = %digest, "🧩 Ciphertext output published");
        self.record(job_id, caller, JobEventKind::CiphertextPublished { digest })
            .await;
        Ok(())
    }

    /// A committee member publishes the decrypted plaintext with its
    /// decryption proof, completing and settling the job.
    pub async fn publish_plaintext(
        &self,
        caller: AccountId,
        job_id: JobId,
        plaintext: &[u8],
        proof: &[u8],
        now: i64,
    ) -> Result<()> {
        let _guard = self.gate.lock().await;
        let deadline = self.require_stage(job_id, JobStage::CiphertextReady).await?;
        if now > deadline {
            return Err(JobError::DeadlinePassed { deadline, now });
        }
        self.require_active_member(job_id, &caller).await?;

        let verifiers = self.verifiers_for(job_id).await?;
        match verifiers.decryption.verify(job_id, plaintext, proof).await {
            Err(e) => return Err(JobError::VerifierCallFailed(e.to_string())),
            Ok(false) => return Err(JobError::ProofInvalid),
            Ok(true) => {}
        }

        let snapshot = {
            let jobs = self.jobs.read().await;
            jobs.get(&job_id).ok_or(JobError::JobNotFound)?.clone()
        };
        let settlement = self.build_settlement(&snapshot, 10_000, now).await?;

        {
            let mut jobs = self.jobs.write().await;
            if let Some(job) = jobs.get_mut(&job_id) {
                job.plaintext_digest = Some(Digest::of(plaintext));
                job.stage = JobStage::Complete;
            }
        }
        self.commit_settlement(settlement).await;

        if let Some(counter) = &self.jobs_completed {
            counter.inc();
        }
        info!(job = %job_id, publisher = %caller, "🎉 Job complete");
        self.record(job_id, caller, JobEventKind::Completed).await;
        Ok(())
    }

    /// Fail a job whose current stage deadline has lapsed. Permissionless.
    pub async fn mark_failed(&self, job_id: JobId, now: i64) -> Result<()> {
        let _guard = self.gate.lock().await;
        let reason = {
            let jobs = self.jobs.read().await;
            let job = jobs.get(&job_id).ok_or(JobError::JobNotFound)?;
            if job.is_terminal() {
                return Err(JobError::JobTerminal);
            }
            if now < job.deadline {
                return Err(JobError::DeadlineNotReached {
                    deadline: job.deadline,
                    now,
                });
            }
            match job.stage {
                JobStage::Requested => JobFailureReason::CommitteeFormationTimeout,
                JobStage::CommitteeFinalized => JobFailureReason::KeyPublishTimeout,
                JobStage::KeyPublished => JobFailureReason::ActivationTimeout,
                JobStage::Activated => JobFailureReason::ComputeTimeout,
                JobStage::CiphertextReady => JobFailureReason::DecryptionTimeout,
                JobStage::Complete | JobStage::Failed => return Err(JobError::JobTerminal),
            }
        };
        self.fail_locked(job_id, reason, now).await
    }

    /// Fail a job for an externally determined reason, settling it against
    /// the stage it had reached.
    pub async fn fail(&self, job_id: JobId, reason: JobFailureReason, now: i64) -> Result<()> {
        let _guard = self.gate.lock().await;
        self.fail_locked(job_id, reason, now).await
    }

    /// Claim the requester's settled refund. Idempotent: a second claim
    /// returns `AlreadyClaimed` and moves no funds.
    pub async fn claim_requester_refund(
        &self,
        caller: AccountId,
        job_id: JobId,
    ) -> Result<TokenAmount> {
        let _guard = self.gate.lock().await;
        let amount = {
            let settlements = self.settlements.read().await;
            let settlement = settlements
                .get(&job_id)
                .ok_or(JobError::DistributionNotFound)?;
            if settlement.requester != caller {
                return Err(JobError::NotRequester);
            }
            if settlement.requester_claimed {
                return Err(JobError::AlreadyClaimed);
            }
            if settlement.requester_refund.is_zero() {
                return Err(JobError::NothingToClaim);
            }
            settlement.requester_refund
        };

        self.token
            .transfer_out(caller, amount)
            .await
            .map_err(|e| JobError::TransferFailed(e.to_string()))?;
        {
            let mut settlements = self.settlements.write().await;
            if let Some(settlement) = settlements.get_mut(&job_id) {
                settlement.requester_claimed = true;
            }
        }

        info!(job = %job_id, requester = %caller, amount = %amount, "💸 Requester refund claimed");
        self.record(job_id, caller, JobEventKind::RefundClaimed { amount })
            .await;
        Ok(amount)
    }

    /// Claim a committee member's settled reward.
    pub async fn claim_node_reward(&self, caller: AccountId, job_id: JobId) -> Result<TokenAmount> {
        let _guard = self.gate.lock().await;
        let amount = {
            let settlements = self.settlements.read().await;
            let settlement = settlements
                .get(&job_id)
                .ok_or(JobError::DistributionNotFound)?;
            let share = settlement
                .node_share(&caller)
                .ok_or(JobError::NothingToClaim)?;
            if share.claimed {
                return Err(JobError::AlreadyClaimed);
            }
            if share.amount.is_zero() {
                return Err(JobError::NothingToClaim);
            }
            share.amount
        };

        self.token
            .transfer_out(caller, amount)
            .await
            .map_err(|e| JobError::TransferFailed(e.to_string()))?;
        {
            let mut settlements = self.settlements.write().await;
            if let Some(settlement) = settlements.get_mut(&job_id) {
                if let Some(share) = settlement
                    .node_shares
                    .iter_mut()
                    .find(|s| s.operator == caller)
                {
                    share.claimed = true;
                }
            }
        }

        info!(job = %job_id, operator = %caller, amount = %amount, "💰 Node reward claimed");
        self.record(job_id, caller, JobEventKind::RewardClaimed { amount })
            .await;
        Ok(amount)
    }

    /// Governance sweep of accumulated protocol fees to the treasury.
    pub async fn withdraw_protocol_fees(&self, caller: AccountId) -> Result<TokenAmount> {
        if !self.config.is_governance(&caller) {
            return Err(JobError::Unauthorized);
        }

        let _guard = self.gate.lock().await;
        let amount = *self.protocol_fees.read().await;
        if amount.is_zero() {
            return Err(JobError::NothingToClaim);
        }
        self.token
            .transfer_out(self.config.treasury, amount)
            .await
            .map_err(|e| JobError::TransferFailed(e.to_string()))?;
        {
            let mut pot = self.protocol_fees.write().await;
            *pot = TokenAmount::ZERO;
        }

        info!(
            caller = %caller,
            amount = %amount,
            treasury = %self.config.treasury,
            "🏛️ Protocol fees withdrawn"
        );
        self.record(
            JobId::new(u64::MAX),
            caller,
            JobEventKind::ProtocolFeesWithdrawn { amount },
        )
        .await;
        Ok(amount)
    }

    pub async fn job(&self, job_id: JobId) -> Option<Job> {
        self.jobs.read().await.get(&job_id).cloned()
    }

    pub async fn settlement(&self, job_id: JobId) -> Option<Settlement> {
        self.settlements.read().await.get(&job_id).cloned()
    }

    pub async fn protocol_fee_balance(&self) -> TokenAmount {
        *self.protocol_fees.read().await
    }

    pub async fn stats(&self) -> JobStats {
        let jobs = self.jobs.read().await;
        let mut stats = JobStats {
            jobs: jobs.len(),
            protocol_fees: *self.protocol_fees.read().await,
            ..Default::default()
        };
        for job in jobs.values() {
            match job.stage {
                JobStage::Complete => stats.complete += 1,
                JobStage::Failed => stats.failed += 1,
                _ => stats.active += 1,
            }
            stats.total_escrowed = stats.total_escrowed.saturating_add(job.payment);
        }
        stats
    }

    pub async fn events(&self) -> Vec<JobEvent> {
        self.events.read().await.clone()
    }

    /// Verify the stage and return its deadline.
    async fn require_stage(&self, job_id: JobId, expected: JobStage) -> Result<i64> {
        let jobs = self.jobs.read().await;
        let job = jobs.get(&job_id).ok_or(JobError::JobNotFound)?;
        if job.is_terminal() {
            return Err(JobError::JobTerminal);
        }
        if job.stage != expected {
            return Err(JobError::StageMismatch {
                expected,
                actual: job.stage,
            });
        }
        Ok(job.deadline)
    }

    async fn require_active_member(&self, job_id: JobId, operator: &AccountId) -> Result<()> {
        if !self
            .registry
            .is_active_committee_member(job_id, operator)
            .await
        {
            return Err(JobError::Registry(
                syndic_registry::RegistryError::NotCommitteeMember,
            ));
        }
        Ok(())
    }

    async fn verifiers_for(&self, job_id: JobId) -> Result<JobVerifiers> {
        self.verifiers
            .read()
            .await
            .get(&job_id)
            .cloned()
            .ok_or(JobError::VerifierNotSet)
    }

    async fn advance(&self, job_id: JobId, stage: JobStage, deadline: i64) {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.get_mut(&job_id) {
            job.stage = stage;
            job.deadline = deadline;
        }
    }

    /// Fail and settle. Caller holds the gate.
    async fn fail_locked(
        &self,
        job_id: JobId,
        reason: JobFailureReason,
        now: i64,
    ) -> Result<()> {
        let snapshot = {
            let jobs = self.jobs.read().await;
            let job = jobs.get(&job_id).ok_or(JobError::JobNotFound)?;
            if job.is_terminal() {
                return Err(JobError::JobTerminal);
            }
            job.clone()
        };
        let work_bps = self.config.work_schedule.for_stage(snapshot.stage);
        let settlement = self.build_settlement(&snapshot, work_bps, now).await?;

        {
            let mut jobs = self.jobs.write().await;
            if let Some(job) = jobs.get_mut(&job_id) {
                job.failure = Some(reason);
                job.failure_stage = Some(job.stage);
                job.stage = JobStage::Failed;
            }
        }
        self.commit_settlement(settlement).await;

        if let Some(counter) = &self.jobs_failed {
            counter.inc();
        }
        warn!(
            job = %job_id,
            stage = %snapshot.stage,
            reason = %reason,
            "💥 Job failed"
        );
        self.record(job_id, AccountId::zero(), JobEventKind::Failed { reason })
            .await;
        Ok(())
    }

    /// Compute the money split for a job at `work_bps` completion. Routes
    /// the job's slashed tally out of the stake accumulators as part of the
    /// computation.
    async fn build_settlement(
        &self,
        job: &Job,
        work_bps: u16,
        now: i64,
    ) -> Result<Settlement> {
        let success = work_bps == 10_000;
        let worked = job.payment.mul_bps(work_bps);
        let mut requester_refund = job.payment.saturating_sub(worked);
        let mut protocol_fees = worked.mul_bps(self.config.protocol_fee_bps);
        let honest_fee_pool = worked.saturating_sub(protocol_fees);

        let slashed = self.adjudicator.take_job_slashed(job.id).await;
        if let Err(e) = self
            .ledger
            .consume_slashed(slashed.ticket, slashed.license)
            .await
        {
            // Put the tally back; a retry must settle the same funds
            self.adjudicator.restore_job_slashed(job.id, slashed).await;
            return Err(e.into());
        }
        let node_bps = if success {
            self.config.success_slashed_node_bps
        } else {
            self.config.failure_slashed_node_bps
        };
        let slashed_to_nodes = slashed.total().mul_bps(node_bps);
        let slashed_remainder = slashed.total().saturating_sub(slashed_to_nodes);
        if success {
            protocol_fees = protocol_fees.saturating_add(slashed_remainder);
        } else {
            requester_refund = requester_refund.saturating_add(slashed_remainder);
        }

        let honest_total = honest_fee_pool.saturating_add(slashed_to_nodes);
        let nodes = self.registry.active_committee_nodes(job.id).await;
        let (per_node, crumbs) = honest_total.split_evenly(nodes.len() as u64);
        protocol_fees = protocol_fees.saturating_add(crumbs);

        let node_shares = nodes
            .iter()
            .map(|operator| NodeShare {
                operator: *operator,
                amount: per_node,
                claimed: false,
            })
            .collect();

        Ok(Settlement {
            job: job.id,
            work_bps,
            requester: job.requester,
            requester_refund,
            requester_claimed: false,
            node_shares,
            protocol_fees,
            slashed_routed: slashed,
            settled_at: now,
        })
    }

    async fn commit_settlement(&self, settlement: Settlement) {
        {
            let mut pot = self.protocol_fees.write().await;
            *pot = pot.saturating_add(settlement.protocol_fees);
        }
        let per_node = settlement
            .node_shares
            .first()
            .map(|s| s.amount)
            .unwrap_or(TokenAmount::ZERO);
        info!(
            job = %settlement.job,
            work_bps = settlement.work_bps,
            requester_refund = %settlement.requester_refund,
            nodes = settlement.node_shares.len(),
            per_node = %per_node,
            protocol = %settlement.protocol_fees,
            "🧾 Job settled"
        );
        self.record(
            settlement.job,
            AccountId::zero(),
            JobEventKind::Settled {
                work_bps: settlement.work_bps,
                requester_refund: settlement.requester_refund,
                per_node,
                nodes: settlement.node_shares.len(),
                protocol_fees: settlement.protocol_fees,
            },
        )
        .await;
        self.settlements
            .write()
            .await
            .insert(settlement.job, settlement);
    }

    async fn record(&self, job: JobId, actor: AccountId, kind: JobEventKind) {
        let mut events = self.events.write().await;
        events.push(JobEvent::new(job, actor, kind));
    }
}

#[async_trait]
impl JobFailureSink for JobManager {
    async fn fail_job(&self, job: JobId, reason: JobFailureReason, now: i64) -> anyhow::Result<()> {
        self.fail(job, reason, now).await?;
        Ok(())
    }
}
