use crate::attestation::FaultAttestation;
use crate::config::SlashConfig;
use crate::error::{Result, SlashError};
use crate::events::{SlashEvent, SlashEventKind};
use crate::policy::{default_policies, ProofKind, SlashPolicy};
use crate::proposal::{ProposalStatus, SlashLane, SlashProposal};
use async_trait::async_trait;
use prometheus::IntCounter;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use syndic_registry::{MembershipRegistry, RegistryError};
use syndic_stake::StakeLedger;
use syndic_types::{
    AccountId, Digest, FaultReason, JobFailureReason, JobId, ProposalId, PublicKey, TokenAmount,
};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

/// Verifies fault proofs produced by ciphernodes. `Ok(true)` means the
/// proof is valid and there is no fault to punish; `Ok(false)` means the
/// proof fails verification. `Err` means the verifier itself could not run.
#[async_trait]
pub trait FaultProofVerifier: Send + Sync {
    async fn verify(&self, proof: &[u8], public_inputs: &[u8]) -> anyhow::Result<bool>;
}

/// Notified when a slash drops a committee below its threshold.
#[async_trait]
pub trait JobFailureSink: Send + Sync {
    async fn fail_job(&self, job: JobId, reason: JobFailureReason, now: i64) -> anyhow::Result<()>;
}

/// Slashed amounts accumulated for one job, split by source pool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlashedFunds {
    pub ticket: TokenAmount,
    pub license: TokenAmount,
}

impl SlashedFunds {
    pub fn total(&self) -> TokenAmount {
        self.ticket.saturating_add(self.license)
    }

    pub fn is_zero(&self) -> bool {
        self.ticket.is_zero() && self.license.is_zero()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlashStats {
    pub proposals: usize,
    pub pending: usize,
    pub appealed: usize,
    pub executed: usize,
    pub upheld: usize,
    pub total_applied_ticket: TokenAmount,
    pub total_applied_license: TokenAmount,
    pub policies: usize,
}

struct CommitOutcome {
    id: ProposalId,
    accused: AccountId,
    job: Option<JobId>,
    reason: FaultReason,
    affects_committee: bool,
    applied_ticket: TokenAmount,
    applied_license: TokenAmount,
    banned: bool,
}

/// Adjudicates fault accusations against committee members and applies the
/// resulting slashes to the stake ledger.
///
/// The financial commit (stake debit, ban, per-job tally, proposal status)
/// is one unit. Expulsion and job-failure notification run after it and
/// their failures never unwind it; they are logged and swallowed.
pub struct FaultAdjudicator {
    config: SlashConfig,
    ledger: Arc<StakeLedger>,
    registry: Arc<MembershipRegistry>,
    policies: RwLock<HashMap<FaultReason, SlashPolicy>>,
    proposals: RwLock<HashMap<ProposalId, SlashProposal>>,
    next_proposal: AtomicU64,
    verifiers: RwLock<HashMap<ProofKind, Arc<dyn FaultProofVerifier>>>,
    job_sink: RwLock<Option<Arc<dyn JobFailureSink>>>,
    job_tallies: RwLock<HashMap<JobId, SlashedFunds>>,
    events: RwLock<Vec<SlashEvent>>,
    // Serializes proposal status transitions and their commits.
    gate: Mutex<()>,
    slashes_executed: Option<Arc<IntCounter>>,
    appeals_filed: Option<Arc<IntCounter>>,
}

impl FaultAdjudicator {
    pub fn new(
        ledger: Arc<StakeLedger>,
        registry: Arc<MembershipRegistry>,
        config: SlashConfig,
    ) -> Self {
        let policies = default_policies()
            .into_iter()
            .map(|p| (p.reason, p))
            .collect();
        Self {
            config,
            ledger,
            registry,
            policies: RwLock::new(policies),
            proposals: RwLock::new(HashMap::new()),
            next_proposal: AtomicU64::new(0),
            verifiers: RwLock::new(HashMap::new()),
            job_sink: RwLock::new(None),
            job_tallies: RwLock::new(HashMap::new()),
            events: RwLock::new(Vec::new()),
            gate: Mutex::new(()),
            slashes_executed: None,
            appeals_filed: None,
        }
    }

    /// Attach metric counters. Call before sharing the adjudicator.
    pub fn set_metrics(
        &mut self,
        slashes_executed: Option<Arc<IntCounter>>,
        appeals_filed: Option<Arc<IntCounter>>,
    ) {
        self.slashes_executed = slashes_executed;
        self.appeals_filed = appeals_filed;
    }

    pub async fn set_verifier(&self, kind: ProofKind, verifier: Arc<dyn FaultProofVerifier>) {
        self.verifiers.write().await.insert(kind, verifier);
    }

    pub async fn set_job_sink(&self, sink: Arc<dyn JobFailureSink>) {
        let mut job_sink = self.job_sink.write().await;
        *job_sink = Some(sink);
    }

    pub fn config(&self) -> &SlashConfig {
        &self.config
    }

    /// Lane A: permissionless, proof-based, instant.
    ///
    /// The attestation must be signed by the accused and bind this chain,
    /// this job, and the submitted proof material. The slash executes only
    /// if the registered verifier reports the proof invalid.
    #[allow(clippy::too_many_arguments)]
    pub async fn propose_slash(
        &self,
        reporter: AccountId,
        accused: AccountId,
        accused_key: &PublicKey,
        job: JobId,
        reason: FaultReason,
        attestation: &FaultAttestation,
        proof: &[u8],
        public_inputs: &[u8],
        now: i64,
    ) -> Result<ProposalId> {
        let policy = self.policy_for(reason).await?;
        if !policy.requires_proof {
            return Err(SlashError::PolicyNotProofBased);
        }
        if policy.proof_kind != Some(attestation.proof_kind) {
            return Err(SlashError::ProofKindMismatch);
        }
        if attestation.chain_id != self.config.chain_id {
            return Err(SlashError::ChainMismatch {
                attested: attestation.chain_id,
                expected: self.config.chain_id,
            });
        }
        if attestation.job != job {
            return Err(SlashError::JobMismatch {
                attested: attestation.job.as_u64(),
                expected: job.as_u64(),
            });
        }
        if !attestation.matches_material(proof, public_inputs) {
            return Err(SlashError::DigestMismatch);
        }
        if AccountId::from_public_key(accused_key) != accused
            || !attestation.verify_signer(accused_key)
        {
            return Err(SlashError::SignerMismatch);
        }

        let commit = {
            let _guard = self.gate.lock().await;
            self.require_committee_member(job, &accused).await?;
            if self.ledger.is_banned(accused).await {
                return Err(SlashError::CiphernodeBanned);
            }

            let verifier = self
                .verifiers
                .read()
                .await
                .get(&attestation.proof_kind)
                .cloned()
                .ok_or(SlashError::VerifierNotSet)?;
            match verifier.verify(proof, public_inputs).await {
                Err(e) => return Err(SlashError::VerifierCallFailed(e.to_string())),
                Ok(true) => return Err(SlashError::ProofIsValid),
                Ok(false) => {}
            }

            let id = self.allocate_id();
            let proposal = SlashProposal {
                id,
                lane: SlashLane::Proof,
                accused,
                proposer: reporter,
                job: Some(job),
                reason,
                ticket_amount: policy.ticket_amount,
                license_amount: policy.license_amount,
                ban: policy.ban,
                affects_committee: policy.affects_committee,
                proof_digest: Some(attestation.proof_digest),
                evidence_digest: None,
                appeal_digest: None,
                resolution_digest: None,
                status: ProposalStatus::Pending,
                created_at: now,
                executable_at: now,
                executed_at: None,
                applied_ticket: TokenAmount::ZERO,
                applied_license: TokenAmount::ZERO,
            };
            self.proposals.write().await.insert(id, proposal);

            info!(
                id = %id,
                reporter = %reporter,
                accused = %accused,
                job = %job,
                reason = %reason,
                "🧾 Fault proof accepted"
            );
            self.record(
                accused,
                SlashEventKind::ProposalCreated {
                    id,
                    lane: SlashLane::Proof,
                    job: Some(job),
                    reason,
                },
            )
            .await;
            self.commit_slash(id, now).await?
        };
        self.expel_and_notify(&commit, now).await;
        Ok(commit.id)
    }

    /// Lane B: evidence-based proposal from an authorized slasher. The
    /// slash waits out the policy's appeal window before it can execute.
    /// Binding a job requires the accused to sit on its committee; `None`
    /// accuses misconduct outside any committee context.
    pub async fn propose_slash_evidence(
        &self,
        proposer: AccountId,
        accused: AccountId,
        job: Option<JobId>,
        reason: FaultReason,
        evidence: &[u8],
        now: i64,
    ) -> Result<ProposalId> {
        if evidence.is_empty() {
            return Err(SlashError::EmptyEvidence);
        }
        let policy = self.policy_for(reason).await?;
        if policy.requires_proof {
            return Err(SlashError::PolicyNotEvidenceBased);
        }
        if !self.config.is_authorized_slasher(&proposer) {
            return Err(SlashError::Unauthorized);
        }

        let _guard = self.gate.lock().await;
        if let Some(job) = job {
            self.require_committee_member(job, &accused).await?;
        }
        if self.ledger.is_banned(accused).await {
            return Err(SlashError::CiphernodeBanned);
        }

        let id = self.allocate_id();
        let executable_at = now + policy.appeal_window_secs;
        let proposal = SlashProposal {
            id,
            lane: SlashLane::Evidence,
            accused,
            proposer,
            job,
            reason,
            ticket_amount: policy.ticket_amount,
            license_amount: policy.license_amount,
            ban: policy.ban,
            affects_committee: policy.affects_committee,
            proof_digest: None,
            evidence_digest: Some(Digest::of(evidence)),
            appeal_digest: None,
            resolution_digest: None,
            status: ProposalStatus::Pending,
            created_at: now,
            executable_at,
            executed_at: None,
            applied_ticket: TokenAmount::ZERO,
            applied_license: TokenAmount::ZERO,
        };
        self.proposals.write().await.insert(id, proposal);

        info!(
            id = %id,
            proposer = %proposer,
            accused = %accused,
            job = ?job,
            reason = %reason,
            executable_at = executable_at,
            "📝 Evidence slash proposed"
        );
        self.record(
            accused,
            SlashEventKind::ProposalCreated {
                id,
                lane: SlashLane::Evidence,
                job,
                reason,
            },
        )
        .await;
        Ok(id)
    }

    /// Execute a slash once its appeal window has passed. A rejected appeal
    /// puts the proposal back on the same clock; it never shortens the
    /// window. Permissionless.
    pub async fn execute_slash(
        &self,
        id: ProposalId,
        now: i64,
    ) -> Result<(TokenAmount, TokenAmount)> {
        let commit = {
            let _guard = self.gate.lock().await;
            {
                let proposals = self.proposals.read().await;
                let proposal = proposals.get(&id).ok_or(SlashError::ProposalNotFound)?;
                match proposal.status {
                    ProposalStatus::Executed => return Err(SlashError::AlreadyExecuted),
                    ProposalStatus::Appealed => return Err(SlashError::AppealPending),
                    ProposalStatus::AppealUpheld => return Err(SlashError::AppealUpheld),
                    ProposalStatus::Pending | ProposalStatus::AppealRejected => {
                        if now < proposal.executable_at {
                            return Err(SlashError::AppealWindowActive {
                                executable_at: proposal.executable_at,
                                now,
                            });
                        }
                    }
                }
            }
            self.commit_slash(id, now).await?
        };
        self.expel_and_notify(&commit, now).await;
        Ok((commit.applied_ticket, commit.applied_license))
    }

    /// Appeal a pending evidence slash. Only the accused, only inside the
    /// window, only once. The defense material is recorded by digest.
    pub async fn file_appeal(
        &self,
        caller: AccountId,
        id: ProposalId,
        evidence: &[u8],
        now: i64,
    ) -> Result<()> {
        if evidence.is_empty() {
            return Err(SlashError::EmptyEvidence);
        }

        let _guard = self.gate.lock().await;
        let mut proposals = self.proposals.write().await;
        let proposal = proposals.get_mut(&id).ok_or(SlashError::ProposalNotFound)?;
        if caller != proposal.accused {
            return Err(SlashError::OnlyAccused);
        }
        match proposal.status {
            ProposalStatus::Executed => return Err(SlashError::AlreadyExecuted),
            ProposalStatus::Appealed => return Err(SlashError::AlreadyAppealed),
            ProposalStatus::AppealUpheld | ProposalStatus::AppealRejected => {
                return Err(SlashError::AlreadyResolved)
            }
            ProposalStatus::Pending => {}
        }
        if now >= proposal.executable_at {
            return Err(SlashError::AppealWindowClosed {
                executable_at: proposal.executable_at,
                now,
            });
        }
        proposal.status = ProposalStatus::Appealed;
        proposal.appeal_digest = Some(Digest::of(evidence));
        drop(proposals);

        if let Some(counter) = &self.appeals_filed {
            counter.inc();
        }
        info!(id = %id, accused = %caller, "📨 Appeal filed");
        self.record(caller, SlashEventKind::AppealFiled { id }).await;
        Ok(())
    }

    /// Resolve a filed appeal, recording the ruling rationale by digest.
    /// Upholding voids the slash permanently; rejecting sends it back to
    /// wait out the remainder of the window.
    pub async fn resolve_appeal(
        &self,
        caller: AccountId,
        id: ProposalId,
        uphold: bool,
        resolution: &[u8],
    ) -> Result<()> {
        if !self.config.is_authorized_slasher(&caller) && !self.config.is_governance(&caller) {
            return Err(SlashError::Unauthorized);
        }

        let _guard = self.gate.lock().await;
        let mut proposals = self.proposals.write().await;
        let proposal = proposals.get_mut(&id).ok_or(SlashError::ProposalNotFound)?;
        match proposal.status {
            ProposalStatus::Executed => return Err(SlashError::AlreadyExecuted),
            ProposalStatus::AppealUpheld | ProposalStatus::AppealRejected => {
                return Err(SlashError::AlreadyResolved)
            }
            ProposalStatus::Pending => return Err(SlashError::NotAppealed),
            ProposalStatus::Appealed => {}
        }
        proposal.status = if uphold {
            ProposalStatus::AppealUpheld
        } else {
            ProposalStatus::AppealRejected
        };
        proposal.resolution_digest = Some(Digest::of(resolution));
        let accused = proposal.accused;
        drop(proposals);

        info!(id = %id, upheld = uphold, "⚖️ Appeal resolved");
        self.record(accused, SlashEventKind::AppealResolved { id, upheld: uphold })
            .await;
        Ok(())
    }

    /// Governance ban outside any slash.
    pub async fn ban(&self, caller: AccountId, operator: AccountId) -> Result<()> {
        self.set_ban(caller, operator, true).await
    }

    pub async fn unban(&self, caller: AccountId, operator: AccountId) -> Result<()> {
        self.set_ban(caller, operator, false).await
    }

    async fn set_ban(&self, caller: AccountId, operator: AccountId, banned: bool) -> Result<()> {
        if !self.config.is_governance(&caller) {
            return Err(SlashError::Unauthorized);
        }
        if self.ledger.set_banned(operator, banned).await? {
            self.record(operator, SlashEventKind::BanUpdated { banned })
                .await;
        }
        Ok(())
    }

    /// Insert or replace the policy for a fault reason.
    pub async fn set_policy(&self, caller: AccountId, policy: SlashPolicy) -> Result<()> {
        if !self.config.is_governance(&caller) {
            return Err(SlashError::Unauthorized);
        }
        policy.validate().map_err(SlashError::InvalidPolicy)?;
        let reason = policy.reason;
        self.policies.write().await.insert(reason, policy);

        info!(reason = %reason, "📜 Slash policy updated");
        self.record(AccountId::zero(), SlashEventKind::PolicyUpdated { reason })
            .await;
        Ok(())
    }

    /// Toggle a policy without replacing its terms.
    pub async fn set_enabled(
        &self,
        caller: AccountId,
        reason: FaultReason,
        enabled: bool,
    ) -> Result<()> {
        if !self.config.is_governance(&caller) {
            return Err(SlashError::Unauthorized);
        }
        let mut policies = self.policies.write().await;
        let policy = policies.get_mut(&reason).ok_or(SlashError::PolicyNotFound)?;
        policy.enabled = enabled;
        drop(policies);

        info!(reason = %reason, enabled = enabled, "📜 Slash policy toggled");
        self.record(AccountId::zero(), SlashEventKind::PolicyUpdated { reason })
            .await;
        Ok(())
    }

    pub async fn policy(&self, reason: FaultReason) -> Option<SlashPolicy> {
        self.policies.read().await.get(&reason).cloned()
    }

    pub async fn policies(&self) -> Vec<SlashPolicy> {
        self.policies.read().await.values().cloned().collect()
    }

    pub async fn proposal(&self, id: ProposalId) -> Option<SlashProposal> {
        self.proposals.read().await.get(&id).cloned()
    }

    /// Proposals bound to one job, in id order.
    pub async fn proposals_for(&self, job: JobId) -> Vec<SlashProposal> {
        let proposals = self.proposals.read().await;
        let mut list: Vec<SlashProposal> = proposals
            .values()
            .filter(|p| p.job == Some(job))
            .cloned()
            .collect();
        list.sort_by_key(|p| p.id);
        list
    }

    /// Proposals ready to execute at `now`: pending or appeal-rejected ones
    /// past their appeal window. Id order.
    pub async fn executable_proposals(&self, now: i64) -> Vec<SlashProposal> {
        let proposals = self.proposals.read().await;
        let mut list: Vec<SlashProposal> = proposals
            .values()
            .filter(|p| match p.status {
                ProposalStatus::Pending | ProposalStatus::AppealRejected => {
                    now >= p.executable_at
                }
                _ => false,
            })
            .cloned()
            .collect();
        list.sort_by_key(|p| p.id);
        list
    }

    /// Slashed amounts accumulated for a job and not yet routed.
    pub async fn job_slashed(&self, job: JobId) -> SlashedFunds {
        self.job_tallies
            .read()
            .await
            .get(&job)
            .copied()
            .unwrap_or_default()
    }

    /// Remove and return the job's slashed tally. Settlement calls this
    /// exactly once when it routes the funds.
    pub async fn take_job_slashed(&self, job: JobId) -> SlashedFunds {
        self.job_tallies
            .write()
            .await
            .remove(&job)
            .unwrap_or_default()
    }

    /// Put a taken tally back, merging with anything slashed since the
    /// take. Settlement calls this when routing fails after the take.
    pub async fn restore_job_slashed(&self, job: JobId, funds: SlashedFunds) {
        if funds.is_zero() {
            return;
        }
        let mut tallies = self.job_tallies.write().await;
        let entry = tallies.entry(job).or_default();
        entry.ticket = entry.ticket.saturating_add(funds.ticket);
        entry.license = entry.license.saturating_add(funds.license);
    }

    /// Drop terminal proposals created before the cutoff. Returns how many
    /// were removed.
    pub async fn sweep_resolved(&self, before: i64) -> usize {
        let mut proposals = self.proposals.write().await;
        let prior = proposals.len();
        proposals.retain(|_, p| !(p.is_terminal() && p.created_at < before));
        let removed = prior - proposals.len();
        if removed > 0 {
            debug!(removed = removed, "🧹 Swept resolved slash proposals");
        }
        removed
    }

    pub async fn stats(&self) -> SlashStats {
        let proposals = self.proposals.read().await;
        let mut stats = SlashStats {
            proposals: proposals.len(),
            policies: self.policies.read().await.len(),
            ..Default::default()
        };
        for p in proposals.values() {
            match p.status {
                ProposalStatus::Pending => stats.pending += 1,
                ProposalStatus::Appealed => stats.appealed += 1,
                ProposalStatus::Executed => stats.executed += 1,
                ProposalStatus::AppealUpheld => stats.upheld += 1,
                ProposalStatus::AppealRejected => {}
            }
            stats.total_applied_ticket = stats.total_applied_ticket.saturating_add(p.applied_ticket);
            stats.total_applied_license =
                stats.total_applied_license.saturating_add(p.applied_license);
        }
        stats
    }

    pub async fn events(&self) -> Vec<SlashEvent> {
        self.events.read().await.clone()
    }

    /// The financial commit. Caller holds the gate and has already checked
    /// the proposal status.
    async fn commit_slash(&self, id: ProposalId, now: i64) -> Result<CommitOutcome> {
        let snapshot = {
            let proposals = self.proposals.read().await;
            proposals
                .get(&id)
                .cloned()
                .ok_or(SlashError::ProposalNotFound)?
        };
        let accused = snapshot.accused;
        let job = snapshot.job;
        let ban = snapshot.ban;

        let applied_ticket = self
            .ledger
            .slash_ticket(accused, snapshot.ticket_amount, snapshot.reason)
            .await?;
        let applied_license = self
            .ledger
            .slash_license(accused, snapshot.license_amount, snapshot.reason)
            .await?;
        if ban {
            self.ledger.set_banned(accused, true).await?;
        }

        if let Some(job) = job {
            let mut tallies = self.job_tallies.write().await;
            let entry = tallies.entry(job).or_default();
            entry.ticket = entry.ticket.saturating_add(applied_ticket);
            entry.license = entry.license.saturating_add(applied_license);
        }
        {
            let mut proposals = self.proposals.write().await;
            if let Some(p) = proposals.get_mut(&id) {
                p.status = ProposalStatus::Executed;
                p.executed_at = Some(now);
                p.applied_ticket = applied_ticket;
                p.applied_license = applied_license;
            }
        }

        if let Some(counter) = &self.slashes_executed {
            counter.inc();
        }
        info!(
            id = %id,
            accused = %accused,
            job = ?job,
            ticket = %applied_ticket,
            license = %applied_license,
            banned = ban,
            "⚔️ Slash executed"
        );
        self.record(
            accused,
            SlashEventKind::SlashExecuted {
                id,
                job,
                ticket: applied_ticket,
                license: applied_license,
                banned: ban,
            },
        )
        .await;

        Ok(CommitOutcome {
            id,
            accused,
            job,
            reason: snapshot.reason,
            affects_committee: snapshot.affects_committee,
            applied_ticket,
            applied_license,
            banned: ban,
        })
    }

    /// Post-commit side effects. Failures here never unwind the commit.
    async fn expel_and_notify(&self, commit: &CommitOutcome, now: i64) {
        let job = match commit.job {
            Some(job) => job,
            None => {
                debug!(
                    operator = %commit.accused,
                    "Slash bound to no job; membership untouched"
                );
                return;
            }
        };
        if !commit.affects_committee {
            debug!(
                job = %job,
                operator = %commit.accused,
                "Slash leaves committee membership intact"
            );
            return;
        }
        let viability = match self.registry.expel(job, commit.accused).await {
            Ok(v) => v,
            Err(e) => {
                warn!(
                    job = %job,
                    operator = %commit.accused,
                    error = %e,
                    "Expulsion failed after slash commit"
                );
                return;
            }
        };
        if viability.is_viable() {
            return;
        }

        warn!(
            job = %job,
            active = viability.active_count,
            threshold_m = viability.threshold_m,
            "🚨 Committee below threshold"
        );
        self.record(
            commit.accused,
            SlashEventKind::CommitteeUnviable {
                job,
                active_count: viability.active_count,
                threshold_m: viability.threshold_m,
            },
        )
        .await;

        let sink = self.job_sink.read().await.clone();
        match sink {
            Some(sink) => {
                let reason = JobFailureReason::CommitteeBelowQuorum(commit.reason);
                if let Err(e) = sink.fail_job(job, reason, now).await {
                    warn!(
                        job = %job,
                        error = %e,
                        "Job failure notification failed after slash commit"
                    );
                }
            }
            None => debug!(job = %job, "No job failure sink wired"),
        }
    }

    async fn require_committee_member(&self, job: JobId, operator: &AccountId) -> Result<()> {
        let committee = self
            .registry
            .committee(job)
            .await
            .ok_or(SlashError::Registry(RegistryError::CommitteeNotFound))?;
        if committee.member(operator).is_none() {
            return Err(SlashError::Registry(RegistryError::NotCommitteeMember));
        }
        Ok(())
    }

    async fn policy_for(&self, reason: FaultReason) -> Result<SlashPolicy> {
        let policies = self.policies.read().await;
        let policy = policies.get(&reason).ok_or(SlashError::PolicyNotFound)?;
        if !policy.enabled {
            return Err(SlashError::PolicyDisabled);
        }
        Ok(policy.clone())
    }

    fn allocate_id(&self) -> ProposalId {
        ProposalId::new(self.next_proposal.fetch_add(1, Ordering::SeqCst))
    }

    async fn record(&self, operator: AccountId, kind: SlashEventKind) {
        let mut events = self.events.write().await;
        events.push(SlashEvent::new(operator, kind));
    }
}
