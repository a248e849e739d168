use crate::committee::{
    Committee, CommitteeMember, CommitteeStage, CommitteeViability, FinalizeOutcome, MemberStatus,
    TicketSubmission,
};
use crate::config::RegistryConfig;
use crate::error::{RegistryError, Result};
use crate::events::{RegistryEvent, RegistryEventKind};
use crate::sortition;
use crate::tree::MembershipTree;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use syndic_stake::{MembershipHook, StakeLedger};
use syndic_types::{AccountId, Digest, JobId, MembershipProof, Threshold, TokenAmount};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Read-only view of the stake ledger used for sortition eligibility.
#[async_trait]
pub trait StakeView: Send + Sync {
    /// Active operators with their current ticket balances.
    async fn active_ticket_balances(&self) -> anyhow::Result<Vec<(AccountId, TokenAmount)>>;
}

#[async_trait]
impl StakeView for StakeLedger {
    async fn active_ticket_balances(&self) -> anyhow::Result<Vec<(AccountId, TokenAmount)>> {
        Ok(self.active_operators().await?)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryStats {
    pub members: usize,
    pub leaf_slots: usize,
    pub committees: usize,
    pub finalized: usize,
    pub failed: usize,
}

/// Membership tree plus per-job committees. Ticket balances are snapshotted
/// from the stake ledger when a round opens; the member set never updates
/// after finalization except through expulsion.
pub struct MembershipRegistry {
    stake: Arc<dyn StakeView>,
    config: RegistryConfig,
    tree: RwLock<MembershipTree>,
    committees: RwLock<HashMap<JobId, Committee>>,
    events: RwLock<Vec<RegistryEvent>>,
}

impl MembershipRegistry {
    pub fn new(stake: Arc<dyn StakeView>, config: RegistryConfig) -> Self {
        Self {
            stake,
            config,
            tree: RwLock::new(MembershipTree::new()),
            committees: RwLock::new(HashMap::new()),
            events: RwLock::new(Vec::new()),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Insert an operator into the membership tree.
    pub async fn add_member(&self, operator: AccountId) -> Result<u64> {
        let mut tree = self.tree.write().await;
        let leaf_index = tree.insert(operator)?;
        let root = tree.root();
        drop(tree);

        info!(
            operator = %operator,
            leaf_index = leaf_index,
            root = %root,
            "🌳 Member added to tree"
        );
        self.record(operator, RegistryEventKind::MemberAdded { leaf_index, root })
            .await;
        Ok(leaf_index)
    }

    /// Remove an operator, verifying the sibling path against the current
    /// root before zeroing the leaf.
    pub async fn remove_member(&self, operator: AccountId, proof: &MembershipProof) -> Result<()> {
        let mut tree = self.tree.write().await;
        tree.remove(operator, proof)?;
        let root = tree.root();
        drop(tree);

        info!(operator = %operator, root = %root, "🍂 Member removed from tree");
        self.record(operator, RegistryEventKind::MemberRemoved { root })
            .await;
        Ok(())
    }

    pub async fn is_member(&self, operator: &AccountId) -> bool {
        self.tree.read().await.contains(operator)
    }

    pub async fn member_count(&self) -> usize {
        self.tree.read().await.len()
    }

    pub async fn merkle_root(&self) -> Digest {
        self.tree.read().await.root()
    }

    pub async fn membership_proof(&self, operator: &AccountId) -> Result<MembershipProof> {
        self.tree.read().await.proof_of(operator)
    }

    /// Open a sortition round for a job, freezing each active operator's
    /// ticket balance as the round's eligibility snapshot. Submissions are
    /// accepted strictly before the deadline; `None` applies the configured
    /// default window.
    pub async fn open_committee(
        &self,
        job: JobId,
        seed: Digest,
        threshold: Threshold,
        deadline: Option<i64>,
        now: i64,
    ) -> Result<()> {
        if !threshold.is_valid() || threshold.n > self.config.max_committee_size {
            return Err(RegistryError::InvalidThreshold {
                m: threshold.m,
                n: threshold.n,
            });
        }
        let deadline = deadline.unwrap_or(now + self.config.submission_window_secs);

        let mut committees = self.committees.write().await;
        if committees.contains_key(&job) {
            return Err(RegistryError::CommitteeExists);
        }
        let eligibility = self
            .stake
            .active_ticket_balances()
            .await
            .map_err(|e| RegistryError::StakeUnavailable(e.to_string()))?;
        let eligible = eligibility.len();
        committees.insert(job, Committee::new(job, seed, threshold, deadline, eligibility));
        drop(committees);

        info!(
            job = %job,
            threshold = %threshold,
            deadline = deadline,
            eligible = eligible,
            "📋 Committee opened for sortition"
        );
        self.record(
            AccountId::zero(),
            RegistryEventKind::CommitteeOpened {
                job,
                threshold,
                deadline,
            },
        )
        .await;
        Ok(())
    }

    /// Submit a sortition ticket. Tickets are zero-indexed against the
    /// balance frozen when the round opened; the score binds the ticket to
    /// the job seed.
    pub async fn submit_ticket(
        &self,
        operator: AccountId,
        job: JobId,
        ticket_number: u64,
        now: i64,
    ) -> Result<Digest> {
        let mut committees = self.committees.write().await;
        let committee = committees
            .get_mut(&job)
            .ok_or(RegistryError::CommitteeNotFound)?;
        if committee.stage != CommitteeStage::Requested {
            return Err(RegistryError::CommitteeClosed);
        }
        if now >= committee.submission_deadline {
            return Err(RegistryError::SubmissionWindowClosed {
                deadline: committee.submission_deadline,
                now,
            });
        }
        if !self.tree.read().await.contains(&operator) {
            return Err(RegistryError::NotEligible);
        }
        if committee.has_submitted(&operator) {
            return Err(RegistryError::AlreadySubmitted);
        }

        let balance = committee
            .eligible_balance(&operator)
            .map(|b| b.to_units())
            .ok_or(RegistryError::NotEligible)?;
        if ticket_number >= balance {
            return Err(RegistryError::TicketOutOfRange {
                ticket: ticket_number,
                balance,
            });
        }

        let score = sortition::ticket_score(&committee.seed, &operator, ticket_number);
        committee.submissions.push(TicketSubmission {
            operator,
            ticket_number,
            score,
        });
        drop(committees);

        debug!(
            operator = %operator,
            job = %job,
            ticket = ticket_number,
            score = %score,
            "🎟️ Sortition ticket submitted"
        );
        self.record(
            operator,
            RegistryEventKind::TicketSubmitted {
                job,
                ticket_number,
                score,
            },
        )
        .await;
        Ok(score)
    }

    /// Close sortition once the window has elapsed. The top scores fill up
    /// to `n` seats; at least `m` submissions must have arrived, otherwise
    /// the committee commits to `Failed` and the shortfall is reported in
    /// the outcome, not as an error.
    pub async fn finalize_committee(&self, job: JobId, now: i64) -> Result<FinalizeOutcome> {
        let mut committees = self.committees.write().await;
        let committee = committees
            .get_mut(&job)
            .ok_or(RegistryError::CommitteeNotFound)?;
        if committee.stage != CommitteeStage::Requested {
            return Err(RegistryError::CommitteeClosed);
        }
        if now < committee.submission_deadline {
            return Err(RegistryError::SubmissionWindowOpen {
                deadline: committee.submission_deadline,
                now,
            });
        }

        let quorum = committee.threshold.m;
        let seats = committee.threshold.n;
        let submitted = committee.submissions.len();
        if submitted < quorum as usize {
            committee.stage = CommitteeStage::Failed;
            drop(committees);

            warn!(
                job = %job,
                submitted = submitted,
                required = quorum,
                "⚠️ Sortition quorum not reached"
            );
            self.record(
                AccountId::zero(),
                RegistryEventKind::CommitteeFailed {
                    job,
                    submitted,
                    required: quorum,
                },
            )
            .await;
            return Ok(FinalizeOutcome::QuorumNotReached {
                submitted,
                required: quorum,
            });
        }

        let selected = sortition::select_top(&committee.submissions, seats as usize);
        committee.members = selected
            .iter()
            .map(|s| CommitteeMember {
                operator: s.operator,
                ticket_number: s.ticket_number,
                score: s.score,
                status: MemberStatus::Active,
            })
            .collect();
        committee.stage = CommitteeStage::Finalized;
        let members: Vec<AccountId> = committee.members.iter().map(|m| m.operator).collect();
        drop(committees);

        info!(
            job = %job,
            members = members.len(),
            "🏛️ Committee finalized"
        );
        self.record(
            AccountId::zero(),
            RegistryEventKind::CommitteeFinalized {
                job,
                members: members.clone(),
            },
        )
        .await;
        Ok(FinalizeOutcome::Finalized { members })
    }

    /// Publish the committee public key. Only an active member of the
    /// finalized committee may publish, and only once.
    pub async fn publish_committee_key(
        &self,
        publisher: AccountId,
        job: JobId,
        key: Vec<u8>,
    ) -> Result<()> {
        if key.is_empty() {
            return Err(RegistryError::InvalidPublicKey);
        }

        let mut committees = self.committees.write().await;
        let committee = committees
            .get_mut(&job)
            .ok_or(RegistryError::CommitteeNotFound)?;
        if committee.stage != CommitteeStage::Finalized {
            return Err(RegistryError::CommitteeNotFinalized);
        }
        if !committee.is_active_member(&publisher) {
            return Err(RegistryError::NotCommitteeMember);
        }
        if committee.public_key.is_some() {
            return Err(RegistryError::KeyAlreadyPublished);
        }
        committee.public_key = Some(key);
        drop(committees);

        info!(job = %job, publisher = %publisher, "🔑 Committee public key published");
        self.record(publisher, RegistryEventKind::KeyPublished { job })
            .await;
        Ok(())
    }

    /// Mark a committee member expelled and report the surviving head count
    /// against the threshold. Expelling an already expelled member is a
    /// no-op returning the unchanged viability.
    pub async fn expel(&self, job: JobId, operator: AccountId) -> Result<CommitteeViability> {
        let mut committees = self.committees.write().await;
        let committee = committees
            .get_mut(&job)
            .ok_or(RegistryError::CommitteeNotFound)?;
        if committee.stage == CommitteeStage::Requested {
            return Err(RegistryError::CommitteeNotFinalized);
        }
        let member = committee
            .members
            .iter_mut()
            .find(|m| m.operator == operator)
            .ok_or(RegistryError::NotCommitteeMember)?;

        if member.status == MemberStatus::Expelled {
            let viability = committee.viability();
            debug!(job = %job, operator = %operator, "Member already expelled");
            return Ok(viability);
        }

        member.status = MemberStatus::Expelled;
        let viability = committee.viability();
        drop(committees);

        warn!(
            job = %job,
            operator = %operator,
            active = viability.active_count,
            threshold_m = viability.threshold_m,
            "⛔ Committee member expelled"
        );
        self.record(
            operator,
            RegistryEventKind::MemberExpelled {
                job,
                active_count: viability.active_count,
                threshold_m: viability.threshold_m,
            },
        )
        .await;
        Ok(viability)
    }

    pub async fn committee(&self, job: JobId) -> Option<Committee> {
        self.committees.read().await.get(&job).cloned()
    }

    pub async fn committee_viability(&self, job: JobId) -> Result<CommitteeViability> {
        let committees = self.committees.read().await;
        let committee = committees.get(&job).ok_or(RegistryError::CommitteeNotFound)?;
        Ok(committee.viability())
    }

    /// Active members of a finalized committee. Empty when the committee is
    /// missing or not finalized.
    pub async fn active_committee_nodes(&self, job: JobId) -> Vec<AccountId> {
        let committees = self.committees.read().await;
        match committees.get(&job) {
            Some(c) if c.stage == CommitteeStage::Finalized => c.active_members(),
            _ => Vec::new(),
        }
    }

    pub async fn is_active_committee_member(&self, job: JobId, operator: &AccountId) -> bool {
        let committees = self.committees.read().await;
        matches!(
            committees.get(&job),
            Some(c) if c.stage == CommitteeStage::Finalized && c.is_active_member(operator)
        )
    }

    /// Ever selected into the job's committee, expelled or not.
    pub async fn is_committee_member(&self, job: JobId, operator: &AccountId) -> bool {
        let committees = self.committees.read().await;
        matches!(
            committees.get(&job),
            Some(c) if c.member(operator).is_some()
        )
    }

    pub async fn committee_public_key(&self, job: JobId) -> Option<Vec<u8>> {
        let committees = self.committees.read().await;
        committees.get(&job).and_then(|c| c.public_key.clone())
    }

    pub async fn stats(&self) -> RegistryStats {
        // Drop the tree guard before touching committees; submit_ticket
        // nests the two locks in the opposite order.
        let (members, leaf_slots) = {
            let tree = self.tree.read().await;
            (tree.len(), tree.leaf_count())
        };
        let committees = self.committees.read().await;
        RegistryStats {
            members,
            leaf_slots,
            committees: committees.len(),
            finalized: committees
                .values()
                .filter(|c| c.stage == CommitteeStage::Finalized)
                .count(),
            failed: committees
                .values()
                .filter(|c| c.stage == CommitteeStage::Failed)
                .count(),
        }
    }

    pub async fn events(&self) -> Vec<RegistryEvent> {
        self.events.read().await.clone()
    }

    async fn record(&self, operator: AccountId, kind: RegistryEventKind) {
        let mut events = self.events.write().await;
        events.push(RegistryEvent::new(operator, kind));
    }
}

#[async_trait]
impl MembershipHook for MembershipRegistry {
    async fn insert_member(&self, operator: AccountId) -> anyhow::Result<()> {
        MembershipRegistry::add_member(self, operator).await?;
        Ok(())
    }

    async fn remove_member(
        &self,
        operator: AccountId,
        proof: &MembershipProof,
    ) -> anyhow::Result<()> {
        MembershipRegistry::remove_member(self, operator, proof).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubStake {
        balances: Vec<(AccountId, TokenAmount)>,
    }

    #[async_trait]
    impl StakeView for StubStake {
        async fn active_ticket_balances(&self) -> anyhow::Result<Vec<(AccountId, TokenAmount)>> {
            Ok(self.balances.clone())
        }
    }

    fn op(byte: u8) -> AccountId {
        AccountId::from_bytes([byte; 32])
    }

    fn threshold(m: u32, n: u32) -> Threshold {
        Threshold { m, n }
    }

    async fn registry_with_members(bytes: &[u8]) -> MembershipRegistry {
        let balances = bytes
            .iter()
            .map(|b| (op(*b), TokenAmount::from_units(1_000)))
            .collect();
        let registry = MembershipRegistry::new(
            Arc::new(StubStake { balances }),
            RegistryConfig::default(),
        );
        for b in bytes {
            registry.add_member(op(*b)).await.unwrap();
        }
        registry
    }

    #[tokio::test]
    async fn test_open_rejects_bad_threshold() {
        let registry = registry_with_members(&[1]).await;
        let seed = Digest::of(b"seed");

        assert!(matches!(
            registry
                .open_committee(JobId::new(1), seed, threshold(0, 3), None, 0)
                .await,
            Err(RegistryError::InvalidThreshold { .. })
        ));
        assert!(matches!(
            registry
                .open_committee(JobId::new(1), seed, threshold(4, 3), None, 0)
                .await,
            Err(RegistryError::InvalidThreshold { .. })
        ));

        registry
            .open_committee(JobId::new(1), seed, threshold(2, 3), None, 0)
            .await
            .unwrap();
        assert!(matches!(
            registry
                .open_committee(JobId::new(1), seed, threshold(2, 3), None, 0)
                .await,
            Err(RegistryError::CommitteeExists)
        ));
    }

    #[tokio::test]
    async fn test_sortition_selects_top_scores() {
        let registry = registry_with_members(&[1, 2, 3, 4, 5]).await;
        let job = JobId::new(7);
        let seed = Digest::of(b"job-7");
        registry
            .open_committee(job, seed, threshold(2, 3), Some(100), 0)
            .await
            .unwrap();

        for b in 1..=5u8 {
            registry
                .submit_ticket(op(b), job, u64::from(b) * 10, 50)
                .await
                .unwrap();
        }

        let outcome = registry.finalize_committee(job, 100).await.unwrap();
        let members = match outcome {
            FinalizeOutcome::Finalized { members } => members,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(members.len(), 3);

        // Selection matches an offline ranking of the same tickets
        let mut expected: Vec<(Digest, AccountId)> = (1..=5u8)
            .map(|b| {
                let operator = op(b);
                (
                    sortition::ticket_score(&seed, &operator, u64::from(b) * 10),
                    operator,
                )
            })
            .collect();
        expected.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        let expected: Vec<AccountId> = expected.into_iter().take(3).map(|(_, o)| o).collect();
        assert_eq!(members, expected);

        assert_eq!(registry.active_committee_nodes(job).await.len(), 3);
    }

    #[tokio::test]
    async fn test_submit_gating() {
        let registry = registry_with_members(&[1, 2]).await;
        let job = JobId::new(1);
        registry
            .open_committee(job, Digest::of(b"s"), threshold(1, 2), Some(100), 0)
            .await
            .unwrap();

        // Unknown job
        assert!(matches!(
            registry.submit_ticket(op(1), JobId::new(9), 1, 10).await,
            Err(RegistryError::CommitteeNotFound)
        ));
        // Not in the tree
        assert!(matches!(
            registry.submit_ticket(op(9), job, 1, 10).await,
            Err(RegistryError::NotEligible)
        ));
        // Tickets are zero-indexed, so the balance itself is out of range
        assert!(matches!(
            registry.submit_ticket(op(1), job, 1_001, 10).await,
            Err(RegistryError::TicketOutOfRange { ticket: 1_001, balance: 1_000 })
        ));
        assert!(matches!(
            registry.submit_ticket(op(1), job, 1_000, 10).await,
            Err(RegistryError::TicketOutOfRange { ticket: 1_000, .. })
        ));

        registry.submit_ticket(op(1), job, 500, 10).await.unwrap();
        assert!(matches!(
            registry.submit_ticket(op(1), job, 501, 11).await,
            Err(RegistryError::AlreadySubmitted)
        ));

        // Window closes at the deadline itself
        assert!(matches!(
            registry.submit_ticket(op(2), job, 1, 100).await,
            Err(RegistryError::SubmissionWindowClosed { deadline: 100, now: 100 })
        ));
    }

    #[tokio::test]
    async fn test_inactive_operator_cannot_submit() {
        // In the tree but absent from the stake view's active set
        let registry = MembershipRegistry::new(
            Arc::new(StubStake { balances: vec![] }),
            RegistryConfig::default(),
        );
        registry.add_member(op(1)).await.unwrap();
        let job = JobId::new(1);
        registry
            .open_committee(job, Digest::of(b"s"), threshold(1, 1), Some(100), 0)
            .await
            .unwrap();

        assert!(matches!(
            registry.submit_ticket(op(1), job, 1, 10).await,
            Err(RegistryError::NotEligible)
        ));
    }

    struct ShiftingStake {
        balances: RwLock<Vec<(AccountId, TokenAmount)>>,
    }

    #[async_trait]
    impl StakeView for ShiftingStake {
        async fn active_ticket_balances(&self) -> anyhow::Result<Vec<(AccountId, TokenAmount)>> {
            Ok(self.balances.read().await.clone())
        }
    }

    #[tokio::test]
    async fn test_eligibility_frozen_when_round_opens() {
        let stake = Arc::new(ShiftingStake {
            balances: RwLock::new(vec![(op(1), TokenAmount::from_units(1_000))]),
        });
        let registry = MembershipRegistry::new(stake.clone(), RegistryConfig::default());
        registry.add_member(op(1)).await.unwrap();
        registry.add_member(op(2)).await.unwrap();
        let job = JobId::new(1);
        registry
            .open_committee(job, Digest::of(b"s"), threshold(1, 2), Some(100), 0)
            .await
            .unwrap();

        // Balance changes after the round opened do not reach it
        *stake.balances.write().await = vec![
            (op(1), TokenAmount::from_units(10)),
            (op(2), TokenAmount::from_units(1_000)),
        ];

        registry.submit_ticket(op(1), job, 500, 10).await.unwrap();
        assert!(matches!(
            registry.submit_ticket(op(2), job, 500, 10).await,
            Err(RegistryError::NotEligible)
        ));
    }

    #[tokio::test]
    async fn test_finalize_requires_closed_window() {
        let registry = registry_with_members(&[1]).await;
        let job = JobId::new(1);
        registry
            .open_committee(job, Digest::of(b"s"), threshold(1, 1), Some(100), 0)
            .await
            .unwrap();
        // Ticket zero is the first valid ticket
        registry.submit_ticket(op(1), job, 0, 10).await.unwrap();

        assert!(matches!(
            registry.finalize_committee(job, 99).await,
            Err(RegistryError::SubmissionWindowOpen { deadline: 100, now: 99 })
        ));
        registry.finalize_committee(job, 100).await.unwrap();
    }

    #[tokio::test]
    async fn test_finalize_quorum_miss_commits_failed() {
        let registry = registry_with_members(&[1, 2]).await;
        let job = JobId::new(1);
        registry
            .open_committee(job, Digest::of(b"s"), threshold(2, 3), Some(100), 0)
            .await
            .unwrap();
        registry.submit_ticket(op(1), job, 1, 10).await.unwrap();

        let outcome = registry.finalize_committee(job, 101).await.unwrap();
        assert_eq!(
            outcome,
            FinalizeOutcome::QuorumNotReached {
                submitted: 1,
                required: 2
            }
        );

        let committee = registry.committee(job).await.unwrap();
        assert_eq!(committee.stage, CommitteeStage::Failed);
        assert!(registry.active_committee_nodes(job).await.is_empty());

        // Closed for both further submissions and a second finalize
        assert!(matches!(
            registry.submit_ticket(op(1), job, 2, 102).await,
            Err(RegistryError::CommitteeClosed)
        ));
        assert!(matches!(
            registry.finalize_committee(job, 102).await,
            Err(RegistryError::CommitteeClosed)
        ));
    }

    #[tokio::test]
    async fn test_finalize_partial_fill_meets_quorum() {
        let registry = registry_with_members(&[1, 2]).await;
        let job = JobId::new(1);
        registry
            .open_committee(job, Digest::of(b"s"), threshold(2, 3), Some(100), 0)
            .await
            .unwrap();
        registry.submit_ticket(op(1), job, 1, 10).await.unwrap();
        registry.submit_ticket(op(2), job, 1, 10).await.unwrap();

        // Two of three seats filled still satisfies m = 2
        let outcome = registry.finalize_committee(job, 101).await.unwrap();
        assert!(matches!(
            outcome,
            FinalizeOutcome::Finalized { ref members } if members.len() == 2
        ));
        let viability = registry.committee_viability(job).await.unwrap();
        assert!(viability.is_viable());
        assert_eq!(viability.active_count, 2);
    }

    #[tokio::test]
    async fn test_publish_key_member_gated_and_once() {
        let registry = registry_with_members(&[1, 2]).await;
        let job = JobId::new(1);
        registry
            .open_committee(job, Digest::of(b"s"), threshold(1, 2), Some(100), 0)
            .await
            .unwrap();
        registry.submit_ticket(op(1), job, 1, 10).await.unwrap();
        registry.submit_ticket(op(2), job, 1, 10).await.unwrap();

        // Before finalize
        assert!(matches!(
            registry.publish_committee_key(op(1), job, vec![1]).await,
            Err(RegistryError::CommitteeNotFinalized)
        ));

        registry.finalize_committee(job, 100).await.unwrap();

        assert!(matches!(
            registry.publish_committee_key(op(1), job, vec![]).await,
            Err(RegistryError::InvalidPublicKey)
        ));
        assert!(matches!(
            registry.publish_committee_key(op(9), job, vec![1]).await,
            Err(RegistryError::NotCommitteeMember)
        ));

        registry
            .publish_committee_key(op(1), job, vec![0xAB; 48])
            .await
            .unwrap();
        assert_eq!(
            registry.committee_public_key(job).await,
            Some(vec![0xAB; 48])
        );
        assert!(matches!(
            registry.publish_committee_key(op(2), job, vec![1]).await,
            Err(RegistryError::KeyAlreadyPublished)
        ));
    }

    #[tokio::test]
    async fn test_expel_is_idempotent() {
        let registry = registry_with_members(&[1, 2, 3]).await;
        let job = JobId::new(1);
        registry
            .open_committee(job, Digest::of(b"s"), threshold(2, 3), Some(100), 0)
            .await
            .unwrap();
        for b in 1..=3u8 {
            registry.submit_ticket(op(b), job, 1, 10).await.unwrap();
        }
        registry.finalize_committee(job, 100).await.unwrap();

        let v = registry.expel(job, op(1)).await.unwrap();
        assert_eq!(v.active_count, 2);
        assert!(v.is_viable());

        // Expelled members stay selected, just not active
        assert!(registry.is_committee_member(job, &op(1)).await);
        assert!(!registry.is_active_committee_member(job, &op(1)).await);

        // Second expulsion of the same member changes nothing
        let v = registry.expel(job, op(1)).await.unwrap();
        assert_eq!(v.active_count, 2);

        let v = registry.expel(job, op(2)).await.unwrap();
        assert_eq!(v.active_count, 1);
        assert!(!v.is_viable());

        assert!(matches!(
            registry.expel(job, op(9)).await,
            Err(RegistryError::NotCommitteeMember)
        ));

        // Only one expulsion event per member
        let expulsions = registry
            .events()
            .await
            .into_iter()
            .filter(|e| matches!(e.kind, RegistryEventKind::MemberExpelled { .. }))
            .count();
        assert_eq!(expulsions, 2);
    }

    #[tokio::test]
    async fn test_membership_hook_round_trip() {
        let registry = registry_with_members(&[]).await;
        let hook: &dyn MembershipHook = &registry;

        hook.insert_member(op(1)).await.unwrap();
        assert!(registry.is_member(&op(1)).await);

        let proof = registry.membership_proof(&op(1)).await.unwrap();
        hook.remove_member(op(1), &proof).await.unwrap();
        assert!(!registry.is_member(&op(1)).await);
    }

    /// stats reads the tree and the committee map; submit_ticket nests the
    /// same locks the other way around. Hammer both, plus tree writes, and
    /// require every task to finish.
    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_stats_and_submit_do_not_deadlock() {
        let registry = Arc::new(registry_with_members(&[1, 2, 3]).await);
        let job = JobId::new(1);
        registry
            .open_committee(job, Digest::of(b"s"), threshold(2, 3), Some(10_000), 0)
            .await
            .unwrap();

        let run = async {
            let mut handles = Vec::new();
            for b in [1u8, 2, 3] {
                let registry = registry.clone();
                handles.push(tokio::spawn(async move {
                    registry.submit_ticket(op(b), job, 500, 100).await.unwrap();
                }));
            }
            let reader = registry.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..200 {
                    let _ = reader.stats().await;
                }
            }));
            let grower = registry.clone();
            handles.push(tokio::spawn(async move {
                for b in 10u8..30 {
                    grower.add_member(op(b)).await.unwrap();
                }
            }));
            for handle in handles {
                handle.await.unwrap();
            }
        };
        tokio::time::timeout(std::time::Duration::from_secs(10), run)
            .await
            .expect("registry operations deadlocked");

        let stats = registry.stats().await;
        assert_eq!(stats.members, 23);
        assert_eq!(stats.committees, 1);
    }
}
