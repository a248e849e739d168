use async_trait::async_trait;
use std::sync::Arc;
use syndic::{EngineConfig, Metrics, SyndicEngine};
use syndic_jobs::{DecryptionVerifier, JobError, JobStage, JobVerifiers, ProgramVerifier};
use syndic_registry::FinalizeOutcome;
use syndic_slashing::{FaultAttestation, FaultProofVerifier, ProofKind, SlashError};
use syndic_stake::{MemoryLedgerStore, MemoryToken, StakeError, TokenTransfer};
use syndic_types::{
    AccountId, Digest, FaultReason, JobFailureReason, JobId, Keypair, Threshold, TokenAmount,
};

#[tokio::test]
async fn test_full_job_lifecycle_conserves_funds() {
    let h = harness(3).await;
    let ops: Vec<AccountId> = h.operators.iter().map(|k| k.account_id()).collect();

    // 3 operators hold 1000 bond + 1000 tickets each in custody
    assert_eq!(h.token.vault_balance().await, TokenAmount::from_units(6_000));

    let job = h
        .engine
        .jobs
        .request_job(
            h.requester,
            Threshold { m: 2, n: 3 },
            Digest::of(b"beacon-42"),
            accept_all(),
            0,
        )
        .await
        .unwrap();
    assert_eq!(h.token.vault_balance().await, TokenAmount::from_units(7_600));

    for keypair in &h.operators {
        h.engine
            .registry
            .submit_ticket(keypair.account_id(), job, 400, 100)
            .await
            .unwrap();
    }
    let outcome = h.engine.jobs.finalize_committee(job, 3_600).await.unwrap();
    assert!(matches!(outcome, FinalizeOutcome::Finalized { .. }));

    h.engine
        .jobs
        .publish_key(ops[0], job, vec![0xAB; 48], 4_000)
        .await
        .unwrap();
    assert!(h.engine.registry.committee_public_key(job).await.is_some());

    h.engine.jobs.activate(h.requester, job, 5_000).await.unwrap();
    h.engine
        .jobs
        .publish_ciphertext(ops[1], job, b"ciphertext", b"proof", 6_000)
        .await
        .unwrap();
    h.engine
        .jobs
        .publish_plaintext(ops[2], job, b"plaintext", b"proof", 7_000)
        .await
        .unwrap();

    let record = h.engine.jobs.job(job).await.unwrap();
    assert_eq!(record.stage, JobStage::Complete);

    // Fee 1600 at full completion: 5% protocol plus crumbs, rest split 3 ways
    for op in &ops {
        assert_eq!(
            h.engine.jobs.claim_node_reward(*op, job).await.unwrap(),
            TokenAmount::from_units(506)
        );
    }
    assert!(matches!(
        h.engine.jobs.claim_requester_refund(h.requester, job).await,
        Err(JobError::NothingToClaim)
    ));
    assert_eq!(
        h.engine.jobs.withdraw_protocol_fees(governance()).await.unwrap(),
        TokenAmount::from_units(82)
    );

    // Custody back to exactly the staked funds
    assert_eq!(h.token.vault_balance().await, TokenAmount::from_units(6_000));
    for op in &ops {
        assert_eq!(
            h.token.balance_of(*op).await.unwrap(),
            TokenAmount::from_units(10_000 - 2_000 + 506)
        );
    }
    assert_eq!(
        h.token.balance_of(h.requester).await.unwrap(),
        TokenAmount::from_units(50_000 - 1_600)
    );
    assert_eq!(
        h.token
            .balance_of(AccountId::from_bytes(TREASURY))
            .await
            .unwrap(),
        TokenAmount::from_units(82)
    );

    let metrics = h.engine.metrics().unwrap();
    assert_eq!(metrics.jobs_requested.get(), 1);
    assert_eq!(metrics.jobs_completed.get(), 1);
    assert_eq!(metrics.jobs_failed.get(), 0);
}

#[tokio::test]
async fn test_quorum_collapse_slashes_fund_failed_job() {
    let h = harness(3).await;
    let job = finalized_job(&h, 2).await;

    h.engine
        .adjudicator
        .set_verifier(ProofKind::KeyGeneration, Arc::new(RejectProofs))
        .await;

    // Two members submit key-generation material whose proofs fail
    // verification; each accusation slashes 500 license and expels.
    for index in 0..2 {
        let accused = &h.operators[index];
        let attestation = FaultAttestation::signed(
            accused,
            1,
            job,
            ProofKind::KeyGeneration,
            b"bad-share",
            b"inputs",
        );
        h.engine
            .adjudicator
            .propose_slash(
                h.requester,
                accused.account_id(),
                &accused.public_key(),
                job,
                FaultReason::KeyGenFault,
                &attestation,
                b"bad-share",
                b"inputs",
                4_000 + index as i64,
            )
            .await
            .unwrap();
    }

    // The second expulsion left 1 < m=2 active members; the adjudicator
    // failed the job through its sink and settlement ran.
    let record = h.engine.jobs.job(job).await.unwrap();
    assert_eq!(record.stage, JobStage::Failed);
    assert_eq!(
        record.failure,
        Some(JobFailureReason::CommitteeBelowQuorum(FaultReason::KeyGenFault))
    );

    // 10% work done at CommitteeFinalized. Slashed 1000 routes half to the
    // survivor and half to the requester.
    let survivor = h.operators[2].account_id();
    assert_eq!(
        h.engine
            .jobs
            .claim_requester_refund(h.requester, job)
            .await
            .unwrap(),
        TokenAmount::from_units(1_940)
    );
    assert_eq!(
        h.engine.jobs.claim_node_reward(survivor, job).await.unwrap(),
        TokenAmount::from_units(652)
    );
    assert_eq!(
        h.engine.jobs.withdraw_protocol_fees(governance()).await.unwrap(),
        TokenAmount::from_units(8)
    );

    // Slashed bonds left custody through settlement, nothing else did:
    // 6000 staked + 1600 escrow - 2600 paid out = 5000, matching the
    // remaining bonds (500 + 500 + 1000) and tickets (3000).
    assert_eq!(h.token.vault_balance().await, TokenAmount::from_units(5_000));
    let (ticket_pool, license_pool) = h.engine.ledger.slashed_funds().await.unwrap();
    assert_eq!(ticket_pool, TokenAmount::ZERO);
    assert_eq!(license_pool, TokenAmount::ZERO);

    // Both slashed operators are banned and no longer active
    for keypair in &h.operators[..2] {
        assert!(h.engine.ledger.is_banned(keypair.account_id()).await);
    }

    let metrics = h.engine.metrics().unwrap();
    assert_eq!(metrics.slashes_executed.get(), 2);
    assert_eq!(metrics.jobs_failed.get(), 1);
}

#[tokio::test]
async fn test_evidence_slash_appeal_then_job_completes() {
    let h = harness(3).await;
    let job = finalized_job(&h, 2).await;
    let accused = h.operators[0].account_id();

    // Governance tightens the unavailability appeal window so it closes
    // inside this job's timeline.
    let mut policy = h
        .engine
        .adjudicator
        .policy(FaultReason::Unavailability)
        .await
        .unwrap();
    policy.appeal_window_secs = 600;
    h.engine
        .adjudicator
        .set_policy(governance(), policy)
        .await
        .unwrap();

    // First accusation is appealed and upheld: void, stake untouched.
    let first = h
        .engine
        .adjudicator
        .propose_slash_evidence(
            governance(),
            accused,
            Some(job),
            FaultReason::Unavailability,
            b"missed-heartbeats",
            3_700,
        )
        .await
        .unwrap();
    h.engine
        .adjudicator
        .file_appeal(accused, first, b"was-online", 3_710)
        .await
        .unwrap();
    h.engine
        .adjudicator
        .resolve_appeal(governance(), first, true, b"uptime-verified")
        .await
        .unwrap();
    assert!(matches!(
        h.engine.adjudicator.execute_slash(first, 3_720).await,
        Err(SlashError::AppealUpheld)
    ));
    let account = h.engine.ledger.account(accused).await.unwrap().unwrap();
    assert_eq!(account.license_bond, TokenAmount::from_units(1_000));
    assert_eq!(account.ticket_balance, TokenAmount::from_units(1_000));

    // Second accusation sticks: the appeal is rejected and the slash
    // executes once the window lapses.
    let second = h
        .engine
        .adjudicator
        .propose_slash_evidence(
            governance(),
            accused,
            Some(job),
            FaultReason::Unavailability,
            b"missed-heartbeats",
            3_800,
        )
        .await
        .unwrap();
    h.engine
        .adjudicator
        .file_appeal(accused, second, b"was-online", 3_810)
        .await
        .unwrap();
    h.engine
        .adjudicator
        .resolve_appeal(governance(), second, false, b"logs-confirm-outage")
        .await
        .unwrap();

    // Rejection puts the proposal back on the original clock
    assert!(matches!(
        h.engine.adjudicator.execute_slash(second, 3_830).await,
        Err(SlashError::AppealWindowActive { executable_at: 4_400, now: 3_830 })
    ));
    let (ticket, license) = h
        .engine
        .adjudicator
        .execute_slash(second, 4_400)
        .await
        .unwrap();
    assert_eq!(ticket, TokenAmount::from_units(50));
    assert_eq!(license, TokenAmount::from_units(200));

    // Unavailability does not ban, but the bond fell below the license
    // floor, so the operator drops out of future sortition.
    assert!(!h.engine.ledger.is_banned(accused).await);
    assert!(!h.engine.ledger.is_active(accused).await);

    // Committee is still viable at 2 of 3; the job completes without the
    // expelled member and the slashed 250 routes through settlement.
    let ops: Vec<AccountId> = h.operators.iter().map(|k| k.account_id()).collect();
    h.engine
        .jobs
        .publish_key(ops[1], job, vec![0xAB; 48], 5_000)
        .await
        .unwrap();
    h.engine.jobs.activate(h.requester, job, 5_500).await.unwrap();
    h.engine
        .jobs
        .publish_ciphertext(ops[1], job, b"ciphertext", b"proof", 6_000)
        .await
        .unwrap();
    assert!(matches!(
        h.engine
            .jobs
            .publish_plaintext(ops[0], job, b"plaintext", b"proof", 6_500)
            .await,
        Err(JobError::Registry(_))
    ));
    h.engine
        .jobs
        .publish_plaintext(ops[2], job, b"plaintext", b"proof", 6_500)
        .await
        .unwrap();

    // Success split of 1600 fee + 250 slashed: 791 per active node, 268
    // protocol (80 fee cut + 188 slashed remainder), no refund.
    let settlement = h.engine.jobs.settlement(job).await.unwrap();
    assert_eq!(settlement.work_bps, 10_000);
    assert_eq!(settlement.requester_refund, TokenAmount::ZERO);
    assert_eq!(settlement.node_shares.len(), 2);
    assert_eq!(settlement.nodes_total(), TokenAmount::from_units(1_582));
    assert_eq!(settlement.protocol_fees, TokenAmount::from_units(268));
    assert_eq!(settlement.total(), TokenAmount::from_units(1_850));
    assert!(settlement.node_share(&ops[0]).is_none());
}

#[tokio::test]
async fn test_exit_queue_delay_and_partial_claims() {
    let mut config = base_config();
    config.ledger.exit_delay_secs = 600;
    let h = harness_with(1, config).await;
    let op = h.operators[0].account_id();

    let proof = h.engine.registry.membership_proof(&op).await.unwrap();
    h.engine.ledger.deregister(op, &proof, 0).await.unwrap();
    assert!(!h.engine.registry.is_member(&op).await);

    // Exit not ready before the delay
    assert!(matches!(
        h.engine
            .ledger
            .claim_exits(op, TokenAmount::MAX, TokenAmount::MAX, 599)
            .await,
        Err(StakeError::ExitNotReady { unlock_at: 600, now: 599 })
    ));

    // Re-registration is blocked while funds sit in the exit queue
    assert!(matches!(
        h.engine.ledger.register(op).await,
        Err(StakeError::ExitInProgress)
    ));

    // Partial claim, then the remainder
    let (ticket, license) = h
        .engine
        .ledger
        .claim_exits(op, TokenAmount::from_units(300), TokenAmount::MAX, 600)
        .await
        .unwrap();
    assert_eq!(ticket, TokenAmount::from_units(300));
    assert_eq!(license, TokenAmount::from_units(1_000));

    let (ticket, license) = h
        .engine
        .ledger
        .claim_exits(op, TokenAmount::MAX, TokenAmount::MAX, 700)
        .await
        .unwrap();
    assert_eq!(ticket, TokenAmount::from_units(700));
    assert_eq!(license, TokenAmount::ZERO);

    assert!(matches!(
        h.engine
            .ledger
            .claim_exits(op, TokenAmount::MAX, TokenAmount::MAX, 800)
            .await,
        Err(StakeError::NoExitPending)
    ));

    // Everything returned to the operator wallet
    assert_eq!(
        h.token.balance_of(op).await.unwrap(),
        TokenAmount::from_units(10_000)
    );
    assert_eq!(h.token.vault_balance().await, TokenAmount::ZERO);
}

#[tokio::test]
async fn test_sortition_is_deterministic_across_engines() {
    let a = harness(5).await;
    let b = harness(5).await;

    let seed = Digest::of(b"round-7-beacon");
    let job_a = request_with_seed(&a, seed).await;
    let job_b = request_with_seed(&b, seed).await;

    let mut scores_a = Vec::new();
    let mut scores_b = Vec::new();
    for (index, keypair) in a.operators.iter().enumerate() {
        let ticket = 100 + index as u64;
        scores_a.push(
            a.engine
                .registry
                .submit_ticket(keypair.account_id(), job_a, ticket, 100)
                .await
                .unwrap(),
        );
        scores_b.push(
            b.engine
                .registry
                .submit_ticket(b.operators[index].account_id(), job_b, ticket, 100)
                .await
                .unwrap(),
        );
    }
    assert_eq!(scores_a, scores_b);

    a.engine.jobs.finalize_committee(job_a, 3_600).await.unwrap();
    b.engine.jobs.finalize_committee(job_b, 3_600).await.unwrap();

    let committee_a = a.engine.registry.committee(job_a).await.unwrap();
    let committee_b = b.engine.registry.committee(job_b).await.unwrap();
    let members_a: Vec<AccountId> = committee_a.members.iter().map(|m| m.operator).collect();
    let members_b: Vec<AccountId> = committee_b.members.iter().map(|m| m.operator).collect();
    assert_eq!(members_a.len(), 3);
    assert_eq!(members_a, members_b);

    // A different beacon reshuffles the scores
    let other = request_with_seed(&a, Digest::of(b"round-8-beacon")).await;
    let rescored = a
        .engine
        .registry
        .submit_ticket(a.operators[0].account_id(), other, 100, 100)
        .await
        .unwrap();
    assert_ne!(rescored, scores_a[0]);
}

#[tokio::test]
async fn test_committee_formation_timeout_refunds_requester() {
    let h = harness(3).await;
    let job = h
        .engine
        .jobs
        .request_job(
            h.requester,
            Threshold { m: 2, n: 3 },
            Digest::of(b"beacon"),
            accept_all(),
            0,
        )
        .await
        .unwrap();

    // Nobody submits; anyone may fail the job once the window lapses.
    assert!(matches!(
        h.engine.jobs.mark_failed(job, 3_599).await,
        Err(JobError::DeadlineNotReached { .. })
    ));
    h.engine.jobs.mark_failed(job, 3_600).await.unwrap();

    let record = h.engine.jobs.job(job).await.unwrap();
    assert_eq!(record.failure, Some(JobFailureReason::CommitteeFormationTimeout));

    assert_eq!(
        h.engine
            .jobs
            .claim_requester_refund(h.requester, job)
            .await
            .unwrap(),
        TokenAmount::from_units(1_600)
    );
    assert_eq!(
        h.token.balance_of(h.requester).await.unwrap(),
        TokenAmount::from_units(50_000)
    );
}

const GOVERNANCE: [u8; 32] = [0xA0; 32];
const TREASURY: [u8; 32] = [0xE0; 32];

fn governance() -> AccountId {
    AccountId::from_bytes(GOVERNANCE)
}

struct Harness {
    engine: SyndicEngine,
    token: Arc<MemoryToken>,
    operators: Vec<Keypair>,
    requester: AccountId,
}

fn base_config() -> EngineConfig {
    EngineConfig::default()
        .with_governance(vec![governance()])
        .with_slashers(vec![governance()])
        .with_treasury(AccountId::from_bytes(TREASURY))
}

async fn harness(operators: u8) -> Harness {
    harness_with(operators, base_config()).await
}

/// Engine over a shared in-memory token, with `operators` bonded (1000),
/// ticketed (1000), and registered, plus a funded requester.
async fn harness_with(operators: u8, config: EngineConfig) -> Harness {
    let _ = tracing_subscriber::fmt::try_init();

    let token = Arc::new(MemoryToken::new());
    let engine = SyndicEngine::with_backends(
        config,
        token.clone(),
        Arc::new(MemoryLedgerStore::new()),
        Some(Metrics::new()),
    )
    .await
    .unwrap();

    let mut keypairs = Vec::new();
    for i in 0..operators {
        let keypair = Keypair::from_seed([i + 10; 32]);
        let operator = keypair.account_id();
        token.mint(operator, TokenAmount::from_units(10_000)).await;
        engine
            .ledger
            .bond(operator, TokenAmount::from_units(1_000))
            .await
            .unwrap();
        engine
            .ledger
            .add_ticket_balance(operator, TokenAmount::from_units(1_000))
            .await
            .unwrap();
        engine.ledger.register(operator).await.unwrap();
        keypairs.push(keypair);
    }

    let requester = AccountId::from_bytes([0x99; 32]);
    token.mint(requester, TokenAmount::from_units(50_000)).await;

    Harness {
        engine,
        token,
        operators: keypairs,
        requester,
    }
}

/// Request a job at t=0, submit every operator's ticket, finalize at t=3600.
async fn finalized_job(h: &Harness, m: u32) -> JobId {
    let n = h.operators.len() as u32;
    let job = h
        .engine
        .jobs
        .request_job(
            h.requester,
            Threshold { m, n },
            Digest::of(b"beacon"),
            accept_all(),
            0,
        )
        .await
        .unwrap();
    for keypair in &h.operators {
        h.engine
            .registry
            .submit_ticket(keypair.account_id(), job, 500, 100)
            .await
            .unwrap();
    }
    let outcome = h.engine.jobs.finalize_committee(job, 3_600).await.unwrap();
    assert!(matches!(outcome, FinalizeOutcome::Finalized { .. }));
    job
}

async fn request_with_seed(h: &Harness, seed: Digest) -> JobId {
    h.engine
        .jobs
        .request_job(h.requester, Threshold { m: 2, n: 3 }, seed, accept_all(), 0)
        .await
        .unwrap()
}

struct AcceptAll;

#[async_trait]
impl ProgramVerifier for AcceptAll {
    async fn verify(&self, _job: JobId, _ciphertext: &[u8], _proof: &[u8]) -> anyhow::Result<bool> {
        Ok(true)
    }
}

#[async_trait]
impl DecryptionVerifier for AcceptAll {
    async fn verify(&self, _job: JobId, _plaintext: &[u8], _proof: &[u8]) -> anyhow::Result<bool> {
        Ok(true)
    }
}

fn accept_all() -> JobVerifiers {
    JobVerifiers {
        program: Arc::new(AcceptAll),
        decryption: Arc::new(AcceptAll),
    }
}

struct RejectProofs;

#[async_trait]
impl FaultProofVerifier for RejectProofs {
    async fn verify(&self, _proof: &[u8], _public_inputs: &[u8]) -> anyhow::Result<bool> {
        Ok(false)
    }
}
