use crate::config::EngineConfig;
use crate::metrics::Metrics;
use anyhow::Result;
use std::sync::Arc;
use syndic_jobs::{JobManager, JobStats};
use syndic_registry::{MembershipRegistry, RegistryStats};
use syndic_slashing::{FaultAdjudicator, SlashStats};
use syndic_stake::{
    LedgerStats, LedgerStore, MemoryLedgerStore, MemoryToken, StakeLedger, TokenTransfer,
};
use tracing::info;

/// The full coordination stack, wired and ready.
///
/// Construction order matters: the registry needs the ledger for ticket
/// balances, the ledger calls back into the registry on registration, the
/// adjudicator slashes through the ledger and expels through the registry,
/// and the job manager consumes slashed tallies and receives quorum-collapse
/// notifications from the adjudicator.
pub struct SyndicEngine {
    pub token: Arc<dyn TokenTransfer>,
    pub ledger: Arc<StakeLedger>,
    pub registry: Arc<MembershipRegistry>,
    pub adjudicator: Arc<FaultAdjudicator>,
    pub jobs: Arc<JobManager>,
    metrics: Option<Metrics>,
}

impl SyndicEngine {
    /// In-memory engine for tests and local runs.
    pub async fn new(config: EngineConfig) -> Result<Self> {
        Self::with_backends(
            config,
            Arc::new(MemoryToken::new()),
            Arc::new(MemoryLedgerStore::new()),
            None,
        )
        .await
    }

    /// In-memory engine with a Prometheus registry attached.
    pub async fn with_metrics(config: EngineConfig) -> Result<Self> {
        Self::with_backends(
            config,
            Arc::new(MemoryToken::new()),
            Arc::new(MemoryLedgerStore::new()),
            Some(Metrics::new()),
        )
        .await
    }

    /// Wire the stack over caller-provided token and store backends.
    pub async fn with_backends(
        config: EngineConfig,
        token: Arc<dyn TokenTransfer>,
        store: Arc<dyn LedgerStore>,
        metrics: Option<Metrics>,
    ) -> Result<Self> {
        info!("Initializing syndic engine...");

        let ledger = Arc::new(StakeLedger::new(store, token.clone(), config.ledger));
        let registry = Arc::new(MembershipRegistry::new(ledger.clone(), config.registry));
        ledger.set_membership_hook(registry.clone()).await;

        let mut adjudicator =
            FaultAdjudicator::new(ledger.clone(), registry.clone(), config.slashing);
        if let Some(m) = &metrics {
            adjudicator.set_metrics(
                Some(Arc::new(m.slashes_executed.clone())),
                Some(Arc::new(m.appeals_filed.clone())),
            );
        }
        let adjudicator = Arc::new(adjudicator);

        let mut jobs = JobManager::new(
            config.jobs,
            token.clone(),
            ledger.clone(),
            registry.clone(),
            adjudicator.clone(),
        );
        if let Some(m) = &metrics {
            jobs.set_metrics(
                Some(Arc::new(m.jobs_requested.clone())),
                Some(Arc::new(m.jobs_completed.clone())),
                Some(Arc::new(m.jobs_failed.clone())),
            );
        }
        let jobs = Arc::new(jobs);
        adjudicator.set_job_sink(jobs.clone()).await;

        info!("Syndic engine initialized");
        Ok(Self {
            token,
            ledger,
            registry,
            adjudicator,
            jobs,
            metrics,
        })
    }

    pub fn metrics(&self) -> Option<&Metrics> {
        self.metrics.as_ref()
    }

    /// Prometheus exposition text, empty when metrics are off.
    pub fn metrics_text(&self) -> String {
        self.metrics.as_ref().map(|m| m.gather()).unwrap_or_default()
    }

    pub async fn stats(&self) -> Result<EngineStats> {
        Ok(EngineStats {
            ledger: self.ledger.stats().await?,
            registry: self.registry.stats().await,
            slashing: self.adjudicator.stats().await,
            jobs: self.jobs.stats().await,
        })
    }
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EngineStats {
    pub ledger: LedgerStats,
    pub registry: RegistryStats,
    pub slashing: SlashStats,
    pub jobs: JobStats,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_engine_wires_clean_stack() {
        let engine = SyndicEngine::new(EngineConfig::default()).await.unwrap();

        let stats = engine.stats().await.unwrap();
        assert_eq!(stats.ledger.operators, 0);
        assert_eq!(stats.registry.members, 0);
        assert_eq!(stats.slashing.proposals, 0);
        assert_eq!(stats.jobs.jobs, 0);
        assert!(engine.metrics_text().is_empty());
    }

    #[tokio::test]
    async fn test_engine_exposes_metrics() {
        let engine = SyndicEngine::with_metrics(EngineConfig::default())
            .await
            .unwrap();

        let text = engine.metrics_text();
        assert!(text.contains("syndic_jobs_requested_total"));
    }
}
