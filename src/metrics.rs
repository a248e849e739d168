use prometheus::{IntCounter, Registry, TextEncoder};
use std::sync::Arc;

/// Prometheus counters shared with the subsystems that increment them.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    pub jobs_requested: IntCounter,
    pub jobs_completed: IntCounter,
    pub jobs_failed: IntCounter,
    pub slashes_executed: IntCounter,
    pub appeals_filed: IntCounter,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Arc::new(Registry::new());

        let jobs_requested =
            IntCounter::new("syndic_jobs_requested_total", "Total jobs requested").unwrap();
        let jobs_completed =
            IntCounter::new("syndic_jobs_completed_total", "Total jobs completed").unwrap();
        let jobs_failed =
            IntCounter::new("syndic_jobs_failed_total", "Total jobs failed").unwrap();
        let slashes_executed =
            IntCounter::new("syndic_slashes_executed_total", "Total slashes executed").unwrap();
        let appeals_filed =
            IntCounter::new("syndic_appeals_filed_total", "Total slash appeals filed").unwrap();

        registry
            .register(Box::new(jobs_requested.clone()))
            .unwrap();
        registry
            .register(Box::new(jobs_completed.clone()))
            .unwrap();
        registry.register(Box::new(jobs_failed.clone())).unwrap();
        registry
            .register(Box::new(slashes_executed.clone()))
            .unwrap();
        registry.register(Box::new(appeals_filed.clone())).unwrap();

        Self {
            registry,
            jobs_requested,
            jobs_completed,
            jobs_failed,
            slashes_executed,
            appeals_filed,
        }
    }

    pub fn gather(&self) -> String {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        encoder
            .encode_to_string(&metric_families)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_gather() {
        let m = Metrics::new();
        m.jobs_requested.inc();
        m.slashes_executed.inc_by(2);

        let text = m.gather();
        assert!(text.contains("syndic_jobs_requested_total"));
        assert!(text.contains("syndic_slashes_executed_total"));
        assert!(text.contains("syndic_appeals_filed_total"));
    }
}
