//! Bulk reset of every service to baseline settings
//!
//! The reset runs in two phases. First every cached record is overwritten
//! with baseline settings, so nothing re-applies stale values. Then the
//! baseline value of every (service, kind) pair is pushed, with a bounded
//! number of attempts per pair. A pair that never succeeds is logged and
//! skipped; the reset as a whole always completes.

use crate::config::ResetConfig;
use crate::push::EntropyPusher;
use crate::registry::ServiceRegistry;
use crate::scenario::RunningScenarioSet;
use crate::storage::StateStore;
use entropy_types::{EntropyKind, EntropySettings, ServiceDescriptor};
use serde::Serialize;
use std::sync::Arc;

/// Outcome of pushing the baseline value for one (service, kind) pair
#[derive(Debug, Clone, Serialize)]
pub struct PairOutcome {
    pub service_id: String,
    pub kind: EntropyKind,
    pub attempts: u32,
    pub succeeded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Result of one bulk reset
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResetReport {
    /// Scenario runs dropped from the running set
    pub cleared_runs: usize,
    pub pairs: Vec<PairOutcome>,
}

impl ResetReport {
    pub fn succeeded(&self) -> usize {
        self.pairs.iter().filter(|p| p.succeeded).count()
    }

    pub fn failed(&self) -> usize {
        self.pairs.len() - self.succeeded()
    }

    pub fn is_converged(&self) -> bool {
        self.pairs.iter().all(|p| p.succeeded)
    }
}

/// Drives the two-phase bulk reset
pub struct ResetCoordinator {
    store: Arc<dyn StateStore>,
    registry: Arc<ServiceRegistry>,
    pusher: Arc<dyn EntropyPusher>,
    running: Arc<RunningScenarioSet>,
    config: ResetConfig,
}

impl ResetCoordinator {
    pub fn new(
        store: Arc<dyn StateStore>,
        registry: Arc<ServiceRegistry>,
        pusher: Arc<dyn EntropyPusher>,
        running: Arc<RunningScenarioSet>,
        config: ResetConfig,
    ) -> Self {
        Self {
            store,
            registry,
            pusher,
            running,
            config,
        }
    }

    /// Write baseline settings for every registered service into the store
    pub async fn seed_baseline(&self) {
        for service in self.registry.all() {
            self.store
                .set(&service.id, EntropySettings::baseline())
                .await;
        }
    }

    /// Reset every service; never fails
    pub async fn reset(&self) -> ResetReport {
        let cleared_runs = self.running.clear();
        tracing::info!(
            services = self.registry.len(),
            cleared_runs,
            "Resetting all services to baseline"
        );

        self.seed_baseline().await;

        let mut pairs = Vec::new();
        for service in self.registry.all() {
            for &kind in service.entropy_endpoints.keys() {
                pairs.push(self.push_baseline(service, kind).await);
            }
        }

        let report = ResetReport {
            cleared_runs,
            pairs,
        };
        if report.is_converged() {
            tracing::info!(pairs = report.pairs.len(), "Reset complete");
        } else {
            tracing::warn!(
                succeeded = report.succeeded(),
                failed = report.failed(),
                "Reset complete with unreachable services"
            );
        }
        report
    }

    async fn push_baseline(&self, service: &ServiceDescriptor, kind: EntropyKind) -> PairOutcome {
        let service_id = service.id.as_str();
        let value = kind.baseline_value();
        let max_attempts = self.config.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=max_attempts {
            match self.pusher.push(service, kind, value).await {
                Ok(()) => {
                    tracing::info!(service_id = %service_id, kind = %kind, attempt, "Baseline restored");
                    return PairOutcome {
                        service_id: service_id.to_string(),
                        kind,
                        attempts: attempt,
                        succeeded: true,
                        last_error: None,
                    };
                }
                Err(e) => {
                    if attempt < max_attempts {
                        tracing::warn!(
                            service_id = %service_id,
                            kind = %kind,
                            attempt,
                            error = %e,
                            "Baseline push failed, retrying"
                        );
                        tokio::time::sleep(self.config.retry_delay()).await;
                    } else {
                        tracing::error!(
                            service_id = %service_id,
                            kind = %kind,
                            attempts = attempt,
                            error = %e,
                            "Giving up on baseline push"
                        );
                    }
                    last_error = Some(e.to_string());
                }
            }
        }

        PairOutcome {
            service_id: service_id.to_string(),
            kind,
            attempts: max_attempts,
            succeeded: false,
            last_error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStateStore;
    use crate::testing::{services, RecordingPusher};
    use entropy_types::EntropyPatch;
    use std::time::Duration;
    use tokio::time::Instant;

    fn coordinator(
        store: Arc<InMemoryStateStore>,
        pusher: Arc<RecordingPusher>,
        running: Arc<RunningScenarioSet>,
    ) -> ResetCoordinator {
        ResetCoordinator::new(
            store,
            Arc::new(ServiceRegistry::new(services()).unwrap()),
            pusher,
            running,
            ResetConfig::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_converges_despite_failures() {
        let store = Arc::new(InMemoryStateStore::new());
        let pusher = Arc::new(RecordingPusher::new());
        let running = Arc::new(RunningScenarioSet::new());
        running.register("payment-degradation");

        let patch = EntropyPatch::single(EntropyKind::Latency, 2.0)
            .set(EntropyKind::Throughput, 0.1);
        store.merge("payment", &patch).await;
        store.merge("checkout", &patch).await;
        pusher.fail_always("payment");

        let report = coordinator(store.clone(), pusher.clone(), running.clone())
            .reset()
            .await;

        assert!(store.get("payment").await.is_baseline());
        assert!(store.get("checkout").await.is_baseline());
        assert!(running.is_empty());
        assert_eq!(report.cleared_runs, 1);

        // payment: three kinds, five attempts each; checkout: two kinds, one attempt each.
        assert_eq!(report.pairs.len(), 5);
        assert_eq!(report.failed(), 3);
        assert_eq!(report.succeeded(), 2);
        assert_eq!(pusher.attempts_for("payment").len(), 15);
        assert_eq!(pusher.attempts_for("checkout").len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_failure_is_retried() {
        let store = Arc::new(InMemoryStateStore::new());
        let pusher = Arc::new(RecordingPusher::new());
        pusher.fail_next("checkout", 2);

        let started = Instant::now();
        let report = coordinator(store, pusher.clone(), Arc::new(RunningScenarioSet::new()))
            .reset()
            .await;

        assert!(report.is_converged());
        let first = report
            .pairs
            .iter()
            .find(|p| p.service_id == "checkout")
            .unwrap();
        assert_eq!(first.attempts, 3);
        assert_eq!(started.elapsed(), Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_pushes_baseline_value_per_kind() {
        let store = Arc::new(InMemoryStateStore::new());
        let pusher = Arc::new(RecordingPusher::new());

        coordinator(store, pusher.clone(), Arc::new(RunningScenarioSet::new()))
            .reset()
            .await;

        for push in pusher.attempts() {
            assert_eq!(push.value, push.kind.baseline_value());
        }
        let throughput = pusher
            .attempts()
            .into_iter()
            .find(|p| p.kind == EntropyKind::Throughput)
            .unwrap();
        assert_eq!(throughput.value, 1.0);
    }

    #[tokio::test]
    async fn test_seed_baseline_initializes_every_service() {
        let store = Arc::new(InMemoryStateStore::new());
        let coordinator = coordinator(
            store.clone(),
            Arc::new(RecordingPusher::new()),
            Arc::new(RunningScenarioSet::new()),
        );

        coordinator.seed_baseline().await;
        assert!(store.lookup("payment").await.is_some());
        assert!(store.lookup("checkout").await.is_some());
    }
}
