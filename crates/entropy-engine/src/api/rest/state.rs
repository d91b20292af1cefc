//! Application state for API handlers

use crate::config::ResetConfig;
use crate::container::ContainerControl;
use crate::push::EntropyPusher;
use crate::registry::ServiceRegistry;
use crate::reset::ResetCoordinator;
use crate::scenario::{RunningScenarioSet, ScenarioCatalog, ScenarioEngine};
use crate::storage::StateStore;
use std::sync::Arc;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Cached entropy settings
    pub store: Arc<dyn StateStore>,

    /// Registered services
    pub registry: Arc<ServiceRegistry>,

    /// Loaded scenarios
    pub scenarios: Arc<ScenarioCatalog>,

    /// Scenario runs in progress
    pub running: Arc<RunningScenarioSet>,

    /// Entropy application and scenario runs
    pub engine: Arc<ScenarioEngine>,

    /// Bulk reset
    pub reset: Arc<ResetCoordinator>,

    /// Container-control collaborator
    pub containers: Arc<dyn ContainerControl>,

    /// Engine version
    pub version: String,

    /// Engine start time
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    /// Wire the engine components around one store and one running set
    pub fn new(
        registry: ServiceRegistry,
        scenarios: ScenarioCatalog,
        store: Arc<dyn StateStore>,
        pusher: Arc<dyn EntropyPusher>,
        containers: Arc<dyn ContainerControl>,
        reset: ResetConfig,
    ) -> Self {
        let registry = Arc::new(registry);
        let running = Arc::new(RunningScenarioSet::new());

        let engine = Arc::new(ScenarioEngine::new(
            store.clone(),
            registry.clone(),
            pusher.clone(),
            containers.clone(),
            running.clone(),
        ));
        let reset = Arc::new(ResetCoordinator::new(
            store.clone(),
            registry.clone(),
            pusher,
            running.clone(),
            reset,
        ));

        Self {
            store,
            registry,
            scenarios: Arc::new(scenarios),
            running,
            engine,
            reset,
            containers,
            version: env!("CARGO_PKG_VERSION").to_string(),
            started_at: chrono::Utc::now(),
        }
    }

    /// Get uptime as a human-readable string
    pub fn uptime(&self) -> String {
        let duration = chrono::Utc::now() - self.started_at;
        let secs = duration.num_seconds();

        if secs < 60 {
            format!("{}s", secs)
        } else if secs < 3600 {
            format!("{}m {}s", secs / 60, secs % 60)
        } else if secs < 86400 {
            format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
        } else {
            format!("{}d {}h", secs / 86400, (secs % 86400) / 3600)
        }
    }
}
