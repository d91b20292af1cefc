//! Server setup and lifecycle management

use crate::api::create_router;
use crate::api::rest::state::AppState;
use crate::config::EngineConfig;
use crate::container::LoggingContainerControl;
use crate::error::{EngineError, EngineResult};
use crate::push::HttpEntropyPusher;
use crate::registry::ServiceRegistry;
use crate::scenario::ScenarioCatalog;
use crate::storage::InMemoryStateStore;
use entropy_interceptor::shutdown_signal;
use entropy_types::{load_scenarios, load_services};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Entropy engine server
pub struct Server {
    config: EngineConfig,
    state: AppState,
}

impl Server {
    /// Load definitions and wire the engine
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let services = load_services(&config.definitions.services_file)?;
        let scenarios = if config.definitions.scenarios_dir.is_dir() {
            load_scenarios(&config.definitions.scenarios_dir)?
        } else {
            tracing::warn!(
                dir = %config.definitions.scenarios_dir.display(),
                "Scenarios directory not found, starting without scenarios"
            );
            Vec::new()
        };

        tracing::info!(
            services = services.len(),
            scenarios = scenarios.len(),
            "Definitions loaded"
        );

        let containers =
            LoggingContainerControl::new(services.iter().map(|s| s.id.clone()));
        let state = AppState::new(
            ServiceRegistry::new(services)?,
            ScenarioCatalog::new(scenarios)?,
            Arc::new(InMemoryStateStore::new()),
            Arc::new(HttpEntropyPusher::new(config.push.timeout())?),
            Arc::new(containers),
            config.reset.clone(),
        );

        Ok(Self { config, state })
    }

    /// Application state, for embedding the engine
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Run the server
    pub async fn run(self) -> EngineResult<()> {
        let addr = self.config.server.listen_addr;

        // Every registered service starts from baseline settings
        self.state.reset.seed_baseline().await;

        let app = create_router(self.state.clone(), &self.config.server);
        let listener = TcpListener::bind(addr).await?;

        tracing::info!("Entropy engine listening on {}", addr);

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| EngineError::Server(e.to_string()))?;

        tracing::info!(
            abandoned_runs = self.state.running.len(),
            "Entropy engine shutting down"
        );

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_services_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = EngineConfig::default();
        config.definitions.services_file = dir.path().join("services.yml");

        assert!(matches!(
            Server::new(config),
            Err(EngineError::Definitions(_))
        ));
    }

    #[tokio::test]
    async fn test_loads_definitions() {
        let dir = tempfile::tempdir().unwrap();
        let services = dir.path().join("services.yml");
        std::fs::write(
            &services,
            r#"
services:
  - id: payment
    name: Payment API
    url: http://localhost:8003
    entropy_endpoints:
      latency: /entropy/latency
      errors: /entropy/errors
"#,
        )
        .unwrap();

        let mut config = EngineConfig::default();
        config.definitions.services_file = services;
        config.definitions.scenarios_dir = dir.path().join("scenarios");

        let server = Server::new(config).unwrap();
        assert_eq!(server.state().registry.len(), 1);
        assert!(server.state().scenarios.is_empty());
    }
}
