//! Container-control collaborator
//!
//! Container runtimes are driven through [`ContainerControl`]. The shipped
//! implementation only records the requested change in the log.

use crate::error::{EngineError, EngineResult};
use async_trait::async_trait;
use entropy_types::ContainerAction;
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Applies container-level actions to a service's container
#[async_trait]
pub trait ContainerControl: Send + Sync {
    async fn apply(
        &self,
        service_id: &str,
        action: ContainerAction,
        params: &Map<String, Value>,
    ) -> EngineResult<()>;
}

/// Container control that logs each action against a known set of containers
#[derive(Debug, Clone, Default)]
pub struct LoggingContainerControl {
    containers: HashSet<String>,
}

impl LoggingContainerControl {
    /// Create a control aware of the given container names
    pub fn new<I, S>(containers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            containers: containers.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl ContainerControl for LoggingContainerControl {
    async fn apply(
        &self,
        service_id: &str,
        action: ContainerAction,
        params: &Map<String, Value>,
    ) -> EngineResult<()> {
        if !self.containers.contains(service_id) {
            return Err(EngineError::ContainerNotFound(service_id.to_string()));
        }

        match action {
            ContainerAction::SetEnv => {
                for (key, value) in params {
                    tracing::info!(container = %service_id, key = %key, value = %value, "Container env set");
                }
            }
            ContainerAction::SetResources => {
                tracing::info!(
                    container = %service_id,
                    cpu = ?params.get("cpu"),
                    memory = ?params.get("memory"),
                    "Container resources updated"
                );
            }
            ContainerAction::DisconnectNetwork | ContainerAction::ConnectNetwork => {
                let network = params
                    .get("network")
                    .and_then(Value::as_str)
                    .unwrap_or("default");
                tracing::info!(
                    container = %service_id,
                    action = action.as_str(),
                    network = %network,
                    "Container network changed"
                );
            }
            ContainerAction::Stop | ContainerAction::Start => {
                tracing::info!(container = %service_id, action = action.as_str(), "Container lifecycle changed");
            }
        }
        Ok(())
    }
}
