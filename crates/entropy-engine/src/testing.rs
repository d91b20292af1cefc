//! Recording fakes for the engine's outbound collaborators

use crate::container::ContainerControl;
use crate::error::{EngineError, EngineResult};
use crate::push::EntropyPusher;
use async_trait::async_trait;
use entropy_types::{ContainerAction, EntropyKind, ServiceDescriptor};
use parking_lot::Mutex;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub struct Push {
    pub service_id: String,
    pub kind: EntropyKind,
    pub value: f64,
    pub at: Instant,
}

/// Pusher that records every attempt and fails on demand
#[derive(Debug, Default)]
pub struct RecordingPusher {
    attempts: Mutex<Vec<Push>>,
    failures: Mutex<HashMap<String, u32>>,
}

impl RecordingPusher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `count` pushes to a service
    pub fn fail_next(&self, service_id: &str, count: u32) {
        self.failures.lock().insert(service_id.to_string(), count);
    }

    /// Fail every push to a service
    pub fn fail_always(&self, service_id: &str) {
        self.fail_next(service_id, u32::MAX);
    }

    pub fn attempts(&self) -> Vec<Push> {
        self.attempts.lock().clone()
    }

    pub fn attempts_for(&self, service_id: &str) -> Vec<Push> {
        self.attempts()
            .into_iter()
            .filter(|p| p.service_id == service_id)
            .collect()
    }
}

#[async_trait]
impl EntropyPusher for RecordingPusher {
    async fn push(
        &self,
        service: &ServiceDescriptor,
        kind: EntropyKind,
        value: f64,
    ) -> EngineResult<()> {
        self.attempts.lock().push(Push {
            service_id: service.id.clone(),
            kind,
            value,
            at: Instant::now(),
        });

        let mut failures = self.failures.lock();
        if let Some(remaining) = failures.get_mut(&service.id) {
            if *remaining > 0 {
                if *remaining != u32::MAX {
                    *remaining -= 1;
                }
                return Err(EngineError::RemotePushFailed {
                    service_id: service.id.clone(),
                    url: service.endpoint_url(kind).unwrap_or_default(),
                    reason: "connection refused".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Container control that records applied actions
#[derive(Debug, Default)]
pub struct RecordingContainers {
    applied: Mutex<Vec<(String, ContainerAction)>>,
}

impl RecordingContainers {
    pub fn applied(&self) -> Vec<(String, ContainerAction)> {
        self.applied.lock().clone()
    }
}

#[async_trait]
impl ContainerControl for RecordingContainers {
    async fn apply(
        &self,
        service_id: &str,
        action: ContainerAction,
        _params: &Map<String, Value>,
    ) -> EngineResult<()> {
        self.applied.lock().push((service_id.to_string(), action));
        Ok(())
    }
}

/// Services used across engine tests
pub fn services() -> Vec<ServiceDescriptor> {
    vec![
        ServiceDescriptor::new("payment", "Payment API", "http://payment:8002")
            .with_endpoint(EntropyKind::Latency, "/entropy/latency")
            .with_endpoint(EntropyKind::ErrorRate, "/entropy/errors")
            .with_endpoint(EntropyKind::Throughput, "/entropy/throughput"),
        ServiceDescriptor::new("checkout", "Checkout API", "http://checkout:8001")
            .with_endpoint(EntropyKind::Latency, "/entropy/latency")
            .with_endpoint(EntropyKind::ErrorRate, "/entropy/errors"),
    ]
}
