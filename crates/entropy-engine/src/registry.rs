//! Registry of the services the engine controls

use crate::error::{EngineError, EngineResult};
use entropy_types::{EntropyKind, ServiceDescriptor};
use std::collections::HashMap;

/// Immutable set of service descriptors, loaded once at startup
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    services: Vec<ServiceDescriptor>,
    index: HashMap<String, usize>,
}

impl ServiceRegistry {
    /// Build a registry, rejecting duplicate ids
    pub fn new(services: Vec<ServiceDescriptor>) -> EngineResult<Self> {
        let mut index = HashMap::with_capacity(services.len());
        for (position, service) in services.iter().enumerate() {
            if index.insert(service.id.clone(), position).is_some() {
                return Err(EngineError::Config(format!(
                    "duplicate service id: {}",
                    service.id
                )));
            }
        }
        Ok(Self { services, index })
    }

    /// Look up a service
    pub fn get(&self, service_id: &str) -> Option<&ServiceDescriptor> {
        self.index.get(service_id).map(|&i| &self.services[i])
    }

    /// Look up a service, failing with `ServiceNotFound`
    pub fn require(&self, service_id: &str) -> EngineResult<&ServiceDescriptor> {
        self.get(service_id)
            .ok_or_else(|| EngineError::ServiceNotFound(service_id.to_string()))
    }

    /// Look up a service and the control endpoint it exposes for a kind
    pub fn require_endpoint(
        &self,
        service_id: &str,
        kind: EntropyKind,
    ) -> EngineResult<&ServiceDescriptor> {
        let service = self.require(service_id)?;
        if service.endpoint(kind).is_none() {
            return Err(EngineError::UnknownEntropyKind {
                service_id: service_id.to_string(),
                kind: kind.to_string(),
            });
        }
        Ok(service)
    }

    /// All services in definition order
    pub fn all(&self) -> &[ServiceDescriptor] {
        &self.services
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}
