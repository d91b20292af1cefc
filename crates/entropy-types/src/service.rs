//! Service descriptors
//!
//! A descriptor tells the control plane where a service lives and which path
//! accepts updates for each entropy kind. Descriptors are immutable once loaded.

use crate::EntropyKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A service that can have entropy injected into it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Unique service identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Base URL, e.g. `http://payment-api:8000`
    #[serde(rename = "url", alias = "base_url")]
    pub base_url: String,

    /// Entropy-control path per kind
    #[serde(default)]
    pub entropy_endpoints: BTreeMap<EntropyKind, String>,
}

impl ServiceDescriptor {
    /// Create a descriptor with no entropy endpoints
    pub fn new(id: impl Into<String>, name: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            base_url: base_url.into(),
            entropy_endpoints: BTreeMap::new(),
        }
    }

    /// Register the control path for a kind
    pub fn with_endpoint(mut self, kind: EntropyKind, path: impl Into<String>) -> Self {
        self.entropy_endpoints.insert(kind, path.into());
        self
    }

    /// Control path for a kind, if the service accepts it
    pub fn endpoint(&self, kind: EntropyKind) -> Option<&str> {
        self.entropy_endpoints.get(&kind).map(String::as_str)
    }

    /// Absolute URL of the control endpoint for a kind
    pub fn endpoint_url(&self, kind: EntropyKind) -> Option<String> {
        self.endpoint(kind).map(|path| {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_url_joins_cleanly() {
        let service = ServiceDescriptor::new("payment-api", "Payment API", "http://payment:8000/")
            .with_endpoint(EntropyKind::Latency, "/entropy/latency");

        assert_eq!(
            service.endpoint_url(EntropyKind::Latency).as_deref(),
            Some("http://payment:8000/entropy/latency")
        );
        assert!(service.endpoint_url(EntropyKind::Throughput).is_none());
    }

    #[test]
    fn test_descriptor_serializes_url_field() {
        let service = ServiceDescriptor::new("auth-api", "Auth API", "http://auth:8000")
            .with_endpoint(EntropyKind::ErrorRate, "/entropy/errors");
        let json = serde_json::to_value(&service).unwrap();
        assert_eq!(json["url"], "http://auth:8000");
        assert_eq!(json["entropy_endpoints"]["errors"], "/entropy/errors");
    }
}
