//! Outbound entropy pushes to protected services

use crate::error::{EngineError, EngineResult};
use async_trait::async_trait;
use entropy_types::{EntropyKind, ServiceDescriptor};
use std::time::Duration;

/// Delivers one entropy value to a service's control endpoint
#[async_trait]
pub trait EntropyPusher: Send + Sync {
    async fn push(
        &self,
        service: &ServiceDescriptor,
        kind: EntropyKind,
        value: f64,
    ) -> EngineResult<()>;
}

/// Pusher posting `{<payload key>: value}` over HTTP
#[derive(Debug, Clone)]
pub struct HttpEntropyPusher {
    client: reqwest::Client,
}

impl HttpEntropyPusher {
    /// Create a pusher whose requests are bounded by `timeout`
    pub fn new(timeout: Duration) -> EngineResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EngineError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl EntropyPusher for HttpEntropyPusher {
    async fn push(
        &self,
        service: &ServiceDescriptor,
        kind: EntropyKind,
        value: f64,
    ) -> EngineResult<()> {
        let url = service
            .endpoint_url(kind)
            .ok_or_else(|| EngineError::UnknownEntropyKind {
                service_id: service.id.clone(),
                kind: kind.to_string(),
            })?;

        let failed = |reason: String| EngineError::RemotePushFailed {
            service_id: service.id.clone(),
            url: url.clone(),
            reason,
        };

        let mut body = serde_json::Map::new();
        body.insert(kind.payload_key().to_string(), serde_json::json!(value));

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| failed(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failed(format!("HTTP {}", status)));
        }

        tracing::debug!(
            service_id = %service.id,
            kind = %kind,
            value,
            url = %url,
            "Entropy pushed"
        );
        Ok(())
    }
}
