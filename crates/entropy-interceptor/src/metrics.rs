//! Request metrics for protected services

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;
use std::time::Duration;

/// Per-service request metrics
///
/// Each service owns its registry, so several services can run in one process
/// (and in tests) without colliding on metric names.
#[derive(Clone)]
pub struct RequestMetrics {
    registry: Arc<Registry>,
    requests: IntCounterVec,
    latency: HistogramVec,
}

impl RequestMetrics {
    /// Create metrics registered under a service prefix
    pub fn new(prefix: &str) -> Result<Self, prometheus::Error> {
        let registry = Arc::new(Registry::new_custom(Some(prefix.to_string()), None)?);

        let requests = IntCounterVec::new(
            Opts::new("http_requests_total", "Total HTTP requests"),
            &["method", "endpoint", "http_status"],
        )?;
        let latency = HistogramVec::new(
            HistogramOpts::new("http_request_latency_seconds", "HTTP request latency"),
            &["method", "endpoint"],
        )?;

        registry.register(Box::new(requests.clone()))?;
        registry.register(Box::new(latency.clone()))?;

        Ok(Self {
            registry,
            requests,
            latency,
        })
    }

    /// Record one handled request
    pub fn record(&self, method: &str, endpoint: &str, status: u16, elapsed: Duration) {
        self.requests
            .with_label_values(&[method, endpoint, &status.to_string()])
            .inc();
        self.latency
            .with_label_values(&[method, endpoint])
            .observe(elapsed.as_secs_f64());
    }

    /// Number of requests recorded for a label set
    pub fn request_count(&self, method: &str, endpoint: &str, status: u16) -> u64 {
        self.requests
            .with_label_values(&[method, endpoint, &status.to_string()])
            .get()
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }

    /// Underlying registry, for services that add their own metrics
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl std::fmt::Debug for RequestMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestMetrics").finish_non_exhaustive()
    }
}
