//! The entropy interceptor middleware
//!
//! Checks run in a fixed order and the first one that applies wins:
//!
//! 1. sleep for `latency` seconds when latency is positive
//! 2. one uniform draw; below `error_rate` the request fails with 500
//! 3. a second, independent draw; at or above `throughput` the request is
//!    throttled with 429
//! 4. otherwise the business handler runs
//!
//! Every outcome is recorded in [`RequestMetrics`], with the injected delay
//! included in the observed duration.

use crate::metrics::RequestMetrics;
use crate::state::EntropyState;
use axum::{
    extract::{MatchedPath, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    Json, Router,
};
use entropy_types::EntropySettings;
use rand::Rng;
use serde_json::json;
use std::sync::Arc;
use tokio::time::Instant;

/// Metric label for requests that matched no route
pub const UNMATCHED_ENDPOINT: &str = "unmatched";

/// Source of uniform draws in `[0, 1)`
pub trait Sampler: Send + Sync {
    fn sample(&self) -> f64;
}

/// Sampler backed by the thread-local RNG
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngSampler;

impl Sampler for ThreadRngSampler {
    fn sample(&self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// What the interceptor does with a request after the latency step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Hand the request to the business handler
    Pass,
    /// Fail with a server error
    Fail,
    /// Reject with too-many-requests
    Throttle,
}

/// Decide the fate of one request from two independent draws.
///
/// The throughput draw is only taken when the error draw did not fail the
/// request.
pub fn decide(settings: &EntropySettings, sampler: &dyn Sampler) -> Decision {
    if sampler.sample() < settings.error_rate {
        return Decision::Fail;
    }
    if sampler.sample() >= settings.throughput {
        return Decision::Throttle;
    }
    Decision::Pass
}

/// Request-processing stage enforcing a service's local entropy settings
#[derive(Clone)]
pub struct EntropyInterceptor {
    state: EntropyState,
    metrics: RequestMetrics,
    sampler: Arc<dyn Sampler>,
}

impl EntropyInterceptor {
    /// Create an interceptor drawing from the thread-local RNG
    pub fn new(state: EntropyState, metrics: RequestMetrics) -> Self {
        Self::with_sampler(state, metrics, Arc::new(ThreadRngSampler))
    }

    /// Create an interceptor with a custom sampler
    pub fn with_sampler(
        state: EntropyState,
        metrics: RequestMetrics,
        sampler: Arc<dyn Sampler>,
    ) -> Self {
        Self {
            state,
            metrics,
            sampler,
        }
    }

    /// Local settings this interceptor enforces
    pub fn state(&self) -> &EntropyState {
        &self.state
    }

    /// Metrics this interceptor records into
    pub fn metrics(&self) -> &RequestMetrics {
        &self.metrics
    }
}

impl std::fmt::Debug for EntropyInterceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntropyInterceptor")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

/// Install the interceptor in front of business routes and mount the
/// entropy-control and metrics routes beside them, outside the interceptor.
pub fn protect(business: Router, interceptor: EntropyInterceptor) -> Router {
    let control = crate::control::control_router(
        interceptor.state.clone(),
        interceptor.metrics.clone(),
    );

    business
        .layer(middleware::from_fn_with_state(interceptor, intercept))
        .merge(control)
}

/// Route template of a request, or [`UNMATCHED_ENDPOINT`] when no route matched
fn endpoint_label(request: &Request) -> String {
    request
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| UNMATCHED_ENDPOINT.to_string())
}

async fn intercept(
    State(interceptor): State<EntropyInterceptor>,
    request: Request,
    next: Next,
) -> Response {
    let started = Instant::now();
    let method = request.method().to_string();
    let endpoint = endpoint_label(&request);

    // A delayed request keeps the snapshot it started with.
    let settings = interceptor.state.get();

    if settings.latency > 0.0 {
        tokio::time::sleep(settings.latency_duration()).await;
    }

    let response = match decide(&settings, interceptor.sampler.as_ref()) {
        Decision::Fail => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "detail": "Internal Server Error" })),
        )
            .into_response(),
        Decision::Throttle => (
            StatusCode::TOO_MANY_REQUESTS,
            Json(json!({ "detail": "Too Many Requests" })),
        )
            .into_response(),
        Decision::Pass => next.run(request).await,
    };

    let elapsed = started.elapsed();
    let status = response.status().as_u16();
    interceptor
        .metrics
        .record(&method, &endpoint, status, elapsed);

    tracing::info!(
        http_method = %method,
        http_path = %endpoint,
        http_status_code = status,
        duration = elapsed.as_secs_f64(),
        "http_request"
    );

    response
}
