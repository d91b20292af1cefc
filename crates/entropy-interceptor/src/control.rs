//! Entropy-control surface of a protected service
//!
//! These routes must stay reachable while the service is under fault, so they
//! are never placed behind the interceptor.

use crate::metrics::RequestMetrics;
use crate::state::EntropyState;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use entropy_types::{EntropyKind, EntropySettings};
use serde::{Deserialize, Serialize};

#[derive(Clone)]
struct ControlState {
    entropy: EntropyState,
    metrics: RequestMetrics,
}

/// Latency update
#[derive(Debug, Deserialize)]
pub struct LatencyRequest {
    pub latency: f64,
}

/// Error-rate update
#[derive(Debug, Deserialize)]
pub struct ErrorRateRequest {
    #[serde(alias = "errors")]
    pub error_rate: f64,
}

/// Throughput update
#[derive(Debug, Deserialize)]
pub struct ThroughputRequest {
    pub throughput: f64,
}

/// Response to an entropy update
#[derive(Debug, Serialize, Deserialize)]
pub struct EntropyUpdateResponse {
    pub message: String,
    pub settings: EntropySettings,
}

/// Routes for entropy control and metrics
pub fn control_router(entropy: EntropyState, metrics: RequestMetrics) -> Router {
    Router::new()
        .route("/entropy", get(current_settings))
        .route("/entropy/latency", post(set_latency))
        .route("/entropy/errors", post(set_error_rate))
        .route("/entropy/throughput", post(set_throughput))
        .route("/metrics", get(export_metrics))
        .with_state(ControlState { entropy, metrics })
}

async fn current_settings(State(state): State<ControlState>) -> Json<EntropySettings> {
    Json(state.entropy.get())
}

async fn set_latency(
    State(state): State<ControlState>,
    Json(request): Json<LatencyRequest>,
) -> Json<EntropyUpdateResponse> {
    apply(&state, EntropyKind::Latency, request.latency)
}

async fn set_error_rate(
    State(state): State<ControlState>,
    Json(request): Json<ErrorRateRequest>,
) -> Json<EntropyUpdateResponse> {
    apply(&state, EntropyKind::ErrorRate, request.error_rate)
}

async fn set_throughput(
    State(state): State<ControlState>,
    Json(request): Json<ThroughputRequest>,
) -> Json<EntropyUpdateResponse> {
    apply(&state, EntropyKind::Throughput, request.throughput)
}

fn apply(state: &ControlState, kind: EntropyKind, value: f64) -> Json<EntropyUpdateResponse> {
    let settings = state.entropy.set(kind, value);
    tracing::info!(kind = %kind, value = settings.get(kind), "Entropy updated");

    Json(EntropyUpdateResponse {
        message: format!("{} set to {}", kind, settings.get(kind)),
        settings,
    })
}

async fn export_metrics(State(state): State<ControlState>) -> Response {
    match state.metrics.export() {
        Ok(body) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Failed to export metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use tower::ServiceExt;

    async fn post_json(app: &Router, uri: &str, body: &str) -> (StatusCode, serde_json::Value) {
        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_updates_are_stored_locally() {
        let entropy = EntropyState::new();
        let app = control_router(entropy.clone(), RequestMetrics::new("ctl").unwrap());

        let (status, body) = post_json(&app, "/entropy/latency", r#"{"latency": 1.5}"#).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["settings"]["latency"], 1.5);

        let (status, _) = post_json(&app, "/entropy/errors", r#"{"error_rate": 0.4}"#).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = post_json(&app, "/entropy/throughput", r#"{"throughput": 2.0}"#).await;
        assert_eq!(status, StatusCode::OK);

        let settings = entropy.get();
        assert_eq!(settings.latency, 1.5);
        assert_eq!(settings.error_rate, 0.4);
        assert_eq!(settings.throughput, 1.0);
    }

    #[tokio::test]
    async fn test_malformed_update_rejected() {
        let entropy = EntropyState::new();
        let app = control_router(entropy.clone(), RequestMetrics::new("ctl").unwrap());

        let (status, _) = post_json(&app, "/entropy/latency", r#"{"delay": 3}"#).await;
        assert!(status.is_client_error());
        assert!(entropy.get().is_baseline());
    }
}
