//! Health and status handlers

use crate::api::rest::state::AppState;
use axum::{extract::State, Json};
use serde::Serialize;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthCheckResponse {
    pub status: String,
}

/// Liveness endpoint
pub async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "ok".to_string(),
    })
}

/// Engine status response
#[derive(Debug, Serialize)]
pub struct EngineStatusResponse {
    pub status: String,
    pub version: String,
    pub uptime: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub services: usize,
    pub scenarios: usize,
    pub running_scenarios: usize,
}

/// Engine status endpoint
pub async fn engine_status(State(state): State<AppState>) -> Json<EngineStatusResponse> {
    Json(EngineStatusResponse {
        status: "running".to_string(),
        version: state.version.clone(),
        uptime: state.uptime(),
        started_at: state.started_at,
        services: state.registry.len(),
        scenarios: state.scenarios.len(),
        running_scenarios: state.running.len(),
    })
}
