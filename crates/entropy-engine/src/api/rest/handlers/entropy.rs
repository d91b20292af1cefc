//! Entropy control handlers

use crate::api::rest::state::AppState;
use crate::error::{ApiError, ApiResult};
use crate::reset::ResetReport;
use axum::{
    extract::{Path, State},
    Json,
};
use entropy_types::{EntropyPatch, EntropySettings};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Set entropy request
///
/// `state` maps entropy kinds to values; `errors` and `error_rate` both name
/// the error rate.
#[derive(Debug, Deserialize)]
pub struct SetEntropyRequest {
    #[serde(alias = "serviceId")]
    pub service_id: String,
    pub state: HashMap<String, f64>,
}

/// Set entropy response
#[derive(Debug, Serialize)]
pub struct SetEntropyResponse {
    pub message: String,
    pub service_id: String,
    pub settings: EntropySettings,
}

/// Merge an entropy update onto the stored settings and push it to the service
pub async fn set_entropy(
    State(state): State<AppState>,
    Json(request): Json<SetEntropyRequest>,
) -> ApiResult<Json<SetEntropyResponse>> {
    state.registry.require(&request.service_id)?;

    let patch = EntropyPatch::from_fields(request.state.iter().map(|(k, v)| (k.as_str(), *v)))
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    if patch.is_empty() {
        return Err(ApiError::BadRequest("No entropy values given".to_string()));
    }

    let settings = state
        .engine
        .apply_patch(&request.service_id, &patch)
        .await?;

    Ok(Json(SetEntropyResponse {
        message: format!("Entropy state for {} set", request.service_id),
        service_id: request.service_id,
        settings,
    }))
}

/// Stored entropy settings of one service
pub async fn entropy_status(
    State(state): State<AppState>,
    Path(service_id): Path<String>,
) -> ApiResult<Json<EntropySettings>> {
    state
        .store
        .lookup(&service_id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("State for service {} not found", service_id)))
}

/// Reset response
#[derive(Debug, Serialize)]
pub struct ResetResponse {
    pub message: String,
    pub report: ResetReport,
}

/// Reset every service to baseline; succeeds even when some pushes fail
pub async fn reset_entropy(State(state): State<AppState>) -> Json<ResetResponse> {
    let report = state.reset.reset().await;
    Json(ResetResponse {
        message: "Entropy state for all services reset".to_string(),
        report,
    })
}
