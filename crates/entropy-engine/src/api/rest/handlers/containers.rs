//! Container control handler

use crate::api::rest::state::AppState;
use crate::error::{ApiResult, EngineError};
use axum::{extract::State, Json};
use entropy_types::ContainerAction;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Container control request
#[derive(Debug, Deserialize)]
pub struct ContainerControlRequest {
    pub service_id: String,
    pub action: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

/// Container control response
#[derive(Debug, Serialize)]
pub struct ContainerControlResponse {
    pub message: String,
}

/// Apply a container action directly
pub async fn container_control(
    State(state): State<AppState>,
    Json(request): Json<ContainerControlRequest>,
) -> ApiResult<Json<ContainerControlResponse>> {
    let action = ContainerAction::parse(&request.action)
        .ok_or_else(|| EngineError::UnknownContainerAction(request.action.clone()))?;

    state
        .containers
        .apply(&request.service_id, action, &request.params)
        .await?;

    Ok(Json(ContainerControlResponse {
        message: format!(
            "Action '{}' performed on container '{}'",
            action.as_str(),
            request.service_id
        ),
    }))
}
