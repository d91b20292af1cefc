//! Scenario handlers

use crate::api::rest::state::AppState;
use crate::error::ApiResult;
use crate::scenario::RunId;
use axum::{extract::State, http::StatusCode, Json};
use entropy_types::Scenario;
use serde::{Deserialize, Serialize};

/// List loaded scenarios
pub async fn list_scenarios(State(state): State<AppState>) -> Json<Vec<Scenario>> {
    Json(state.scenarios.all().to_vec())
}

/// Names of running scenarios, once per run
pub async fn scenario_status(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.running.names())
}

/// Run scenario request
#[derive(Debug, Deserialize)]
pub struct RunScenarioRequest {
    pub name: String,
}

/// Run scenario response
#[derive(Debug, Serialize)]
pub struct RunScenarioResponse {
    pub message: String,
    pub run_id: RunId,
}

/// Start a scenario in the background
pub async fn run_scenario(
    State(state): State<AppState>,
    Json(request): Json<RunScenarioRequest>,
) -> ApiResult<(StatusCode, Json<RunScenarioResponse>)> {
    let scenario = state.scenarios.require(&request.name)?.clone();
    let (run_id, _) = state.engine.spawn(scenario);

    Ok((
        StatusCode::ACCEPTED,
        Json(RunScenarioResponse {
            message: format!("Scenario '{}' started in the background", request.name),
            run_id,
        }),
    ))
}
