//! Service listing

use crate::api::rest::state::AppState;
use axum::{extract::State, Json};
use entropy_types::ServiceDescriptor;

/// List registered services
pub async fn list_services(State(state): State<AppState>) -> Json<Vec<ServiceDescriptor>> {
    Json(state.registry.all().to_vec())
}
