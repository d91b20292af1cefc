//! API Router configuration

use super::handlers;
use super::state::AppState;
use crate::config::ServerConfig;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main API router
pub fn create_router(state: AppState, config: &ServerConfig) -> Router {
    let api_routes = Router::new()
        .route("/status", get(handlers::engine_status))
        // Entropy
        .route("/entropy/set", post(handlers::set_entropy))
        .route("/entropy/status/:service_id", get(handlers::entropy_status))
        .route("/entropy/reset", post(handlers::reset_entropy))
        // Services
        .route("/services", get(handlers::list_services))
        // Scenarios
        .route("/scenarios", get(handlers::list_scenarios))
        .route("/scenarios/status", get(handlers::scenario_status))
        .route("/scenarios/run", post(handlers::run_scenario))
        // Containers
        .route("/docker/control", post(handlers::container_control));

    let router = Router::new().route("/health", get(handlers::health_check));

    let prefix = config.api_prefix.trim_end_matches('/');
    let router = if prefix.is_empty() {
        router.merge(api_routes)
    } else {
        router.nest(prefix, api_routes)
    };

    let router = router.layer(TraceLayer::new_for_http());
    let router = if config.enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}
