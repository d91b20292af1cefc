//! Serving a shop service

use crate::error::{ShopError, ShopResult};
use axum::Router;
use entropy_interceptor::shutdown_signal;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Serve a router until a shutdown signal arrives
pub async fn serve(name: &str, addr: SocketAddr, router: Router) -> ShopResult<()> {
    let app = router.layer(TraceLayer::new_for_http());
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(service = name, "Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ShopError::Server(e.to_string()))?;

    tracing::info!(service = name, "Shutting down");
    Ok(())
}
