//! Axum-based HTTP server.

use std::sync::Arc;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::get,
    Router,
};
use serde_json::json;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::generate::{acknowledge_handler, generate_handler};
use crate::state::GatewayState;

/// Build the gateway router.
pub fn router(state: Arc<GatewayState>) -> Router {
    let router = Router::new()
        .route(
            "/api/vapi/generate",
            get(acknowledge_handler).post(generate_handler),
        )
        .route("/health", get(health_handler));

    #[cfg(feature = "metrics")]
    let router = router.route("/metrics", get(crate::metrics::metrics_handler));

    router.layer(TraceLayer::new_for_http()).with_state(state)
}

/// Start the gateway HTTP server and serve until Ctrl-C.
pub async fn start_gateway(state: Arc<GatewayState>, port: u16) -> anyhow::Result<()> {
    let bind_addr = state.config.gateway_bind();
    let app = router(state);

    let addr = format!("{bind_addr}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Gateway listening on {addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn health_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    let version = env!("CARGO_PKG_VERSION");

    axum::Json(json!({
        "status": "ok",
        "version": version,
        "provider": state.provider.id(),
        "model": state.config.model(),
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(%e, "Failed to install Ctrl-C handler");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
