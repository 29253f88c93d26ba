//! Prometheus metrics recording and endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use prepkit_core::error::PrepKitError;

use crate::state::GatewayState;

/// Install the Prometheus metrics recorder and return the handle for rendering.
pub fn install_prometheus_recorder() -> anyhow::Result<PrometheusHandle> {
    PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install Prometheus recorder: {e}"))
}

/// Label for a generation outcome.
pub fn outcome_label<T>(result: &Result<T, PrepKitError>) -> &'static str {
    match result {
        Ok(_) => "ok",
        Err(PrepKitError::InvalidModelResponse) => "invalid_response",
        Err(PrepKitError::Provider(_)) => "provider_error",
        Err(PrepKitError::Config(_)) => "config_error",
        Err(_) => "storage_error",
    }
}

/// Record one generation request with its outcome and duration.
pub fn record_generation<T>(result: &Result<T, PrepKitError>, duration_secs: f64) {
    let labels = [("outcome", outcome_label(result).to_string())];
    metrics::counter!("generate_requests_total", &labels).increment(1);
    metrics::histogram!("generate_request_duration_seconds", &labels).record(duration_secs);
}

/// `GET /metrics`
pub async fn metrics_handler(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    match &state.metrics_handle {
        Some(handle) => (StatusCode::OK, handle.render()),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed".to_string()),
    }
}
