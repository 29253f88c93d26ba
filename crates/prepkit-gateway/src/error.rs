use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use prepkit_core::error::PrepKitError;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by gateway handlers.
///
/// Every variant renders as `{"success": false, "error": "<message>"}`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Generation(#[from] PrepKitError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Generation(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({
            "success": false,
            "error": self.to_string(),
        }));
        (status, body).into_response()
    }
}
