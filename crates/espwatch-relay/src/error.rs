//! Relay error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use espwatch_core::CoreError;
use serde_json::json;
use thiserror::Error;

use crate::broadcast::DeliveryError;

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Invalid payload: {0}")]
    InvalidPayload(#[from] CoreError),

    #[error("Mirror forward failed: {0}")]
    Mirror(String),

    #[error("HTTP client error: {0}")]
    HttpClient(String),

    #[error("Viewer delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Metrics error: {0}")]
    Metrics(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type RelayResult<T> = Result<T, RelayError>;

impl RelayError {
    /// HTTP status reported to the caller.
    pub fn status(&self) -> StatusCode {
        match self {
            RelayError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            RelayError::Mirror(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for RelayError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "ok": false, "error": self.to_string() }));
        (self.status(), body).into_response()
    }
}
