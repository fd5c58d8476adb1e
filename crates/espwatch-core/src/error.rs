//! Error types for espwatch-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Payload is not a JSON object (got {0})")]
    NotAnObject(&'static str),

    #[error("Malformed JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
