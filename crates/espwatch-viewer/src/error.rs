//! Viewer error types.

use espwatch_core::CoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("Relay responded with status {0}")]
    Status(u16),

    #[error("Invalid snapshot: {0}")]
    Payload(#[from] CoreError),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] Box<tokio_tungstenite::tungstenite::Error>),

    #[error("Push channel not connected")]
    NotConnected,

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid configuration: {0}")]
    Config(String),
}

pub type ViewerResult<T> = Result<T, ViewerError>;

impl From<tokio_tungstenite::tungstenite::Error> for ViewerError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        ViewerError::WebSocket(Box::new(e))
    }
}
