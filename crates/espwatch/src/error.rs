//! Application error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to load configuration: {0}")]
    ConfigLoad(#[from] config::ConfigError),

    #[error("Relay error: {0}")]
    Relay(#[from] espwatch_relay::RelayError),

    #[error("Viewer error: {0}")]
    Viewer(#[from] espwatch_viewer::ViewerError),

    #[error("Telemetry error: {0}")]
    Telemetry(#[from] espwatch_telemetry::TelemetryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AppResult<T> = Result<T, AppError>;
