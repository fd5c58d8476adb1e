//! espwatch application.
//!
//! Wires configuration, logging and shutdown around the two roles:
//! - `serve`: the telemetry relay (ingestion, fan-out, mirror forwarding)
//! - `watch`: the headless dashboard viewer

pub mod app;
pub mod config;
pub mod error;

pub use app::Application;
pub use config::AppConfig;
pub use error::{AppError, AppResult};
