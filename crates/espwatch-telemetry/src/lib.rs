//! Prometheus metrics and structured logging for espwatch.
//!
//! - Structured logging with tracing (pretty in development, JSON in production)
//! - Relay and viewer counters exported in Prometheus text format

pub mod error;
pub mod logging;
pub mod metrics;

pub use error::{TelemetryError, TelemetryResult};
pub use logging::init_logging;
pub use metrics::Metrics;
