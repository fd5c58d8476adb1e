//! Dashboard viewer for espwatch.
//!
//! Mirrors what the browser dashboard does, headless:
//! - Fetches the latest snapshot every tick (HTTP polling or WebSocket push)
//! - Derives gauge, voltage, LED, watchdog and heartbeat display state
//! - Keeps a bounded activity log with edge-triggered sleep transitions
//! - Degrades to a "disconnected" display on transport failure

pub mod activity;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod feed;
pub mod runner;
pub mod view;

pub use activity::{ActivityLog, LogEntry};
pub use config::{Transport, ViewerConfig};
pub use dashboard::{Dashboard, TickOutcome, TickReport};
pub use error::{ViewerError, ViewerResult};
pub use feed::{Feed, HttpPoller, PushFeed};
pub use runner::{run_viewer, tick};
pub use view::{GaugeView, Heartbeat, LedIndicator, WatchdogMode, WatchdogView};

use std::sync::Once;

static INIT_CRYPTO: Once = Once::new();

/// Initialize the TLS crypto provider.
/// Must be called before any HTTPS or WSS connection is made.
pub fn init_crypto() {
    INIT_CRYPTO.call_once(|| {
        let _ = rustls::crypto::ring::default_provider().install_default();
    });
}
