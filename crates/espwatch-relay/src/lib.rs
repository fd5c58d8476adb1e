//! espwatch-relay - Telemetry relay between the ESP32 and its viewers.
//!
//! The device pushes its state over HTTP; the relay keeps the latest
//! snapshot and fans every update out to connected WebSocket viewers.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐  POST /api/update   ┌──────────────────────────────────────┐
//! │  ESP32   │ ──────────────────▶ │  Relay                               │
//! └──────────┘                     │   ├─ SnapshotStore (latest only)     │
//!                                  │   └─ Broadcaster ──▶ viewer channels │
//!                                  └───────────────┬──────────────────────┘
//!                                                  │ (optional)
//!                                                  ▼
//!                                         mirror POST (bounded timeout)
//!
//!  GET /api/data  → latest snapshot, `{}` before first update
//!  GET /ws        → {"type":"init"} then {"type":"update"} per ingestion
//!  GET /metrics   → Prometheus text
//!  GET /          → liveness text
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use espwatch_relay::{run_server, Relay, RelayConfig};
//! use tokio_util::sync::CancellationToken;
//!
//! let relay = Arc::new(Relay::new());
//! run_server(relay, RelayConfig::default(), CancellationToken::new()).await?;
//! ```

mod broadcast;
mod config;
mod error;
mod mirror;
mod relay;
mod server;
mod store;

pub use broadcast::{Broadcaster, DeliveryError, PublishReport, SubscriberId, Subscription};
pub use config::RelayConfig;
pub use error::{RelayError, RelayResult};
pub use mirror::MirrorClient;
pub use relay::{Frame, Ingestion, Relay};
pub use server::{create_router, run_server, serve, AppState};
pub use store::SnapshotStore;
