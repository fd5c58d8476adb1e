//! Frames pushed from the relay to connected viewers.

use serde::{Deserialize, Serialize};

use crate::snapshot::TelemetrySnapshot;

/// WebSocket frame, serialized as `{"type": "...", "data": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum RelayMessage {
    /// Current snapshot, sent once when a viewer connects.
    Init(TelemetrySnapshot),
    /// New snapshot, sent after every ingestion.
    Update(TelemetrySnapshot),
}

impl RelayMessage {
    /// The carried snapshot.
    pub fn snapshot(&self) -> &TelemetrySnapshot {
        match self {
            RelayMessage::Init(s) | RelayMessage::Update(s) => s,
        }
    }

    /// Consume the frame, returning the snapshot.
    pub fn into_snapshot(self) -> TelemetrySnapshot {
        match self {
            RelayMessage::Init(s) | RelayMessage::Update(s) => s,
        }
    }
}
