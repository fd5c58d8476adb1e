//! Latest-snapshot store.

use std::sync::Arc;

use espwatch_core::TelemetrySnapshot;
use parking_lot::RwLock;

/// Holds the single most recent snapshot.
///
/// Readers get an `Arc` to an immutable snapshot, so a reader never sees a
/// half-written value and never holds the lock while serializing.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    latest: RwLock<Arc<TelemetrySnapshot>>,
}

impl SnapshotStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored snapshot, returning the new value.
    pub fn set(&self, snapshot: TelemetrySnapshot) -> Arc<TelemetrySnapshot> {
        let snapshot = Arc::new(snapshot);
        *self.latest.write() = snapshot.clone();
        snapshot
    }

    /// Current snapshot, empty if nothing was ever set.
    pub fn get(&self) -> Arc<TelemetrySnapshot> {
        self.latest.read().clone()
    }
}
