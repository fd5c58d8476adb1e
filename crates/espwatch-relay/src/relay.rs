//! Relay core: snapshot store plus viewer fan-out.

use std::sync::Arc;

use espwatch_core::TelemetrySnapshot;
use espwatch_telemetry::Metrics;
use parking_lot::Mutex;
use serde::Serialize;
use tracing::debug;

use crate::broadcast::{Broadcaster, DeliveryError, PublishReport, Subscription};
use crate::error::RelayResult;
use crate::store::SnapshotStore;

/// Serialized frame handed to viewer channels.
pub type Frame = Arc<str>;

/// Borrowed wire shape of a relay message, `{"type": ..., "data": ...}`.
#[derive(Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
enum OutboundFrame<'a> {
    Init(&'a TelemetrySnapshot),
    Update(&'a TelemetrySnapshot),
}

impl OutboundFrame<'_> {
    fn encode(&self) -> RelayResult<Frame> {
        Ok(serde_json::to_string(self)?.into())
    }
}

/// Result of one ingestion.
#[derive(Debug, Clone)]
pub struct Ingestion {
    /// The snapshot as stored.
    pub snapshot: Arc<TelemetrySnapshot>,
    /// Fan-out outcome.
    pub report: PublishReport,
}

/// Owns the latest snapshot and the set of attached viewers.
///
/// Ingestion and viewer attachment are serialized so every viewer sees
/// frames in ingestion order, starting from the snapshot current at the
/// moment it attached.
pub struct Relay {
    store: SnapshotStore,
    broadcaster: Broadcaster<Frame>,
    sequence: Mutex<()>,
}

impl Default for Relay {
    fn default() -> Self {
        Self::new()
    }
}

impl Relay {
    pub fn new() -> Self {
        Self {
            store: SnapshotStore::new(),
            broadcaster: Broadcaster::new(),
            sequence: Mutex::new(()),
        }
    }

    /// Latest snapshot, empty before the first ingestion.
    pub fn latest(&self) -> Arc<TelemetrySnapshot> {
        self.store.get()
    }

    /// Store a new snapshot and push it to every attached viewer.
    pub fn ingest(&self, snapshot: TelemetrySnapshot) -> RelayResult<Ingestion> {
        let _order = self.sequence.lock();

        let stored = self.store.set(snapshot);
        let frame = OutboundFrame::Update(&stored).encode()?;
        let report = self.broadcaster.publish(&frame);

        Metrics::ingest_accepted();
        Metrics::frames_published(report.delivered, report.dropped);
        if report.dropped > 0 {
            debug!(dropped = report.dropped, "Update skipped for some viewers");
        }
        Ok(Ingestion {
            snapshot: stored,
            report,
        })
    }

    /// Attach a viewer: `handler` receives the current snapshot as an init
    /// frame, then every subsequent update until the subscription is dropped.
    pub fn attach<F>(&self, handler: F) -> RelayResult<Subscription<Frame>>
    where
        F: Fn(&Frame) -> Result<(), DeliveryError> + Send + Sync + 'static,
    {
        let _order = self.sequence.lock();

        let current = self.store.get();
        let init = OutboundFrame::Init(&current).encode()?;
        handler(&init)?;

        Ok(self.broadcaster.subscribe(handler))
    }

    /// Number of attached viewers.
    pub fn viewer_count(&self) -> usize {
        self.broadcaster.subscriber_count()
    }
}

impl std::fmt::Debug for Relay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Relay")
            .field("fields", &self.store.get().len())
            .field("viewers", &self.viewer_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use espwatch_core::RelayMessage;
    use serde_json::json;

    fn snapshot(value: serde_json::Value) -> TelemetrySnapshot {
        TelemetrySnapshot::try_from(value).unwrap()
    }

    fn collector() -> (
        Arc<Mutex<Vec<RelayMessage>>>,
        impl Fn(&Frame) -> Result<(), DeliveryError> + Send + Sync + 'static,
    ) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        (seen, move |frame: &Frame| {
            sink.lock().push(serde_json::from_str(frame).unwrap());
            Ok(())
        })
    }

    #[test]
    fn test_attach_sends_empty_init_before_first_update() {
        let relay = Relay::new();
        let (seen, handler) = collector();
        let _sub = relay.attach(handler).unwrap();

        assert_eq!(
            *seen.lock(),
            vec![RelayMessage::Init(TelemetrySnapshot::empty())]
        );
    }

    #[test]
    fn test_init_then_updates_in_order() {
        let relay = Relay::new();
        relay.ingest(snapshot(json!({"servo1": 1}))).unwrap();

        let (seen, handler) = collector();
        let _sub = relay.attach(handler).unwrap();
        relay.ingest(snapshot(json!({"servo1": 2}))).unwrap();
        relay.ingest(snapshot(json!({"servo1": 3}))).unwrap();

        let seen = seen.lock();
        assert_eq!(seen.len(), 3);
        assert!(matches!(seen[0], RelayMessage::Init(_)));
        let servo: Vec<_> = seen
            .iter()
            .map(|m| m.snapshot().servo_angle(1).unwrap())
            .collect();
        assert_eq!(servo, vec![1.0, 2.0, 3.0]);
        assert!(matches!(seen[2], RelayMessage::Update(_)));
    }

    #[test]
    fn test_ingest_updates_store_even_without_viewers() {
        let relay = Relay::new();
        let ingestion = relay.ingest(snapshot(json!({"led_y": 1}))).unwrap();
        assert_eq!(ingestion.report, PublishReport::default());
        assert_eq!(ingestion.snapshot.get("led_y"), Some(&json!(1)));
        assert_eq!(relay.latest().get("led_y"), Some(&json!(1)));
    }

    #[test]
    fn test_failed_init_does_not_attach() {
        let relay = Relay::new();
        let result = relay.attach(|_| Err(DeliveryError::Closed));
        assert!(result.is_err());
        assert_eq!(relay.viewer_count(), 0);
    }

    #[test]
    fn test_detached_viewer_gets_nothing_more() {
        let relay = Relay::new();
        let (seen, handler) = collector();
        let sub = relay.attach(handler).unwrap();
        assert_eq!(relay.viewer_count(), 1);

        drop(sub);
        relay.ingest(snapshot(json!({"servo1": 9}))).unwrap();

        assert_eq!(relay.viewer_count(), 0);
        assert_eq!(seen.lock().len(), 1);
    }
}
