//! Prometheus metrics for the relay and the viewer.
//!
//! # Panics
//!
//! Registration panics on first use if a metric name is registered twice.

use once_cell::sync::Lazy;
use prometheus::{
    register_counter_vec, register_int_counter, register_int_gauge, CounterVec, Encoder,
    IntCounter, IntGauge, TextEncoder,
};

use crate::error::{TelemetryError, TelemetryResult};

/// Snapshots accepted from the device.
pub static INGEST_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "espwatch_ingest_total",
        "Total telemetry snapshots accepted from the device"
    )
    .unwrap()
});

/// Snapshots rejected at the ingestion boundary.
/// Labels: reason (malformed_json/not_object)
pub static INGEST_REJECTED_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "espwatch_ingest_rejected_total",
        "Total telemetry payloads rejected at ingestion",
        &["reason"]
    )
    .unwrap()
});

/// Failed forwards to the downstream mirror.
pub static MIRROR_FAILURES_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "espwatch_mirror_failures_total",
        "Total snapshot forwards to the mirror that failed"
    )
    .unwrap()
});

/// Currently connected WebSocket viewers.
pub static VIEWERS_CONNECTED: Lazy<IntGauge> = Lazy::new(|| {
    register_int_gauge!(
        "espwatch_viewers_connected",
        "Currently connected WebSocket viewers"
    )
    .unwrap()
});

/// Frames handed to viewer channels.
pub static FRAMES_DELIVERED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "espwatch_frames_delivered_total",
        "Total frames queued to viewer channels"
    )
    .unwrap()
});

/// Frames dropped because a viewer channel was full or closed.
pub static FRAMES_DROPPED_TOTAL: Lazy<IntCounter> = Lazy::new(|| {
    register_int_counter!(
        "espwatch_frames_dropped_total",
        "Total frames dropped for slow or closed viewers"
    )
    .unwrap()
});

/// Viewer tick outcomes.
/// Labels: outcome (data/empty/disconnected/skipped)
pub static VIEWER_TICKS_TOTAL: Lazy<CounterVec> = Lazy::new(|| {
    register_counter_vec!(
        "espwatch_viewer_ticks_total",
        "Viewer update ticks by outcome",
        &["outcome"]
    )
    .unwrap()
});

/// Metrics facade for easy access.
pub struct Metrics;

impl Metrics {
    /// Record an accepted snapshot.
    pub fn ingest_accepted() {
        INGEST_TOTAL.inc();
    }

    /// Record a rejected payload.
    pub fn ingest_rejected(reason: &str) {
        INGEST_REJECTED_TOTAL.with_label_values(&[reason]).inc();
    }

    /// Record a failed mirror forward.
    pub fn mirror_failed() {
        MIRROR_FAILURES_TOTAL.inc();
    }

    /// Record a viewer connecting.
    pub fn viewer_connected() {
        VIEWERS_CONNECTED.inc();
    }

    /// Record a viewer disconnecting.
    pub fn viewer_disconnected() {
        VIEWERS_CONNECTED.dec();
    }

    /// Record the outcome of one publish.
    pub fn frames_published(delivered: usize, dropped: usize) {
        FRAMES_DELIVERED_TOTAL.inc_by(delivered as u64);
        FRAMES_DROPPED_TOTAL.inc_by(dropped as u64);
    }

    /// Record a viewer tick outcome.
    pub fn viewer_tick(outcome: &str) {
        VIEWER_TICKS_TOTAL.with_label_values(&[outcome]).inc();
    }

    /// Render all registered metrics in Prometheus text format.
    pub fn render() -> TelemetryResult<String> {
        let encoder = TextEncoder::new();
        let mut buf = Vec::new();
        encoder.encode(&prometheus::gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|_| TelemetryError::Encoding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_includes_recorded_metrics() {
        Metrics::ingest_accepted();
        Metrics::ingest_rejected("not_object");
        Metrics::frames_published(2, 1);

        let text = Metrics::render().unwrap();
        assert!(text.contains("espwatch_ingest_total"));
        assert!(text.contains("espwatch_ingest_rejected_total{reason=\"not_object\"}"));
        assert!(text.contains("espwatch_frames_dropped_total"));
    }

    #[test]
    fn test_viewer_gauge_moves_both_ways() {
        let before = VIEWERS_CONNECTED.get();
        Metrics::viewer_connected();
        Metrics::viewer_disconnected();
        assert_eq!(VIEWERS_CONNECTED.get(), before);
    }
}
