//! Render loop.

use std::time::Duration;

use espwatch_telemetry::Metrics;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::ViewerConfig;
use crate::dashboard::{Dashboard, TickReport};
use crate::error::{ViewerError, ViewerResult};
use crate::feed::Feed;

/// Fetch once and render the result. The fetch is bounded by `timeout`.
pub async fn tick(feed: &Feed, dashboard: &mut Dashboard, timeout: Duration) -> TickReport {
    let fetched = match tokio::time::timeout(timeout, feed.latest()).await {
        Ok(result) => result,
        Err(_) => Err(ViewerError::Timeout),
    };
    let report = dashboard.apply(&fetched);

    Metrics::viewer_tick(report.outcome.label());
    for entry in &report.new_entries {
        info!(time = %entry.timestamp, "{}", entry.message);
    }
    debug!(outcome = report.outcome.label(), "{}", dashboard.status_line());
    report
}

/// Run the dashboard until `shutdown` is cancelled, returning its final state.
///
/// Ticks never overlap: each fetch completes (or times out) before the
/// next tick is taken, and missed ticks are skipped rather than bunched.
pub async fn run_viewer(
    config: ViewerConfig,
    shutdown: CancellationToken,
) -> ViewerResult<Dashboard> {
    let feed = Feed::from_config(&config, &shutdown)?;
    let mut dashboard = Dashboard::new(config.log_capacity);

    let mut ticker = tokio::time::interval(config.tick_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        base_url = %config.base_url,
        transport = ?feed.transport(),
        interval_ms = config.tick_interval_ms,
        "Viewer started"
    );

    loop {
        tokio::select! {
            biased;
            () = shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }
        tick(&feed, &mut dashboard, config.request_timeout()).await;
    }

    info!("Viewer stopped");
    Ok(dashboard)
}
