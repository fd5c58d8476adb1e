//! Forwarding of ingested snapshots to a downstream mirror relay.

use std::time::Duration;

use espwatch_core::TelemetrySnapshot;
use reqwest::Client;
use tracing::debug;

use crate::error::{RelayError, RelayResult};

/// HTTP client for the mirror endpoint.
#[derive(Debug, Clone)]
pub struct MirrorClient {
    client: Client,
    url: String,
}

impl MirrorClient {
    /// Create a mirror client.
    ///
    /// # Arguments
    /// * `url` - full ingestion URL of the mirror (e.g. "https://relay.example/api/update")
    /// * `timeout` - upper bound for one forward, connect included
    pub fn new(url: impl Into<String>, timeout: Duration) -> RelayResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RelayError::HttpClient(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// POST the snapshot to the mirror.
    pub async fn forward(&self, snapshot: &TelemetrySnapshot) -> RelayResult<()> {
        let response = self
            .client
            .post(&self.url)
            .json(snapshot)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RelayError::Mirror(format!("timed out forwarding to {}", self.url))
                } else {
                    RelayError::Mirror(format!("request to {} failed: {e}", self.url))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RelayError::Mirror(format!("HTTP {status}: {body}")));
        }

        debug!(url = %self.url, "Snapshot forwarded to mirror");
        Ok(())
    }
}
