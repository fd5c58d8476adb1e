//! Viewer configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ViewerError, ViewerResult};

/// How the viewer obtains snapshots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Transport {
    /// `GET /api/data` every tick.
    #[default]
    Poll,
    /// Subscribe to `/ws` and render the latest pushed frame every tick.
    Push,
}

/// Viewer configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewerConfig {
    /// Relay origin, e.g. "http://127.0.0.1:3000" locally or the deployed host.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Snapshot transport.
    #[serde(default)]
    pub transport: Transport,
    /// Render tick interval in milliseconds.
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Upper bound for one poll request in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// First push reconnect delay in milliseconds.
    #[serde(default = "default_reconnect_base_delay_ms")]
    pub reconnect_base_delay_ms: u64,
    /// Cap for push reconnect delay in milliseconds.
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub reconnect_max_delay_ms: u64,
    /// Activity log entries kept.
    #[serde(default = "default_log_capacity")]
    pub log_capacity: usize,
}

fn default_base_url() -> String {
    "http://127.0.0.1:3000".to_string()
}

fn default_tick_interval_ms() -> u64 {
    1_000
}

fn default_request_timeout_ms() -> u64 {
    2_000
}

fn default_reconnect_base_delay_ms() -> u64 {
    500
}

fn default_reconnect_max_delay_ms() -> u64 {
    10_000
}

fn default_log_capacity() -> usize {
    30
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            transport: Transport::default(),
            tick_interval_ms: default_tick_interval_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            reconnect_base_delay_ms: default_reconnect_base_delay_ms(),
            reconnect_max_delay_ms: default_reconnect_max_delay_ms(),
            log_capacity: default_log_capacity(),
        }
    }
}

impl ViewerConfig {
    fn origin(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }

    /// Polling endpoint.
    pub fn data_url(&self) -> String {
        format!("{}/api/data", self.origin())
    }

    /// Push endpoint; `http` becomes `ws` and `https` becomes `wss`.
    pub fn ws_url(&self) -> ViewerResult<String> {
        let origin = self.origin();
        if let Some(rest) = origin.strip_prefix("https://") {
            Ok(format!("wss://{rest}/ws"))
        } else if let Some(rest) = origin.strip_prefix("http://") {
            Ok(format!("ws://{rest}/ws"))
        } else {
            Err(ViewerError::Config(format!(
                "base_url must start with http:// or https:// (got {origin:?})"
            )))
        }
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Reconnect delay for the given attempt (1-based), doubling up to the cap.
    pub fn reconnect_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(10);
        let delay = self
            .reconnect_base_delay_ms
            .saturating_mul(1u64 << exponent)
            .min(self.reconnect_max_delay_ms);
        Duration::from_millis(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls() {
        let config = ViewerConfig {
            base_url: "http://172.20.10.7:3000/".into(),
            ..Default::default()
        };
        assert_eq!(config.data_url(), "http://172.20.10.7:3000/api/data");
        assert_eq!(config.ws_url().unwrap(), "ws://172.20.10.7:3000/ws");

        let deployed = ViewerConfig {
            base_url: "https://relay.example.com".into(),
            ..Default::default()
        };
        assert_eq!(deployed.ws_url().unwrap(), "wss://relay.example.com/ws");
    }

    #[test]
    fn test_bad_scheme() {
        let config = ViewerConfig {
            base_url: "ftp://nope".into(),
            ..Default::default()
        };
        assert!(matches!(config.ws_url(), Err(ViewerError::Config(_))));
    }

    #[test]
    fn test_reconnect_delay_doubles_and_caps() {
        let config = ViewerConfig::default();
        assert_eq!(config.reconnect_delay(1), Duration::from_millis(500));
        assert_eq!(config.reconnect_delay(2), Duration::from_millis(1000));
        assert_eq!(config.reconnect_delay(3), Duration::from_millis(2000));
        assert_eq!(config.reconnect_delay(10), Duration::from_millis(10_000));
        assert_eq!(config.reconnect_delay(u32::MAX), Duration::from_millis(10_000));
    }

    #[test]
    fn test_transport_deserialize() {
        let config: ViewerConfig =
            serde_json::from_str(r#"{"transport": "push", "tick_interval_ms": 250}"#).unwrap();
        assert_eq!(config.transport, Transport::Push);
        assert_eq!(config.tick_interval(), Duration::from_millis(250));
        assert_eq!(config.log_capacity, 30);
    }
}
