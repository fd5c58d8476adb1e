//! Relay configuration.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{RelayError, RelayResult};

/// Relay server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelayConfig {
    /// Address to bind.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Ingestion URL of a downstream mirror (None = no forwarding).
    #[serde(default)]
    pub mirror_url: Option<String>,
    /// Timeout for one mirror forward in milliseconds.
    #[serde(default = "default_mirror_timeout_ms")]
    pub mirror_timeout_ms: u64,
    /// Frames buffered per viewer before updates are dropped for it.
    #[serde(default = "default_viewer_buffer")]
    pub viewer_buffer: usize,
    /// Maximum concurrent WebSocket viewers.
    #[serde(default = "default_max_viewers")]
    pub max_viewers: usize,
}

fn default_bind_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_mirror_timeout_ms() -> u64 {
    3000
}

fn default_viewer_buffer() -> usize {
    32
}

fn default_max_viewers() -> usize {
    64
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            port: default_port(),
            mirror_url: None,
            mirror_timeout_ms: default_mirror_timeout_ms(),
            viewer_buffer: default_viewer_buffer(),
            max_viewers: default_max_viewers(),
        }
    }
}

impl RelayConfig {
    /// Socket address to listen on.
    pub fn socket_addr(&self) -> RelayResult<SocketAddr> {
        let ip: IpAddr = self
            .bind_addr
            .parse()
            .map_err(|e| RelayError::Config(format!("bind_addr {:?}: {e}", self.bind_addr)))?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn mirror_timeout(&self) -> Duration {
        Duration::from_millis(self.mirror_timeout_ms)
    }

    /// Mirror URL, treating an empty string as unset.
    pub fn mirror(&self) -> Option<&str> {
        self.mirror_url.as_deref().filter(|u| !u.trim().is_empty())
    }

    /// Per-viewer channel capacity (never zero).
    pub fn viewer_capacity(&self) -> usize {
        self.viewer_buffer.max(1)
    }
}
