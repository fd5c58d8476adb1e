//! Application orchestration.

use std::sync::Arc;

use espwatch_relay::{run_server, Relay};
use espwatch_viewer::{run_viewer, Dashboard};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::AppResult;

/// Runs one role until shutdown.
pub struct Application {
    config: AppConfig,
    shutdown: CancellationToken,
}

impl Application {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Token cancelled on shutdown; clones may be used to stop the app.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Cancel the shutdown token on Ctrl-C.
    pub fn install_signal_handler(&self) {
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => info!("Shutdown signal received"),
                Err(e) => warn!(error = %e, "Failed to listen for Ctrl-C, shutting down"),
            }
            shutdown.cancel();
        });
    }

    /// Run the relay server.
    pub async fn serve(self) -> AppResult<()> {
        let relay = Arc::new(Relay::new());
        info!(
            addr = %self.config.relay.bind_addr,
            port = self.config.relay.port,
            "Starting relay"
        );
        run_server(relay, self.config.relay, self.shutdown).await?;
        Ok(())
    }

    /// Run the dashboard viewer, returning its final state.
    pub async fn watch(self) -> AppResult<Dashboard> {
        let dashboard = run_viewer(self.config.viewer, self.shutdown).await?;
        info!(
            heartbeat = %dashboard.heartbeat(),
            log_entries = dashboard.log_entries().len(),
            "Viewer finished"
        );
        Ok(dashboard)
    }
}
