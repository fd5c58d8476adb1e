//! Snapshot transports.
//!
//! [`HttpPoller`] fetches `/api/data` on demand. [`PushFeed`] keeps a
//! WebSocket subscription to `/ws` alive in the background, reconnecting
//! with exponential backoff, and caches the newest frame. While no push
//! channel is up it polls instead.

use std::sync::Arc;

use espwatch_core::{RelayMessage, TelemetrySnapshot};
use futures_util::{SinkExt, StreamExt};
use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async_tls_with_config, tungstenite::Message};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use crate::config::{Transport, ViewerConfig};
use crate::error::{ViewerError, ViewerResult};

/// Polling transport.
#[derive(Debug, Clone)]
pub struct HttpPoller {
    client: reqwest::Client,
    url: String,
}

impl HttpPoller {
    pub fn new(config: &ViewerConfig) -> ViewerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| ViewerError::Http(e.to_string()))?;
        Ok(Self {
            client,
            url: config.data_url(),
        })
    }

    /// GET the latest snapshot.
    pub async fn fetch(&self) -> ViewerResult<TelemetrySnapshot> {
        let response = self.client.get(&self.url).send().await.map_err(http_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ViewerError::Status(status.as_u16()));
        }

        let body = response.bytes().await.map_err(http_error)?;
        Ok(TelemetrySnapshot::from_slice(&body)?)
    }
}

fn http_error(e: reqwest::Error) -> ViewerError {
    if e.is_timeout() {
        ViewerError::Timeout
    } else {
        ViewerError::Http(e.to_string())
    }
}

/// Push transport.
///
/// The cached snapshot is cleared whenever the socket drops; until the next
/// frame arrives [`PushFeed::latest`] polls `/api/data`.
pub struct PushFeed {
    latest: Arc<RwLock<Option<TelemetrySnapshot>>>,
    fallback: HttpPoller,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl PushFeed {
    /// Start the background subscription. Must be called inside a tokio runtime.
    pub fn spawn(config: &ViewerConfig, shutdown: &CancellationToken) -> ViewerResult<Self> {
        let url = config.ws_url()?;
        let fallback = HttpPoller::new(config)?;
        let latest = Arc::new(RwLock::new(None));
        let shutdown = shutdown.child_token();

        let task = tokio::spawn(subscribe_loop(
            url,
            config.clone(),
            latest.clone(),
            shutdown.clone(),
        ));

        Ok(Self {
            latest,
            fallback,
            shutdown,
            task: Some(task),
        })
    }

    /// Newest pushed snapshot.
    pub fn current(&self) -> ViewerResult<TelemetrySnapshot> {
        self.latest.read().clone().ok_or(ViewerError::NotConnected)
    }

    /// Newest pushed snapshot, or a polled one while the socket is down.
    pub async fn latest(&self) -> ViewerResult<TelemetrySnapshot> {
        match self.current() {
            Err(ViewerError::NotConnected) => {
                trace!("Push channel down, polling");
                self.fallback.fetch().await
            }
            pushed => pushed,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.latest.read().is_some()
    }

    /// Stop the subscription and wait for the task to exit.
    pub async fn close(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for PushFeed {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

impl std::fmt::Debug for PushFeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushFeed")
            .field("connected", &self.is_connected())
            .finish()
    }
}

async fn subscribe_loop(
    url: String,
    config: ViewerConfig,
    latest: Arc<RwLock<Option<TelemetrySnapshot>>>,
    shutdown: CancellationToken,
) {
    let mut attempt = 0u32;

    loop {
        if shutdown.is_cancelled() {
            break;
        }

        match read_frames(&url, &latest, &shutdown, &mut attempt).await {
            Ok(()) => info!("Push channel closed"),
            Err(e) => warn!(error = %e, "Push channel error"),
        }
        *latest.write() = None;

        if shutdown.is_cancelled() {
            break;
        }

        attempt = attempt.saturating_add(1);
        let delay = config.reconnect_delay(attempt);
        debug!(attempt, delay_ms = delay.as_millis() as u64, "Reconnecting push channel");

        tokio::select! {
            () = tokio::time::sleep(delay) => {}
            () = shutdown.cancelled() => break,
        }
    }

    *latest.write() = None;
    debug!("Push channel stopped");
}

async fn read_frames(
    url: &str,
    latest: &RwLock<Option<TelemetrySnapshot>>,
    shutdown: &CancellationToken,
    attempt: &mut u32,
) -> ViewerResult<()> {
    let (ws_stream, _response) = tokio::select! {
        connected = connect_async_tls_with_config(url, None, true, None) => connected?,
        () = shutdown.cancelled() => return Ok(()),
    };
    let (mut write, mut read) = ws_stream.split();
    info!(%url, "Push channel connected");
    *attempt = 0;

    loop {
        tokio::select! {
            () = shutdown.cancelled() => {
                if let Err(e) = write.send(Message::Close(None)).await {
                    debug!(error = %e, "Failed to send Close frame during shutdown");
                }
                return Ok(());
            }
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<RelayMessage>(&text) {
                            Ok(frame) => *latest.write() = Some(frame.into_snapshot()),
                            Err(e) => warn!(error = %e, "Ignoring malformed relay frame"),
                        }
                    }
                    Some(Ok(Message::Ping(data))) => {
                        write.send(Message::Pong(data)).await?;
                    }
                    Some(Ok(Message::Close(_))) | None => return Ok(()),
                    Some(Err(e)) => {
                        error!(error = %e, "Push channel read error");
                        return Err(e.into());
                    }
                    Some(Ok(_)) => {}
                }
            }
        }
    }
}

/// Transport selected by configuration.
#[derive(Debug)]
pub enum Feed {
    Poll(HttpPoller),
    Push(PushFeed),
}

impl Feed {
    pub fn from_config(config: &ViewerConfig, shutdown: &CancellationToken) -> ViewerResult<Self> {
        match config.transport {
            Transport::Poll => Ok(Feed::Poll(HttpPoller::new(config)?)),
            Transport::Push => Ok(Feed::Push(PushFeed::spawn(config, shutdown)?)),
        }
    }

    /// Latest snapshot as seen by this transport.
    pub async fn latest(&self) -> ViewerResult<TelemetrySnapshot> {
        match self {
            Feed::Poll(poller) => poller.fetch().await,
            Feed::Push(push) => push.latest().await,
        }
    }

    pub fn transport(&self) -> Transport {
        match self {
            Feed::Poll(_) => Transport::Poll,
            Feed::Push(_) => Transport::Push,
        }
    }
}
