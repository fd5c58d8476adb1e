//! HTTP server implementation using axum.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use espwatch_core::{CoreError, TelemetrySnapshot};
use espwatch_telemetry::Metrics;
use futures_util::stream::StreamExt;
use futures_util::SinkExt;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::{debug, info, warn};

use crate::broadcast::DeliveryError;
use crate::config::RelayConfig;
use crate::error::{RelayError, RelayResult};
use crate::mirror::MirrorClient;
use crate::relay::{Frame, Relay};

/// Limits concurrent WebSocket viewers.
pub struct ViewerLimiter {
    current: AtomicUsize,
    max: usize,
}

impl ViewerLimiter {
    pub fn new(max: usize) -> Self {
        Self {
            current: AtomicUsize::new(0),
            max,
        }
    }

    /// Reserve a slot; the slot is released when the guard drops.
    pub fn try_acquire(self: &Arc<Self>) -> Option<ViewerGuard> {
        loop {
            let current = self.current.load(Ordering::Acquire);
            if current >= self.max {
                return None;
            }
            if self
                .current
                .compare_exchange(current, current + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                return Some(ViewerGuard {
                    limiter: self.clone(),
                });
            }
        }
    }

    pub fn current_count(&self) -> usize {
        self.current.load(Ordering::Relaxed)
    }
}

pub struct ViewerGuard {
    limiter: Arc<ViewerLimiter>,
}

impl Drop for ViewerGuard {
    fn drop(&mut self) {
        self.limiter.current.fetch_sub(1, Ordering::Release);
    }
}

/// Shared application state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    relay: Arc<Relay>,
    mirror: Option<MirrorClient>,
    viewer_limiter: Arc<ViewerLimiter>,
    config: RelayConfig,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        relay: Arc<Relay>,
        config: RelayConfig,
        shutdown: CancellationToken,
    ) -> RelayResult<Self> {
        let mirror = config
            .mirror()
            .map(|url| MirrorClient::new(url, config.mirror_timeout()))
            .transpose()?;

        Ok(Self {
            relay,
            mirror,
            viewer_limiter: Arc::new(ViewerLimiter::new(config.max_viewers)),
            config,
            shutdown,
        })
    }

    pub fn relay(&self) -> &Arc<Relay> {
        &self.relay
    }
}

/// Create the axum router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/api/update", post(ingest))
        .route("/api/data", get(get_data))
        .route("/metrics", get(metrics))
        .route("/ws", get(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness check.
async fn health() -> &'static str {
    "ESP32 telemetry relay is running"
}

/// Accept a snapshot pushed by the device.
async fn ingest(State(state): State<AppState>, body: Bytes) -> Result<Json<Value>, RelayError> {
    let snapshot = TelemetrySnapshot::from_slice(&body).map_err(|e| {
        let reason = match &e {
            CoreError::Json(_) => "malformed_json",
            CoreError::NotAnObject(_) => "not_object",
        };
        Metrics::ingest_rejected(reason);
        warn!(error = %e, "Rejected telemetry payload");
        RelayError::from(e)
    })?;

    info!(fields = snapshot.len(), "Telemetry received from ESP32");
    debug!(snapshot = %serde_json::to_string(&snapshot)?, "Telemetry payload");

    let ingestion = state.relay.ingest(snapshot)?;
    debug!(viewers = ingestion.report.delivered, "Update broadcast");

    if let Some(mirror) = &state.mirror {
        // The local update stands even if the mirror is unreachable.
        if let Err(e) = mirror.forward(&ingestion.snapshot).await {
            Metrics::mirror_failed();
            warn!(error = %e, mirror = %mirror.url(), "Mirror forward failed");
            return Err(e);
        }
    }

    Ok(Json(json!({ "ok": true })))
}

/// Latest snapshot, `{}` before the first update.
async fn get_data(State(state): State<AppState>) -> Json<TelemetrySnapshot> {
    Json(TelemetrySnapshot::clone(&state.relay.latest()))
}

/// Prometheus text exposition.
async fn metrics() -> Response {
    match Metrics::render() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => RelayError::Metrics(e.to_string()).into_response(),
    }
}

/// WebSocket upgrade handler.
async fn ws_handler(State(state): State<AppState>, ws: WebSocketUpgrade) -> Response {
    let Some(guard) = state.viewer_limiter.try_acquire() else {
        warn!(
            current = state.viewer_limiter.current_count(),
            max = state.config.max_viewers,
            "Viewer limit reached"
        );
        return (StatusCode::SERVICE_UNAVAILABLE, "Too many viewers").into_response();
    };

    ws.on_upgrade(move |socket| handle_ws_connection(socket, state, guard))
}

/// Drive one viewer connection until either side goes away.
async fn handle_ws_connection(socket: WebSocket, state: AppState, _guard: ViewerGuard) {
    let (mut sender, mut receiver) = socket.split();
    let (frame_tx, mut frame_rx) = mpsc::channel::<Frame>(state.config.viewer_capacity());

    let subscription = match state.relay.attach(move |frame: &Frame| {
        frame_tx.try_send(frame.clone()).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Full,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }) {
        Ok(subscription) => subscription,
        Err(e) => {
            debug!(error = %e, "Failed to attach viewer");
            return;
        }
    };

    Metrics::viewer_connected();
    info!(
        viewer = subscription.id(),
        viewers = state.relay.viewer_count(),
        "Dashboard connected via WebSocket"
    );

    // Viewers send nothing meaningful; watch for close and errors only.
    let mut incoming_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Close(_)) => {
                    debug!("Viewer sent close frame");
                    break;
                }
                Err(e) => {
                    debug!(error = %e, "WebSocket receive error");
                    break;
                }
                _ => {}
            }
        }
    });

    loop {
        tokio::select! {
            frame = frame_rx.recv() => {
                let Some(frame) = frame else { break };
                if sender.send(Message::Text(frame.to_string().into())).await.is_err() {
                    debug!("Failed to send frame, viewer disconnected");
                    break;
                }
            }
            _ = &mut incoming_task => {
                break;
            }
            _ = state.shutdown.cancelled() => {
                let _ = sender.send(Message::Close(None)).await;
                break;
            }
        }
    }

    incoming_task.abort();
    let viewer = subscription.id();
    drop(subscription);
    Metrics::viewer_disconnected();
    info!(
        viewer,
        viewers = state.relay.viewer_count(),
        "Dashboard disconnected"
    );
}

/// Serve the relay on an already bound listener until `shutdown` fires.
pub async fn serve(listener: TcpListener, state: AppState) -> RelayResult<()> {
    let shutdown = state.shutdown.clone();
    let app = create_router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    Ok(())
}

/// Run the relay HTTP server.
pub async fn run_server(
    relay: Arc<Relay>,
    config: RelayConfig,
    shutdown: CancellationToken,
) -> RelayResult<()> {
    let addr = config.socket_addr()?;
    let state = AppState::new(relay, config.clone(), shutdown)?;

    if let Some(url) = config.mirror() {
        info!(mirror = %url, timeout_ms = config.mirror_timeout_ms, "Mirror forwarding enabled");
    }

    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "Relay server running");

    serve(listener, state).await?;

    info!("Relay server stopped");
    Ok(())
}
