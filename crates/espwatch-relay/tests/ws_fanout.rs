//! WebSocket fan-out integration tests.
//!
//! Runs the relay on a real socket and connects viewers with tokio-tungstenite:
//! - init frame on connect
//! - update frames per ingestion, in order, to every viewer
//! - viewer removal on disconnect

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use espwatch_core::RelayMessage;
use espwatch_relay::{serve, AppState, Relay, RelayConfig};
use futures_util::StreamExt;
use serde_json::json;
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_test::{assert_err, assert_ok};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

type Viewer = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct TestRelay {
    addr: SocketAddr,
    relay: Arc<Relay>,
    shutdown: CancellationToken,
}

impl TestRelay {
    async fn start(config: RelayConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let relay = Arc::new(Relay::new());
        let shutdown = CancellationToken::new();
        let state = AppState::new(relay.clone(), config, shutdown.clone()).unwrap();
        tokio::spawn(serve(listener, state));
        Self {
            addr,
            relay,
            shutdown,
        }
    }

    async fn connect(&self) -> Viewer {
        let (ws, _) = connect_async(format!("ws://{}/ws", self.addr))
            .await
            .unwrap();
        ws
    }

    async fn post(&self, body: serde_json::Value) {
        let response = reqwest::Client::new()
            .post(format!("http://{}/api/update", self.addr))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
    }

    async fn wait_for_viewers(&self, n: usize) {
        timeout(Duration::from_secs(2), async {
            while self.relay.viewer_count() != n {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("viewer count did not settle");
    }
}

impl Drop for TestRelay {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn next_message(viewer: &mut Viewer) -> RelayMessage {
    loop {
        let msg = timeout(Duration::from_secs(2), viewer.next())
            .await
            .expect("timed out waiting for frame")
            .expect("stream ended")
            .expect("websocket error");
        if let Message::Text(text) = msg {
            return serde_json::from_str(&text).unwrap();
        }
    }
}

#[tokio::test]
async fn test_viewer_receives_init_on_connect() {
    let server = TestRelay::start(RelayConfig::default()).await;
    server.relay.ingest(json!({"servo1": 90}).try_into().unwrap()).unwrap();

    let mut viewer = server.connect().await;
    match next_message(&mut viewer).await {
        RelayMessage::Init(snapshot) => assert_eq!(snapshot.servo_angle(1), Some(90.0)),
        other => panic!("expected init, got {other:?}"),
    }
}

#[tokio::test]
async fn test_updates_fan_out_in_order() {
    let server = TestRelay::start(RelayConfig::default()).await;
    let mut first = server.connect().await;
    let mut second = server.connect().await;
    assert!(matches!(next_message(&mut first).await, RelayMessage::Init(_)));
    assert!(matches!(next_message(&mut second).await, RelayMessage::Init(_)));
    server.wait_for_viewers(2).await;

    for angle in [10, 20, 30] {
        server.post(json!({ "servo1": angle })).await;
    }

    for viewer in [&mut first, &mut second] {
        let mut angles = Vec::new();
        for _ in 0..3 {
            match next_message(viewer).await {
                RelayMessage::Update(s) => angles.push(s.servo_angle(1).unwrap()),
                other => panic!("expected update, got {other:?}"),
            }
        }
        assert_eq!(angles, vec![10.0, 20.0, 30.0]);
    }
}

#[tokio::test]
async fn test_closed_viewer_is_removed() {
    let server = TestRelay::start(RelayConfig::default()).await;
    let mut staying = server.connect().await;
    let mut leaving = server.connect().await;
    next_message(&mut staying).await;
    next_message(&mut leaving).await;
    server.wait_for_viewers(2).await;

    assert_ok!(leaving.close(None).await);
    server.wait_for_viewers(1).await;

    server.post(json!({"led_y": 1})).await;
    assert!(matches!(
        next_message(&mut staying).await,
        RelayMessage::Update(_)
    ));
}

#[tokio::test]
async fn test_viewer_limit() {
    let config = RelayConfig {
        max_viewers: 1,
        ..Default::default()
    };
    let server = TestRelay::start(config).await;
    let mut admitted = server.connect().await;
    next_message(&mut admitted).await;

    assert_err!(connect_async(format!("ws://{}/ws", server.addr)).await);
}
