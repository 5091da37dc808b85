//! Common test utilities for wsconn integration tests
//!
//! - `MockWsServer`: loopback echo server with sub-protocol selection
//! - `RecordingTransport`: in-memory transport whose events are fired by the test
//! - `recorder`: builder callbacks that forward every event into a channel

#![allow(dead_code)]

use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU16, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, Notify};
use url::Url;
use wsconn::{validate, ConnectionBuilder, Event, EventKind, Listener, Payload, Socket, Transport, TransportError};

/// Macro for verbose test output (controlled by TEST_VERBOSE env var)
#[macro_export]
macro_rules! verbose_println {
    ($($arg:tt)*) => {
        if std::env::var("TEST_VERBOSE").is_ok() {
            println!($($arg)*);
        }
    };
}

/// Text frame that makes the server start the closing handshake
pub const SERVER_CLOSE_COMMAND: &str = "server-close";

/// Close code the server uses when asked to close
pub const SERVER_CLOSE_CODE: u16 = 4000;

/// A simple mock WebSocket server for testing
///
/// Echoes text and binary frames, selects the first sub-protocol the client
/// offers, and closes with `SERVER_CLOSE_CODE` when it receives
/// `SERVER_CLOSE_COMMAND`.
pub struct MockWsServer {
    pub addr: SocketAddr,
    /// Request headers of every accepted handshake, lowercased names
    pub seen_headers: Arc<Mutex<Vec<(String, String)>>>,
    shutdown: Arc<Notify>,
}

impl MockWsServer {
    /// Create and start a new mock WebSocket server
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let shutdown_clone = shutdown.clone();
        let seen_headers = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = Arc::clone(&seen_headers);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let shutdown = shutdown_clone.clone();
                                let seen = Arc::clone(&seen_clone);
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, shutdown, seen).await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown_clone.notified() => {
                        break;
                    }
                }
            }
        });

        Self {
            addr,
            seen_headers,
            shutdown,
        }
    }

    async fn handle_connection(
        stream: tokio::net::TcpStream,
        shutdown: Arc<Notify>,
        seen: Arc<Mutex<Vec<(String, String)>>>,
    ) {
        use futures::{SinkExt, StreamExt};
        use tokio_tungstenite::accept_hdr_async;
        use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
        use tokio_tungstenite::tungstenite::http::HeaderValue;
        use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
        use tokio_tungstenite::tungstenite::protocol::CloseFrame;
        use tokio_tungstenite::tungstenite::Message;

        let select_protocol = |request: &Request, mut response: Response| -> Result<Response, ErrorResponse> {
            seen.lock().extend(request.headers().iter().filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            }));

            let offered = request
                .headers()
                .get("sec-websocket-protocol")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.split(',').map(str::trim).find(|p| !p.is_empty()))
                .map(str::to_string);

            if let Some(protocol) = offered {
                if let Ok(value) = HeaderValue::from_str(&protocol) {
                    response.headers_mut().insert("sec-websocket-protocol", value);
                }
            }
            Ok(response)
        };

        let ws_stream = match accept_hdr_async(stream, select_protocol).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        let (mut write, mut read) = ws_stream.split();
        let mut closing = false;

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) if text == SERVER_CLOSE_COMMAND => {
                            let frame = CloseFrame {
                                code: CloseCode::from(SERVER_CLOSE_CODE),
                                reason: "bye".into(),
                            };
                            if write.send(Message::Close(Some(frame))).await.is_err() {
                                break;
                            }
                            closing = true;
                        }
                        Some(Ok(msg)) => {
                            // Frames arriving after our close frame are dropped
                            if !closing && (msg.is_text() || msg.is_binary()) {
                                // Echo the message back
                                if write.send(msg).await.is_err() {
                                    break;
                                }
                            }
                            // Close replies are flushed by the next read
                        }
                        Some(Err(_)) | None => break,
                    }
                }
                _ = shutdown.notified() => {
                    break;
                }
            }
        }
    }

    /// Get the WebSocket URL for this server
    pub fn ws_url(&self) -> Url {
        Url::parse(&format!("ws://{}/echo", self.addr)).unwrap()
    }

    /// Value of a handshake header the server has seen, if any
    pub fn seen_header(&self, name: &str) -> Option<String> {
        let name = name.to_ascii_lowercase();
        self.seen_headers
            .lock()
            .iter()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.clone())
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockWsServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// A loopback address nothing listens on
pub async fn refused_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    Url::parse(&format!("ws://{}/", addr)).unwrap()
}

/// Everything a recorder callback can observe
#[derive(Debug, Clone, PartialEq)]
pub enum Recorded {
    Open,
    Closed { code: u16, reason: String, was_clean: bool },
    Errored(String),
    Text(String),
    Bytes(Vec<u8>),
}

/// Attach forwarding callbacks for all five slots
pub fn recorder(builder: ConnectionBuilder) -> (ConnectionBuilder, mpsc::UnboundedReceiver<Recorded>) {
    let (tx, rx) = mpsc::unbounded_channel();

    let open_tx = tx.clone();
    let closed_tx = tx.clone();
    let errored_tx = tx.clone();
    let text_tx = tx.clone();
    let bytes_tx = tx;

    let builder = builder
        .on_open(move |_: &Event| {
            let _ = open_tx.send(Recorded::Open);
        })
        .on_closed(move |event: &Event| {
            if let Event::Close { code, reason, was_clean } = event {
                let _ = closed_tx.send(Recorded::Closed {
                    code: *code,
                    reason: reason.clone(),
                    was_clean: *was_clean,
                });
            }
        })
        .on_errored(move |event: &Event| {
            if let Event::Error { message } = event {
                let _ = errored_tx.send(Recorded::Errored(message.clone()));
            }
        })
        .on_text(move |text: &str, _: &Event| {
            let _ = text_tx.send(Recorded::Text(text.to_string()));
        })
        .on_bytes(move |bytes: &[u8], _: &Event| {
            let _ = bytes_tx.send(Recorded::Bytes(bytes.to_vec()));
        });

    (builder, rx)
}

/// Wait for the next recorded event, failing the test after five seconds
pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<Recorded>) -> Recorded {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Socket state the test can drive directly
#[derive(Default)]
pub struct MockSocketState {
    pub ready_state: AtomicU16,
    pub buffered: AtomicU64,
    pub activated: AtomicBool,
    pub url: Mutex<String>,
    pub protocol: Mutex<String>,
    pub extensions: Mutex<String>,
    pub listeners: Mutex<Vec<Listener>>,
    pub sent: Mutex<Vec<Payload>>,
    pub closes: Mutex<Vec<(u16, String)>>,
}

impl MockSocketState {
    /// Fire an event the way a transport would
    pub fn fire(&self, payload: Option<&Payload>, event: &Event) {
        let kind = event.kind();
        let listeners: Vec<Listener> = self
            .listeners
            .lock()
            .iter()
            .filter(|listener| listener.kind() == kind)
            .cloned()
            .collect();
        for listener in &listeners {
            listener.fire(payload, event);
        }
    }

    pub fn fire_text(&self, text: &str) {
        let event = Event::Message { origin: "ws://mock".to_string() };
        self.fire(Some(&Payload::Text(text.to_string())), &event);
    }

    pub fn fire_bytes(&self, bytes: &[u8]) {
        let event = Event::Message { origin: "ws://mock".to_string() };
        self.fire(Some(&Payload::Binary(bytes.to_vec())), &event);
    }

    pub fn set_ready_state(&self, code: u16) {
        self.ready_state.store(code, Ordering::Release);
    }

    /// Drain queued bytes as if the network accepted them
    pub fn drain(&self) {
        self.buffered.store(0, Ordering::Release);
    }

    pub fn listener_kinds(&self) -> Vec<EventKind> {
        self.listeners.lock().iter().map(Listener::kind).collect()
    }
}

/// Socket handed out by `RecordingTransport`
pub struct MockSocket {
    state: Arc<MockSocketState>,
}

impl Socket for MockSocket {
    fn add_listener(&self, listener: Listener) {
        assert!(
            !self.state.activated.load(Ordering::Acquire),
            "listener registered after activation"
        );
        self.state.listeners.lock().push(listener);
    }

    fn activate(&self) {
        self.state.activated.store(true, Ordering::Release);
    }

    fn ready_state(&self) -> u16 {
        self.state.ready_state.load(Ordering::Acquire)
    }

    fn protocol(&self) -> String {
        self.state.protocol.lock().clone()
    }

    fn extensions(&self) -> String {
        self.state.extensions.lock().clone()
    }

    fn buffered_amount(&self) -> u64 {
        self.state.buffered.load(Ordering::Acquire)
    }

    fn url(&self) -> String {
        self.state.url.lock().clone()
    }

    fn send(&self, payload: Payload) -> Result<(), TransportError> {
        if self.ready_state() == 0 {
            return Err(TransportError::InvalidState);
        }
        self.state.buffered.fetch_add(payload.len() as u64, Ordering::AcqRel);
        self.state.sent.lock().push(payload);
        Ok(())
    }

    fn close(&self, code: u16, reason: &str) -> Result<(), TransportError> {
        validate::check_close(code, reason)?;
        if self.ready_state() < 2 {
            self.state.set_ready_state(2);
        }
        self.state.closes.lock().push((code, reason.to_string()));
        Ok(())
    }
}

/// Transport that validates like the real one but never touches the network
#[derive(Default)]
pub struct RecordingTransport {
    pub sockets: Mutex<Vec<Arc<MockSocketState>>>,
    pub constructed: AtomicUsize,
    pub offered: Mutex<Vec<Vec<String>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// State of the most recently constructed socket
    pub fn last(&self) -> Arc<MockSocketState> {
        Arc::clone(self.sockets.lock().last().expect("no socket constructed"))
    }

    pub fn constructed(&self) -> usize {
        self.constructed.load(Ordering::Acquire)
    }
}

impl Transport for RecordingTransport {
    type Socket = MockSocket;

    fn construct(&self, url: &str, protocols: &[String]) -> Result<MockSocket, TransportError> {
        let resolved = validate::resolve_url(url)?;
        validate::check_protocols(protocols)?;

        let state = Arc::new(MockSocketState::default());
        *state.url.lock() = resolved.to_string();

        self.sockets.lock().push(Arc::clone(&state));
        self.offered.lock().push(protocols.to_vec());
        self.constructed.fetch_add(1, Ordering::AcqRel);

        Ok(MockSocket { state })
    }
}
