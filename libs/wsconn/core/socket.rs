//! Built-in transport on top of tokio-tungstenite
//!
//! # Architecture
//!
//! ```text
//! WsSocket (caller side)                 Socket task (tokio spawn)
//! ┌────────────────────┐                 ┌──────────────────────────────┐
//! │ send / close ──────┼── command ─────>│ wait for activation          │
//! │ activate ──────────┼── oneshot ─────>│ handshake (timeout, headers) │
//! │ ready_state ───┐   │                 │ select! { read, commands }   │
//! │ buffered ──────┤   │                 │ dispatch events to listeners │
//! └────────────────┼───┘                 └──────────────┬───────────────┘
//!                  └──── SocketShared (atomics + locks) ┘
//! ```
//!
//! The task does nothing until [`Socket::activate`] is called, so listeners
//! registered between construction and activation never miss an event.
//! Dropping the handle closes the command channel, which makes the task
//! send a `1001 Going Away` close frame and wind down on its own.

use crate::config::SocketConfig;
use crate::ready_state::{AtomicReadyState, ReadyState};
use crate::traits::*;
use crate::validate;
use futures::stream::SplitStream;
use futures::{SinkExt, StreamExt};
use parking_lot::{Mutex, RwLock};
use std::borrow::Cow;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::handshake::client::{Request, Response};
use tokio_tungstenite::tungstenite::http;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::{Error as WsError, Message};
use tokio_tungstenite::{connect_async_with_config, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, warn};
use url::Url;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Close code reported when the peer's close frame carried no status
const CLOSE_NO_STATUS: u16 = 1005;

/// Close code reported when the connection ended without a close frame
const CLOSE_ABNORMAL: u16 = 1006;

/// How long a failed write waits for an already-sent close frame
const CLOSE_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Commands from the socket handle to its task
#[derive(Debug)]
enum SocketCommand {
    /// Write a frame; the length is released from the buffered count once written
    Send(Message, u64),
    /// Start the closing handshake
    Close { code: u16, reason: String },
}

/// State shared between a socket handle and its task
struct SocketShared {
    state: AtomicReadyState,
    buffered: AtomicU64,
    url: Url,
    origin: String,
    protocol: RwLock<String>,
    extensions: RwLock<String>,
    listeners: Mutex<Vec<Listener>>,
}

impl SocketShared {
    fn new(url: Url) -> Self {
        let origin = url.origin().ascii_serialization();
        Self {
            state: AtomicReadyState::new(ReadyState::Connecting),
            buffered: AtomicU64::new(0),
            url,
            origin,
            protocol: RwLock::new(String::new()),
            extensions: RwLock::new(String::new()),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Deliver an event to every listener of its kind, in registration order
    ///
    /// Listeners are invoked outside the lock so callbacks may re-enter.
    fn dispatch(&self, payload: Option<&Payload>, event: &Event) {
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

    fn dispatch_message(&self, payload: Payload) {
        let event = Event::Message {
            origin: self.origin.clone(),
        };
        self.dispatch(Some(&payload), &event);
    }

    /// Tear down after a failure: closed state, then error and abnormal close events
    fn fail(&self, message: String) {
        self.state.advance(ReadyState::Closed);
        self.dispatch(None, &Event::Error { message });
        self.dispatch(
            None,
            &Event::Close {
                code: CLOSE_ABNORMAL,
                reason: String::new(),
                was_clean: false,
            },
        );
    }
}

/// Transport that opens real WebSocket connections with tokio-tungstenite
///
/// Socket tasks are spawned on the runtime configured in [`SocketConfig`],
/// or on the current runtime.
///
/// # Panics
/// `construct` panics when no runtime is configured and it is called from
/// outside a Tokio runtime, the same way `tokio::spawn` does.
#[derive(Debug, Clone, Default)]
pub struct WsTransport {
    config: Arc<SocketConfig>,
}

impl WsTransport {
    pub fn new(config: SocketConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &SocketConfig {
        &self.config
    }
}

impl Transport for WsTransport {
    type Socket = WsSocket;

    fn construct(&self, url: &str, protocols: &[String]) -> Result<WsSocket, TransportError> {
        let url = validate::resolve_url(url)?;
        validate::check_protocols(protocols)?;

        let shared = Arc::new(SocketShared::new(url));
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (start_tx, start_rx) = oneshot::channel();

        let runtime = self
            .config
            .runtime
            .clone()
            .unwrap_or_else(tokio::runtime::Handle::current);

        runtime.spawn(run_socket(
            Arc::clone(&shared),
            Arc::clone(&self.config),
            protocols.to_vec(),
            command_rx,
            start_rx,
        ));

        debug!("Constructed socket for {}", shared.url);

        Ok(WsSocket {
            shared,
            command_tx,
            start: Mutex::new(Some(start_tx)),
        })
    }
}

/// A socket created by [`WsTransport`]
pub struct WsSocket {
    shared: Arc<SocketShared>,
    command_tx: mpsc::UnboundedSender<SocketCommand>,
    start: Mutex<Option<oneshot::Sender<()>>>,
}

impl Socket for WsSocket {
    fn add_listener(&self, listener: Listener) {
        self.shared.listeners.lock().push(listener);
    }

    fn activate(&self) {
        if let Some(start) = self.start.lock().take() {
            let _ = start.send(());
        }
    }

    #[inline]
    fn ready_state(&self) -> u16 {
        self.shared.state.get().code()
    }

    fn protocol(&self) -> String {
        self.shared.protocol.read().clone()
    }

    fn extensions(&self) -> String {
        self.shared.extensions.read().clone()
    }

    #[inline]
    fn buffered_amount(&self) -> u64 {
        self.shared.buffered.load(Ordering::Acquire)
    }

    fn url(&self) -> String {
        self.shared.url.to_string()
    }

    fn send(&self, payload: Payload) -> Result<(), TransportError> {
        let len = payload.len() as u64;

        match self.shared.state.get() {
            ReadyState::Connecting => Err(TransportError::InvalidState),
            ReadyState::Open => {
                self.shared.buffered.fetch_add(len, Ordering::AcqRel);
                let message = match payload {
                    Payload::Text(text) => Message::Text(text),
                    Payload::Binary(data) => Message::Binary(data),
                };
                if self.command_tx.send(SocketCommand::Send(message, len)).is_err() {
                    debug!("Socket task for {} has exited, frame dropped", self.shared.url);
                }
                Ok(())
            }
            ReadyState::Closing | ReadyState::Closed => {
                // Accepted but never written, so the count keeps growing
                self.shared.buffered.fetch_add(len, Ordering::AcqRel);
                debug!(
                    "Discarding {} byte frame on {} socket {}",
                    len,
                    self.shared.state.get(),
                    self.shared.url
                );
                Ok(())
            }
        }
    }

    fn close(&self, code: u16, reason: &str) -> Result<(), TransportError> {
        validate::check_close(code, reason)?;

        let previous = self.shared.state.advance(ReadyState::Closing);
        if previous < ReadyState::Closing {
            debug!("Closing {} with code {} (was {})", self.shared.url, code, previous);
            let _ = self.command_tx.send(SocketCommand::Close {
                code,
                reason: reason.to_string(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for WsSocket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WsSocket")
            .field("url", &self.shared.url.as_str())
            .field("state", &self.shared.state.get())
            .field("buffered", &self.buffered_amount())
            .finish()
    }
}

/// Socket task: handshake, then message loop
async fn run_socket(
    shared: Arc<SocketShared>,
    config: Arc<SocketConfig>,
    protocols: Vec<String>,
    mut command_rx: mpsc::UnboundedReceiver<SocketCommand>,
    start_rx: oneshot::Receiver<()>,
) {
    if start_rx.await.is_err() {
        debug!("Socket for {} dropped before activation", shared.url);
        shared.state.advance(ReadyState::Closed);
        return;
    }

    if shared.state.get() >= ReadyState::Closing {
        shared.fail("connection closed before it was established".to_string());
        return;
    }

    let request = match build_request(&shared.url, &protocols, &config).await {
        Ok(request) => request,
        Err(e) => {
            error!("Failed to build handshake request for {}: {}", shared.url, e);
            shared.fail(e);
            return;
        }
    };

    debug!("Connecting to {}", shared.url);

    let connect = tokio::time::timeout(
        config.connect_timeout,
        connect_async_with_config(request, Some(config.websocket_config()), config.disable_nagle),
    );

    // Sends are refused while connecting, so any command here is a close
    // (or the handle being dropped)
    let outcome = tokio::select! {
        result = connect => result,
        _ = command_rx.recv() => {
            debug!("Connection to {} aborted during handshake", shared.url);
            shared.fail("connection closed before it was established".to_string());
            return;
        }
    };

    let (mut ws_stream, response) = match outcome {
        Ok(Ok(pair)) => pair,
        Ok(Err(e)) => {
            error!("Failed to connect to {}: {}", shared.url, e);
            shared.fail(e.to_string());
            return;
        }
        Err(_) => {
            error!("Handshake with {} timed out", shared.url);
            shared.fail(format!(
                "opening handshake timed out after {:?}",
                config.connect_timeout
            ));
            return;
        }
    };

    *shared.protocol.write() = header_value(&response, "sec-websocket-protocol");
    *shared.extensions.write() = header_value(&response, "sec-websocket-extensions");

    if shared
        .state
        .compare_exchange(ReadyState::Connecting, ReadyState::Open)
        .is_err()
    {
        debug!("Close requested while handshake with {} completed", shared.url);
        let _ = ws_stream.close(None).await;
        shared.fail("connection closed before it was established".to_string());
        return;
    }

    info!("Connected to {}", shared.url);
    shared.dispatch(None, &Event::Open);

    message_loop(ws_stream, &shared, &mut command_rx).await;

    debug!("Socket task for {} exiting", shared.url);
}

/// Main message processing loop
async fn message_loop(
    ws_stream: WsStream,
    shared: &SocketShared,
    command_rx: &mut mpsc::UnboundedReceiver<SocketCommand>,
) {
    let (mut write, mut read) = ws_stream.split();
    let mut received_close: Option<(u16, String)> = None;
    let mut handle_alive = true;

    loop {
        tokio::select! {
            msg = read.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => shared.dispatch_message(Payload::Text(text)),
                    Some(Ok(Message::Binary(data))) => shared.dispatch_message(Payload::Binary(data)),
                    Some(Ok(Message::Close(frame))) => {
                        let (code, reason) = close_parts(frame);
                        debug!("Received close frame {} from {}", code, shared.url);
                        shared.state.advance(ReadyState::Closing);
                        received_close = Some((code, reason));
                    }
                    // Ping/pong are answered by tungstenite
                    Some(Ok(_)) => {}
                    Some(Err(WsError::ConnectionClosed)) | None => break,
                    Some(Err(e)) if received_close.is_some() => {
                        debug!("Error after close frame from {}: {}", shared.url, e);
                        break;
                    }
                    Some(Err(e)) => {
                        error!("WebSocket error on {}: {}", shared.url, e);
                        shared.fail(e.to_string());
                        return;
                    }
                }
            }

            cmd = command_rx.recv(), if handle_alive => {
                match cmd {
                    Some(SocketCommand::Send(message, len)) => {
                        // Queued before the peer's close frame arrived; it stays counted
                        if received_close.is_some() {
                            debug!("Dropping {} byte frame for closing peer {}", len, shared.url);
                            continue;
                        }
                        if let Err(e) = write.send(message).await {
                            match drain_for_close(&mut read, shared).await {
                                Some(close) => {
                                    debug!("Write to {} failed after peer closed: {}", shared.url, e);
                                    shared.state.advance(ReadyState::Closing);
                                    received_close = Some(close);
                                    break;
                                }
                                None => {
                                    error!("Failed to write frame to {}: {}", shared.url, e);
                                    shared.fail(e.to_string());
                                    return;
                                }
                            }
                        }
                        shared.buffered.fetch_sub(len, Ordering::AcqRel);
                    }
                    Some(SocketCommand::Close { code, reason }) => {
                        let frame = CloseFrame {
                            code: CloseCode::from(code),
                            reason: Cow::Owned(reason),
                        };
                        if let Err(e) = write.send(Message::Close(Some(frame))).await {
                            warn!("Failed to send close frame to {}: {}", shared.url, e);
                        }
                    }
                    None => {
                        debug!("Socket handle for {} dropped, closing", shared.url);
                        handle_alive = false;
                        if shared.state.advance(ReadyState::Closing) < ReadyState::Closing {
                            let frame = CloseFrame {
                                code: CloseCode::Away,
                                reason: Cow::Borrowed(""),
                            };
                            let _ = write.send(Message::Close(Some(frame))).await;
                        }
                    }
                }
            }
        }
    }

    shared.state.advance(ReadyState::Closed);

    match received_close {
        Some((code, reason)) => {
            info!("Connection to {} closed ({})", shared.url, code);
            shared.dispatch(
                None,
                &Event::Close {
                    code,
                    reason,
                    was_clean: true,
                },
            );
        }
        None => {
            warn!("Connection to {} ended without a close frame", shared.url);
            shared.dispatch(
                None,
                &Event::Error {
                    message: "connection ended without a closing handshake".to_string(),
                },
            );
            shared.dispatch(
                None,
                &Event::Close {
                    code: CLOSE_ABNORMAL,
                    reason: String::new(),
                    was_clean: false,
                },
            );
        }
    }
}

/// Read whatever the peer sent before a failed write, looking for its close frame
///
/// Data frames found on the way are still delivered.
async fn drain_for_close(
    read: &mut SplitStream<WsStream>,
    shared: &SocketShared,
) -> Option<(u16, String)> {
    let drain = async {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => shared.dispatch_message(Payload::Text(text)),
                Ok(Message::Binary(data)) => shared.dispatch_message(Payload::Binary(data)),
                Ok(Message::Close(frame)) => return Some(close_parts(frame)),
                Ok(_) => {}
                Err(_) => return None,
            }
        }
        None
    };

    tokio::time::timeout(CLOSE_DRAIN_TIMEOUT, drain)
        .await
        .ok()
        .flatten()
}

fn close_parts(frame: Option<CloseFrame<'static>>) -> (u16, String) {
    frame
        .map(|f| (u16::from(f.code), f.reason.into_owned()))
        .unwrap_or((CLOSE_NO_STATUS, String::new()))
}

/// Build the handshake request with sub-protocols and provider headers
async fn build_request(
    url: &Url,
    protocols: &[String],
    config: &SocketConfig,
) -> Result<Request, String> {
    let mut request = url
        .as_str()
        .into_client_request()
        .map_err(|e| e.to_string())?;

    if !protocols.is_empty() {
        let value = http::HeaderValue::from_str(&protocols.join(", ")).map_err(|e| e.to_string())?;
        request
            .headers_mut()
            .insert(http::header::SEC_WEBSOCKET_PROTOCOL, value);
    }

    if let Some(ref provider) = config.headers {
        for (key, value) in provider.get_headers().await {
            match key.parse::<http::header::HeaderName>() {
                Ok(header_name) => match value.parse::<http::header::HeaderValue>() {
                    Ok(header_value) => {
                        request.headers_mut().insert(header_name, header_value);
                    }
                    Err(_) => {
                        warn!("Invalid header value for key '{}': {}", key, value);
                    }
                },
                Err(_) => {
                    warn!("Invalid header name: {}", key);
                }
            }
        }
    }

    Ok(request)
}

fn header_value(response: &Response, name: &str) -> String {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}
