use crate::connection::Connection;
use crate::socket::{WsSocket, WsTransport};
use crate::traits::*;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Builder for a [`Connection`]
///
/// Holds the endpoint, the sub-protocols to offer and up to five optional
/// callbacks. Every configuration method consumes the builder and returns
/// the updated one; nothing is validated until [`open`](Self::open).
///
/// The builder is `Clone`, and callbacks are shared rather than copied, so a
/// base configuration can be branched to open several independent
/// connections:
///
/// ```ignore
/// let base = ConnectionBuilder::new(url)
///     .with_protocols(["v2.feed"])
///     .on_errored(|event: &Event| warn!("socket error: {:?}", event));
///
/// let trades = base.clone().on_text(TradeHandler::new()).open()?;
/// let books = base.on_text(BookHandler::new()).open()?;
/// ```
#[derive(Clone)]
pub struct ConnectionBuilder {
    endpoint: Url,
    protocols: Vec<String>,
    on_open: Option<Arc<dyn EventHandler>>,
    on_closed: Option<Arc<dyn EventHandler>>,
    on_errored: Option<Arc<dyn EventHandler>>,
    on_text: Option<Arc<dyn TextHandler>>,
    on_bytes: Option<Arc<dyn BytesHandler>>,
}

impl ConnectionBuilder {
    /// Create a builder for `endpoint` with no protocols and no callbacks
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            protocols: Vec::new(),
            on_open: None,
            on_closed: None,
            on_errored: None,
            on_text: None,
            on_bytes: None,
        }
    }

    /// Replace the sub-protocols offered, in preference order
    pub fn with_protocols<I, P>(mut self, protocols: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<String>,
    {
        self.protocols = protocols.into_iter().map(Into::into).collect();
        self
    }

    pub fn on_open(mut self, handler: impl EventHandler) -> Self {
        self.on_open = Some(Arc::new(handler));
        self
    }

    pub fn on_closed(mut self, handler: impl EventHandler) -> Self {
        self.on_closed = Some(Arc::new(handler));
        self
    }

    pub fn on_errored(mut self, handler: impl EventHandler) -> Self {
        self.on_errored = Some(Arc::new(handler));
        self
    }

    /// Set the callback for text frames; binary frames never reach it
    pub fn on_text(mut self, handler: impl TextHandler) -> Self {
        self.on_text = Some(Arc::new(handler));
        self
    }

    /// Set the callback for binary frames; text frames never reach it
    pub fn on_bytes(mut self, handler: impl BytesHandler) -> Self {
        self.on_bytes = Some(Arc::new(handler));
        self
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn protocols(&self) -> &[String] {
        &self.protocols
    }

    pub fn has_on_open(&self) -> bool {
        self.on_open.is_some()
    }

    pub fn has_on_closed(&self) -> bool {
        self.on_closed.is_some()
    }

    pub fn has_on_errored(&self) -> bool {
        self.on_errored.is_some()
    }

    pub fn has_on_text(&self) -> bool {
        self.on_text.is_some()
    }

    pub fn has_on_bytes(&self) -> bool {
        self.on_bytes.is_some()
    }

    /// Number of populated callback slots
    pub fn callback_count(&self) -> usize {
        [
            self.has_on_open(),
            self.has_on_closed(),
            self.has_on_errored(),
            self.has_on_text(),
            self.has_on_bytes(),
        ]
        .into_iter()
        .filter(|set| *set)
        .count()
    }

    /// Open the connection with the built-in tokio-tungstenite transport
    ///
    /// Must be called from within a Tokio runtime; use
    /// [`open_with`](Self::open_with) and a [`WsTransport`] configured with
    /// `SocketConfig::with_runtime` otherwise.
    ///
    /// # Errors
    /// * `OpenError::Syntax` - the endpoint scheme is not ws/wss/http/https,
    ///   the endpoint has a fragment, or a protocol is duplicated or not a
    ///   valid token
    pub fn open(self) -> Result<Connection<WsSocket>, OpenError> {
        self.open_with(&WsTransport::default())
    }

    /// Open the connection with any transport
    ///
    /// On success the callbacks are registered in the order open, closed,
    /// errored, text, bytes, and the socket is activated. No callback runs
    /// before this returns. On failure nothing is registered and no network
    /// activity takes place.
    pub fn open_with<T: Transport>(
        self,
        transport: &T,
    ) -> Result<Connection<T::Socket>, OpenError> {
        let socket = transport
            .construct(self.endpoint.as_str(), &self.protocols)
            .map_err(|e| {
                warn!("Rejected connection to {}: {}", self.endpoint, e);
                OpenError::from(e)
            })?;

        debug!(
            "Registering {} callbacks for {}",
            self.callback_count(),
            self.endpoint
        );

        if let Some(handler) = self.on_open {
            socket.add_listener(Listener::Open(Arc::new(move |event: &Event| {
                EventHandler::handle(handler.as_ref(), event)
            })));
        }

        if let Some(handler) = self.on_closed {
            socket.add_listener(Listener::Close(Arc::new(move |event: &Event| {
                EventHandler::handle(handler.as_ref(), event)
            })));
        }

        if let Some(handler) = self.on_errored {
            socket.add_listener(Listener::Error(Arc::new(move |event: &Event| {
                EventHandler::handle(handler.as_ref(), event)
            })));
        }

        if let Some(handler) = self.on_text {
            socket.add_listener(Listener::Message(Arc::new(
                move |payload: &Payload, event: &Event| {
                    if let Some(text) = payload.as_text() {
                        TextHandler::handle(handler.as_ref(), text, event);
                    }
                },
            )));
        }

        if let Some(handler) = self.on_bytes {
            socket.add_listener(Listener::Message(Arc::new(
                move |payload: &Payload, event: &Event| {
                    if let Some(bytes) = payload.as_binary() {
                        BytesHandler::handle(handler.as_ref(), bytes, event);
                    }
                },
            )));
        }

        socket.activate();

        Ok(Connection::new(socket))
    }
}

impl fmt::Debug for ConnectionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionBuilder")
            .field("endpoint", &self.endpoint.as_str())
            .field("protocols", &self.protocols)
            .field("on_open", &self.has_on_open())
            .field("on_closed", &self.has_on_closed())
            .field("on_errored", &self.has_on_errored())
            .field("on_text", &self.has_on_text())
            .field("on_bytes", &self.has_on_bytes())
            .finish()
    }
}
