use std::fmt;
use std::sync::Arc;

/// Frame payload handed to or received from a socket
/// Can be Text or Binary data
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    /// Get the payload as text, if it is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(s) => Some(s),
            Payload::Binary(_) => None,
        }
    }

    /// Get the payload as binary, if it is binary
    pub fn as_binary(&self) -> Option<&[u8]> {
        match self {
            Payload::Text(_) => None,
            Payload::Binary(b) => Some(b),
        }
    }

    /// Number of bytes this payload occupies on the wire (UTF-8 length for text)
    pub fn len(&self) -> usize {
        match self {
            Payload::Text(s) => s.len(),
            Payload::Binary(b) => b.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The four kinds of event a socket fires
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    Open,
    Message,
    Error,
    Close,
}

/// Event handle passed to every callback
///
/// Callers that need failure detail after a successful `open` inspect
/// the `Error` and `Close` variants delivered to their callbacks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Opening handshake completed
    Open,
    /// A data frame arrived from `origin`
    Message { origin: String },
    /// The transport failed; the connection is being torn down
    Error { message: String },
    /// The connection is closed
    Close {
        code: u16,
        reason: String,
        was_clean: bool,
    },
}

impl Event {
    pub fn kind(&self) -> EventKind {
        match self {
            Event::Open => EventKind::Open,
            Event::Message { .. } => EventKind::Message,
            Event::Error { .. } => EventKind::Error,
            Event::Close { .. } => EventKind::Close,
        }
    }

    /// Close code, if this is a close event
    pub fn close_code(&self) -> Option<u16> {
        match self {
            Event::Close { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Callback for open, close and error events
pub type EventCallback = Arc<dyn Fn(&Event) + Send + Sync>;

/// Callback for message events, receiving the raw payload
pub type MessageCallback = Arc<dyn Fn(&Payload, &Event) + Send + Sync>;

/// A listener registered on a socket, one variant per event kind
#[derive(Clone)]
pub enum Listener {
    Open(EventCallback),
    Close(EventCallback),
    Error(EventCallback),
    Message(MessageCallback),
}

impl Listener {
    pub fn kind(&self) -> EventKind {
        match self {
            Listener::Open(_) => EventKind::Open,
            Listener::Close(_) => EventKind::Close,
            Listener::Error(_) => EventKind::Error,
            Listener::Message(_) => EventKind::Message,
        }
    }

    /// Invoke the listener for an event
    ///
    /// Message listeners are skipped when no payload is supplied.
    pub fn fire(&self, payload: Option<&Payload>, event: &Event) {
        match (self, payload) {
            (Listener::Open(cb) | Listener::Close(cb) | Listener::Error(cb), _) => cb(event),
            (Listener::Message(cb), Some(payload)) => cb(payload, event),
            (Listener::Message(_), None) => {}
        }
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener::{:?}", self.kind())
    }
}
