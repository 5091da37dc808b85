use crate::ready_state::ReadyState;
use crate::socket::WsSocket;
use crate::traits::*;
use std::fmt;
use url::Url;

/// A live WebSocket connection
///
/// Produced by [`ConnectionBuilder::open`](crate::ConnectionBuilder::open).
/// Every query reads through to the socket at call time, so values are never
/// stale. Events arrive through the callbacks configured on the builder.
///
/// The connection owns its socket exclusively. Dropping it is the only
/// teardown; the transport takes care of the rest.
pub struct Connection<S: Socket = WsSocket> {
    socket: S,
}

impl<S: Socket> Connection<S> {
    pub(crate) fn new(socket: S) -> Self {
        Self { socket }
    }

    /// Current lifecycle state
    ///
    /// # Panics
    /// If the transport reports a code outside 0..=3.
    pub fn ready_state(&self) -> ReadyState {
        let code = self.socket.ready_state();
        ReadyState::from_code(code)
            .unwrap_or_else(|| panic!("transport reported unknown ready state code {}", code))
    }

    /// Negotiated sub-protocol, empty if the server selected none
    pub fn protocol(&self) -> String {
        self.socket.protocol()
    }

    /// Negotiated extensions, empty if none
    pub fn extensions(&self) -> String {
        self.socket.extensions()
    }

    /// Bytes queued by `send` calls that have not reached the network yet
    ///
    /// Sends after `close` are still counted, so this keeps growing on a
    /// closed connection.
    pub fn buffered_amount(&self) -> u64 {
        self.socket.buffered_amount()
    }

    /// Resolved absolute URI of the connection
    ///
    /// # Panics
    /// If the transport reports a URL that does not parse.
    pub fn uri(&self) -> Url {
        let raw = self.socket.url();
        Url::parse(&raw)
            .unwrap_or_else(|e| panic!("transport reported unparsable URL '{}': {}", raw, e))
    }

    /// Send a text frame
    ///
    /// Returns the same connection so sends can be chained.
    ///
    /// # Errors
    /// * `SendError::InvalidState` - the opening handshake has not completed
    pub fn send(&self, text: impl Into<String>) -> Result<&Self, SendError> {
        self.send_payload(Payload::Text(text.into()))
    }

    /// Send a binary frame
    ///
    /// # Errors
    /// * `SendError::InvalidState` - the opening handshake has not completed
    pub fn send_bytes(&self, payload: impl Into<Vec<u8>>) -> Result<&Self, SendError> {
        self.send_payload(Payload::Binary(payload.into()))
    }

    /// Start the closing handshake without waiting for it to finish
    ///
    /// # Errors
    /// * `CloseError::InvalidAccess` - code is neither 1000 nor in 3000..=4999
    /// * `CloseError::ReasonSyntax` - reason is longer than 123 UTF-8 bytes
    pub fn close(&self, code: u16, reason: &str) -> Result<(), CloseError> {
        match self.socket.close(code, reason) {
            Ok(()) => Ok(()),
            Err(TransportError::InvalidAccess(code)) => Err(CloseError::InvalidAccess(code)),
            Err(TransportError::ReasonSyntax(len)) => Err(CloseError::ReasonSyntax(len)),
            Err(other) => panic!("transport rejected close with unexpected error: {}", other),
        }
    }

    fn send_payload(&self, payload: Payload) -> Result<&Self, SendError> {
        match self.socket.send(payload) {
            Ok(()) => Ok(self),
            Err(TransportError::InvalidState) => Err(SendError::InvalidState),
            Err(other) => panic!("transport rejected send with unexpected error: {}", other),
        }
    }
}

impl<S: Socket + fmt::Debug> fmt::Debug for Connection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("socket", &self.socket)
            .finish()
    }
}
