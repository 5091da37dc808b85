use crate::traits::error::TransportError;
use crate::traits::event::{Listener, Payload};

/// Factory for live sockets
///
/// `construct` validates its arguments and returns a socket that is in the
/// connecting state. Implementations must not deliver any event before
/// [`Socket::activate`] has been called.
pub trait Transport {
    type Socket: Socket;

    /// Create a socket for `url`, offering `protocols` in preference order
    ///
    /// # Errors
    /// * `TransportError::Syntax` - the URL or the protocol list is rejected
    fn construct(&self, url: &str, protocols: &[String]) -> Result<Self::Socket, TransportError>;
}

/// A live transport socket
///
/// Every query is an instantaneous read of the socket's current view and
/// never blocks. `ready_state` reports the numeric lifecycle code
/// (0 connecting, 1 open, 2 closing, 3 closed).
pub trait Socket: Send + Sync + 'static {
    /// Register a listener; same-kind listeners fire in registration order
    fn add_listener(&self, listener: Listener);

    /// Release the socket to start connecting and delivering events
    fn activate(&self) {}

    fn ready_state(&self) -> u16;

    /// Negotiated sub-protocol, empty when none was selected
    fn protocol(&self) -> String;

    /// Negotiated extensions as reported by the server, empty when none
    fn extensions(&self) -> String;

    /// Bytes accepted by `send` that have not been handed to the network yet
    fn buffered_amount(&self) -> u64;

    /// Resolved absolute URL of the socket
    fn url(&self) -> String;

    /// Queue a frame for transmission
    ///
    /// # Errors
    /// * `TransportError::InvalidState` - the socket is still connecting
    fn send(&self, payload: Payload) -> Result<(), TransportError>;

    /// Start the closing handshake
    ///
    /// # Errors
    /// * `TransportError::InvalidAccess` - code is not 1000 or 3000..=4999
    /// * `TransportError::ReasonSyntax` - reason is longer than 123 bytes
    fn close(&self, code: u16, reason: &str) -> Result<(), TransportError>;
}
