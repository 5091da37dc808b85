use thiserror::Error;

/// Errors a transport reports back to the connection layer
///
/// These mirror the rejection kinds a WebSocket transport can raise
/// synchronously. `Connection` translates them into the stage-scoped
/// enums below; callers never see this type from the public operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Malformed URL or sub-protocol list
    #[error("Syntax error: {0}")]
    Syntax(String),

    /// Operation not allowed in the current ready state
    #[error("Invalid state: socket is still connecting")]
    InvalidState,

    /// Close code outside the permitted ranges
    #[error("Invalid close code: {0}")]
    InvalidAccess(u16),

    /// Close reason longer than a control frame allows
    #[error("Close reason too long: {0} bytes (max 123)")]
    ReasonSyntax(usize),
}

/// Failure to finalize a `ConnectionBuilder`
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OpenError {
    /// Endpoint or sub-protocol list rejected by the transport
    #[error("Open syntax error: {0}")]
    Syntax(String),
}

/// Failure to hand a payload to the transport
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendError {
    /// Send attempted before the opening handshake completed
    #[error("Invalid state: cannot send while connecting")]
    InvalidState,
}

/// Failure to start the closing handshake
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseError {
    /// Code is neither 1000 nor within 3000..=4999
    #[error("Invalid close code: {0}")]
    InvalidAccess(u16),

    /// Reason exceeds 123 bytes once UTF-8 encoded
    #[error("Close reason too long: {0} bytes (max 123)")]
    ReasonSyntax(usize),
}

impl From<TransportError> for OpenError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Syntax(msg) => OpenError::Syntax(msg),
            other => OpenError::Syntax(other.to_string()),
        }
    }
}
