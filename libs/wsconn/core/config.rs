use crate::traits::HeaderProvider;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;

const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 << 20;
const DEFAULT_MAX_FRAME_SIZE: usize = 16 << 20;

/// Configuration for sockets created by `WsTransport`
///
/// Shared by every socket the transport constructs.
#[derive(Clone)]
pub struct SocketConfig {
    /// Upper bound for TCP connect, TLS and opening handshake together
    pub(crate) connect_timeout: Duration,

    /// Largest incoming message accepted; `None` for unlimited
    pub(crate) max_message_size: Option<usize>,

    /// Largest incoming frame accepted; `None` for unlimited
    pub(crate) max_frame_size: Option<usize>,

    /// Set TCP_NODELAY on the underlying stream
    pub(crate) disable_nagle: bool,

    /// Optional provider of extra handshake headers
    pub(crate) headers: Option<Arc<dyn HeaderProvider>>,

    /// Runtime to spawn socket tasks on; defaults to the caller's runtime
    pub(crate) runtime: Option<tokio::runtime::Handle>,
}

impl SocketConfig {
    pub fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            max_message_size: Some(DEFAULT_MAX_MESSAGE_SIZE),
            max_frame_size: Some(DEFAULT_MAX_FRAME_SIZE),
            disable_nagle: false,
            headers: None,
            runtime: None,
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_max_message_size(mut self, size: Option<usize>) -> Self {
        self.max_message_size = size;
        self
    }

    pub fn with_max_frame_size(mut self, size: Option<usize>) -> Self {
        self.max_frame_size = size;
        self
    }

    pub fn with_disable_nagle(mut self, disable: bool) -> Self {
        self.disable_nagle = disable;
        self
    }

    pub fn with_headers(mut self, provider: impl HeaderProvider + 'static) -> Self {
        self.headers = Some(Arc::new(provider));
        self
    }

    /// Spawn socket tasks on `handle` instead of the current runtime
    ///
    /// Needed when sockets are constructed from outside a Tokio context.
    pub fn with_runtime(mut self, handle: tokio::runtime::Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    pub fn has_headers(&self) -> bool {
        self.headers.is_some()
    }

    /// Protocol limits in tungstenite's form
    pub(crate) fn websocket_config(&self) -> WebSocketConfig {
        let mut config = WebSocketConfig::default();
        config.max_message_size = self.max_message_size;
        config.max_frame_size = self.max_frame_size;
        config
    }
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SocketConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SocketConfig")
            .field("connect_timeout", &self.connect_timeout)
            .field("max_message_size", &self.max_message_size)
            .field("max_frame_size", &self.max_frame_size)
            .field("disable_nagle", &self.disable_nagle)
            .field("has_headers", &self.headers.is_some())
            .finish()
    }
}
