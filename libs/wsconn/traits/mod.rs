//! # wsconn Traits
//!
//! Core traits and types shared by the connection layer and transports:
//!
//! - **Transport / Socket**: The collaborator contract the connection drives
//! - **EventHandler / TextHandler / BytesHandler**: Typed callback capabilities
//! - **Event / Payload / Listener**: What sockets deliver and accept
//! - **HeaderProvider**: Extra headers for the opening handshake
//! - **Errors**: The stage-scoped error taxonomy
//!
//! ## Example
//!
//! ```rust,ignore
//! use wsconn::traits::*;
//!
//! struct Logger;
//!
//! impl EventHandler for Logger {
//!     fn handle(&self, event: &Event) {
//!         tracing::info!("socket event: {:?}", event);
//!     }
//! }
//! ```

pub mod error;
pub mod event;
pub mod handler;
pub mod headers;
pub mod transport;

// Re-export commonly used types
pub use error::{CloseError, OpenError, SendError, TransportError};
pub use event::{Event, EventCallback, EventKind, Listener, MessageCallback, Payload};
pub use handler::{BytesHandler, EventHandler, TextHandler};
pub use headers::{HeaderProvider, Headers, NoHeaders};
pub use transport::{Socket, Transport};
