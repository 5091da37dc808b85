//! # wsconn
//!
//! A client-side WebSocket connection facade with typed callbacks.
//!
//! ## Features
//!
//! - **Value builder**: Clone-and-branch configuration, nothing validated until `open`
//! - **Typed callbacks**: Separate capabilities for lifecycle, text and binary events
//! - **Read-through queries**: Ready state, protocol, extensions, buffered bytes, URI
//! - **Closed error taxonomy**: One small error enum per fallible operation
//! - **Pluggable transport**: Built-in tokio-tungstenite socket, or bring your own

pub mod traits;
pub mod core;

// Re-export all traits
pub use traits::*;

// Re-export core functionality
pub use self::core::{
    builder, config, connection, ready_state, socket, validate,
    builder::ConnectionBuilder,
    config::SocketConfig,
    connection::Connection,
    ready_state::{AtomicReadyState, ReadyState},
    socket::{WsSocket, WsTransport},
};
