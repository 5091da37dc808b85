//! # wsconn core
//!
//! The connection builder, the live connection handle, the ready-state
//! mapping and the built-in tokio-tungstenite transport.
//!
//! ## Example
//!
//! ```rust,ignore
//! use wsconn::{ConnectionBuilder, Event, ReadyState};
//! use url::Url;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let connection = ConnectionBuilder::new(Url::parse("wss://echo.example.com")?)
//!         .with_protocols(["chat"])
//!         .on_open(|_: &Event| tracing::info!("open"))
//!         .on_text(|text: &str, _: &Event| println!("<- {}", text))
//!         .on_closed(|event: &Event| tracing::info!("closed: {:?}", event))
//!         .open()?;
//!
//!     // Sends before the open event fire are refused
//!     assert_eq!(connection.ready_state(), ReadyState::Connecting);
//!
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod config;
pub mod connection;
pub mod ready_state;
pub mod socket;
pub mod validate;

// Re-export main types
pub use builder::ConnectionBuilder;
pub use config::SocketConfig;
pub use connection::Connection;
pub use ready_state::{AtomicReadyState, ReadyState};
pub use socket::{WsSocket, WsTransport};

// Re-export traits for convenience
pub use crate::traits::*;

/// Start a builder for `endpoint`
///
/// Convenience for [`ConnectionBuilder::new`].
pub fn builder(endpoint: url::Url) -> ConnectionBuilder {
    ConnectionBuilder::new(endpoint)
}
