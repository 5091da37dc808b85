//! Callback capabilities
//!
//! One trait per callback signature so that lifecycle callbacks, text
//! callbacks and bytes callbacks can never be confused at the type level.
//! Closures implement the matching trait automatically.
//!
//! # Example
//!
//! ```ignore
//! struct TickerHandler {
//!     ticks: Arc<AtomicU64>,
//! }
//!
//! impl TextHandler for TickerHandler {
//!     fn handle(&self, text: &str, _event: &Event) {
//!         if text.starts_with("tick") {
//!             self.ticks.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//! }
//!
//! let builder = ConnectionBuilder::new(url)
//!     .on_open(|_: &Event| info!("connected"))
//!     .on_text(TickerHandler { ticks });
//! ```

use crate::traits::event::Event;

/// Handles open, closed and errored events
///
/// Runs on the transport's event task, after `open` has returned.
/// Re-entrant calls on the connection are allowed.
pub trait EventHandler: Send + Sync + 'static {
    fn handle(&self, event: &Event);
}

/// Handles text frames
pub trait TextHandler: Send + Sync + 'static {
    fn handle(&self, text: &str, event: &Event);
}

/// Handles binary frames
pub trait BytesHandler: Send + Sync + 'static {
    fn handle(&self, bytes: &[u8], event: &Event);
}

impl<F> EventHandler for F
where
    F: Fn(&Event) + Send + Sync + 'static,
{
    fn handle(&self, event: &Event) {
        self(event)
    }
}

impl<F> TextHandler for F
where
    F: Fn(&str, &Event) + Send + Sync + 'static,
{
    fn handle(&self, text: &str, event: &Event) {
        self(text, event)
    }
}

impl<F> BytesHandler for F
where
    F: Fn(&[u8], &Event) + Send + Sync + 'static,
{
    fn handle(&self, bytes: &[u8], event: &Event) {
        self(bytes, event)
    }
}
