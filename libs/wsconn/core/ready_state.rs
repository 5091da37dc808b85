//! Ready-state mapping
//!
//! Sockets report their lifecycle as a numeric code. The connection layer
//! maps it onto [`ReadyState`] at the boundary; an unknown code is an
//! invariant violation.
//!
//! [`AtomicReadyState`] is the lock-free cell the built-in transport keeps
//! the code in. Transitions only move forward:
//!
//! ```text
//! Connecting ──> Open ──> Closing ──> Closed
//!     │                      ▲           ▲
//!     └──────────────────────┴───────────┘
//! ```

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ReadyState {
    Connecting = 0,
    Open = 1,
    Closing = 2,
    Closed = 3,
}

impl ReadyState {
    /// Map a transport's numeric code onto a state
    #[inline]
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0 => Some(ReadyState::Connecting),
            1 => Some(ReadyState::Open),
            2 => Some(ReadyState::Closing),
            3 => Some(ReadyState::Closed),
            _ => None,
        }
    }

    #[inline]
    pub fn code(self) -> u16 {
        self as u16
    }

    #[inline]
    fn from_u8(value: u8) -> Self {
        match value {
            0 => ReadyState::Connecting,
            1 => ReadyState::Open,
            2 => ReadyState::Closing,
            _ => ReadyState::Closed,
        }
    }
}

impl fmt::Display for ReadyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ReadyState::Connecting => "connecting",
            ReadyState::Open => "open",
            ReadyState::Closing => "closing",
            ReadyState::Closed => "closed",
        };
        f.write_str(name)
    }
}

/// Atomic ready-state cell shared between a socket handle and its I/O task
#[derive(Debug)]
pub struct AtomicReadyState {
    inner: AtomicU8,
}

impl AtomicReadyState {
    pub fn new(state: ReadyState) -> Self {
        Self {
            inner: AtomicU8::new(state as u8),
        }
    }

    #[inline]
    pub fn get(&self) -> ReadyState {
        ReadyState::from_u8(self.inner.load(Ordering::Acquire))
    }

    /// Unconditionally store a state
    #[inline]
    pub fn set(&self, state: ReadyState) {
        self.inner.store(state as u8, Ordering::Release);
    }

    /// Move forward to `state`; never moves backwards
    ///
    /// Returns the state held before the call.
    #[inline]
    pub fn advance(&self, state: ReadyState) -> ReadyState {
        ReadyState::from_u8(self.inner.fetch_max(state as u8, Ordering::AcqRel))
    }

    /// Transition from `current` to `new` only if the cell holds `current`
    #[inline]
    pub fn compare_exchange(
        &self,
        current: ReadyState,
        new: ReadyState,
    ) -> Result<ReadyState, ReadyState> {
        self.inner
            .compare_exchange(current as u8, new as u8, Ordering::AcqRel, Ordering::Acquire)
            .map(ReadyState::from_u8)
            .map_err(ReadyState::from_u8)
    }

    #[inline]
    pub fn is_connecting(&self) -> bool {
        self.get() == ReadyState::Connecting
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.get() == ReadyState::Open
    }

    #[inline]
    pub fn is_closing(&self) -> bool {
        self.get() == ReadyState::Closing
    }

    #[inline]
    pub fn is_closed(&self) -> bool {
        self.get() == ReadyState::Closed
    }
}

impl Default for AtomicReadyState {
    fn default() -> Self {
        Self::new(ReadyState::Connecting)
    }
}
