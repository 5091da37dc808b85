//! Graceful shutdown on Ctrl+C

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::signal;
use tokio::sync::Notify;
use tracing::info;

/// Tracks whether the process should keep running
pub struct ShutdownManager {
    running: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownManager {
    /// Create a new shutdown manager in the running state
    pub fn new() -> Self {
        Self {
            running: Arc::new(AtomicBool::new(true)),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Spawn a Ctrl+C signal handler that triggers shutdown
    pub fn spawn_signal_handler(&self) {
        let running = Arc::clone(&self.running);
        let notify = Arc::clone(&self.notify);
        tokio::spawn(async move {
            if signal::ctrl_c().await.is_ok() {
                info!("");
                info!("Received shutdown signal (Ctrl+C)");
                info!("Shutting down gracefully...");
                running.store(false, Ordering::Release);
                notify.notify_waiters();
            }
        });
    }

    /// Trigger shutdown without a signal
    pub fn trigger(&self) {
        self.running.store(false, Ordering::Release);
        self.notify.notify_waiters();
    }

    /// Check if the process should continue running
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Wait until shutdown is triggered
    pub async fn wait(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        // Register before checking the flag so a concurrent trigger is not lost
        notified.as_mut().enable();
        if !self.is_running() {
            return;
        }
        notified.await;
    }
}

impl Default for ShutdownManager {
    fn default() -> Self {
        Self::new()
    }
}
