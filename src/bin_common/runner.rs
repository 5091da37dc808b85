//! Binary runner utilities
//!
//! Provides a standardized way to run binaries with proper
//! logging, heartbeat, and graceful shutdown.

use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use url::Url;

/// Initialize tracing, honouring `RUST_LOG` and defaulting to `info`
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_line_number(false)
        .init();
}

/// Configuration for running a binary application
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Name of the binary (for logging)
    pub name: String,
    /// Heartbeat interval in seconds
    pub heartbeat_interval_secs: u64,
    /// How long to wait for the closing handshake on shutdown
    pub close_timeout_secs: u64,
}

impl RunConfig {
    /// Create a new run configuration
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            heartbeat_interval_secs: 30,
            close_timeout_secs: 5,
        }
    }

    /// Set heartbeat interval
    pub fn with_heartbeat(mut self, secs: u64) -> Self {
        self.heartbeat_interval_secs = secs;
        self
    }

    /// Set close timeout
    pub fn with_close_timeout(mut self, secs: u64) -> Self {
        self.close_timeout_secs = secs;
        self
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_secs)
    }

    pub fn close_timeout(&self) -> Duration {
        Duration::from_secs(self.close_timeout_secs)
    }
}

/// Trait for client binaries driving a single connection
#[allow(async_fn_in_trait)]
pub trait BinaryRunner {
    /// Run the session until it ends or shutdown is requested
    async fn run(&mut self) -> anyhow::Result<()>;

    /// Get the run configuration
    fn config(&self) -> &RunConfig;

    /// Endpoint the session talks to
    fn endpoint(&self) -> &Url;

    /// One-line account of the session, logged on shutdown
    fn summary(&self) -> Option<String> {
        None
    }

    fn print_banner(&self) {
        let config = self.config();
        info!(
            "{} -> {} (heartbeat {:?}, close timeout {:?})",
            config.name,
            self.endpoint(),
            config.heartbeat_interval(),
            config.close_timeout()
        );
        info!("Ctrl+C sends a normal close (1000)");
    }

    fn print_shutdown(&self, result: &anyhow::Result<()>) {
        let config = self.config();
        match result {
            Ok(()) => info!("{} finished with {}", config.name, self.endpoint()),
            Err(e) => error!("{} stopped on {}: {:#}", config.name, self.endpoint(), e),
        }
        if let Some(summary) = self.summary() {
            info!("{}", summary);
        }
    }

    /// Banner, session, then the outcome and summary
    async fn execute(&mut self) -> anyhow::Result<()> {
        self.print_banner();
        let result = self.run().await;
        self.print_shutdown(&result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_config_builder() {
        let config = RunConfig::new("test-binary")
            .with_heartbeat(120)
            .with_close_timeout(2);

        assert_eq!(config.name, "test-binary");
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(120));
        assert_eq!(config.close_timeout(), Duration::from_secs(2));
    }

    struct FailingSession {
        config: RunConfig,
        endpoint: Url,
        runs: usize,
    }

    impl BinaryRunner for FailingSession {
        async fn run(&mut self) -> anyhow::Result<()> {
            self.runs += 1;
            anyhow::bail!("handshake refused")
        }

        fn config(&self) -> &RunConfig {
            &self.config
        }

        fn endpoint(&self) -> &Url {
            &self.endpoint
        }

        fn summary(&self) -> Option<String> {
            Some(format!("{} run(s)", self.runs))
        }
    }

    #[tokio::test]
    async fn test_execute_returns_session_result() {
        let mut session = FailingSession {
            config: RunConfig::new("failing"),
            endpoint: Url::parse("ws://localhost:9001").unwrap(),
            runs: 0,
        };

        let err = session.execute().await.unwrap_err();
        assert_eq!(err.to_string(), "handshake refused");
        assert_eq!(session.summary().as_deref(), Some("1 run(s)"));
    }

    #[test]
    fn test_default_config() {
        let config = RunConfig::new("default");
        assert_eq!(config.heartbeat_interval_secs, 30);
        assert_eq!(config.close_timeout_secs, 5);
    }
}
