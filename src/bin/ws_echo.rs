//! Interactive WebSocket client
//!
//! Connects to `WSCONN_ENDPOINT`, sends each command line argument as a text
//! frame once the connection is open, and logs everything it receives.
//! Ctrl+C starts a normal (1000) closing handshake.
//!
//! ```text
//! WSCONN_ENDPOINT=wss://echo.example.com WSCONN_PROTOCOLS=chat \
//!     cargo run --bin ws_echo -- hello world
//! ```

use anyhow::{anyhow, Result};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};
use tracing::{error, info, warn};
use url::Url;
use wsconn_cli::bin_common::{
    init_tracing, load_settings_from_env, parse_args, BinaryRunner, ClientSettings, RunConfig,
    ShutdownManager,
};
use wsconn_cli::wsconn::{Connection, ConnectionBuilder, Event, ReadyState, WsTransport};

const SHUTDOWN_REASON: &str = "client shutdown";

struct EchoClient {
    config: RunConfig,
    settings: ClientSettings,
    messages: Vec<String>,
    shutdown: ShutdownManager,
    sent: u64,
    received: Arc<AtomicU64>,
    final_state: Option<ReadyState>,
}

impl EchoClient {
    /// Send the queued messages once open, then idle until closed or interrupted
    async fn session(
        &mut self,
        connection: &Connection,
        opened_rx: &mut mpsc::UnboundedReceiver<()>,
        closed: &Notify,
    ) -> Result<()> {
        tokio::select! {
            Some(()) = opened_rx.recv() => {
                if !connection.protocol().is_empty() {
                    info!("Negotiated protocol: {}", connection.protocol());
                }
                for message in &self.messages {
                    info!("-> {}", message);
                    connection.send(message.as_str())?;
                    self.sent += 1;
                }
            }
            _ = closed.notified() => {
                return Err(anyhow!("connection to {} closed before opening", self.settings.endpoint));
            }
            _ = self.shutdown.wait() => {
                connection.close(1000, SHUTDOWN_REASON)?;
                return Ok(());
            }
        }

        let mut heartbeat = tokio::time::interval(self.config.heartbeat_interval());
        heartbeat.tick().await;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    info!(
                        "Heartbeat: state={} buffered={} bytes",
                        connection.ready_state(),
                        connection.buffered_amount()
                    );
                }
                _ = closed.notified() => {
                    info!("Server ended the connection");
                    return Ok(());
                }
                _ = self.shutdown.wait() => break,
            }
        }

        connection.close(1000, SHUTDOWN_REASON)?;

        if tokio::time::timeout(self.config.close_timeout(), closed.notified())
            .await
            .is_err()
        {
            warn!(
                "Closing handshake did not finish within {:?}",
                self.config.close_timeout()
            );
        }

        Ok(())
    }
}

impl BinaryRunner for EchoClient {
    async fn run(&mut self) -> Result<()> {
        let (opened_tx, mut opened_rx) = mpsc::unbounded_channel::<()>();
        let closed = Arc::new(Notify::new());
        let closed_signal = Arc::clone(&closed);
        let text_count = Arc::clone(&self.received);
        let bytes_count = Arc::clone(&self.received);

        let builder = ConnectionBuilder::new(self.settings.endpoint.clone())
            .with_protocols(self.settings.protocols.clone())
            .on_open(move |_: &Event| {
                info!("Connection open");
                let _ = opened_tx.send(());
            })
            .on_text(move |text: &str, _: &Event| {
                text_count.fetch_add(1, Ordering::Relaxed);
                info!("<- {}", text);
            })
            .on_bytes(move |bytes: &[u8], _: &Event| {
                bytes_count.fetch_add(1, Ordering::Relaxed);
                info!("<- {} bytes", bytes.len());
            })
            .on_errored(|event: &Event| {
                if let Event::Error { message } = event {
                    error!("Connection error: {}", message);
                }
            })
            .on_closed(move |event: &Event| {
                if let Event::Close { code, reason, was_clean } = event {
                    info!("Connection closed: code={} reason='{}' clean={}", code, reason, was_clean);
                }
                closed_signal.notify_one();
            });

        let transport = WsTransport::new(self.settings.socket_config());
        let connection = builder.open_with(&transport)?;
        info!("Connecting to {}", connection.uri());

        let result = self.session(&connection, &mut opened_rx, &closed).await;
        self.final_state = Some(connection.ready_state());
        result
    }

    fn config(&self) -> &RunConfig {
        &self.config
    }

    fn endpoint(&self) -> &Url {
        &self.settings.endpoint
    }

    fn summary(&self) -> Option<String> {
        let state = self.final_state?;
        Some(format!(
            "Sent {} frames, received {}, final state {}",
            self.sent,
            self.received.load(Ordering::Relaxed),
            state
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let settings = load_settings_from_env()?;

    let shutdown = ShutdownManager::new();
    shutdown.spawn_signal_handler();

    let mut client = EchoClient {
        config: RunConfig::new("ws_echo"),
        settings,
        messages: parse_args(),
        shutdown,
        sent: 0,
        received: Arc::new(AtomicU64::new(0)),
        final_state: None,
    };

    client.execute().await
}
