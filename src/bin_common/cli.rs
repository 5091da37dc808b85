//! CLI utilities for binaries
//!
//! Handles settings loading from environment variables (and `.env`)
//! for the binary executables.

use anyhow::{anyhow, Context, Result};
use std::time::Duration;
use url::Url;
use wsconn::SocketConfig;

const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;

/// Environment variables the client understands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsKey {
    /// Endpoint to connect to (required)
    Endpoint,
    /// Comma-separated sub-protocols, in preference order
    Protocols,
    /// Opening handshake timeout in whole seconds
    ConnectTimeout,
}

impl SettingsKey {
    /// Get the environment variable name for this setting
    pub fn env_var_name(&self) -> &'static str {
        match self {
            SettingsKey::Endpoint => "WSCONN_ENDPOINT",
            SettingsKey::Protocols => "WSCONN_PROTOCOLS",
            SettingsKey::ConnectTimeout => "WSCONN_CONNECT_TIMEOUT_SECS",
        }
    }
}

/// Connection settings for a client binary
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub endpoint: Url,
    pub protocols: Vec<String>,
    pub connect_timeout: Duration,
}

impl ClientSettings {
    /// Socket configuration derived from these settings
    pub fn socket_config(&self) -> SocketConfig {
        SocketConfig::new().with_connect_timeout(self.connect_timeout)
    }
}

/// Load client settings from the environment
///
/// A `.env` file in the working directory is read first if present.
///
/// # Errors
/// Fails when `WSCONN_ENDPOINT` is missing or not a URL, or the timeout is
/// not a whole number of seconds.
pub fn load_settings_from_env() -> Result<ClientSettings> {
    dotenv::dotenv().ok();
    settings_from_lookup(|key| std::env::var(key).ok())
}

/// Build settings from any key lookup
///
/// `load_settings_from_env` uses the process environment; tests pass a map.
pub fn settings_from_lookup<F>(lookup: F) -> Result<ClientSettings>
where
    F: Fn(&str) -> Option<String>,
{
    let endpoint_var = SettingsKey::Endpoint.env_var_name();
    let raw_endpoint = lookup(endpoint_var)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| anyhow!("{} is not set", endpoint_var))?;
    let endpoint = Url::parse(raw_endpoint.trim())
        .with_context(|| format!("{} is not a valid URL: {}", endpoint_var, raw_endpoint))?;

    let protocols = lookup(SettingsKey::Protocols.env_var_name())
        .map(|raw| parse_protocols(&raw))
        .unwrap_or_default();

    let timeout_var = SettingsKey::ConnectTimeout.env_var_name();
    let connect_timeout = match lookup(timeout_var) {
        Some(raw) => {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("{} must be a whole number of seconds: {}", timeout_var, raw))?;
            Duration::from_secs(secs)
        }
        None => Duration::from_secs(DEFAULT_CONNECT_TIMEOUT_SECS),
    };

    Ok(ClientSettings {
        endpoint,
        protocols,
        connect_timeout,
    })
}

/// Split a comma-separated protocol list, trimming whitespace and dropping empties
pub fn parse_protocols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|protocol| !protocol.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse command line arguments for a binary
///
/// Returns a vector of arguments (excluding the program name)
pub fn parse_args() -> Vec<String> {
    std::env::args().skip(1).collect()
}
