//! wsconn command line front end - Main Library
//!
//! ## Architecture
//!
//! - **bin_common**: Common utilities for binary executables (settings, runners)
//! - **wsconn**: WebSocket connection library (re-exported from workspace)
//!
//! ## Usage in Binaries
//!
//! ```rust,ignore
//! use wsconn_cli::bin_common::{load_settings_from_env, BinaryRunner};
//! use wsconn_cli::wsconn::ConnectionBuilder;
//! ```

// Re-export workspace libraries for convenience
pub use wsconn;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod runner;
    pub mod shutdown;

    pub use cli::{
        load_settings_from_env, parse_args, parse_protocols, settings_from_lookup, ClientSettings,
        SettingsKey,
    };
    pub use runner::{init_tracing, BinaryRunner, RunConfig};
    pub use shutdown::ShutdownManager;
}
