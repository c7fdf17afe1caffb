//! Bootstrap error taxonomy.
//!
//! # Design Decisions
//! - Every phase failure is fatal and surfaces as one `BootError`
//! - Plugin-authored failures arrive as `BoxError` and are wrapped with the
//!   module key that produced them
//! - Request-time failures are not boot errors (see `http::failure`)

use std::path::PathBuf;

use thiserror::Error;

use crate::config::ConfigError;
use crate::plugin::PluginError;

/// Error type returned by plugin code (backends, providers, facade targets).
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias for bootstrap operations.
pub type BootResult<T> = Result<T, BootError>;

/// Errors that abort the bootstrap sequence.
#[derive(Debug, Error)]
pub enum BootError {
    /// Configuration could not be scanned, parsed or validated.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A plugin could not be resolved from the registry.
    #[error("plugin error: {0}")]
    Plugin(#[from] PluginError),

    /// A backend module's loader failed.
    #[error("backend '{module}' failed to load: {source}")]
    Backend {
        /// Module key of the failing backend.
        module: String,
        #[source]
        source: BoxError,
    },

    /// A service provider's boot failed.
    #[error("provider '{module}' failed to boot: {source}")]
    Provider {
        /// Module key of the failing provider.
        module: String,
        #[source]
        source: BoxError,
    },

    /// Two route files share a stem and would mount at the same prefix.
    #[error("route files '{first}' and '{second}' both mount at /{stem}")]
    DuplicateRoute {
        stem: String,
        first: String,
        second: String,
    },

    /// A conventional directory could not be enumerated.
    #[error("failed to read directory {path}: {source}")]
    Discovery {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The listener could not be bound.
    #[error("failed to bind port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: std::io::Error,
    },
}
