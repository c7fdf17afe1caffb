//! Plugin loading protocol.
//!
//! # Data Flow
//! ```text
//! identifier ("auth", "./lib/auth", "vendor.search")
//!     → resolver.rs (bare name → conventional dir, path-like → root-relative)
//!     → ModuleKey ("app/providers/auth")
//!     → registry.rs (key → registered unit of the expected kind)
//!     → PluginUnit::Lifecycle | PluginUnit::Stateless
//!
//! conventional directory
//!     → discovery.rs (enumerate, drop index/dotfiles, sort)
//!     → stems → ModuleKey → registry.rs
//! ```
//!
//! # Design Decisions
//! - Units are registered up front; discovery only yields keys
//! - Plugin shape is declared at registration, never inferred
//! - A discovered or configured key with no registered unit is fatal

pub mod discovery;
pub mod kinds;
pub mod registry;
pub mod resolver;

use thiserror::Error;

pub use discovery::{discover, DiscoveredUnit, Exclusions, FsDirectory, MemoryDirectory, PluginDirectory};
pub use kinds::{
    BackendModule, FacadeTarget, MiddlewareHandler, MiddlewarePlugin, ProviderPlugin,
    RouteModule, RoutesEntry, ServiceProvider,
};
pub use registry::{PluginRegistry, Registered};
pub use resolver::{is_path_like, resolve, ModuleKey};

/// Directory for bare backend names.
pub const BACKEND_DIR: &str = "core";
/// Directory for bare facade targets.
pub const FACADE_DIR: &str = "core/facades";
/// Directory for bare global middleware names and autoload.
pub const GLOBAL_MIDDLEWARE_DIR: &str = "app/middlewares/global";
/// Directory for bare provider names and autoload.
pub const PROVIDER_DIR: &str = "app/providers";
/// Routes directory; `index` is the entry point.
pub const ROUTES_DIR: &str = "routes";
/// Config directory.
pub const CONFIG_DIR: &str = "config";

/// How a unit produces its effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginShape {
    /// Constructed first, then its boot/handle operation is invoked.
    Lifecycle,
    /// Invoked directly to produce its effect.
    Stateless,
}

/// A pluggable unit tagged with its shape at registration time.
pub enum PluginUnit<L, S> {
    Lifecycle(L),
    Stateless(S),
}

impl<L, S> PluginUnit<L, S> {
    /// Classify the unit. Pure: depends only on the registered variant.
    pub fn shape(&self) -> PluginShape {
        match self {
            PluginUnit::Lifecycle(_) => PluginShape::Lifecycle,
            PluginUnit::Stateless(_) => PluginShape::Stateless,
        }
    }
}

impl<L: Clone, S: Clone> Clone for PluginUnit<L, S> {
    fn clone(&self) -> Self {
        match self {
            PluginUnit::Lifecycle(l) => PluginUnit::Lifecycle(l.clone()),
            PluginUnit::Stateless(s) => PluginUnit::Stateless(s.clone()),
        }
    }
}

/// Errors raised while resolving plugins.
#[derive(Debug, Error)]
pub enum PluginError {
    #[error("empty module identifier")]
    EmptyIdentifier,

    #[error("module identifier escapes the application root: {0}")]
    EscapesRoot(String),

    #[error("invalid plugin registration key: {0:?}")]
    InvalidKey(String),

    #[error("no unit registered for module '{0}'")]
    NotRegistered(ModuleKey),

    #[error("module '{key}' is a {found}, expected a {expected}")]
    WrongKind {
        key: ModuleKey,
        expected: &'static str,
        found: &'static str,
    },
}
