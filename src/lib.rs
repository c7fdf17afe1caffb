//! Expressway: convention-driven application bootstrap.
//!
//! Turns an application root laid out by convention into a wired HTTP
//! server:
//!
//! ```text
//! <root>/
//!   config/*.toml|json          → ConfigStore namespaces
//!   app/middlewares/global/*    → global middlewares (autoload)
//!   app/providers/*             → service providers (autoload)
//!   routes/index                → primary routes + catch-all error handler
//!   routes/*                    → mounted at /<file stem>
//! ```
//!
//! Code units are registered in a [`PluginRegistry`] under their module keys
//! (`app/providers/auth`, `routes/users`, ...); the directories decide
//! which of them load and in what order.

pub mod backends;
pub mod config;
pub mod context;
pub mod error;
pub mod facade;
pub mod http;
pub mod lifecycle;
pub mod loaders;
pub mod observability;
pub mod plugin;
pub mod security;

pub use config::ConfigStore;
pub use context::AppContext;
pub use error::{BootError, BootResult, BoxError};
pub use http::{App, RunningServer};
pub use lifecycle::{bootstrap, Bootstrap, Server, Shutdown};
pub use plugin::PluginRegistry;
