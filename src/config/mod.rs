//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! <root>/config/*.toml | *.json
//!     → loader.rs (enumerate, parse one unit per file)
//!     → store.rs (namespace → value tree, dotted-path lookup)
//!     → schema.rs (typed AppSettings / CookieSettings with defaults)
//!     → validation.rs (semantic checks)
//!     → shared read-only through AppContext
//! ```
//!
//! # Design Decisions
//! - Config is loaded once at bootstrap start and never reloaded
//! - A missing config directory means "no units", not an error
//! - Later units for the same namespace overwrite earlier ones
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod store;
pub mod validation;

pub use loader::ConfigError;
pub use schema::{AppSettings, CookieSettings, SameSite};
pub use store::ConfigStore;
pub use validation::{validate_settings, ValidationError};
