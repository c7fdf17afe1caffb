//! Core backend modules.
//!
//! Each backend reads its own config namespace and registers a service in
//! the context's container. The matching core facades resolve to those
//! services on first use.
//!
//! | key             | config      | service    | facade target          |
//! |-----------------|-------------|------------|------------------------|
//! | `core/mail`     | `mail`      | `mail`     | `core/facades/mail`    |
//! | `core/database` | `database`  | `database` | `core/facades/database`|
//! | `core/caching`  | `cache`     | `cache`    | `core/facades/cache`   |

pub mod caching;
pub mod database;
pub mod mail;

use std::any::Any;
use std::sync::Arc;

use crate::context::AppContext;
use crate::error::BoxError;
use crate::plugin::PluginRegistry;

pub use caching::{CacheBackend, CacheStore};
pub use database::{DatabaseBackend, DatabaseSettings};
pub use mail::{MailBackend, Mailer};

/// Add the core backends and their facades to `registry`.
pub fn register_core(registry: PluginRegistry) -> PluginRegistry {
    registry
        .backend("core/mail", MailBackend)
        .backend("core/database", DatabaseBackend)
        .backend("core/caching", CacheBackend)
        .facade("core/facades/mail", |ctx| service::<Mailer>(ctx, "mail"))
        .facade("core/facades/database", |ctx| {
            service::<DatabaseSettings>(ctx, "database")
        })
        .facade("core/facades/cache", |ctx| service::<CacheStore>(ctx, "cache"))
}

fn service<T: Any + Send + Sync>(ctx: &AppContext, name: &str) -> Result<Arc<T>, BoxError> {
    ctx.services()
        .get::<T>(name)
        .ok_or_else(|| format!("service '{name}' is not loaded").into())
}
