//! Database backend.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::BoxError;
use crate::plugin::BackendModule;

/// Connection settings from the `database` namespace.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct DatabaseSettings {
    pub connection: String,
    pub url: Option<String>,
    pub pool_size: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            connection: "memory".to_string(),
            url: None,
            pool_size: 5,
        }
    }
}

pub struct DatabaseBackend;

#[async_trait]
impl BackendModule for DatabaseBackend {
    async fn load(&self, ctx: Arc<AppContext>) -> Result<(), BoxError> {
        let settings: DatabaseSettings = ctx.config().typed("database")?;
        if settings.connection != "memory" && settings.url.is_none() {
            return Err(format!("database.url is required for '{}'", settings.connection).into());
        }
        if settings.pool_size == 0 {
            return Err("database.pool_size must be greater than zero".into());
        }
        tracing::info!(
            connection = %settings.connection,
            pool_size = settings.pool_size,
            "Database backend ready"
        );
        ctx.services().provide("database", settings);
        Ok(())
    }
}
