//! Mail backend.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::BoxError;
use crate::plugin::BackendModule;

/// Outgoing mail settings from the `mail` namespace.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct Mailer {
    /// Transport name (`log`, `smtp`, ...).
    pub driver: String,
    pub host: Option<String>,
    pub port: u16,
    pub from: Option<String>,
}

impl Default for Mailer {
    fn default() -> Self {
        Self {
            driver: "log".to_string(),
            host: None,
            port: 587,
            from: None,
        }
    }
}

pub struct MailBackend;

#[async_trait]
impl BackendModule for MailBackend {
    async fn load(&self, ctx: Arc<AppContext>) -> Result<(), BoxError> {
        let mailer: Mailer = ctx.config().typed("mail")?;
        if mailer.driver == "smtp" && mailer.host.is_none() {
            return Err("mail.host is required for the smtp driver".into());
        }
        tracing::info!(driver = %mailer.driver, "Mail backend ready");
        ctx.services().provide("mail", mailer);
        Ok(())
    }
}
