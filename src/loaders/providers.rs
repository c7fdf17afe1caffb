//! Service provider lifecycle.

use std::sync::Arc;

use crate::context::AppContext;
use crate::error::{BootError, BootResult};
use crate::lifecycle::barrier::join_barrier;
use crate::plugin::discovery::{discover, Exclusions};
use crate::plugin::{resolve, ModuleKey, PluginUnit, PROVIDER_DIR};

/// Boot every provider concurrently.
///
/// `app.autoload_providers` selects discovery of `app/providers/` over the
/// `app.providers` list. Lifecycle providers are constructed with the
/// context and then booted; stateless providers are called with it. Either
/// may queue middlewares and mounts on `ctx.server()`.
pub async fn boot_all(ctx: &Arc<AppContext>) -> BootResult<usize> {
    let keys = if ctx.settings().autoload_providers {
        autoload_keys(ctx)?
    } else {
        ctx.settings()
            .providers
            .iter()
            .map(|identifier| resolve(identifier, PROVIDER_DIR))
            .collect::<Result<Vec<_>, _>>()?
    };

    let mut providers = Vec::with_capacity(keys.len());
    for key in keys {
        let unit = ctx.registry().provider_unit(&key)?;
        providers.push((key, unit));
    }

    let tasks = providers.into_iter().map(|(key, unit)| {
        let ctx = ctx.clone();
        async move {
            tracing::debug!(module = %key, shape = ?unit.shape(), "Booting provider");
            let booted = match unit {
                PluginUnit::Lifecycle(construct) => construct(ctx).boot().await,
                PluginUnit::Stateless(provider) => provider(ctx).await,
            };
            booted.map_err(|source| BootError::Provider {
                module: key.to_string(),
                source,
            })?;
            tracing::debug!(module = %key, "Provider booted");
            Ok::<_, BootError>(())
        }
    });

    let booted = join_barrier(tasks).await?.len();
    tracing::info!(count = booted, "Service providers booted");
    Ok(booted)
}

fn autoload_keys(ctx: &AppContext) -> BootResult<Vec<ModuleKey>> {
    let directory = ctx.directory(PROVIDER_DIR);
    let discovered =
        discover(directory.as_ref(), Exclusions::standard()).map_err(|source| BootError::Discovery {
            path: ctx.root().join(PROVIDER_DIR),
            source,
        })?;

    discovered
        .iter()
        .map(|unit| ModuleKey::within(PROVIDER_DIR, &unit.stem).map_err(BootError::from))
        .collect()
}
