//! Global middleware installation.

use crate::context::AppContext;
use crate::error::{BootError, BootResult};
use crate::http::app::{App, InstallStep};
use crate::http::middleware::Middleware;
use crate::plugin::discovery::{discover, Exclusions};
use crate::plugin::{resolve, MiddlewarePlugin, ModuleKey, PluginUnit, GLOBAL_MIDDLEWARE_DIR};

/// Install global middlewares.
///
/// With `app.middlewares` set, installs exactly that list in declared order.
/// Otherwise installs every unit in `app/middlewares/global/` in file-name
/// order. Returns the number installed.
pub fn install_global(app: &mut App, ctx: &AppContext) -> BootResult<usize> {
    let keys = match ctx.settings().middlewares.as_deref() {
        Some(list) if !list.is_empty() => list
            .iter()
            .map(|identifier| resolve(identifier, GLOBAL_MIDDLEWARE_DIR))
            .collect::<Result<Vec<_>, _>>()?,
        _ => autoload_keys(ctx)?,
    };

    let mut units = Vec::with_capacity(keys.len());
    for key in keys {
        let unit = ctx.registry().middleware_unit(&key)?;
        units.push((key, unit));
    }

    let count = units.len();
    for (key, unit) in units {
        tracing::debug!(module = %key, shape = ?unit.shape(), "Installing middleware");
        app.use_middleware(InstallStep::Middleware(key.to_string()), artifact(&unit, ctx));
    }

    tracing::info!(count, "Global middlewares installed");
    Ok(count)
}

/// Obtain the installable middleware from a unit.
pub fn artifact(unit: &MiddlewarePlugin, ctx: &AppContext) -> Middleware {
    match unit {
        PluginUnit::Lifecycle(construct) => construct(ctx).handle(),
        PluginUnit::Stateless(factory) => factory(ctx),
    }
}

fn autoload_keys(ctx: &AppContext) -> BootResult<Vec<ModuleKey>> {
    let directory = ctx.directory(GLOBAL_MIDDLEWARE_DIR);
    let discovered =
        discover(directory.as_ref(), Exclusions::standard()).map_err(|source| BootError::Discovery {
            path: ctx.root().join(GLOBAL_MIDDLEWARE_DIR),
            source,
        })?;

    discovered
        .iter()
        .map(|unit| ModuleKey::within(GLOBAL_MIDDLEWARE_DIR, &unit.stem).map_err(BootError::from))
        .collect()
}
