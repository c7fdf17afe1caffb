//! Route table assembly.

use std::collections::HashMap;

use crate::context::AppContext;
use crate::error::{BootError, BootResult};
use crate::http::app::App;
use crate::plugin::discovery::{discover, Exclusions};
use crate::plugin::{ModuleKey, ROUTES_DIR};

/// Mount the routes entry point's primary table, every autoloaded route
/// module, the static directory, and finally the catch-all error handler.
///
/// Returns the number of autoloaded modules mounted.
pub fn assemble(app: &mut App, ctx: &AppContext) -> BootResult<usize> {
    let entry = ctx.registry().routes_entry_unit()?;
    app.mount("/", (entry.main)(ctx));

    let mounted = mount_autoloaded(app, ctx)?;

    if let Some(dir) = ctx.settings().static_dir.as_deref() {
        app.serve_static(ctx.root().join(dir));
    }

    app.use_error_handler("errors", entry.errors);
    tracing::info!(modules = mounted, "Routes assembled");
    Ok(mounted)
}

fn mount_autoloaded(app: &mut App, ctx: &AppContext) -> BootResult<usize> {
    let directory = ctx.directory(ROUTES_DIR);
    let discovered = discover(directory.as_ref(), Exclusions::standard().and_stem("errors"))
        .map_err(|source| BootError::Discovery {
            path: ctx.root().join(ROUTES_DIR),
            source,
        })?;

    let mut seen: HashMap<String, String> = HashMap::new();
    for unit in discovered.iter() {
        if let Some(first) = seen.insert(unit.stem.clone(), unit.file_name.clone()) {
            return Err(BootError::DuplicateRoute {
                stem: unit.stem,
                first,
                second: unit.file_name,
            });
        }
    }

    let mut mounted = 0;
    for unit in discovered.iter() {
        let key = ModuleKey::within(ROUTES_DIR, &unit.stem)?;
        let module = ctx.registry().route_unit(&key)?;
        match module(ctx) {
            Some(router) => {
                app.mount(&format!("/{}", unit.stem), router);
                mounted += 1;
            }
            None => tracing::warn!(module = %key, "Route module is empty, skipped"),
        }
    }
    Ok(mounted)
}
