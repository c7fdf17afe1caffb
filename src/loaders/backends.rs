//! Backend module loading.

use std::sync::Arc;

use crate::context::AppContext;
use crate::error::{BootError, BootResult};
use crate::lifecycle::barrier::join_barrier;
use crate::plugin::{resolve, BACKEND_DIR};

/// Load every backend in `modules` concurrently.
///
/// Bare names resolve under `core/`; path-like names resolve from the
/// application root. Completes when all loaders have finished, or fails with
/// the first loader error.
pub async fn load_all(ctx: &Arc<AppContext>, modules: &[String]) -> BootResult<usize> {
    let mut backends = Vec::with_capacity(modules.len());
    for identifier in modules {
        let key = resolve(identifier, BACKEND_DIR)?;
        let backend = ctx.registry().backend_unit(&key)?;
        backends.push((key, backend));
    }

    let tasks = backends.into_iter().map(|(key, backend)| {
        let ctx = ctx.clone();
        async move {
            tracing::debug!(module = %key, "Loading backend");
            backend
                .load(ctx)
                .await
                .map_err(|source| BootError::Backend {
                    module: key.to_string(),
                    source,
                })?;
            tracing::debug!(module = %key, "Backend loaded");
            Ok::<_, BootError>(())
        }
    });

    let loaded = join_barrier(tasks).await?.len();
    tracing::info!(count = loaded, "Backends loaded");
    Ok(loaded)
}
