//! Join barrier for concurrent batches.
//!
//! All tasks are polled concurrently on the current task (no threads are
//! spawned). The barrier resolves when every task succeeds, or with the
//! first failure. On failure the remaining in-flight tasks are dropped,
//! which cancels them at their next suspension point.

use std::future::Future;

use futures_util::future::try_join_all;

/// Await every task; fail fast on the first error.
pub async fn join_barrier<I, T, E>(tasks: I) -> Result<Vec<T>, E>
where
    I: IntoIterator,
    I::Item: Future<Output = Result<T, E>>,
{
    try_join_all(tasks).await
}
