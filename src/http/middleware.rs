//! Installable middleware artifacts.

use std::future::Future;
use std::sync::Arc;

use axum::{extract::Request, middleware::Next, response::Response};
use futures_util::future::BoxFuture;

/// A global middleware: sees the request, may call `next`, returns a response.
pub type Middleware = Arc<dyn Fn(Request, Next) -> BoxFuture<'static, Response> + Send + Sync>;

/// Build a [`Middleware`] from an async function or closure.
pub fn middleware_fn<F, Fut>(f: F) -> Middleware
where
    F: Fn(Request, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Response> + Send + 'static,
{
    Arc::new(move |req: Request, next: Next| Box::pin(f(req, next)) as BoxFuture<'static, Response>)
}
