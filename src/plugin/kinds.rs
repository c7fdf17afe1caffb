//! The four plugin kinds and their two shapes.

use std::any::Any;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use futures_util::future::BoxFuture;

use crate::context::AppContext;
use crate::error::BoxError;
use crate::http::{ErrorHandler, Middleware};
use crate::plugin::PluginUnit;

/// A backend module's loader entry point.
#[async_trait]
pub trait BackendModule: Send + Sync {
    async fn load(&self, ctx: Arc<AppContext>) -> Result<(), BoxError>;
}

/// A lifecycle middleware: constructed, then asked once for its handler.
pub trait MiddlewareHandler: Send + Sync {
    fn handle(&self) -> Middleware;
}

/// A lifecycle provider, constructed with the application context.
///
/// The context's [`AppContext::server`] queue reaches the server itself.
#[async_trait]
pub trait ServiceProvider: Send + Sync {
    async fn boot(&self) -> Result<(), BoxError>;
}

pub type MiddlewareConstructor = Arc<dyn Fn(&AppContext) -> Box<dyn MiddlewareHandler> + Send + Sync>;
pub type MiddlewareFactory = Arc<dyn Fn(&AppContext) -> Middleware + Send + Sync>;
pub type MiddlewarePlugin = PluginUnit<MiddlewareConstructor, MiddlewareFactory>;

pub type ProviderConstructor = Arc<dyn Fn(Arc<AppContext>) -> Box<dyn ServiceProvider> + Send + Sync>;
pub type ProviderFn =
    Arc<dyn Fn(Arc<AppContext>) -> BoxFuture<'static, Result<(), BoxError>> + Send + Sync>;
pub type ProviderPlugin = PluginUnit<ProviderConstructor, ProviderFn>;

/// A capability published under a facade alias.
pub type Capability = Arc<dyn Any + Send + Sync>;

/// Produces a facade's capability on first use.
pub type FacadeTarget = Arc<dyn Fn(&AppContext) -> Result<Capability, BoxError> + Send + Sync>;

/// A route file. Returning `None` marks the module as empty.
pub type RouteModule = Arc<dyn Fn(&AppContext) -> Option<Router> + Send + Sync>;

/// The routes entry point: primary table plus catch-all error handler.
#[derive(Clone)]
pub struct RoutesEntry {
    pub main: Arc<dyn Fn(&AppContext) -> Router + Send + Sync>,
    pub errors: ErrorHandler,
}

impl RoutesEntry {
    pub fn new<F>(main: F, errors: ErrorHandler) -> Self
    where
        F: Fn(&AppContext) -> Router + Send + Sync + 'static,
    {
        Self {
            main: Arc::new(main),
            errors,
        }
    }
}

impl Default for RoutesEntry {
    /// Empty primary table; failures render as their own JSON body.
    fn default() -> Self {
        Self::new(|_| Router::new(), crate::http::failure::render_failures())
    }
}
