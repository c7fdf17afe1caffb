//! The server object assembled by the bootstrap sequence.
//!
//! # Responsibilities
//! - Record middlewares, mounts, static files and error handlers in
//!   installation order
//! - Compile the record into one `axum::Router`
//!
//! # Design Decisions
//! - Installation is recorded first and compiled later, so a middleware
//!   installed before a mount still wraps it
//! - The first middleware installed is the outermost and runs first
//! - Error handlers wrap all middlewares and routes; earlier handlers sit
//!   inside later ones, so the last installed sees every failure left over
//! - Mounts and the static directory are chained, not merged: a request
//!   falls through to the next mount when no earlier one has a route for
//!   its path or method, so overlapping tables resolve in install order

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use axum::{extract::Request, middleware::Next, response::{IntoResponse, Response}, Router};
use tower::ServiceExt;
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::context::AppContext;
use crate::http::failure::{ErrorHandler, RequestFailure};
use crate::http::middleware::Middleware;

/// One entry of the installation log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallStep {
    BodyParser,
    CookieParser,
    CsrfProtection,
    /// Global CSRF token exposure on GET requests.
    CsrfTokenCookie,
    /// A global middleware, by module key.
    Middleware(String),
    /// A router mounted at a path prefix.
    Mount(String),
    Static(PathBuf),
    /// An error handler, by name.
    ErrorHandler(String),
}

enum Stage {
    Layer(Middleware),
    Mount(String, Router),
    Static(PathBuf),
    Errors(ErrorHandler),
}

enum Queued {
    Middleware(String, Middleware),
    Mount(String, Router),
}

/// Server changes requested while providers boot.
///
/// Providers run concurrently and only hold the context, so their
/// middlewares and mounts are queued here and applied once every provider
/// has booted, before routes are assembled. Changes from one provider keep
/// their order; changes from different providers interleave as they ran.
#[derive(Default)]
pub struct ServerQueue {
    queued: Mutex<Vec<Queued>>,
}

impl ServerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a global middleware named `name`.
    pub fn use_middleware(&self, name: impl Into<String>, middleware: Middleware) {
        self.push(Queued::Middleware(name.into(), middleware));
    }

    /// Queue `router` for mounting at `path`.
    pub fn mount(&self, path: impl Into<String>, router: Router) {
        self.push(Queued::Mount(path.into(), router));
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn push(&self, change: Queued) {
        self.lock().push(change);
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Queued>> {
        self.queued.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Application server under construction.
pub struct App {
    ctx: Arc<AppContext>,
    stages: Vec<(InstallStep, Stage)>,
}

impl App {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self {
            ctx,
            stages: Vec::new(),
        }
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.ctx
    }

    /// Install a global middleware.
    pub fn use_middleware(&mut self, step: InstallStep, middleware: Middleware) {
        tracing::debug!(step = ?step, "Middleware installed");
        self.stages.push((step, Stage::Layer(middleware)));
    }

    /// Mount `router` at `path`; `/` merges it into the root table.
    pub fn mount(&mut self, path: &str, router: Router) {
        tracing::debug!(path = %path, "Router mounted");
        self.stages
            .push((InstallStep::Mount(path.to_owned()), Stage::Mount(path.to_owned(), router)));
    }

    /// Serve files from `dir` for requests no route matches.
    pub fn serve_static(&mut self, dir: PathBuf) {
        tracing::debug!(dir = %dir.display(), "Static directory mounted");
        self.stages
            .push((InstallStep::Static(dir.clone()), Stage::Static(dir)));
    }

    pub fn use_error_handler(&mut self, name: &str, handler: ErrorHandler) {
        tracing::debug!(handler = %name, "Error handler installed");
        self.stages
            .push((InstallStep::ErrorHandler(name.to_owned()), Stage::Errors(handler)));
    }

    /// Apply everything providers queued on the context's [`ServerQueue`].
    ///
    /// Returns the number of changes applied.
    pub fn apply_queued(&mut self) -> usize {
        let queued = std::mem::take(&mut *self.ctx.server().lock());
        let applied = queued.len();
        for change in queued {
            match change {
                Queued::Middleware(name, middleware) => {
                    self.use_middleware(InstallStep::Middleware(name), middleware)
                }
                Queued::Mount(path, router) => self.mount(&path, router),
            }
        }
        applied
    }

    /// Installation log, in order.
    pub fn installed(&self) -> Vec<InstallStep> {
        self.stages.iter().map(|(step, _)| step.clone()).collect()
    }

    /// Compile the installation log into a router.
    pub fn router(&self) -> Router {
        let mut chain: Option<Router> = None;
        for (_, stage) in self.stages.iter().rev() {
            chain = match stage {
                Stage::Mount(path, router) => Some(link(mounted_at(path, router.clone()), chain)),
                Stage::Static(dir) => Some(static_files(dir, chain)),
                Stage::Layer(_) | Stage::Errors(_) => chain,
            };
        }

        let mut routes = chain.unwrap_or_default();
        let mut layers = Vec::new();
        let mut handlers = Vec::new();
        for (_, stage) in &self.stages {
            match stage {
                Stage::Layer(middleware) => layers.push(middleware.clone()),
                Stage::Errors(handler) => handlers.push(handler.clone()),
                Stage::Mount(..) | Stage::Static(_) => {}
            }
        }

        for middleware in layers.into_iter().rev() {
            routes = routes.layer(axum::middleware::from_fn(
                move |req: Request, next: Next| middleware(req, next),
            ));
        }

        for handler in handlers {
            routes = routes.layer(axum::middleware::from_fn(move |req: Request, next: Next| {
                let handler = handler.clone();
                async move { recover(&handler, next.run(req).await) }
            }));
        }

        routes.layer(TraceLayer::new_for_http())
    }
}

fn mounted_at(path: &str, router: Router) -> Router {
    if path == "/" {
        router
    } else {
        Router::new().nest(path, router)
    }
}

/// `segment`, handing unmatched paths and methods on to `next`.
fn link(segment: Router, next: Option<Router>) -> Router {
    let Some(next) = next else { return segment };
    let forward = next.clone();
    segment
        .method_not_allowed_fallback(move |req: Request| {
            let forward = forward.clone();
            async move { forward.oneshot(req).await }
        })
        .fallback_service(next)
}

fn static_files(dir: &Path, next: Option<Router>) -> Router {
    match next {
        Some(next) => Router::new().fallback_service(
            ServeDir::new(dir)
                .call_fallback_on_method_not_allowed(true)
                .fallback(next),
        ),
        None => Router::new().fallback_service(ServeDir::new(dir)),
    }
}

fn recover(handler: &ErrorHandler, mut response: Response) -> Response {
    match response.extensions_mut().remove::<RequestFailure>() {
        Some(failure) => match handler(failure) {
            Ok(recovered) => recovered,
            Err(failure) => failure.into_response(),
        },
        None => response,
    }
}
