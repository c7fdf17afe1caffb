//! HTTP assembly subsystem.
//!
//! # Data Flow
//! ```text
//! bootstrap phases
//!     → app.rs (ordered install log: middlewares, mounts, static, errors)
//!     → App::router() (compile to axum::Router)
//!     → server.rs (bind, serve, graceful shutdown)
//!
//! per request:
//!     → body.rs (buffer + parse JSON / url-encoded)
//!     → security middlewares, global middlewares, routes
//!     → failure.rs (failures bubble out to error handlers)
//! ```

pub mod app;
pub mod body;
pub mod failure;
pub mod middleware;
pub mod server;

pub use app::{App, InstallStep, ServerQueue};
pub use body::{body_parser, ParsedBody};
pub use failure::{error_handler, ErrorHandler, RequestFailure, EBADCSRFTOKEN};
pub use middleware::{middleware_fn, Middleware};
pub use server::RunningServer;
