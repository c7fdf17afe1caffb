//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! bootstrap phases, loaders, security
//!     → logging.rs (structured tracing events, env-filtered)
//!     → metrics.rs (phase durations, CSRF rejections)
//! per request:
//!     → tower_http TraceLayer spans (installed by App::router)
//! ```
//!
//! # Design Decisions
//! - Structured logging (key/value fields) through `tracing`
//! - Metrics go through the `metrics` facade; without an installed
//!   recorder they are no-ops

pub mod logging;
pub mod metrics;
