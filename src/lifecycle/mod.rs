//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Bootstrap::configure  config/ → ConfigStore → settings → validation
//!     Server::boot          facades → backends ⧉ → body → cookies/CSRF
//!                           → middlewares → providers ⧉ → routes → static
//!                           → error handler
//!     App::serve            bind → accept
//!     (⧉ = concurrent batch behind barrier.rs)
//!
//! Shutdown (shutdown.rs):
//!     trigger → stop accepting → drain in-flight requests → exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → trigger graceful shutdown
//! ```

pub mod barrier;
pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use startup::{bootstrap, Bootstrap, Server};
