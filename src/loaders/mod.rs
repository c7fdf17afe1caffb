//! Loaders for each plugin kind.
//!
//! # Data Flow
//! ```text
//! backends.rs     app.modules   → core/<name> | path → join barrier
//! middlewares.rs  app.middlewares (ordered) | app/middlewares/global/*
//!                               → handler / factory → App::use_middleware
//! providers.rs    app.providers | app/providers/* → join barrier
//! routes.rs       routes/index.main → routes/* at /<stem> → static
//!                               → routes/index.errors (last)
//! ```
//!
//! # Design Decisions
//! - Resolution happens before anything runs: an unknown module fails the
//!   phase before any unit in it has started
//! - Concurrent batches (backends, providers) are all-or-nothing
//! - Directory autoload uses lexicographic file order

pub mod backends;
pub mod middlewares;
pub mod providers;
pub mod routes;

pub use backends::load_all;
pub use middlewares::install_global;
pub use providers::boot_all;
pub use routes::assemble;
