//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request (after body parsing):
//!     → cookies.rs (parse Cookie header, verify signed values)
//!     → csrf.rs (secret cookie, token check, token for handlers)
//!     → csrf.rs expose_token (GET only, when global CSRF is on)
//!     → global middlewares, routes
//!
//! Outgoing failure:
//!     → csrf_error_handler (EBADCSRFTOKEN → 403 JSON, else pass through)
//! ```
//!
//! # Design Decisions
//! - Every step is gated by its own configuration flag
//! - No CSRF error handler exists unless CSRF protection is enabled
//! - Fail closed: a missing or wrong token rejects the request

pub mod configurator;
pub mod cookies;
pub mod csrf;

pub use configurator::configure;
pub use cookies::{cookie_parser, CookieJar, CookieOptions, CookieSigner};
pub use csrf::{csrf_error_handler, expose_token, CsrfOptions, CsrfProtection, CsrfToken};
