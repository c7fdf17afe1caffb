//! Cookie and CSRF wiring for the boot phase.
//!
//! Runs after body parsing and strictly before global middlewares, so the
//! cookie jar, token check and token exposure are in place for everything
//! installed afterwards.

use std::sync::Arc;

use crate::config::ValidationError;
use crate::config::ConfigError;
use crate::context::AppContext;
use crate::error::BootResult;
use crate::http::app::{App, InstallStep};
use crate::security::cookies::{cookie_parser, CookieSigner};
use crate::security::csrf::{csrf_error_handler, expose_token, CsrfOptions, CsrfProtection};

/// Install the cookie parser, CSRF protection, token exposure and the CSRF
/// error handler, each gated by its `cookies.*` flag.
pub fn configure(app: &mut App, ctx: &AppContext) -> BootResult<()> {
    let cookies = ctx.cookies();
    let signer = ctx
        .settings()
        .key
        .as_deref()
        .filter(|key| !key.is_empty())
        .and_then(|key| CookieSigner::new(key).ok())
        .map(Arc::new);

    if cookies.wants_cookie_parser() {
        app.use_middleware(InstallStep::CookieParser, cookie_parser(signer.clone()));
    }

    if !cookies.enable_csrf {
        tracing::debug!(cookie_parser = cookies.enable_cookie_parser, "CSRF protection disabled");
        return Ok(());
    }

    let signer = signer.ok_or(ConfigError::Validation(vec![ValidationError::MissingAppKey]))?;
    let protection = CsrfProtection::new(CsrfOptions::from_settings(cookies), signer);
    ctx.publish_csrf(protection.clone());
    app.use_middleware(InstallStep::CsrfProtection, protection.middleware());

    if cookies.enable_global_csrf {
        app.use_middleware(
            InstallStep::CsrfTokenCookie,
            expose_token(cookies.csrf_token_name.clone()),
        );
    }

    app.use_error_handler("csrf", csrf_error_handler());

    tracing::info!(
        global_token = cookies.enable_global_csrf,
        ignored_methods = ?cookies.csrf_ignored_methods,
        "CSRF protection enabled"
    );
    Ok(())
}
