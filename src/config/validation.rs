//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that security features have the key material they need
//! - Validate method names, cookie policies and identifiers
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function over the typed settings
//! - Runs before any plugin is loaded

use axum::http::Method;
use thiserror::Error;

use crate::config::schema::{AppSettings, CookieSettings};

/// A single semantic configuration problem.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("cookies.enable_csrf requires app.key")]
    MissingAppKey,

    #[error("invalid HTTP method in cookies.csrf_ignored_methods: {0}")]
    InvalidMethod(String),

    #[error("invalid cookies.same_site_cookie policy: {0}")]
    InvalidSameSite(String),

    #[error("cookies.csrf_token_name must not be empty")]
    EmptyTokenName,

    #[error("app.body_limit must be greater than zero")]
    ZeroBodyLimit,

    #[error("empty module identifier in {0}")]
    EmptyIdentifier(&'static str),

    #[error("facade alias must be non-empty and contain no '.': {0:?}")]
    InvalidFacadeAlias(String),
}

/// Validate the typed settings, collecting every error.
pub fn validate_settings(
    app: &AppSettings,
    cookies: &CookieSettings,
) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if cookies.enable_csrf && app.key.as_deref().map_or(true, str::is_empty) {
        errors.push(ValidationError::MissingAppKey);
    }

    for method in &cookies.csrf_ignored_methods {
        if Method::from_bytes(method.to_ascii_uppercase().as_bytes()).is_err() {
            errors.push(ValidationError::InvalidMethod(method.clone()));
        }
    }

    if !cookies.same_site_cookie.is_valid() {
        errors.push(ValidationError::InvalidSameSite(format!(
            "{:?}",
            cookies.same_site_cookie
        )));
    }

    if cookies.enable_global_csrf && cookies.csrf_token_name.is_empty() {
        errors.push(ValidationError::EmptyTokenName);
    }

    if app.body_limit == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    let lists: [(&'static str, &[String]); 3] = [
        ("app.modules", &app.modules),
        ("app.providers", &app.providers),
        ("app.middlewares", app.middlewares.as_deref().unwrap_or_default()),
    ];
    for (key, list) in lists {
        if list.iter().any(|id| id.trim().is_empty()) {
            errors.push(ValidationError::EmptyIdentifier(key));
        }
    }
    if app.facades.values().any(|id| id.trim().is_empty()) {
        errors.push(ValidationError::EmptyIdentifier("app.facades"));
    }

    for alias in app.facades.keys() {
        if alias.is_empty() || alias.contains('.') {
            errors.push(ValidationError::InvalidFacadeAlias(alias.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
