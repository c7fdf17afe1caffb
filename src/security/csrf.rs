//! CSRF protection.
//!
//! # Responsibilities
//! - Keep a per-client secret in a `_csrf` cookie, created on first contact
//! - Mint tokens derived from that secret for handlers to embed
//! - Reject state-changing requests that do not echo a valid token
//! - Recover token failures into a fixed `403` JSON response
//!
//! # Design Decisions
//! - Tokens are `<salt>-<hash>`, hash = base64url(SHA-256(salt "-" secret)),
//!   so any number of tokens verify against one secret
//! - Token lookup order: `_csrf` body field, `_csrf` query parameter,
//!   `csrf-token`, `xsrf-token`, `x-csrf-token`, `x-xsrf-token` headers
//! - A failed check still issues the secret cookie so the client can retry

use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header::SET_COOKIE, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use rand::{distributions::Alphanumeric, Rng, RngCore};
use sha2::{Digest, Sha256};

use crate::config::CookieSettings;
use crate::http::body::ParsedBody;
use crate::http::failure::{error_handler, ErrorBody, ErrorHandler, EBADCSRFTOKEN};
use crate::http::middleware::{middleware_fn, Middleware};
use crate::http::RequestFailure;
use crate::observability::metrics;
use crate::security::cookies::{CookieJar, CookieOptions, CookieSigner};

/// Cookie holding the per-client secret.
pub const SECRET_COOKIE: &str = "_csrf";

const TOKEN_FIELD: &str = "_csrf";
const TOKEN_HEADERS: [&str; 4] = ["csrf-token", "xsrf-token", "x-csrf-token", "x-xsrf-token"];
const SECRET_BYTES: usize = 18;
const SALT_LEN: usize = 8;

/// Current CSRF token, set on the request for handlers and on the response
/// by the global token step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CsrfToken(pub String);

/// Options derived from the `cookies` namespace.
#[derive(Debug, Clone)]
pub struct CsrfOptions {
    pub cookie: CookieOptions,
    /// Sign the secret cookie with the application key.
    pub signed: bool,
    pub ignore_methods: Vec<Method>,
}

impl CsrfOptions {
    /// Invalid method names are skipped; validation rejects them earlier.
    pub fn from_settings(settings: &CookieSettings) -> Self {
        Self {
            cookie: CookieOptions {
                path: Some(settings.cookie_path.clone()),
                domain: settings.cookie_domain.clone(),
                max_age: settings.cookie_max_age,
                secure: settings.secure_cookie,
                http_only: settings.http_only_cookie,
                same_site: settings.same_site_cookie.attribute(),
            },
            signed: true,
            ignore_methods: settings
                .csrf_ignored_methods
                .iter()
                .filter_map(|m| Method::from_bytes(m.to_ascii_uppercase().as_bytes()).ok())
                .collect(),
        }
    }
}

struct Inner {
    options: CsrfOptions,
    signer: Arc<CookieSigner>,
}

/// Configured CSRF protection. Cheap to clone.
#[derive(Clone)]
pub struct CsrfProtection {
    inner: Arc<Inner>,
}

impl CsrfProtection {
    pub fn new(options: CsrfOptions, signer: Arc<CookieSigner>) -> Self {
        Self {
            inner: Arc::new(Inner { options, signer }),
        }
    }

    /// Fresh random secret.
    pub fn generate_secret() -> String {
        random_string(SECRET_BYTES)
    }

    /// Mint a token for `secret`. The salt is alphanumeric so the first
    /// `-` always ends it.
    pub fn create_token(&self, secret: &str) -> String {
        let salt: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(SALT_LEN)
            .map(char::from)
            .collect();
        format!("{salt}-{}", hash(&salt, secret))
    }

    /// Whether `token` was minted from `secret`.
    pub fn verify(&self, secret: &str, token: &str) -> bool {
        match token.split_once('-') {
            Some((salt, digest)) => constant_time_eq(hash(salt, secret).as_bytes(), digest.as_bytes()),
            None => false,
        }
    }

    fn is_ignored(&self, method: &Method) -> bool {
        self.inner.options.ignore_methods.contains(method)
    }

    fn secret_from(&self, req: &Request) -> Option<String> {
        let jar = req.extensions().get::<CookieJar>()?;
        let secret = if self.inner.options.signed {
            jar.signed(SECRET_COOKIE)
        } else {
            jar.get(SECRET_COOKIE)
        };
        secret.map(str::to_owned)
    }

    fn secret_cookie(&self, secret: &str) -> Option<axum::http::HeaderValue> {
        let value = if self.inner.options.signed {
            self.inner.signer.sign(secret)
        } else {
            secret.to_owned()
        };
        self.inner.options.cookie.header(SECRET_COOKIE, &value)
    }

    /// Check the request and run the rest of the stack.
    pub async fn protect(&self, mut req: Request, next: Next) -> Response {
        let (secret, created) = match self.secret_from(&req) {
            Some(secret) => (secret, false),
            None => (Self::generate_secret(), true),
        };

        let mut response = if !self.is_ignored(req.method()) && !self.token_matches(&req, &secret) {
            tracing::debug!(method = %req.method(), path = %req.uri().path(), "CSRF token rejected");
            RequestFailure::bad_csrf_token().into_response()
        } else {
            req.extensions_mut().insert(CsrfToken(self.create_token(&secret)));
            next.run(req).await
        };

        if created {
            if let Some(cookie) = self.secret_cookie(&secret) {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
        }
        response
    }

    fn token_matches(&self, req: &Request, secret: &str) -> bool {
        token_from(req).is_some_and(|token| self.verify(secret, &token))
    }

    /// This protection as an installable middleware.
    pub fn middleware(&self) -> Middleware {
        let protection = self.clone();
        middleware_fn(move |req: Request, next: Next| {
            let protection = protection.clone();
            async move { protection.protect(req, next).await }
        })
    }
}

fn token_from(req: &Request) -> Option<String> {
    if let Some(token) = req
        .extensions()
        .get::<ParsedBody>()
        .and_then(|body| body.field(TOKEN_FIELD))
    {
        return Some(token.to_owned());
    }

    if let Some(query) = req.uri().query() {
        if let Some((_, token)) =
            url::form_urlencoded::parse(query.as_bytes()).find(|(k, _)| k == TOKEN_FIELD)
        {
            return Some(token.into_owned());
        }
    }

    TOKEN_HEADERS.iter().find_map(|name| {
        req.headers()
            .get(*name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
    })
}

fn hash(salt: &str, secret: &str) -> String {
    let digest = Sha256::digest(format!("{salt}-{secret}").as_bytes());
    URL_SAFE_NO_PAD.encode(digest)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

fn random_string(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Pass-through step exposing the current token on GET requests, both as a
/// [`CsrfToken`] response extension and as a client-readable cookie.
pub fn expose_token(cookie_name: String) -> Middleware {
    middleware_fn(move |req: Request, next: Next| {
        let cookie_name = cookie_name.clone();
        async move {
            let token = (req.method() == Method::GET)
                .then(|| req.extensions().get::<CsrfToken>().cloned())
                .flatten();
            let mut response = next.run(req).await;
            if let Some(token) = token {
                let options = CookieOptions {
                    path: Some("/".into()),
                    same_site: Some("Strict"),
                    ..CookieOptions::default()
                };
                if let Some(cookie) = options.header(&cookie_name, &token.0) {
                    response.headers_mut().append(SET_COOKIE, cookie);
                }
                response.extensions_mut().insert(token);
            }
            response
        }
    })
}

/// Recovers CSRF failures into `403 {"status":false,"code":403,"message":"Forbidden"}`;
/// every other failure passes through unchanged.
pub fn csrf_error_handler() -> ErrorHandler {
    error_handler(|failure| {
        if failure.code() != Some(EBADCSRFTOKEN) {
            return Err(failure);
        }
        metrics::record_csrf_rejection();
        let body = ErrorBody {
            status: false,
            code: StatusCode::FORBIDDEN.as_u16(),
            message: "Forbidden",
        };
        Ok((StatusCode::FORBIDDEN, Json(body)).into_response())
    })
}
