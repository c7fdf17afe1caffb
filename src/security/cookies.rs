//! Signed cookie parsing.
//!
//! # Responsibilities
//! - Parse the `Cookie` header into a [`CookieJar`] request extension
//! - Verify `s:`-prefixed values against the application key
//! - Build `Set-Cookie` header values
//!
//! # Design Decisions
//! - Signatures are HMAC-SHA256 (`hmac`), base64 without padding
//! - Parsing and `Set-Cookie` rendering go through the `cookie` crate
//! - A value with a bad signature is dropped from the signed set and kept
//!   out of the plain set
//! - Cookie values are used verbatim (no percent-decoding)

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header::COOKIE, HeaderValue},
    middleware::Next,
};
use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine};
use cookie::{time::Duration, Cookie, SameSite};
use hmac::{digest::InvalidLength, Hmac, Mac};
use sha2::Sha256;

use crate::http::middleware::{middleware_fn, Middleware};

const SIGNED_PREFIX: &str = "s:";

type HmacSha256 = Hmac<Sha256>;

/// Signs and verifies cookie values with the application key.
#[derive(Clone)]
pub struct CookieSigner {
    mac: HmacSha256,
}

impl std::fmt::Debug for CookieSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CookieSigner").finish_non_exhaustive()
    }
}

impl CookieSigner {
    pub fn new(key: &str) -> Result<Self, InvalidLength> {
        Ok(Self {
            mac: HmacSha256::new_from_slice(key.as_bytes())?,
        })
    }

    /// `s:<value>.<signature>`
    pub fn sign(&self, value: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(value.as_bytes());
        let signature = STANDARD_NO_PAD.encode(mac.finalize().into_bytes());
        format!("{SIGNED_PREFIX}{value}.{signature}")
    }

    /// Original value if `signed` carries a valid signature.
    pub fn unsign(&self, signed: &str) -> Option<String> {
        let body = signed.strip_prefix(SIGNED_PREFIX)?;
        let (value, signature) = body.rsplit_once('.')?;
        let signature = STANDARD_NO_PAD.decode(signature).ok()?;
        let mut mac = self.mac.clone();
        mac.update(value.as_bytes());
        mac.verify_slice(&signature).ok()?;
        Some(value.to_owned())
    }
}

/// Cookies sent with the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieJar {
    plain: HashMap<String, String>,
    signed: HashMap<String, String>,
}

impl CookieJar {
    /// Parse `Cookie` header values. Signed values are verified when a
    /// signer is available; otherwise they stay in the plain set.
    pub fn parse<'a>(
        headers: impl IntoIterator<Item = &'a HeaderValue>,
        signer: Option<&CookieSigner>,
    ) -> Self {
        let mut jar = Self::default();
        for header in headers {
            let Ok(header) = header.to_str() else { continue };
            for cookie in Cookie::split_parse(header).flatten() {
                let (name, value) = (cookie.name(), cookie.value_trimmed());
                match signer {
                    Some(signer) if value.starts_with(SIGNED_PREFIX) => {
                        if let Some(original) = signer.unsign(value) {
                            jar.signed.insert(name.to_owned(), original);
                        }
                    }
                    _ => {
                        jar.plain.entry(name.to_owned()).or_insert_with(|| value.to_owned());
                    }
                }
            }
        }
        jar
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.plain.get(name).map(String::as_str)
    }

    pub fn signed(&self, name: &str) -> Option<&str> {
        self.signed.get(name).map(String::as_str)
    }
}

/// Attributes of a `Set-Cookie` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CookieOptions {
    pub path: Option<String>,
    pub domain: Option<String>,
    pub max_age: Option<u64>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<&'static str>,
}

impl CookieOptions {
    /// Render a `Set-Cookie` header value.
    pub fn header(&self, name: &str, value: &str) -> Option<HeaderValue> {
        let mut cookie = Cookie::new(name.to_owned(), value.to_owned());
        if let Some(path) = &self.path {
            cookie.set_path(path.clone());
        }
        if let Some(domain) = &self.domain {
            cookie.set_domain(domain.clone());
        }
        if let Some(max_age) = self.max_age {
            cookie.set_max_age(Duration::seconds(i64::try_from(max_age).unwrap_or(i64::MAX)));
        }
        if self.http_only {
            cookie.set_http_only(true);
        }
        if self.secure {
            cookie.set_secure(true);
        }
        if let Some(policy) = self.same_site.and_then(same_site) {
            cookie.set_same_site(policy);
        }
        HeaderValue::from_str(&cookie.to_string()).ok()
    }
}

fn same_site(attribute: &str) -> Option<SameSite> {
    match attribute {
        "Strict" => Some(SameSite::Strict),
        "Lax" => Some(SameSite::Lax),
        "None" => Some(SameSite::None),
        _ => None,
    }
}

/// Middleware parsing cookies into a [`CookieJar`] extension.
///
/// Leaves an existing jar untouched.
pub fn cookie_parser(signer: Option<Arc<CookieSigner>>) -> Middleware {
    middleware_fn(move |mut req: Request, next: Next| {
        let signer = signer.clone();
        async move {
            if req.extensions().get::<CookieJar>().is_none() {
                let jar = CookieJar::parse(req.headers().get_all(COOKIE), signer.as_deref());
                req.extensions_mut().insert(jar);
            }
            next.run(req).await
        }
    })
}
