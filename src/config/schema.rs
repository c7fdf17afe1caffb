//! Typed views over the `app` and `cookies` namespaces.
//!
//! All types derive Serde traits and default every field, so a missing
//! namespace or key falls back to the framework defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::loader::ConfigError;
use crate::config::store::ConfigStore;

/// Port used by `serve` when neither the caller nor `app.port` sets one.
pub const DEFAULT_PORT: u16 = 3000;

/// Backend modules loaded when `app.modules` is omitted.
pub const DEFAULT_MODULES: [&str; 3] = ["mail", "database", "caching"];

/// Settings read from the `app` namespace.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppSettings {
    /// Listening port.
    pub port: Option<u16>,

    /// Application key used to sign cookies.
    pub key: Option<String>,

    /// Static asset directory, relative to the application root.
    pub static_dir: Option<String>,

    /// Backend modules to load, in declaration order.
    pub modules: Vec<String>,

    /// Providers to boot when autoload is off.
    pub providers: Vec<String>,

    /// Discover providers from `app/providers/` instead of `providers`.
    pub autoload_providers: bool,

    /// Facade alias → module identifier.
    pub facades: BTreeMap<String, String>,

    /// Explicit global middleware order. `None` autoloads the directory.
    pub middlewares: Option<Vec<String>>,

    /// Maximum buffered request body, in bytes.
    pub body_limit: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            port: None,
            key: None,
            static_dir: None,
            modules: DEFAULT_MODULES.iter().map(|m| m.to_string()).collect(),
            providers: Vec::new(),
            autoload_providers: false,
            facades: BTreeMap::new(),
            middlewares: None,
            body_limit: 1024 * 1024,
        }
    }
}

impl AppSettings {
    pub fn from_store(store: &ConfigStore) -> Result<Self, ConfigError> {
        store.typed("app")
    }
}

/// `SameSite` attribute for framework-issued cookies.
///
/// Accepts either a boolean (`true` is strict, `false` omits the attribute)
/// or one of `"strict"`, `"lax"`, `"none"`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SameSite {
    Flag(bool),
    Policy(String),
}

impl Default for SameSite {
    fn default() -> Self {
        SameSite::Flag(true)
    }
}

impl SameSite {
    /// Attribute value for a `Set-Cookie` header, if any.
    pub fn attribute(&self) -> Option<&'static str> {
        match self {
            SameSite::Flag(true) => Some("Strict"),
            SameSite::Flag(false) => None,
            SameSite::Policy(p) => match p.to_ascii_lowercase().as_str() {
                "strict" => Some("Strict"),
                "lax" => Some("Lax"),
                "none" => Some("None"),
                _ => None,
            },
        }
    }

    pub fn is_valid(&self) -> bool {
        match self {
            SameSite::Flag(_) => true,
            SameSite::Policy(_) => self.attribute().is_some(),
        }
    }
}

/// Settings read from the `cookies` namespace.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CookieSettings {
    pub enable_cookie_parser: bool,
    pub enable_csrf: bool,
    pub enable_global_csrf: bool,
    pub cookie_path: String,
    pub secure_cookie: bool,
    pub http_only_cookie: bool,
    pub same_site_cookie: SameSite,

    /// Methods exempt from CSRF token checks.
    pub csrf_ignored_methods: Vec<String>,

    /// Cookie max-age in seconds.
    pub cookie_max_age: Option<u64>,
    pub cookie_domain: Option<String>,

    /// Name of the client-readable token cookie set by global CSRF.
    pub csrf_token_name: String,
}

impl Default for CookieSettings {
    fn default() -> Self {
        Self {
            enable_cookie_parser: false,
            enable_csrf: false,
            enable_global_csrf: false,
            cookie_path: "/".to_string(),
            secure_cookie: false,
            http_only_cookie: false,
            same_site_cookie: SameSite::default(),
            csrf_ignored_methods: vec!["GET".into(), "HEAD".into(), "OPTIONS".into()],
            cookie_max_age: None,
            cookie_domain: None,
            csrf_token_name: "XSRF-TOKEN".to_string(),
        }
    }
}

impl CookieSettings {
    pub fn from_store(store: &ConfigStore) -> Result<Self, ConfigError> {
        store.typed("cookies")
    }

    /// Whether a cookie parser must be installed.
    pub fn wants_cookie_parser(&self) -> bool {
        self.enable_cookie_parser || self.enable_csrf
    }
}
