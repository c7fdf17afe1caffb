//! Plugin registry: the manifest of every loadable unit.
//!
//! Units are stored under normalized module keys. Loaders resolve
//! identifiers or discovered file stems to keys and look them up here,
//! checking that the unit is of the kind the loader expects.

use std::any::Any;
use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use axum::Router;
use futures_util::future::BoxFuture;

use crate::context::AppContext;
use crate::error::BoxError;
use crate::http::Middleware;
use crate::plugin::discovery::MemoryDirectory;
use crate::plugin::kinds::{
    BackendModule, FacadeTarget, MiddlewareConstructor, MiddlewareFactory, MiddlewareHandler,
    MiddlewarePlugin, ProviderConstructor, ProviderFn, ProviderPlugin, RouteModule, RoutesEntry,
    ServiceProvider,
};
use crate::plugin::{ModuleKey, PluginError, PluginUnit, ROUTES_DIR};

/// A registered unit.
#[derive(Clone)]
pub enum Registered {
    Backend(Arc<dyn BackendModule>),
    Middleware(MiddlewarePlugin),
    Provider(ProviderPlugin),
    Facade(FacadeTarget),
    Routes(RouteModule),
    RoutesEntry(RoutesEntry),
}

impl Registered {
    pub fn kind(&self) -> &'static str {
        match self {
            Registered::Backend(_) => "backend",
            Registered::Middleware(_) => "middleware",
            Registered::Provider(_) => "provider",
            Registered::Facade(_) => "facade",
            Registered::Routes(_) => "route module",
            Registered::RoutesEntry(_) => "routes entry point",
        }
    }
}

/// Registry of loadable units keyed by module key.
#[derive(Clone, Default)]
pub struct PluginRegistry {
    units: BTreeMap<ModuleKey, Registered>,
    rejected: Vec<String>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry preloaded with the framework's core backends and facades.
    pub fn with_core() -> Self {
        crate::backends::register_core(Self::new())
    }

    /// Insert `unit` under `key`, replacing any earlier registration.
    ///
    /// Keys that do not normalize are remembered and reported by
    /// [`PluginRegistry::check`].
    pub fn register(mut self, key: &str, unit: Registered) -> Self {
        match ModuleKey::new(key) {
            Ok(key) => {
                if self.units.insert(key.clone(), unit).is_some() {
                    tracing::warn!(module = %key, "Plugin registration replaced");
                }
            }
            Err(_) => self.rejected.push(key.to_owned()),
        }
        self
    }

    /// Fails if any registration used an invalid key.
    pub fn check(&self) -> Result<(), PluginError> {
        match self.rejected.first() {
            Some(key) => Err(PluginError::InvalidKey(key.clone())),
            None => Ok(()),
        }
    }

    pub fn backend<B>(self, key: &str, backend: B) -> Self
    where
        B: BackendModule + 'static,
    {
        self.register(key, Registered::Backend(Arc::new(backend)))
    }

    /// Register a lifecycle middleware: `construct` builds the unit, whose
    /// `handle()` yields the installable middleware.
    pub fn lifecycle_middleware<F, H>(self, key: &str, construct: F) -> Self
    where
        F: Fn(&AppContext) -> H + Send + Sync + 'static,
        H: MiddlewareHandler + 'static,
    {
        let ctor: MiddlewareConstructor =
            Arc::new(move |ctx: &AppContext| Box::new(construct(ctx)) as Box<dyn MiddlewareHandler>);
        self.register(key, Registered::Middleware(PluginUnit::Lifecycle(ctor)))
    }

    /// Register a stateless middleware factory.
    pub fn stateless_middleware<F>(self, key: &str, factory: F) -> Self
    where
        F: Fn(&AppContext) -> Middleware + Send + Sync + 'static,
    {
        let factory: MiddlewareFactory = Arc::new(factory);
        self.register(key, Registered::Middleware(PluginUnit::Stateless(factory)))
    }

    /// Register a lifecycle provider constructed with the application context.
    pub fn lifecycle_provider<F, P>(self, key: &str, construct: F) -> Self
    where
        F: Fn(Arc<AppContext>) -> P + Send + Sync + 'static,
        P: ServiceProvider + 'static,
    {
        let ctor: ProviderConstructor =
            Arc::new(move |ctx: Arc<AppContext>| Box::new(construct(ctx)) as Box<dyn ServiceProvider>);
        self.register(key, Registered::Provider(PluginUnit::Lifecycle(ctor)))
    }

    /// Register a stateless provider function.
    pub fn stateless_provider<F, Fut>(self, key: &str, provider: F) -> Self
    where
        F: Fn(Arc<AppContext>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<(), BoxError>> + Send + 'static,
    {
        let f: ProviderFn = Arc::new(move |ctx: Arc<AppContext>| {
            Box::pin(provider(ctx)) as BoxFuture<'static, Result<(), BoxError>>
        });
        self.register(key, Registered::Provider(PluginUnit::Stateless(f)))
    }

    /// Register a facade target producing a `T` on first use.
    pub fn facade<F, T>(self, key: &str, target: F) -> Self
    where
        F: Fn(&AppContext) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
        T: Any + Send + Sync,
    {
        let erased: FacadeTarget = Arc::new(move |ctx: &AppContext| {
            target(ctx).map(|t| t as Arc<dyn Any + Send + Sync>)
        });
        self.register(key, Registered::Facade(erased))
    }

    /// Register a route module mounted at `/<name>` for key `routes/<name>`.
    pub fn routes<F>(self, key: &str, module: F) -> Self
    where
        F: Fn(&AppContext) -> Option<Router> + Send + Sync + 'static,
    {
        self.register(key, Registered::Routes(Arc::new(module)))
    }

    /// Register the routes entry point (`routes/index`).
    pub fn routes_entry(self, entry: RoutesEntry) -> Self {
        self.register(&format!("{ROUTES_DIR}/index"), Registered::RoutesEntry(entry))
    }

    pub fn get(&self, key: &ModuleKey) -> Result<&Registered, PluginError> {
        self.units
            .get(key)
            .ok_or_else(|| PluginError::NotRegistered(key.clone()))
    }

    pub fn contains(&self, key: &ModuleKey) -> bool {
        self.units.contains_key(key)
    }

    pub fn backend_unit(&self, key: &ModuleKey) -> Result<Arc<dyn BackendModule>, PluginError> {
        match self.get(key)? {
            Registered::Backend(b) => Ok(b.clone()),
            other => Err(wrong_kind(key, "backend", other)),
        }
    }

    pub fn middleware_unit(&self, key: &ModuleKey) -> Result<MiddlewarePlugin, PluginError> {
        match self.get(key)? {
            Registered::Middleware(m) => Ok(m.clone()),
            other => Err(wrong_kind(key, "middleware", other)),
        }
    }

    pub fn provider_unit(&self, key: &ModuleKey) -> Result<ProviderPlugin, PluginError> {
        match self.get(key)? {
            Registered::Provider(p) => Ok(p.clone()),
            other => Err(wrong_kind(key, "provider", other)),
        }
    }

    pub fn facade_unit(&self, key: &ModuleKey) -> Result<FacadeTarget, PluginError> {
        match self.get(key)? {
            Registered::Facade(f) => Ok(f.clone()),
            other => Err(wrong_kind(key, "facade", other)),
        }
    }

    pub fn route_unit(&self, key: &ModuleKey) -> Result<RouteModule, PluginError> {
        match self.get(key)? {
            Registered::Routes(r) => Ok(r.clone()),
            other => Err(wrong_kind(key, "route module", other)),
        }
    }

    pub fn routes_entry_unit(&self) -> Result<RoutesEntry, PluginError> {
        let key = ModuleKey::within(ROUTES_DIR, "index")?;
        match self.get(&key)? {
            Registered::RoutesEntry(e) => Ok(e.clone()),
            other => Err(wrong_kind(&key, "routes entry point", other)),
        }
    }

    /// In-memory listing of the units registered directly inside `dir`,
    /// as `<name>.rs` file names.
    pub fn directory(&self, dir: &str) -> MemoryDirectory {
        MemoryDirectory::new(
            self.units
                .keys()
                .filter(|key| key.is_in(dir))
                .map(|key| format!("{}.rs", key.name())),
        )
    }
}

fn wrong_kind(key: &ModuleKey, expected: &'static str, found: &Registered) -> PluginError {
    PluginError::WrongKind {
        key: key.clone(),
        expected,
        found: found.kind(),
    }
}
