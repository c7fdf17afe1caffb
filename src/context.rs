//! Application context shared by every bootstrap phase.
//!
//! Built once at bootstrap start and passed by `Arc` to every loader,
//! backend, provider and route module. Read-only after the load phase except
//! for the interior cells it owns: lazily bound facades, the service
//! container, the CSRF protection published by the security phase and the
//! server changes queued by providers.

use std::any::Any;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;

use crate::config::{AppSettings, ConfigStore, CookieSettings};
use crate::facade::{FacadeError, FacadeRegistry};
use crate::http::app::ServerQueue;
use crate::plugin::discovery::{FsDirectory, PluginDirectory};
use crate::plugin::kinds::Capability;
use crate::plugin::PluginRegistry;
use crate::security::CsrfProtection;

/// Where conventional directories are enumerated from.
pub trait DirectorySource: Send + Sync {
    fn open(&self, root: &Path, relative: &str) -> Box<dyn PluginDirectory>;
}

/// Enumerate conventional directories on disk under the application root.
#[derive(Debug, Clone, Copy, Default)]
pub struct FsSource;

impl DirectorySource for FsSource {
    fn open(&self, root: &Path, relative: &str) -> Box<dyn PluginDirectory> {
        Box::new(FsDirectory::new(root.join(relative)))
    }
}

/// Enumerate conventional directories from the registry's own keys, for
/// applications whose units are all registered in code.
#[derive(Clone)]
pub struct RegistrySource(pub Arc<PluginRegistry>);

impl DirectorySource for RegistrySource {
    fn open(&self, _root: &Path, relative: &str) -> Box<dyn PluginDirectory> {
        Box::new(self.0.directory(relative))
    }
}

/// Named capabilities registered by backends and providers.
///
/// Safe for concurrent writers, since backends and providers boot
/// concurrently.
#[derive(Default)]
pub struct ServiceContainer {
    services: DashMap<String, Capability>,
}

impl ServiceContainer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `service` under `name`, replacing any previous one.
    pub fn provide<T: Any + Send + Sync>(&self, name: impl Into<String>, service: T) {
        self.insert(name, Arc::new(service));
    }

    pub fn insert<T: Any + Send + Sync>(&self, name: impl Into<String>, service: Arc<T>) {
        let name = name.into();
        tracing::debug!(service = %name, "Service registered");
        self.services.insert(name, service);
    }

    /// Service `name`, if registered with type `T`.
    pub fn get<T: Any + Send + Sync>(&self, name: &str) -> Option<Arc<T>> {
        let service = self.services.get(name)?.value().clone();
        service.downcast::<T>().ok()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.services.iter().map(|e| e.key().clone()).collect();
        names.sort_unstable();
        names
    }
}

/// Explicit bootstrap state.
pub struct AppContext {
    root: PathBuf,
    config: ConfigStore,
    settings: AppSettings,
    cookies: CookieSettings,
    facades: FacadeRegistry,
    services: ServiceContainer,
    registry: Arc<PluginRegistry>,
    directories: Arc<dyn DirectorySource>,
    csrf: OnceCell<CsrfProtection>,
    server: ServerQueue,
}

impl AppContext {
    pub(crate) fn new(
        root: PathBuf,
        config: ConfigStore,
        settings: AppSettings,
        cookies: CookieSettings,
        facades: FacadeRegistry,
        registry: Arc<PluginRegistry>,
        directories: Arc<dyn DirectorySource>,
    ) -> Self {
        Self {
            root,
            config,
            settings,
            cookies,
            facades,
            services: ServiceContainer::new(),
            registry,
            directories,
            csrf: OnceCell::new(),
            server: ServerQueue::new(),
        }
    }

    /// A context with default settings and nothing registered.
    pub fn empty() -> Arc<Self> {
        Self::with_config(ConfigStore::new())
    }

    /// Like [`AppContext::empty`], over an already loaded store.
    pub fn with_config(config: ConfigStore) -> Arc<Self> {
        Arc::new(Self::new(
            PathBuf::from("."),
            config,
            AppSettings::default(),
            CookieSettings::default(),
            FacadeRegistry::new(),
            Arc::new(PluginRegistry::new()),
            Arc::new(FsSource),
        ))
    }

    /// Application root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    pub fn cookies(&self) -> &CookieSettings {
        &self.cookies
    }

    pub fn facades(&self) -> &FacadeRegistry {
        &self.facades
    }

    /// Capability behind a facade alias.
    pub fn facade<T: Any + Send + Sync>(&self, alias: &str) -> Result<Arc<T>, FacadeError> {
        self.facades.resolve(alias, self)
    }

    pub fn services(&self) -> &ServiceContainer {
        &self.services
    }

    pub fn registry(&self) -> &PluginRegistry {
        &self.registry
    }

    /// Handle on a conventional directory, relative to the root.
    pub fn directory(&self, relative: &str) -> Box<dyn PluginDirectory> {
        self.directories.open(&self.root, relative)
    }

    /// CSRF protection, once the security phase has configured it.
    ///
    /// Route modules use this to protect individual routes.
    pub fn csrf(&self) -> Option<&CsrfProtection> {
        self.csrf.get()
    }

    /// The server being booted. Providers queue middlewares and mounts here.
    pub fn server(&self) -> &ServerQueue {
        &self.server
    }

    pub(crate) fn publish_csrf(&self, protection: CsrfProtection) {
        if self.csrf.set(protection).is_err() {
            tracing::warn!("CSRF protection already configured");
        }
    }
}
