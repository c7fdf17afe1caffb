//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration (synchronously, once)
//! - Publish facades, then load backends as one concurrent batch
//! - Wire the server in fixed order: body parsing → cookies/CSRF → global
//!   middlewares → providers (and what they queued) → routes → static
//!   files → error handler
//!
//! # Design Decisions
//! - Fail fast: any phase error aborts the whole sequence
//! - Phases run strictly in order; only backends and providers run
//!   concurrently, each behind a full join barrier
//! - No timeouts: a loader that never completes stalls the bootstrap
//! - `Bootstrap` → `Server` → `App` consume each other, so no phase can run
//!   twice

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::{validate_settings, AppSettings, ConfigError, ConfigStore, CookieSettings};
use crate::context::{AppContext, DirectorySource, FsSource};
use crate::error::BootResult;
use crate::facade::FacadeRegistry;
use crate::http::app::{App, InstallStep};
use crate::http::body::body_parser;
use crate::loaders;
use crate::observability::metrics::record_phase;
use crate::plugin::{PluginRegistry, CONFIG_DIR};
use crate::security;

/// Entry point of the bootstrap sequence.
pub struct Bootstrap {
    root: PathBuf,
    registry: PluginRegistry,
    directories: Arc<dyn DirectorySource>,
}

impl Bootstrap {
    /// Bootstrap the application at `root` with the units in `registry`.
    pub fn new(root: impl Into<PathBuf>, registry: PluginRegistry) -> Self {
        Self {
            root: root.into(),
            registry,
            directories: Arc::new(FsSource),
        }
    }

    /// Enumerate conventional directories through `source` instead of the
    /// filesystem.
    pub fn with_directories(mut self, source: impl DirectorySource + 'static) -> Self {
        self.directories = Arc::new(source);
        self
    }

    /// Load `config/`, derive typed settings and validate them.
    pub fn configure(self) -> BootResult<Server> {
        let started = Instant::now();
        self.registry.check()?;

        let config = ConfigStore::load(&self.root.join(CONFIG_DIR))?;
        let settings = AppSettings::from_store(&config)?;
        let cookies = CookieSettings::from_store(&config)?;
        validate_settings(&settings, &cookies).map_err(ConfigError::Validation)?;

        tracing::info!(
            root = %self.root.display(),
            namespaces = ?config.namespaces(),
            "Configuration loaded"
        );
        record_phase("config", started);

        Ok(Server {
            root: self.root,
            config,
            settings,
            cookies,
            registry: Arc::new(self.registry),
            directories: self.directories,
        })
    }
}

/// Configure the application at `root`.
pub fn bootstrap(root: impl Into<PathBuf>, registry: PluginRegistry) -> BootResult<Server> {
    Bootstrap::new(root, registry).configure()
}

/// A configured application that has not been booted yet.
pub struct Server {
    root: PathBuf,
    config: ConfigStore,
    settings: AppSettings,
    cookies: CookieSettings,
    registry: Arc<PluginRegistry>,
    directories: Arc<dyn DirectorySource>,
}

impl Server {
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &ConfigStore {
        &self.config
    }

    pub fn settings(&self) -> &AppSettings {
        &self.settings
    }

    /// Run every loader phase and return the wired application.
    pub async fn boot(self) -> BootResult<App> {
        let started = Instant::now();
        let facades = FacadeRegistry::register(&self.settings.facades, &self.registry)?;
        tracing::info!(aliases = ?facades.aliases().collect::<Vec<_>>(), "Facades registered");

        let modules = self.settings.modules.clone();
        let body_limit = self.settings.body_limit;
        let ctx = Arc::new(AppContext::new(
            self.root,
            self.config,
            self.settings,
            self.cookies,
            facades,
            self.registry,
            self.directories,
        ));
        record_phase("facades", started);

        let started = Instant::now();
        loaders::load_all(&ctx, &modules).await?;
        record_phase("backends", started);

        let started = Instant::now();
        let mut app = App::new(ctx.clone());
        app.use_middleware(InstallStep::BodyParser, body_parser(body_limit));
        security::configure(&mut app, &ctx)?;
        loaders::install_global(&mut app, &ctx)?;
        record_phase("middlewares", started);

        let started = Instant::now();
        loaders::boot_all(&ctx).await?;
        let queued = app.apply_queued();
        if queued > 0 {
            tracing::info!(changes = queued, "Provider server changes applied");
        }
        record_phase("providers", started);

        let started = Instant::now();
        loaders::assemble(&mut app, &ctx)?;
        record_phase("routes", started);

        tracing::info!(steps = app.installed().len(), "Application booted");
        Ok(app)
    }
}
