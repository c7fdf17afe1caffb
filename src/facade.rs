//! Facade aliases with lazy binding.
//!
//! # Responsibilities
//! - Resolve every configured alias to a registered facade target
//! - Produce the capability on first use and cache it for the process
//!
//! # Design Decisions
//! - Targets are resolved eagerly, capabilities lazily: a missing target
//!   fails the bootstrap, but a facade over a backend service can be
//!   registered before that backend has loaded
//! - Registration happens once, before any other loader phase

use std::any::{type_name, Any};
use std::collections::BTreeMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use thiserror::Error;

use crate::context::AppContext;
use crate::error::BoxError;
use crate::plugin::kinds::{Capability, FacadeTarget};
use crate::plugin::{resolve, ModuleKey, PluginError, PluginRegistry, FACADE_DIR};

/// Errors raised when a facade is used.
#[derive(Debug, Error)]
pub enum FacadeError {
    #[error("unknown facade alias '{0}'")]
    UnknownAlias(String),

    #[error("facade '{alias}' could not be resolved: {source}")]
    Resolve {
        alias: String,
        #[source]
        source: BoxError,
    },

    #[error("facade '{alias}' is not a {expected}")]
    TypeMismatch {
        alias: String,
        expected: &'static str,
    },
}

struct Facade {
    target: ModuleKey,
    factory: FacadeTarget,
    cell: OnceCell<Capability>,
}

/// Published facade aliases.
#[derive(Default)]
pub struct FacadeRegistry {
    facades: BTreeMap<String, Facade>,
}

impl FacadeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish every alias in `aliases` (alias → module identifier).
    pub fn register(
        aliases: &BTreeMap<String, String>,
        registry: &PluginRegistry,
    ) -> Result<Self, PluginError> {
        let mut facades = BTreeMap::new();
        for (alias, identifier) in aliases {
            let target = resolve(identifier, FACADE_DIR)?;
            let factory = registry.facade_unit(&target)?;
            tracing::debug!(alias = %alias, target = %target, "Facade published");
            facades.insert(
                alias.clone(),
                Facade {
                    target,
                    factory,
                    cell: OnceCell::new(),
                },
            );
        }
        Ok(Self { facades })
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.facades.keys().map(String::as_str)
    }

    pub fn target(&self, alias: &str) -> Option<&ModuleKey> {
        self.facades.get(alias).map(|f| &f.target)
    }

    /// Whether the alias has been used (and therefore bound) yet.
    pub fn is_bound(&self, alias: &str) -> bool {
        self.facades
            .get(alias)
            .is_some_and(|f| f.cell.get().is_some())
    }

    /// Capability behind `alias`, binding it on first use.
    ///
    /// A failed resolution is not cached; the next call retries.
    pub fn resolve<T: Any + Send + Sync>(
        &self,
        alias: &str,
        ctx: &AppContext,
    ) -> Result<Arc<T>, FacadeError> {
        let facade = self
            .facades
            .get(alias)
            .ok_or_else(|| FacadeError::UnknownAlias(alias.to_owned()))?;

        let capability = facade
            .cell
            .get_or_try_init(|| (facade.factory)(ctx))
            .map_err(|source| FacadeError::Resolve {
                alias: alias.to_owned(),
                source,
            })?;

        capability
            .clone()
            .downcast::<T>()
            .map_err(|_| FacadeError::TypeMismatch {
                alias: alias.to_owned(),
                expected: type_name::<T>(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Mailer(&'static str);

    fn aliases(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(a, t)| (a.to_string(), t.to_string()))
            .collect()
    }

    #[test]
    fn binds_lazily_and_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        let registry = PluginRegistry::new().facade("core/facades/mail", move |_| {
            counted.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(Mailer("smtp")))
        });

        let facades = FacadeRegistry::register(&aliases(&[("Mail", "mail")]), &registry).unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert!(!facades.is_bound("Mail"));

        let ctx = AppContext::empty();
        let first = facades.resolve::<Mailer>("Mail", &ctx).unwrap();
        let second = facades.resolve::<Mailer>("Mail", &ctx).unwrap();
        assert_eq!(first.0, "smtp");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(facades.is_bound("Mail"));
    }

    #[test]
    fn path_like_targets_resolve_from_root() {
        let registry = PluginRegistry::new()
            .facade("app/facades/billing", |_| Ok(Arc::new(Mailer("billing"))));
        let facades =
            FacadeRegistry::register(&aliases(&[("Billing", "./app/facades/billing")]), &registry)
                .unwrap();
        assert_eq!(facades.target("Billing").unwrap().as_str(), "app/facades/billing");
    }

    #[test]
    fn unregistered_target_fails_registration() {
        let err = FacadeRegistry::register(&aliases(&[("Cache", "cache")]), &PluginRegistry::new())
            .err()
            .unwrap();
        assert!(matches!(err, PluginError::NotRegistered(_)));
    }

    #[test]
    fn wrong_type_and_unknown_alias_are_reported() {
        let registry = PluginRegistry::new().facade("core/facades/mail", |_| Ok(Arc::new(Mailer("x"))));
        let facades = FacadeRegistry::register(&aliases(&[("Mail", "mail")]), &registry).unwrap();
        let ctx = AppContext::empty();
        assert!(matches!(
            facades.resolve::<String>("Mail", &ctx),
            Err(FacadeError::TypeMismatch { .. })
        ));
        assert!(matches!(
            facades.resolve::<Mailer>("Nope", &ctx),
            Err(FacadeError::UnknownAlias(_))
        ));
    }
}
