//! Module identifier resolution.
//!
//! An identifier containing `/` or `.` is path-like and resolves relative to
//! the application root, whether written `./x`, `/x` or `x/y`. Anything else
//! is a bare name and resolves under the conventional directory for its kind.

use std::fmt;

use crate::plugin::PluginError;

/// Normalized, root-relative module key such as `app/providers/auth`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModuleKey(String);

impl ModuleKey {
    /// Normalize a root-relative path: drops `.` and empty segments,
    /// applies `..`.
    pub fn new(raw: &str) -> Result<Self, PluginError> {
        let mut segments: Vec<&str> = Vec::new();
        for segment in raw.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(PluginError::EscapesRoot(raw.to_owned()));
                    }
                }
                s => segments.push(s),
            }
        }
        if segments.is_empty() {
            return Err(PluginError::EmptyIdentifier);
        }
        Ok(Self(segments.join("/")))
    }

    /// Key for `name` inside `dir`.
    pub fn within(dir: &str, name: &str) -> Result<Self, PluginError> {
        Self::new(&format!("{dir}/{name}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Last path segment.
    pub fn name(&self) -> &str {
        self.0.rsplit('/').next().unwrap_or(&self.0)
    }

    /// Whether this key lives directly inside `dir`.
    pub fn is_in(&self, dir: &str) -> bool {
        match self.0.strip_prefix(dir.trim_matches('/')) {
            Some(rest) => rest.starts_with('/') && !rest[1..].contains('/'),
            None => false,
        }
    }
}

impl fmt::Display for ModuleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether `identifier` names a path rather than a bare unit.
pub fn is_path_like(identifier: &str) -> bool {
    identifier.contains('/') || identifier.contains('.')
}

/// Resolve `identifier` to a module key, using `base_dir` for bare names.
pub fn resolve(identifier: &str, base_dir: &str) -> Result<ModuleKey, PluginError> {
    let identifier = identifier.trim();
    if identifier.is_empty() {
        return Err(PluginError::EmptyIdentifier);
    }
    if is_path_like(identifier) {
        ModuleKey::new(identifier)
    } else {
        ModuleKey::within(base_dir, identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_names_resolve_under_base_dir() {
        let key = resolve("foo", "app/providers").unwrap();
        assert_eq!(key.as_str(), "app/providers/foo");
        assert_eq!(key.name(), "foo");
    }

    #[test]
    fn path_like_names_resolve_from_root() {
        assert_eq!(resolve("./foo", "app/providers").unwrap().as_str(), "foo");
        assert_eq!(resolve("foo/bar", "app/providers").unwrap().as_str(), "foo/bar");
        assert_eq!(resolve("/lib/x", "core").unwrap().as_str(), "lib/x");
        assert_eq!(resolve("vendor.search", "core").unwrap().as_str(), "vendor.search");
    }

    #[test]
    fn parent_segments_are_applied() {
        assert_eq!(ModuleKey::new("app/../lib/x").unwrap().as_str(), "lib/x");
        assert!(matches!(
            ModuleKey::new("../outside"),
            Err(PluginError::EscapesRoot(_))
        ));
    }

    #[test]
    fn empty_identifiers_are_rejected() {
        assert!(matches!(resolve("  ", "core"), Err(PluginError::EmptyIdentifier)));
        assert!(matches!(ModuleKey::new("./"), Err(PluginError::EmptyIdentifier)));
    }

    #[test]
    fn membership_is_direct_children_only() {
        let key = ModuleKey::new("app/providers/auth").unwrap();
        assert!(key.is_in("app/providers"));
        assert!(key.is_in("/app/providers/"));
        assert!(!key.is_in("app"));
        assert!(!key.is_in("app/prov"));
    }
}
