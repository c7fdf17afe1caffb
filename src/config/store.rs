//! In-memory configuration store with dotted-path lookup.

use std::collections::HashMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::config::loader::{load_units, ConfigError};

/// Namespace-indexed configuration values.
///
/// Populated once at bootstrap start and read-only afterwards. The first
/// segment of a dotted path names the namespace (the config file stem);
/// remaining segments descend into the unit's value tree.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    units: HashMap<String, Value>,
}

impl ConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every unit from `dir` into a new store.
    pub fn load(dir: &Path) -> Result<Self, ConfigError> {
        let mut store = Self::new();
        store.load_into(dir)?;
        Ok(store)
    }

    /// Load units from `dir` into this store, returning how many were read.
    pub fn load_into(&mut self, dir: &Path) -> Result<usize, ConfigError> {
        let units = load_units(dir)?;
        let count = units.len();
        for unit in units {
            tracing::debug!(namespace = %unit.namespace, "Config unit loaded");
            self.insert(unit.namespace, unit.value);
        }
        Ok(count)
    }

    /// Register a namespace, replacing any previous value.
    pub fn insert(&mut self, namespace: impl Into<String>, value: Value) {
        self.units.insert(namespace.into(), value);
    }

    /// Whether a namespace has been loaded.
    pub fn contains(&self, namespace: &str) -> bool {
        self.units.contains_key(namespace)
    }

    /// Loaded namespaces, sorted.
    pub fn namespaces(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.units.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Look up a dotted path such as `app.port`.
    ///
    /// Numeric segments index into arrays.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut segments = path.split('.');
        let namespace = segments.next().filter(|s| !s.is_empty())?;
        let mut current = self.units.get(namespace)?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Look up a dotted path, falling back to `default` when absent.
    pub fn get_or(&self, path: &str, default: impl Into<Value>) -> Value {
        self.get(path).cloned().unwrap_or_else(|| default.into())
    }

    pub fn bool_or(&self, path: &str, default: bool) -> bool {
        self.get(path).and_then(Value::as_bool).unwrap_or(default)
    }

    pub fn u64_or(&self, path: &str, default: u64) -> u64 {
        self.get(path).and_then(Value::as_u64).unwrap_or(default)
    }

    pub fn str_or<'a>(&'a self, path: &str, default: &'a str) -> &'a str {
        self.get(path).and_then(Value::as_str).unwrap_or(default)
    }

    /// Read a list of strings; non-string items are skipped.
    pub fn string_list(&self, path: &str) -> Option<Vec<String>> {
        let items = self.get(path)?.as_array()?;
        Some(
            items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_owned))
                .collect(),
        )
    }

    /// Deserialize a whole namespace into `T`.
    ///
    /// An absent namespace deserializes from an empty table, so schemas with
    /// `#[serde(default)]` come back fully defaulted.
    pub fn typed<T: DeserializeOwned>(&self, namespace: &str) -> Result<T, ConfigError> {
        let value = self
            .units
            .get(namespace)
            .cloned()
            .unwrap_or_else(|| Value::Object(Map::new()));
        serde_json::from_value(value).map_err(|source| ConfigError::Schema {
            namespace: namespace.to_owned(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> ConfigStore {
        let mut store = ConfigStore::new();
        store.insert("app", json!({ "port": 4000, "modules": ["mail", "caching"] }));
        store.insert("cookies", json!({ "enable_csrf": true, "nested": { "deep": "yes" } }));
        store
    }

    #[test]
    fn dotted_lookup_descends_namespaces() {
        let store = store();
        assert_eq!(store.get("app.port"), Some(&json!(4000)));
        assert_eq!(store.get("cookies.nested.deep"), Some(&json!("yes")));
        assert_eq!(store.get("app.modules.1"), Some(&json!("caching")));
    }

    #[test]
    fn absent_paths_fall_back_to_default() {
        let store = store();
        assert_eq!(store.get_or("app.missing", "x"), json!("x"));
        assert_eq!(store.get_or("unknown.port", 1), json!(1));
        assert_eq!(store.get_or("app.port.inner", false), json!(false));
        assert_eq!(store.get(""), None);
    }

    #[test]
    fn present_key_ignores_default() {
        let store = store();
        assert_eq!(store.get_or("app.port", 3000), json!(4000));
        assert!(store.bool_or("cookies.enable_csrf", false));
        assert_eq!(store.u64_or("app.port", 1), 4000);
    }

    #[test]
    fn later_insert_overwrites_namespace() {
        let mut store = store();
        store.insert("app", json!({ "port": 5000 }));
        assert_eq!(store.get("app.port"), Some(&json!(5000)));
        assert_eq!(store.get("app.modules"), None);
    }

    #[test]
    fn string_list_reads_arrays() {
        let store = store();
        assert_eq!(
            store.string_list("app.modules"),
            Some(vec!["mail".to_string(), "caching".to_string()])
        );
        assert_eq!(store.string_list("app.port"), None);
    }
}
