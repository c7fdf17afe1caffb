//! Caching backend with an in-memory store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Deserialize;
use serde_json::Value;

use crate::context::AppContext;
use crate::error::BoxError;
use crate::plugin::BackendModule;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
struct CacheSettings {
    prefix: String,
    default_ttl_secs: Option<u64>,
}

#[derive(Debug, Clone)]
struct Entry {
    value: Value,
    expires_at: Option<Instant>,
}

/// Concurrent key/value cache with optional expiry.
#[derive(Debug, Default)]
pub struct CacheStore {
    prefix: String,
    default_ttl: Option<Duration>,
    entries: DashMap<String, Entry>,
}

impl CacheStore {
    pub fn new(prefix: impl Into<String>, default_ttl: Option<Duration>) -> Self {
        Self {
            prefix: prefix.into(),
            default_ttl,
            entries: DashMap::new(),
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}{key}", self.prefix)
    }

    /// Store with the default TTL.
    pub fn put(&self, key: &str, value: Value) {
        self.put_for(key, value, self.default_ttl);
    }

    pub fn put_for(&self, key: &str, value: Value, ttl: Option<Duration>) {
        let entry = Entry {
            value,
            expires_at: ttl.map(|ttl| Instant::now() + ttl),
        };
        self.entries.insert(self.key(key), entry);
    }

    /// Value for `key` unless missing or expired. Expired entries are evicted.
    pub fn get(&self, key: &str) -> Option<Value> {
        let key = self.key(key);
        {
            let entry = self.entries.get(&key)?;
            match entry.expires_at {
                Some(at) if at <= Instant::now() => {}
                _ => return Some(entry.value.clone()),
            }
        }
        self.entries.remove(&key);
        None
    }

    pub fn forget(&self, key: &str) -> bool {
        self.entries.remove(&self.key(key)).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct CacheBackend;

#[async_trait]
impl BackendModule for CacheBackend {
    async fn load(&self, ctx: Arc<AppContext>) -> Result<(), BoxError> {
        let settings: CacheSettings = ctx.config().typed("cache")?;
        let store = CacheStore::new(
            settings.prefix,
            settings.default_ttl_secs.map(Duration::from_secs),
        );
        tracing::info!(default_ttl = ?store.default_ttl, "Cache backend ready");
        ctx.services().provide("cache", store);
        Ok(())
    }
}
