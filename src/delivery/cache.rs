//! In-memory cache for prepared deliveries and passthrough replies.
//!
//! Keyed by image identifier. Entries expire after a fixed TTL; when full,
//! expired entries are dropped first, then the oldest one. Concurrent misses
//! for the same key are not coalesced.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::config::CacheConfig;
use crate::observability::metrics;

struct Entry<V> {
    value: V,
    stored_at: Instant,
}

/// A thread-safe TTL cache.
#[derive(Clone)]
pub struct Cache<V> {
    name: &'static str,
    entries: Arc<DashMap<String, Entry<V>>>,
    ttl: Duration,
    max_entries: usize,
}

impl<V: Clone> Cache<V> {
    pub fn new(name: &'static str, ttl: Duration, max_entries: usize) -> Self {
        Self {
            name,
            entries: Arc::new(DashMap::new()),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Build from configuration; `None` when caching is disabled.
    pub fn from_config(name: &'static str, config: &CacheConfig) -> Option<Self> {
        config
            .enabled
            .then(|| Self::new(name, Duration::from_secs(config.ttl_secs), config.max_entries))
    }

    /// Look up a live entry.
    pub fn get(&self, key: &str) -> Option<V> {
        let expired = match self.entries.get(key) {
            Some(entry) if !self.is_stale(&entry) => {
                metrics::record_cache_lookup(self.name, true);
                return Some(entry.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.remove_stale(key);
        }
        metrics::record_cache_lookup(self.name, false);
        None
    }

    fn is_stale(&self, entry: &Entry<V>) -> bool {
        entry.stored_at.elapsed() >= self.ttl
    }

    /// Drop `key` only if the entry under the lock is still stale, so a value
    /// re-inserted after the lookup survives.
    fn remove_stale(&self, key: &str) {
        self.entries.remove_if(key, |_, entry| self.is_stale(entry));
    }

    /// Store a value, evicting if the cache is full.
    pub fn insert(&self, key: &str, value: V) {
        if self.entries.len() >= self.max_entries && !self.entries.contains_key(key) {
            self.evict();
        }
        self.entries.insert(
            key.to_string(),
            Entry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    fn evict(&self) {
        self.entries.retain(|_, entry| !self.is_stale(entry));

        if self.entries.len() >= self.max_entries {
            let oldest = self
                .entries
                .iter()
                .min_by_key(|entry| entry.stored_at)
                .map(|entry| entry.key().clone());
            if let Some(key) = oldest {
                tracing::debug!(cache = self.name, key = %key, "Evicting oldest cache entry");
                self.entries.remove(&key);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
