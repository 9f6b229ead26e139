//! TTL map with lazy expiry
//!
//! Entries carry an expiry deadline computed at insertion time. Lookups
//! remove and ignore entries past their deadline; there is no background
//! sweep, no capacity limit, and no LRU. The key space is bounded by the
//! distinct locations/domains queried in a session, so lazy expiry is enough.

use std::collections::HashMap;
use std::time::{Duration, Instant};

/// A single cached value with its expiry deadline
#[derive(Debug)]
struct Entry<V> {
    /// The cached value
    value: V,
    /// Deadline after which the value is stale
    expires_at: Instant,
}

/// An in-memory map from string keys to values with per-entry TTLs.
///
/// Expired entries are evicted lazily on the next lookup for their key.
/// Setting an existing key overwrites the value and resets the expiry clock.
#[derive(Debug, Default)]
pub struct TtlCache<V> {
    entries: HashMap<String, Entry<V>>,
}

impl<V> TtlCache<V> {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Returns the value for `key` if present and not expired.
    ///
    /// An expired entry is removed and reported as absent; a lookup never
    /// triggers a fetch on its own.
    pub fn get(&mut self, key: &str) -> Option<&V> {
        let now = Instant::now();
        if let Some(entry) = self.entries.get(key) {
            if now >= entry.expires_at {
                self.entries.remove(key);
                return None;
            }
        }
        self.entries.get(key).map(|entry| &entry.value)
    }

    /// Inserts or overwrites the entry for `key`, valid for `ttl` from now.
    pub fn set(&mut self, key: impl Into<String>, value: V, ttl: Duration) {
        self.entries.insert(
            key.into(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Forces immediate expiry of the entry for `key`, if any.
    pub fn invalidate(&mut self, key: &str) {
        self.entries.remove(key);
    }

    /// Number of entries currently held, including not-yet-evicted stale ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries at all.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
