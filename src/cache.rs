//! TTL-expiring rate cache.
//!
//! In-memory key/value store for previously fetched exchange rates and
//! derived statistics. Both cached quantities (exchange rates and average
//! percentage changes) are scalar, so values are plain `f64`.
//!
//! Concurrency: `set` is atomic per key and last-write-wins. Two in-flight
//! requests for the same pair may both miss and re-fetch; the resulting
//! double write is a tolerated benign race since entries are idempotent.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

struct CacheEntry {
    value: f64,
    inserted_at: DateTime<Utc>,
}

/// Time-expiring key/value store with a single TTL per cache instance.
pub struct RateCache {
    ttl: Duration,
    entries: Mutex<HashMap<String, CacheEntry>>,
}

impl RateCache {
    /// Create a cache whose entries expire after `ttl_secs` seconds.
    pub fn from_secs(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::seconds(ttl_secs as i64),
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Return the cached value only if present and not expired.
    /// A stale entry is never returned.
    pub fn get(&self, key: &str) -> Option<f64> {
        let entries = self.lock();
        entries.get(key).and_then(|entry| {
            if Utc::now() - entry.inserted_at < self.ttl {
                Some(entry.value)
            } else {
                None
            }
        })
    }

    /// Store `value` with the current timestamp, overwriting any prior
    /// entry for the key.
    pub fn set(&self, key: &str, value: f64) {
        let mut entries = self.lock();
        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: Utc::now(),
            },
        );
    }

    /// Remove an entry. Deleting an absent key is a no-op.
    pub fn delete(&self, key: &str) {
        let mut entries = self.lock();
        entries.remove(key);
    }

    /// Drop all expired entries.
    pub fn evict_expired(&self) {
        let now = Utc::now();
        let mut entries = self.lock();
        entries.retain(|_, entry| now - entry.inserted_at < self.ttl);
    }

    /// Number of entries currently held (including not-yet-evicted stale ones).
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A poisoned lock only means some writer panicked mid-insert; the map
    /// itself is still usable, and a degraded cache must never fail a scan.
    fn lock(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
