//! In-memory key → value cache with per-entry expiry.
//!
//! Keys are case-insensitive. Expired entries are dropped when read, when
//! `clear_expired` runs, or when a write finds the cache full. A full cache
//! with nothing expired evicts its oldest entry, so `len()` never exceeds the
//! capacity. The cache is owned by whoever constructs it; `close` ends its
//! lifetime explicitly.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Default TTL for location suggestions: 10 minutes.
pub const DEFAULT_TTL_SECS: i64 = 10 * 60;

/// Default maximum number of entries held at once.
pub const DEFAULT_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
struct CacheEntry<V> {
    value: V,
    stored_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl<V> CacheEntry<V> {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

/// Snapshot of cache occupancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub total: usize,
    pub valid: usize,
    pub expired: usize,
    pub oldest: Option<DateTime<Utc>>,
    pub newest: Option<DateTime<Utc>>,
}

#[derive(Debug)]
struct Inner<V> {
    entries: HashMap<String, CacheEntry<V>>,
    closed: bool,
}

/// A TTL cache safe to share between threads.
#[derive(Debug)]
pub struct TtlCache<V> {
    default_ttl: Duration,
    capacity: usize,
    inner: Mutex<Inner<V>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(default_ttl: Duration) -> Self {
        Self::with_capacity(default_ttl, DEFAULT_CAPACITY)
    }

    /// A cache holding at most `capacity` entries (at least one).
    pub fn with_capacity(default_ttl: Duration, capacity: usize) -> Self {
        Self {
            default_ttl,
            capacity: capacity.max(1),
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                closed: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<V>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look up a key. Returns None if missing, expired or the cache is closed.
    pub fn get(&self, key: &str) -> Option<V> {
        let key = key.to_lowercase();
        let mut inner = self.lock();
        let now = Utc::now();

        let expired = inner.entries.get(&key)?.is_expired(now);
        if expired {
            inner.entries.remove(&key);
            debug!(key = %key, "cache entry expired");
            return None;
        }
        inner.entries.get(&key).map(|e| e.value.clone())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Store with the default TTL.
    pub fn put(&self, key: &str, value: V) {
        self.put_with_ttl(key, value, self.default_ttl);
    }

    pub fn put_with_ttl(&self, key: &str, value: V, ttl: Duration) {
        let mut inner = self.lock();
        if inner.closed {
            return;
        }
        let now = Utc::now();
        let key = key.to_lowercase();

        if inner.entries.len() >= self.capacity && !inner.entries.contains_key(&key) {
            let before = inner.entries.len();
            inner.entries.retain(|_, e| !e.is_expired(now));
            let swept = before - inner.entries.len();
            if swept > 0 {
                debug!(swept, "swept expired cache entries on write");
            }

            if inner.entries.len() >= self.capacity {
                let oldest = inner
                    .entries
                    .iter()
                    .min_by_key(|(_, e)| e.stored_at)
                    .map(|(k, _)| k.clone());
                if let Some(oldest) = oldest {
                    inner.entries.remove(&oldest);
                    debug!(key = %oldest, "evicted oldest cache entry");
                }
            }
        }

        inner.entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: now,
                expires_at: now + ttl,
            },
        );
    }

    pub fn remove(&self, key: &str) -> bool {
        self.lock().entries.remove(&key.to_lowercase()).is_some()
    }

    pub fn clear(&self) {
        self.lock().entries.clear();
    }

    /// Drop every expired entry, returning how many were removed.
    pub fn clear_expired(&self) -> usize {
        let mut inner = self.lock();
        let now = Utc::now();
        let before = inner.entries.len();
        inner.entries.retain(|_, e| !e.is_expired(now));
        let removed = before - inner.entries.len();
        if removed > 0 {
            debug!(removed, "cleared expired cache entries");
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let now = Utc::now();
        let expired = inner.entries.values().filter(|e| e.is_expired(now)).count();
        CacheStats {
            total: inner.entries.len(),
            valid: inner.entries.len() - expired,
            expired,
            oldest: inner.entries.values().map(|e| e.stored_at).min(),
            newest: inner.entries.values().map(|e| e.stored_at).max(),
        }
    }

    /// Drop all entries and refuse further writes.
    pub fn close(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Number of entries, expired ones included.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> Self {
        Self::new(Duration::seconds(DEFAULT_TTL_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn test_cache() -> TtlCache<Vec<String>> {
        TtlCache::new(Duration::minutes(5))
    }

    #[test]
    fn test_cache_put_get() {
        let cache = test_cache();
        cache.put("douala", vec!["Douala, Cameroon".to_string()]);
        assert_eq!(cache.get("douala").unwrap(), vec!["Douala, Cameroon".to_string()]);
        assert!(cache.contains("douala"));
    }

    #[test]
    fn test_cache_case_insensitive() {
        let cache = test_cache();
        cache.put("Yaoundé", vec![]);
        assert!(cache.get("YAOUNDÉ").is_some());
        assert!(cache.get("yaoundé").is_some());
    }

    #[test]
    fn test_cache_miss() {
        assert!(test_cache().get("nonexistent").is_none());
    }

    #[test]
    fn test_zero_ttl_expires_immediately() {
        let cache = test_cache();
        cache.put_with_ttl("bastos", vec![], Duration::zero());
        assert!(cache.get("bastos").is_none());
        // Expired entries are removed on read.
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_clear_expired() {
        let cache = test_cache();
        cache.put_with_ttl("a", vec![], Duration::zero());
        cache.put_with_ttl("b", vec![], Duration::milliseconds(-1));
        cache.put("c", vec![]);

        let stats = cache.stats();
        assert_eq!(stats.total, 3);
        assert_eq!(stats.expired, 2);
        assert_eq!(stats.valid, 1);

        assert_eq!(cache.clear_expired(), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains("c"));
    }

    #[test]
    fn test_stats_timestamps() {
        let cache = test_cache();
        assert_eq!(cache.stats().oldest, None);
        cache.put("first", vec![]);
        std::thread::sleep(std::time::Duration::from_millis(5));
        cache.put("second", vec![]);
        let stats = cache.stats();
        assert!(stats.oldest.unwrap() < stats.newest.unwrap());
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = test_cache();
        cache.put("a", vec![]);
        cache.put("b", vec![]);
        assert!(cache.remove("A"));
        assert!(!cache.remove("a"));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn test_expired_entries_swept_on_write() {
        let cache: TtlCache<Vec<String>> = TtlCache::with_capacity(Duration::zero(), 64);
        for i in 0..5000 {
            cache.put(&format!("nowhere{i}"), vec![]);
        }
        assert!(cache.len() <= cache.capacity());
    }

    #[test]
    fn test_full_cache_evicts_oldest() {
        let cache: TtlCache<Vec<String>> = TtlCache::with_capacity(Duration::minutes(5), 2);
        cache.put("a", vec![]);
        std::thread::sleep(std::time::Duration::from_millis(5));
        cache.put("b", vec![]);
        std::thread::sleep(std::time::Duration::from_millis(5));
        cache.put("c", vec![]);

        assert_eq!(cache.len(), 2);
        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));

        // Overwriting a present key never evicts.
        cache.put("b", vec!["x".to_string()]);
        assert_eq!(cache.len(), 2);
        assert!(cache.contains("c"));
    }

    #[test]
    fn test_close_ignores_writes() {
        let cache = test_cache();
        cache.put("a", vec![]);
        cache.close();
        assert!(cache.is_closed());
        assert!(cache.get("a").is_none());
        cache.put("b", vec![]);
        assert!(cache.get("b").is_none());
    }

    #[test]
    fn test_shared_across_threads() {
        let cache = Arc::new(test_cache());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || cache.put(&format!("k{i}"), vec![i.to_string()]))
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.len(), 4);
        assert_eq!(cache.get("k2").unwrap(), vec!["2".to_string()]);
    }
}
