//! Cache Store Module
//!
//! Internally synchronized map from string keys to expiring entries.

use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, CachedValue, EntrySnapshot, Expiration, ExpirationPolicy};

#[derive(Debug, Default)]
struct StoreInner {
    /// Ordered so prefix scans and listings are lexicographic
    entries: BTreeMap<String, CacheEntry>,
    stats: CacheStats,
}

impl StoreInner {
    fn sync_total(&mut self) {
        let len = self.entries.len();
        self.stats.set_total_entries(len);
    }
}

// == Expiring Store ==
/// In-memory store with absolute and sliding expiration.
///
/// Every operation takes the lock once, so a sliding refresh happens in the
/// same critical section as the expiry check that precedes it.
#[derive(Debug, Default)]
pub struct ExpiringStore {
    inner: Mutex<StoreInner>,
}

impl ExpiringStore {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Returns a handle to the live value stored under `key`.
    ///
    /// An expired entry is removed and reported as absent. A sliding entry has
    /// its window restarted.
    pub fn get(&self, key: &str) -> Option<Arc<dyn CachedValue>> {
        self.get_at(key, Instant::now())
    }

    pub(crate) fn get_at(&self, key: &str, now: Instant) -> Option<Arc<dyn CachedValue>> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;

        match inner.entries.get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.expiration.touch(now);
                let value = Arc::clone(&entry.value);
                inner.stats.record_hit();
                Some(value)
            }
            Some(_) => {
                inner.entries.remove(key);
                inner.stats.record_expirations(1);
                inner.stats.record_miss();
                inner.sync_total();
                debug!(key, "evicted expired entry on read");
                None
            }
            None => {
                inner.stats.record_miss();
                None
            }
        }
    }

    // == Insert ==
    /// Stores `value` under `key`, replacing any previous entry.
    pub fn insert(
        &self,
        key: impl Into<String>,
        value: Arc<dyn CachedValue>,
        policy: ExpirationPolicy,
        duration: Duration,
    ) {
        self.insert_at(key, value, policy, duration, Instant::now());
    }

    pub(crate) fn insert_at(
        &self,
        key: impl Into<String>,
        value: Arc<dyn CachedValue>,
        policy: ExpirationPolicy,
        duration: Duration,
        now: Instant,
    ) {
        let entry = CacheEntry::new(value, Expiration::new(policy, duration, now));
        let mut inner = self.inner.lock();
        inner.entries.insert(key.into(), entry);
        inner.sync_total();
    }

    // == Remove ==
    /// Removes the entry stored under exactly `key`.
    ///
    /// Returns whether an entry was removed.
    pub fn remove(&self, key: &str) -> bool {
        let mut inner = self.inner.lock();
        let removed = inner.entries.remove(key).is_some();
        inner.sync_total();
        removed
    }

    // == Remove By Prefix ==
    /// Removes every entry whose key starts with `prefix` (case-sensitive).
    ///
    /// A key equal to `prefix` matches. An empty prefix matches everything.
    /// Returns the number of entries removed.
    pub fn remove_by_prefix(&self, prefix: &str) -> usize {
        let mut inner = self.inner.lock();

        let matching: Vec<String> = inner
            .entries
            .range::<str, _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &matching {
            inner.entries.remove(key);
        }

        inner.sync_total();
        matching.len()
    }

    // == Clear ==
    /// Removes all entries and returns how many there were.
    pub fn clear(&self) -> usize {
        let mut inner = self.inner.lock();
        let count = inner.entries.len();
        inner.entries.clear();
        inner.sync_total();
        count
    }

    // == Cleanup Expired ==
    /// Removes all expired entries.
    ///
    /// Returns the number of entries removed.
    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_at(Instant::now())
    }

    pub(crate) fn cleanup_expired_at(&self, now: Instant) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();

        inner.entries.retain(|_, entry| !entry.is_expired(now));

        let removed = before - inner.entries.len();
        inner.stats.record_expirations(removed);
        inner.sync_total();
        removed
    }

    // == Snapshot ==
    /// Describes every live entry, ordered by key.
    pub fn snapshot(&self) -> Vec<EntrySnapshot> {
        self.snapshot_at(Instant::now())
    }

    pub(crate) fn snapshot_at(&self, now: Instant) -> Vec<EntrySnapshot> {
        let inner = self.inner.lock();
        inner
            .entries
            .iter()
            .filter(|(_, entry)| !entry.is_expired(now))
            .map(|(key, entry)| entry.snapshot(key, now))
            .collect()
    }

    // == Stats ==
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats.clone()
    }

    // == Length ==
    /// Returns the number of resident entries.
    ///
    /// Expired entries not yet swept or read are included.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().entries.is_empty()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_store() -> ExpiringStore {
        let store = ExpiringStore::new();
        for key in ["ddd1", "ddd2", "ddd3", "ddd4", "sss", "aaa"] {
            store.insert(key, Arc::new(0i32), ExpirationPolicy::NoExpiration, Duration::ZERO);
        }
        store
    }

    fn read_i32(store: &ExpiringStore, key: &str, now: Instant) -> Option<i32> {
        store
            .get_at(key, now)
            .and_then(|value| (*value).as_any().downcast_ref::<i32>().copied())
    }

    #[test]
    fn test_store_new() {
        let store = ExpiringStore::new();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_insert_and_get() {
        let store = ExpiringStore::new();
        store.insert("key1", Arc::new(5i32), ExpirationPolicy::NoExpiration, Duration::ZERO);

        assert_eq!(read_i32(&store, "key1", Instant::now()), Some(5));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_get_nonexistent() {
        let store = ExpiringStore::new();
        assert!(store.get("nonexistent").is_none());
    }

    #[test]
    fn test_store_overwrite_replaces_policy() {
        let store = ExpiringStore::new();
        let now = Instant::now();
        store.insert_at(
            "key1",
            Arc::new(1i32),
            ExpirationPolicy::Absolute,
            Duration::from_secs(1),
            now,
        );
        store.insert_at(
            "key1",
            Arc::new(2i32),
            ExpirationPolicy::NoExpiration,
            Duration::ZERO,
            now,
        );

        assert_eq!(store.len(), 1);
        assert_eq!(read_i32(&store, "key1", now + Duration::from_secs(60)), Some(2));
    }

    #[test]
    fn test_store_absolute_expiration() {
        let store = ExpiringStore::new();
        let start = Instant::now();
        store.insert_at(
            "ddd1",
            Arc::new(0i32),
            ExpirationPolicy::Absolute,
            Duration::from_secs(3),
            start,
        );

        assert!(store.get_at("ddd1", start + Duration::from_secs(1)).is_some());
        assert!(store.get_at("ddd1", start + Duration::from_secs(2)).is_some());
        assert!(store.get_at("ddd1", start + Duration::from_secs(4)).is_none());
        assert!(store.is_empty(), "expired entry should be evicted on read");
    }

    #[test]
    fn test_store_sliding_expiration() {
        let store = ExpiringStore::new();
        let start = Instant::now();
        store.insert_at(
            "ddd1",
            Arc::new(0i32),
            ExpirationPolicy::Sliding,
            Duration::from_secs(3),
            start,
        );

        assert!(store.get_at("ddd1", start + Duration::from_secs(1)).is_some());
        assert!(store.get_at("ddd1", start + Duration::from_secs(3)).is_some());
        assert!(store.get_at("ddd1", start + Duration::from_secs(5)).is_some());
        assert!(store.get_at("ddd1", start + Duration::from_secs(9)).is_none());
    }

    #[test]
    fn test_store_remove() {
        let store = seeded_store();

        assert!(!store.remove("ddd"));
        assert_eq!(store.len(), 6);

        assert!(store.remove("ddd1"));
        assert_eq!(store.len(), 5);

        assert!(!store.remove("ss"));
        assert!(store.remove("sss"));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_store_remove_by_prefix() {
        let store = seeded_store();

        assert_eq!(store.remove_by_prefix("ddd"), 4);
        assert_eq!(store.len(), 2);

        assert_eq!(store.remove_by_prefix("sss"), 1);
        assert_eq!(store.len(), 1);
        assert!(store.get("aaa").is_some());
    }

    #[test]
    fn test_store_remove_by_prefix_is_case_sensitive() {
        let store = seeded_store();

        assert_eq!(store.remove_by_prefix("DDD"), 0);
        assert_eq!(store.len(), 6);
    }

    #[test]
    fn test_store_remove_by_empty_prefix_removes_all() {
        let store = seeded_store();

        assert_eq!(store.remove_by_prefix(""), 6);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_clear() {
        let store = seeded_store();

        assert_eq!(store.clear(), 6);
        assert!(store.is_empty());
        assert_eq!(store.clear(), 0);
    }

    #[test]
    fn test_store_cleanup_expired() {
        let store = ExpiringStore::new();
        let now = Instant::now();
        store.insert_at("short", Arc::new(1i32), ExpirationPolicy::Absolute, Duration::from_secs(1), now);
        store.insert_at("long", Arc::new(2i32), ExpirationPolicy::Absolute, Duration::from_secs(10), now);
        store.insert_at("forever", Arc::new(3i32), ExpirationPolicy::NoExpiration, Duration::ZERO, now);

        let removed = store.cleanup_expired_at(now + Duration::from_secs(2));
        assert_eq!(removed, 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.stats().expirations, 1);
    }

    #[test]
    fn test_store_stats() {
        let store = ExpiringStore::new();
        store.insert("key1", Arc::new(1i32), ExpirationPolicy::NoExpiration, Duration::ZERO);

        store.get("key1");
        store.get("nonexistent");

        let stats = store.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }

    #[test]
    fn test_store_snapshot_is_ordered_and_live_only() {
        let store = ExpiringStore::new();
        let now = Instant::now();
        store.insert_at("b", Arc::new(2i32), ExpirationPolicy::NoExpiration, Duration::ZERO, now);
        store.insert_at("a", Arc::new(1i32), ExpirationPolicy::NoExpiration, Duration::ZERO, now);
        store.insert_at("c", Arc::new(3i32), ExpirationPolicy::Absolute, Duration::from_secs(1), now);

        let keys: Vec<String> = store
            .snapshot_at(now + Duration::from_secs(5))
            .into_iter()
            .map(|entry| entry.key)
            .collect();
        assert_eq!(keys, vec!["a", "b"]);
    }

    #[test]
    fn test_store_concurrent_inserts() {
        let store = Arc::new(ExpiringStore::new());

        let handles: Vec<_> = (0..8)
            .map(|thread| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..100 {
                        store.insert(
                            format!("t{}-{}", thread, i),
                            Arc::new(i),
                            ExpirationPolicy::NoExpiration,
                            Duration::ZERO,
                        );
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(store.len(), 800);
        assert_eq!(store.remove_by_prefix("t3-"), 100);
    }
}
