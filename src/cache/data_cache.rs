//! Typed Cache Facade
//!
//! Wraps the [`ExpiringStore`] with type recovery, deep-copy reads and the
//! process configuration (enabled flag and default expiration).

use std::any::{type_name, Any};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::cache::convert::coerce;
use crate::cache::{CacheStats, CachedValue, EntrySnapshot, ExpirationPolicy, ExpiringStore};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};

// == Data Cache ==
/// Typed facade over a shared [`ExpiringStore`].
///
/// Every operation checks the enabled flag first. While disabled, reads return
/// the caller's default and writes and removals do nothing.
///
/// Reads through [`get_data`](Self::get_data) return a `Clone` of the stored
/// value. For shared handles such as `Arc<Mutex<T>>` that clone aliases the
/// cached instance, so in-place mutation is visible to later readers. Use
/// [`get_deep_copied_data`](Self::get_deep_copied_data) to get an isolated copy.
#[derive(Debug)]
pub struct DataCache {
    store: Arc<ExpiringStore>,
    config: RwLock<CacheConfig>,
}

impl DataCache {
    // == Constructor ==
    pub fn new(config: CacheConfig) -> Self {
        Self::with_store(Arc::new(ExpiringStore::new()), config)
    }

    /// Creates a facade over an existing store.
    pub fn with_store(store: Arc<ExpiringStore>, config: CacheConfig) -> Self {
        Self {
            store,
            config: RwLock::new(config),
        }
    }

    /// The underlying store, shared with the background sweep.
    pub fn store(&self) -> &Arc<ExpiringStore> {
        &self.store
    }

    // == Configuration ==
    pub fn config(&self) -> CacheConfig {
        *self.config.read()
    }

    pub fn is_enabled(&self) -> bool {
        self.config.read().enabled
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.config.write().enabled = enabled;
    }

    /// Changes the expiration applied by [`insert_data`](Self::insert_data).
    pub fn set_default_expiration(&self, policy: ExpirationPolicy, duration: Duration) {
        let mut config = self.config.write();
        config.default_policy = policy;
        config.default_duration = duration;
    }

    // == Get ==
    /// Looks up `key` and recovers it as `T`.
    ///
    /// A value stored as another scalar type is converted when possible.
    /// Returns None on a miss, an expired entry, a failed conversion or a
    /// disabled cache.
    pub fn try_get_data<T>(&self, key: &str) -> Option<T>
    where
        T: Any + Clone,
    {
        if !self.is_enabled() {
            return None;
        }

        let handle = self.store.get(key)?;
        let value: &dyn CachedValue = &*handle;

        if let Some(value) = value.as_any().downcast_ref::<T>() {
            return Some(value.clone());
        }
        convert_or_log(key, value)
    }

    /// Returns the value stored under `key` as `T`, or `default`.
    pub fn get_data<T>(&self, key: &str, default: T) -> T
    where
        T: Any + Clone,
    {
        self.try_get_data(key).unwrap_or(default)
    }

    // == Get Deep Copied ==
    /// Like [`try_get_data`](Self::try_get_data), but the result shares nothing
    /// with the cached instance.
    ///
    /// The copy is made by a serde round trip of the whole value graph (see
    /// [`deep_copy`]). A value that cannot be round-tripped yields None.
    pub fn try_get_deep_copied_data<T>(&self, key: &str) -> Option<T>
    where
        T: Any + Serialize + DeserializeOwned,
    {
        if !self.is_enabled() {
            return None;
        }

        let handle = self.store.get(key)?;
        let value: &dyn CachedValue = &*handle;

        if let Some(value) = value.as_any().downcast_ref::<T>() {
            return match deep_copy(value) {
                Ok(copy) => Some(copy),
                Err(err) => {
                    warn!(key, error = %err, "deep copy failed, treating as a miss");
                    None
                }
            };
        }
        convert_or_log(key, value)
    }

    /// Returns an isolated copy of the value stored under `key`, or `default`.
    pub fn get_deep_copied_data<T>(&self, key: &str, default: T) -> T
    where
        T: Any + Serialize + DeserializeOwned,
    {
        self.try_get_deep_copied_data(key).unwrap_or(default)
    }

    // == Insert ==
    /// Stores `value` with the configured default expiration.
    pub fn insert_data<T: CachedValue>(&self, key: impl Into<String>, value: T) {
        let config = self.config();
        if !config.enabled {
            return;
        }
        self.store.insert(
            key,
            Arc::new(value),
            config.default_policy,
            config.default_duration,
        );
    }

    /// Stores `value` with an explicit expiration. `duration` is ignored for
    /// [`ExpirationPolicy::NoExpiration`].
    pub fn insert_data_with<T: CachedValue>(
        &self,
        key: impl Into<String>,
        value: T,
        policy: ExpirationPolicy,
        duration: Duration,
    ) {
        if !self.is_enabled() {
            return;
        }
        self.store.insert(key, Arc::new(value), policy, duration);
    }

    pub fn insert_absolute_expiration_data<T: CachedValue>(
        &self,
        key: impl Into<String>,
        value: T,
        duration: Duration,
    ) {
        self.insert_data_with(key, value, ExpirationPolicy::Absolute, duration);
    }

    pub fn insert_sliding_expiration_data<T: CachedValue>(
        &self,
        key: impl Into<String>,
        value: T,
        duration: Duration,
    ) {
        self.insert_data_with(key, value, ExpirationPolicy::Sliding, duration);
    }

    // == Remove ==
    /// Removes exactly `key`. Returns whether something was removed.
    pub fn remove_data(&self, key: &str) -> bool {
        if !self.is_enabled() {
            return false;
        }
        self.store.remove(key)
    }

    /// Removes every key starting with `prefix`. Returns the number removed.
    pub fn remove_all_data_by_prefix(&self, prefix: &str) -> usize {
        if !self.is_enabled() {
            return 0;
        }
        self.store.remove_by_prefix(prefix)
    }

    /// Removes everything. Returns the number removed.
    pub fn remove_all_data(&self) -> usize {
        if !self.is_enabled() {
            return 0;
        }
        self.store.clear()
    }

    // == Introspection ==
    /// Number of resident entries; 0 while disabled.
    pub fn count(&self) -> usize {
        if !self.is_enabled() {
            return 0;
        }
        self.store.len()
    }

    /// Live entries ordered by key; empty while disabled.
    pub fn entries(&self) -> Vec<EntrySnapshot> {
        if !self.is_enabled() {
            return Vec::new();
        }
        self.store.snapshot()
    }

    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }
}

impl Default for DataCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

fn convert_or_log<T: Any>(key: &str, value: &dyn CachedValue) -> Option<T> {
    let converted = coerce::<T>(value.as_any());
    if converted.is_none() {
        debug!(
            key,
            stored = value.type_name(),
            requested = type_name::<T>(),
            "cached value not convertible to requested type"
        );
    }
    converted
}

// == Deep Copy ==
/// Produces an independent copy of `value` through a serde round trip.
///
/// The value is encoded with bincode, which keeps every `Option` tag, so
/// `Some(None)` and `None` stay distinct. Types that only deserialize from a
/// self-describing format (`serde_json::Value`, untagged enums) go through
/// JSON instead, and that copy is rejected unless it encodes to the same bytes
/// as the original.
///
/// The copy is whatever the type's serde impls reconstruct: fields marked
/// `#[serde(skip)]` come back as their `Default`.
pub fn deep_copy<T>(value: &T) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let bytes = bincode::serialize(value).map_err(serialization_error)?;
    match bincode::deserialize(&bytes) {
        Ok(copy) => Ok(copy),
        Err(err) if matches!(*err, bincode::ErrorKind::DeserializeAnyNotSupported) => {
            copy_through_json(value, &bytes)
        }
        Err(err) => Err(serialization_error(err)),
    }
}

fn copy_through_json<T>(value: &T, encoded: &[u8]) -> Result<T>
where
    T: Serialize + DeserializeOwned,
{
    let tree = serde_json::to_value(value).map_err(serialization_error)?;
    let copy: T = serde_json::from_value(tree).map_err(serialization_error)?;

    let copied = bincode::serialize(&copy).map_err(serialization_error)?;
    if copied != encoded {
        return Err(CacheError::Serialization(format!(
            "{} changes when copied through JSON",
            type_name::<T>()
        )));
    }
    Ok(copy)
}

fn serialization_error(err: impl std::fmt::Display) -> CacheError {
    CacheError::Serialization(err.to_string())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    use parking_lot::Mutex;
    use serde::Deserialize;
    use serde_json::{json, Value};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Something {
        id: i32,
        name: String,
        description: Option<String>,
    }

    fn something() -> Something {
        Something {
            id: 1,
            name: "Name".to_string(),
            description: None,
        }
    }

    fn shared_default() -> Arc<Mutex<Something>> {
        Arc::new(Mutex::new(Something {
            id: 0,
            name: "default".to_string(),
            description: None,
        }))
    }

    #[test]
    fn test_insert_and_get() {
        let cache = DataCache::default();
        cache.insert_data("a", 1i32);

        assert_eq!(cache.get_data("a", 0i32), 1);
        assert_eq!(cache.get_data("missing", -1i32), -1);
    }

    #[test]
    fn test_get_struct() {
        let cache = DataCache::default();
        cache.insert_data("something", something());

        let value = cache.get_data::<Option<Something>>("something", None);
        assert!(value.is_none(), "Option<Something> is a different type");

        let value = cache.try_get_data::<Something>("something");
        assert_eq!(value, Some(something()));
    }

    #[test]
    fn test_scalar_coercion() {
        let cache = DataCache::default();
        cache.insert_data("int", 42i32);
        cache.insert_data("text", "17".to_string());

        assert_eq!(cache.get_data("int", 0i64), 42);
        assert_eq!(cache.get_data("int", String::new()), "42");
        assert_eq!(cache.get_data("text", 0u8), 17);
    }

    #[test]
    fn test_type_mismatch_returns_default() {
        let cache = DataCache::default();
        cache.insert_data("something", something());

        assert_eq!(cache.get_data("something", 5i32), 5);
        assert_eq!(cache.get_data("something", vec![1u8]), vec![1u8]);
    }

    #[test]
    fn test_shared_read_aliases_cached_instance() {
        let cache = DataCache::default();
        cache.insert_data("something", Arc::new(Mutex::new(something())));

        let first = cache.get_data("something", shared_default());
        first.lock().id += 1;

        let second = cache.get_data("something", shared_default());
        assert_eq!(second.lock().id, 2);
    }

    #[test]
    fn test_deep_copied_read_is_isolated() {
        let cache = DataCache::default();
        cache.insert_data("something", Arc::new(Mutex::new(something())));

        let copy = cache.get_deep_copied_data("something", shared_default());
        copy.lock().id += 1;
        assert_eq!(copy.lock().id, 2);

        let cached = cache.get_data("something", shared_default());
        assert_eq!(cached.lock().id, 1);
    }

    /// Refuses to serialize, like a handle to an OS resource would.
    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Opaque(u8);

    impl Serialize for Opaque {
        fn serialize<S: serde::Serializer>(&self, _: S) -> std::result::Result<S::Ok, S::Error> {
            Err(serde::ser::Error::custom("opaque values cannot be serialized"))
        }
    }

    #[test]
    fn test_deep_copy_failure_returns_default() {
        let cache = DataCache::default();
        cache.insert_data("opaque", Opaque(1));

        assert_eq!(cache.get_deep_copied_data("opaque", Opaque(0)), Opaque(0));
        assert_eq!(cache.get_data("opaque", Opaque(0)), Opaque(1));
    }

    #[test]
    fn test_deep_copy_keeps_nested_options_distinct() {
        let cache = DataCache::default();
        cache.insert_data("nested", Some(None::<i32>));
        cache.insert_data("outer", None::<Option<i32>>);

        assert_eq!(
            cache.get_deep_copied_data("nested", Some(Some(7))),
            Some(None)
        );
        assert_eq!(cache.get_deep_copied_data("outer", Some(Some(7))), None);
    }

    #[test]
    fn test_deep_copy_non_string_map_keys() {
        let cache = DataCache::default();
        let mut grid: HashMap<(u8, u8), String> = HashMap::new();
        grid.insert((0, 0), "origin".to_string());
        cache.insert_data("grid", grid.clone());

        let copy = cache.get_deep_copied_data("grid", HashMap::<(u8, u8), String>::new());
        assert_eq!(copy, grid);
    }

    #[test]
    fn test_deep_copy_json_value() {
        let cache = DataCache::default();
        let value = json!({"id": 1, "ratio": 2.5, "tags": ["a", null], "nested": {"ok": true}});
        cache.insert_data("json", value.clone());

        assert_eq!(cache.get_deep_copied_data("json", Value::Null), value);
    }

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    #[serde(untagged)]
    enum Loose {
        Nested(Option<Option<i32>>),
    }

    #[test]
    fn test_lossy_json_copy_returns_default() {
        let cache = DataCache::default();
        cache.insert_data("loose", Loose::Nested(Some(None)));

        let copy = cache.get_deep_copied_data("loose", Loose::Nested(Some(Some(7))));
        assert_eq!(copy, Loose::Nested(Some(Some(7))));
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct WithScratch {
        id: i32,
        #[serde(skip)]
        scratch: u32,
    }

    #[test]
    fn test_deep_copy_resets_skipped_fields() {
        let original = WithScratch { id: 3, scratch: 99 };

        let copy = deep_copy(&original).unwrap();
        assert_eq!(copy, WithScratch { id: 3, scratch: 0 });
    }

    #[test]
    fn test_deep_copy_of_missing_key_returns_default() {
        let cache = DataCache::default();
        assert_eq!(cache.get_deep_copied_data("missing", something()), something());
    }

    #[test]
    fn test_default_expiration_is_applied() {
        let cache = DataCache::default();
        cache.set_default_expiration(ExpirationPolicy::Sliding, Duration::from_secs(60));
        cache.insert_data("slides", 1i32);
        cache.insert_data_with("stays", 2i32, ExpirationPolicy::NoExpiration, Duration::ZERO);

        let entries = cache.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].key, "slides");
        assert_eq!(entries[0].policy, ExpirationPolicy::Sliding);
        assert_eq!(entries[1].policy, ExpirationPolicy::NoExpiration);
    }

    #[test]
    fn test_disabled_cache_is_noop() {
        let cache = DataCache::new(CacheConfig {
            enabled: false,
            ..CacheConfig::default()
        });

        cache.insert_data("a", 1i32);
        cache.insert_absolute_expiration_data("b", 2i32, Duration::from_secs(10));

        assert_eq!(cache.get_data("a", 0i32), 0);
        assert_eq!(cache.count(), 0);
        assert_eq!(cache.store().len(), 0);
        assert!(cache.entries().is_empty());
    }

    #[test]
    fn test_disabling_hides_existing_entries() {
        let cache = DataCache::default();
        cache.insert_data("a", 1i32);

        cache.set_enabled(false);
        assert_eq!(cache.get_data("a", 0i32), 0);
        assert!(!cache.remove_data("a"));
        assert_eq!(cache.remove_all_data(), 0);

        cache.set_enabled(true);
        assert_eq!(cache.get_data("a", 0i32), 1);
    }

    #[test]
    fn test_remove_operations() {
        let cache = DataCache::default();
        for key in ["ddd1", "ddd2", "ddd3", "ddd4", "sss", "aaa"] {
            cache.insert_data(key, 0i32);
        }

        assert!(!cache.remove_data("ddd"));
        assert_eq!(cache.count(), 6);
        assert!(cache.remove_data("ddd1"));
        assert_eq!(cache.count(), 5);

        assert_eq!(cache.remove_all_data_by_prefix("ddd"), 3);
        assert_eq!(cache.count(), 2);

        assert_eq!(cache.remove_all_data(), 2);
        assert_eq!(cache.count(), 0);
    }

    #[test]
    fn test_deep_copy_helper() {
        let original = vec![something(), something()];
        let copy = deep_copy(&original).unwrap();
        assert_eq!(copy, original);
    }

    #[test]
    fn test_insert_with_unrepresentable_duration() {
        let cache = DataCache::default();
        cache.insert_data_with(
            "absolute",
            1i32,
            ExpirationPolicy::Absolute,
            Duration::from_secs(u64::MAX),
        );
        cache.insert_sliding_expiration_data("sliding", 2i32, Duration::MAX);

        assert_eq!(cache.get_data("absolute", 0i32), 1);
        assert_eq!(cache.get_data("sliding", 0i32), 2);

        let entries = cache.entries();
        assert_eq!(entries[0].policy, ExpirationPolicy::Absolute);
        assert_eq!(entries[1].expires_in_ms, Some(u64::MAX));
    }

    #[test]
    fn test_huge_default_expiration() {
        let cache = DataCache::new(CacheConfig {
            enabled: true,
            default_policy: ExpirationPolicy::Absolute,
            default_duration: Duration::from_secs(u64::MAX),
        });

        cache.insert_data("a", 1i32);
        cache.insert_data("b", 2i32);

        assert_eq!(cache.get_data("a", 0i32), 1);
        assert_eq!(cache.count(), 2);
    }
}
