//! Cache Entry Module
//!
//! Defines the stored value wrapper and the per-entry expiration metadata.

use std::any::Any;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;

use crate::cache::{Expiration, ExpirationPolicy};

// == Cached Value ==
/// Any value that can live in the cache.
///
/// Implemented for every `'static + Send + Sync + Debug` type. `as_any` is what
/// the facade uses to recover the concrete type on reads.
pub trait CachedValue: Any + Send + Sync + Debug {
    fn as_any(&self) -> &dyn Any;

    fn type_name(&self) -> &'static str;
}

impl<T> CachedValue for T
where
    T: Any + Send + Sync + Debug,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }
}

// == Cache Entry ==
/// A single stored value together with its expiration state.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value, shared with readers that received a handle
    pub value: Arc<dyn CachedValue>,
    /// Expiration state
    pub expiration: Expiration,
}

impl CacheEntry {
    // == Constructor ==
    pub fn new(value: Arc<dyn CachedValue>, expiration: Expiration) -> Self {
        Self { value, expiration }
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expiration.is_expired(now)
    }

    /// Renders the entry for the occupancy listing.
    pub fn snapshot(&self, key: &str, now: Instant) -> EntrySnapshot {
        let value: &dyn CachedValue = &*self.value;
        EntrySnapshot {
            key: key.to_string(),
            type_name: value.type_name().to_string(),
            value: format!("{:?}", value),
            policy: self.expiration.policy(),
            expires_in_ms: self
                .expiration
                .remaining(now)
                .map(|remaining| u64::try_from(remaining.as_millis()).unwrap_or(u64::MAX)),
        }
    }
}

// == Entry Snapshot ==
/// Read-only description of a live entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntrySnapshot {
    pub key: String,
    pub type_name: String,
    /// Debug rendering of the stored value
    pub value: String,
    pub policy: ExpirationPolicy,
    /// Milliseconds until expiry, None = never expires
    pub expires_in_ms: Option<u64>,
}
