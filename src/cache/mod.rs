//! Cache Module
//!
//! Provides the expiring in-memory store and the typed facade built on it.

mod convert;
mod data_cache;
mod entry;
mod policy;
mod stats;
mod store;


// Re-export public types
pub use convert::coerce;
pub use data_cache::{deep_copy, DataCache};
pub use entry::{CacheEntry, CachedValue, EntrySnapshot};
pub use policy::{Expiration, ExpirationPolicy};
pub use stats::CacheStats;
pub use store::ExpiringStore;
