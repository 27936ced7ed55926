//! Data Cache - A process-wide typed key/value cache
//!
//! Provides typed reads, deep-copied reads, absolute and sliding expiration,
//! and removal by exact key or key prefix.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod tasks;

pub use api::AppState;
pub use cache::{DataCache, ExpirationPolicy, ExpiringStore};
pub use config::{CacheConfig, Config};
pub use tasks::spawn_sweep_task;
