//! Response DTOs for the cache HTTP harness
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;
use serde_json::Value;

use crate::cache::{CacheStats, EntrySnapshot, ExpirationPolicy};

/// Response body for GET /data/:key
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: Value,
}

impl GetResponse {
    pub fn new(key: impl Into<String>, value: Value) -> Self {
        Self {
            key: key.into(),
            value,
        }
    }
}

/// Response body for PUT /data
#[derive(Debug, Clone, Serialize)]
pub struct InsertResponse {
    /// Success message
    pub message: String,
    /// The key that was stored
    pub key: String,
    /// Policy the entry was stored with
    pub policy: ExpirationPolicy,
    /// False when the cache is disabled and nothing was stored
    pub cached: bool,
}

impl InsertResponse {
    pub fn new(key: impl Into<String>, policy: ExpirationPolicy, cached: bool) -> Self {
        let key = key.into();
        let message = if cached {
            format!("Key '{}' cached", key)
        } else {
            format!("Cache disabled, key '{}' not stored", key)
        };
        Self {
            message,
            key,
            policy,
            cached,
        }
    }
}

/// Response body for DELETE /data and DELETE /data/:key
#[derive(Debug, Clone, Serialize)]
pub struct RemoveResponse {
    /// Number of entries removed
    pub removed: usize,
}

impl RemoveResponse {
    pub fn new(removed: usize) -> Self {
        Self { removed }
    }
}

/// Response body for GET /stats
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Whether caching is enabled
    pub enabled: bool,
    /// Number of reads that found a live entry
    pub hits: u64,
    /// Number of reads that found nothing
    pub misses: u64,
    /// Number of entries dropped because they expired
    pub expirations: u64,
    /// Current number of resident entries
    pub total_entries: usize,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
}

impl StatsResponse {
    pub fn new(enabled: bool, stats: &CacheStats) -> Self {
        Self {
            enabled,
            hits: stats.hits,
            misses: stats.misses,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
            hit_rate: stats.hit_rate(),
        }
    }
}

/// One row of the occupancy listing
#[derive(Debug, Clone, Serialize)]
pub struct ListedEntry {
    /// 1-based position in key order
    pub index: usize,
    #[serde(flatten)]
    pub entry: EntrySnapshot,
}

/// Response body for GET /entries
#[derive(Debug, Clone, Serialize)]
pub struct EntriesResponse {
    /// Number of live entries listed
    pub count: usize,
    pub entries: Vec<ListedEntry>,
}

impl EntriesResponse {
    pub fn new(entries: Vec<EntrySnapshot>) -> Self {
        let entries: Vec<ListedEntry> = entries
            .into_iter()
            .enumerate()
            .map(|(i, entry)| ListedEntry {
                index: i + 1,
                entry,
            })
            .collect();
        Self {
            count: entries.len(),
            entries,
        }
    }
}

/// Response body for GET /health
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
