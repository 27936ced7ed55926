//! Request DTOs for the cache HTTP harness
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use serde::Deserialize;
use serde_json::Value;

use crate::cache::ExpirationPolicy;

/// Request body for the insert operation (PUT /data)
///
/// Without `policy` the cache's configured default expiration is used.
/// `duration` is in seconds and is required for absolute and sliding policies.
#[derive(Debug, Clone, Deserialize)]
pub struct InsertRequest {
    /// The cache key
    pub key: String,
    /// Any JSON value
    pub value: Value,
    /// Optional expiration policy
    #[serde(default)]
    pub policy: Option<ExpirationPolicy>,
    /// Optional expiration duration in seconds
    #[serde(default)]
    pub duration: Option<u64>,
}

impl InsertRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        match (self.policy, self.duration) {
            (Some(ExpirationPolicy::Absolute | ExpirationPolicy::Sliding), None) => {
                Some("Duration is required for absolute and sliding expiration".to_string())
            }
            (None, Some(_)) => Some("Duration given without a policy".to_string()),
            _ => None,
        }
    }
}

/// Query string of DELETE /data
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RemoveQuery {
    /// Remove keys starting with this prefix; absent = remove everything
    #[serde(default)]
    pub prefix: Option<String>,
}
