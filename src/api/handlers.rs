//! API Handlers
//!
//! HTTP request handlers exercising the cache's public operations.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde_json::Value;
use tracing::debug;

use crate::cache::DataCache;
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::models::{
    EntriesResponse, GetResponse, HealthResponse, InsertRequest, InsertResponse, RemoveQuery,
    RemoveResponse, StatsResponse,
};

/// Application state shared across all handlers.
///
/// The cache synchronizes internally, so handlers share it through a plain Arc.
#[derive(Clone)]
pub struct AppState {
    pub cache: Arc<DataCache>,
}

impl AppState {
    pub fn new(cache: DataCache) -> Self {
        Self {
            cache: Arc::new(cache),
        }
    }

    /// Creates a new AppState with a fresh cache using `config`.
    pub fn from_config(config: CacheConfig) -> Self {
        Self::new(DataCache::new(config))
    }
}

/// Handler for PUT /data
pub async fn insert_handler(
    State(state): State<AppState>,
    Json(req): Json<InsertRequest>,
) -> Result<Json<InsertResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(CacheError::InvalidRequest(error_msg));
    }

    let policy = match req.policy {
        Some(policy) => {
            let duration = Duration::from_secs(req.duration.unwrap_or(0));
            state
                .cache
                .insert_data_with(req.key.clone(), req.value, policy, duration);
            policy
        }
        None => {
            state.cache.insert_data(req.key.clone(), req.value);
            state.cache.config().default_policy
        }
    };

    Ok(Json(InsertResponse::new(
        req.key,
        policy,
        state.cache.is_enabled(),
    )))
}

/// Handler for GET /data/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<Json<GetResponse>> {
    let value = state
        .cache
        .try_get_data::<Value>(&key)
        .ok_or_else(|| CacheError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value)))
}

/// Handler for DELETE /data/:key
///
/// Removes exactly the named key; a missing key is not an error.
pub async fn remove_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Json<RemoveResponse> {
    let removed = state.cache.remove_data(&key);
    Json(RemoveResponse::new(usize::from(removed)))
}

/// Handler for DELETE /data
///
/// With `?prefix=` removes every key starting with it, otherwise clears the cache.
pub async fn remove_all_handler(
    State(state): State<AppState>,
    Query(query): Query<RemoveQuery>,
) -> Json<RemoveResponse> {
    let removed = match query.prefix {
        Some(prefix) => state.cache.remove_all_data_by_prefix(&prefix),
        None => state.cache.remove_all_data(),
    };
    debug!(removed, "bulk removal");

    Json(RemoveResponse::new(removed))
}

/// Handler for GET /entries
pub async fn entries_handler(State(state): State<AppState>) -> Json<EntriesResponse> {
    Json(EntriesResponse::new(state.cache.entries()))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats();
    Json(StatsResponse::new(state.cache.is_enabled(), &stats))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}
