//! Configuration Module
//!
//! Handles loading the cache and server configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::cache::ExpirationPolicy;

// == Cache Config ==
/// Settings injected into [`DataCache`](crate::cache::DataCache).
///
/// Set once at startup and mutable afterwards only through the facade's setters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// When false every cache operation is a no-op
    pub enabled: bool,
    /// Policy applied by inserts that do not name one
    pub default_policy: ExpirationPolicy,
    /// Duration applied by inserts that do not name one
    pub default_duration: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_policy: ExpirationPolicy::NoExpiration,
            default_duration: Duration::from_secs(300),
        }
    }
}

// == Config ==
/// Process configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Whether caching is enabled at all
    pub cache_enabled: bool,
    /// Default expiration policy for inserts
    pub expiration_policy: ExpirationPolicy,
    /// Default expiration duration in seconds
    pub expiration_seconds: u64,
    /// HTTP server port
    pub server_port: u16,
    /// Background sweep interval in seconds
    pub sweep_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_ENABLED` - Enable the cache (default: true)
    /// - `CACHE_EXPIRATION_POLICY` - `no_expiration`, `absolute` or `sliding` (default: no_expiration)
    /// - `CACHE_EXPIRATION_SECONDS` - Default expiration duration (default: 300)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `SWEEP_INTERVAL` - Sweep frequency in seconds (default: 5)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cache_enabled: parse_var("CACHE_ENABLED").unwrap_or(defaults.cache_enabled),
            expiration_policy: parse_var("CACHE_EXPIRATION_POLICY")
                .unwrap_or(defaults.expiration_policy),
            expiration_seconds: parse_var("CACHE_EXPIRATION_SECONDS")
                .unwrap_or(defaults.expiration_seconds),
            server_port: parse_var("SERVER_PORT").unwrap_or(defaults.server_port),
            sweep_interval: parse_var("SWEEP_INTERVAL").unwrap_or(defaults.sweep_interval),
        }
    }

    /// Builds the configuration handed to the cache facade.
    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            enabled: self.cache_enabled,
            default_policy: self.expiration_policy,
            default_duration: Duration::from_secs(self.expiration_seconds),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            expiration_policy: ExpirationPolicy::NoExpiration,
            expiration_seconds: 300,
            server_port: 3000,
            sweep_interval: 5,
        }
    }
}

fn parse_var<T: FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.trim().parse().ok())
}
