//! Expiration Policy Module
//!
//! Defines how long an entry stays in the cache and tracks its deadline.

use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::error::CacheError;

/// Deadline used when `now + duration` does not fit in an `Instant`.
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 3600);

// == Expiration Policy ==
/// How an inserted entry expires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExpirationPolicy {
    /// Entry lives until removed; the duration is ignored
    #[default]
    NoExpiration,
    /// Entry expires a fixed duration after insertion
    Absolute,
    /// Entry expires once the duration elapses without a read
    Sliding,
}

impl fmt::Display for ExpirationPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ExpirationPolicy::NoExpiration => "no_expiration",
            ExpirationPolicy::Absolute => "absolute",
            ExpirationPolicy::Sliding => "sliding",
        };
        f.write_str(name)
    }
}

impl FromStr for ExpirationPolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "no_expiration" | "noexpiration" => Ok(ExpirationPolicy::NoExpiration),
            "absolute" | "absolute_expiration" => Ok(ExpirationPolicy::Absolute),
            "sliding" | "sliding_expiration" => Ok(ExpirationPolicy::Sliding),
            other => Err(CacheError::InvalidRequest(format!(
                "Unknown expiration policy: {}",
                other
            ))),
        }
    }
}

// == Expiration ==
/// Per-entry expiration state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expiration {
    /// Never expires
    Never,
    /// Expires at a fixed instant
    Absolute { deadline: Instant },
    /// Expires when `window` passes without a read since `last_access`
    Sliding { window: Duration, last_access: Instant },
}

impl Expiration {
    // == Constructor ==
    /// Builds the expiration state for an entry inserted at `now`.
    ///
    /// An absolute deadline past what `Instant` can represent is clamped to a
    /// century from `now`.
    pub fn new(policy: ExpirationPolicy, duration: Duration, now: Instant) -> Self {
        match policy {
            ExpirationPolicy::NoExpiration => Expiration::Never,
            ExpirationPolicy::Absolute => match now
                .checked_add(duration)
                .or_else(|| now.checked_add(FAR_FUTURE))
            {
                Some(deadline) => Expiration::Absolute { deadline },
                None => Expiration::Never,
            },
            ExpirationPolicy::Sliding => Expiration::Sliding {
                window: duration,
                last_access: now,
            },
        }
    }

    /// Returns the policy this state was built from.
    pub fn policy(&self) -> ExpirationPolicy {
        match self {
            Expiration::Never => ExpirationPolicy::NoExpiration,
            Expiration::Absolute { .. } => ExpirationPolicy::Absolute,
            Expiration::Sliding { .. } => ExpirationPolicy::Sliding,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry is expired at `now`.
    ///
    /// The boundary counts as expired: once the full duration has elapsed the
    /// entry is gone.
    pub fn is_expired(&self, now: Instant) -> bool {
        match self {
            Expiration::Never => false,
            Expiration::Absolute { deadline } => now >= *deadline,
            Expiration::Sliding {
                window,
                last_access,
            } => now.saturating_duration_since(*last_access) >= *window,
        }
    }

    // == Touch ==
    /// Restarts the sliding window. No-op for other policies.
    pub fn touch(&mut self, now: Instant) {
        if let Expiration::Sliding { last_access, .. } = self {
            *last_access = now;
        }
    }

    /// Time left before expiry, or None if the entry never expires.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        match self {
            Expiration::Never => None,
            Expiration::Absolute { deadline } => Some(deadline.saturating_duration_since(now)),
            Expiration::Sliding {
                window,
                last_access,
            } => Some(window.saturating_sub(now.saturating_duration_since(*last_access))),
        }
    }
}
