//! Configuration Module
//!
//! Selects the eviction policy and its bounds, either programmatically or from
//! environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

// == Eviction Policy ==
/// The eviction strategy backing a cache instance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvictionPolicy {
    /// Size-bounded least-recently-used, with optional per-entry TTL
    #[default]
    Lru,
    /// TTL-bounded, purging soonest-to-expire entries on overflow
    Ttl,
}

impl FromStr for EvictionPolicy {
    type Err = CacheError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lru" => Ok(Self::Lru),
            "ttl" => Ok(Self::Ttl),
            other => Err(CacheError::UnknownPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for EvictionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lru => f.write_str("lru"),
            Self::Ttl => f.write_str("ttl"),
        }
    }
}

/// Cache configuration parameters.
///
/// `max_entries == 0` means unbounded. The TTL is serialized as whole
/// milliseconds under `ttl_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Eviction strategy
    #[serde(default)]
    pub policy: EvictionPolicy,
    /// Maximum number of entries the cache can hold
    #[serde(default)]
    pub max_entries: usize,
    /// Per-entry time to live
    #[serde(default, rename = "ttl_ms", with = "duration_ms")]
    pub ttl: Option<Duration>,
    /// Extend an entry's life on every successful lookup (TTL policy only)
    #[serde(default)]
    pub refresh_on_read: bool,
}

impl CacheConfig {
    /// LRU cache whose entries only leave by capacity pressure or removal.
    pub fn lru(max_entries: usize) -> Self {
        Self {
            policy: EvictionPolicy::Lru,
            max_entries,
            ttl: None,
            refresh_on_read: false,
        }
    }

    /// LRU cache whose entries also expire `ttl` after their last write.
    pub fn lru_with_ttl(max_entries: usize, ttl: Duration) -> Self {
        Self {
            ttl: Some(ttl),
            ..Self::lru(max_entries)
        }
    }

    /// TTL cache, optionally sliding each entry's expiry forward on read.
    pub fn ttl(max_entries: usize, ttl: Duration, refresh_on_read: bool) -> Self {
        Self {
            policy: EvictionPolicy::Ttl,
            max_entries,
            ttl: Some(ttl),
            refresh_on_read,
        }
    }

    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_POLICY` - `lru` or `ttl` (default: lru)
    /// - `CACHE_MAX_ENTRIES` - Maximum cache entries, 0 = unbounded (default: 1000)
    /// - `CACHE_TTL_MS` - Entry TTL in milliseconds (default: none)
    /// - `CACHE_REFRESH_ON_READ` - Sliding expiration for the TTL policy (default: false)
    ///
    /// Missing or unparsable values fall back to their defaults; call
    /// [`CacheConfig::validate`] before building an engine.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            policy: env::var("CACHE_POLICY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.policy),
            max_entries: env::var("CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_entries),
            ttl: env::var("CACHE_TTL_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::from_millis)
                .or(defaults.ttl),
            refresh_on_read: env::var("CACHE_REFRESH_ON_READ")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.refresh_on_read),
        }
    }

    // == Validate ==
    /// Rejects configurations whose eviction invariants cannot hold.
    pub fn validate(&self) -> Result<()> {
        if let Some(ttl) = self.ttl {
            if ttl.is_zero() {
                return Err(CacheError::InvalidConfig(
                    "ttl must be greater than zero".to_string(),
                ));
            }
            // The ttl round-trips through `ttl_ms`
            if duration_ms::whole_millis(ttl).is_none() {
                return Err(CacheError::InvalidConfig(format!(
                    "ttl {ttl:?} is not a whole number of milliseconds"
                )));
            }
        }

        match self.policy {
            EvictionPolicy::Ttl if self.ttl.is_none() => Err(CacheError::InvalidConfig(
                "ttl policy requires a ttl".to_string(),
            )),
            EvictionPolicy::Lru if self.refresh_on_read => Err(CacheError::InvalidConfig(
                "refresh_on_read is only supported by the ttl policy".to_string(),
            )),
            _ => Ok(()),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::lru(1000)
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::ser::Error;
    use serde::{Deserialize, Deserializer, Serializer};

    /// Millisecond count of `ttl`, if it is exact and fits in a u64.
    pub fn whole_millis(ttl: Duration) -> Option<u64> {
        if ttl.subsec_nanos() % 1_000_000 != 0 {
            return None;
        }
        u64::try_from(ttl.as_millis()).ok()
    }

    pub fn serialize<S: Serializer>(
        ttl: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match ttl {
            Some(ttl) => match whole_millis(*ttl) {
                Some(ms) => serializer.serialize_some(&ms),
                None => Err(S::Error::custom(format!(
                    "ttl {ttl:?} is not a whole number of milliseconds"
                ))),
            },
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_millis))
    }
}
