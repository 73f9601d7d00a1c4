//! tlcache - An in-process key/value cache
//!
//! Offers size-bounded LRU eviction (optionally with a per-entry TTL) and
//! TTL-bounded eviction with optional sliding expiration, both behind one
//! thread-safe [`Cache`] facade.
//!
//! ```
//! use std::time::Duration;
//! use tlcache::Cache;
//!
//! let cache = Cache::ttl(100, Duration::from_secs(30), true).unwrap();
//! cache.insert("session", 42);
//! assert_eq!(cache.lookup(&"session"), Some(42));
//! ```

pub mod cache;
pub mod config;
pub mod error;

pub use cache::{Cache, CacheCore, CacheStats};
pub use config::{CacheConfig, EvictionPolicy};
pub use error::{CacheError, Result};
