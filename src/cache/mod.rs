//! Cache Module
//!
//! Provides the two eviction engines (LRU and TTL) and the locking facade
//! that serializes access to whichever one a cache was built with.

mod entry;
mod lru;
mod stats;
mod store;
mod ttl;

#[cfg(test)]
mod property_tests;

use std::time::Instant;

// Re-export public types
pub use entry::{CacheEntry, Expiry};
pub use lru::LruCache;
pub use stats::CacheStats;
pub use store::Cache;
pub use ttl::TtlCache;

// == Cache Core ==
/// Operations shared by both eviction engines.
///
/// Engines are plain single-threaded data structures. Every operation that
/// depends on time receives the caller's clock reading, so one facade call
/// compares against a single `now`.
pub trait CacheCore<K, V> {
    /// Inserts or overwrites `key`, refreshing its expiry, then enforces the
    /// entry bound.
    fn insert(&mut self, key: K, value: V, now: Instant);

    /// Number of tracked entries, including expired ones not yet swept.
    fn size(&self) -> usize;

    /// Returns the live value for `key`, dropping it if it has expired.
    fn lookup(&mut self, key: &K, now: Instant) -> Option<&V>;

    /// Removes `key`, returning its value if it was present.
    fn remove(&mut self, key: &K) -> Option<V>;

    /// Discards every entry. Statistics counters survive.
    fn clear(&mut self);

    /// Checks for a live entry without touching recency, expiry or stats.
    fn contains(&self, key: &K, now: Instant) -> bool;

    /// Removes every entry that has expired as of `now` and returns how many.
    fn purge_expired(&mut self, now: Instant) -> usize;

    /// Snapshot of the engine's counters.
    fn stats(&self) -> CacheStats;
}
