//! Cache Store Module
//!
//! Thread-safe facade over the engine chosen at construction time.

use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::info;

use crate::cache::{CacheCore, CacheStats, LruCache, TtlCache};
use crate::config::{CacheConfig, EvictionPolicy};
use crate::error::Result;

// The two eviction engines a cache can be built on.
enum Engine<K, V> {
    Lru(LruCache<K, V>),
    Ttl(TtlCache<K, V>),
}

impl<K, V> Engine<K, V>
where
    K: Clone + Eq + Hash,
{
    fn core(&mut self) -> &mut dyn CacheCore<K, V> {
        match self {
            Engine::Lru(lru) => lru,
            Engine::Ttl(ttl) => ttl,
        }
    }

    fn core_ref(&self) -> &dyn CacheCore<K, V> {
        match self {
            Engine::Lru(lru) => lru,
            Engine::Ttl(ttl) => ttl,
        }
    }
}

// == Cache ==
/// In-process key/value cache with LRU or TTL eviction.
///
/// Every operation runs under one exclusive lock, so a `Cache` can be shared
/// across threads (e.g. behind an `Arc`). Time-dependent operations read the
/// clock once, after taking the lock.
pub struct Cache<K, V> {
    engine: Mutex<Engine<K, V>>,
    policy: EvictionPolicy,
}

impl<K, V> Cache<K, V>
where
    K: Clone + Eq + Hash,
{
    // == Constructor ==
    /// Builds a cache from a validated configuration.
    ///
    /// # Errors
    /// Returns [`CacheError::InvalidConfig`](crate::error::CacheError::InvalidConfig)
    /// when the configuration is rejected by [`CacheConfig::validate`].
    pub fn new(config: CacheConfig) -> Result<Self> {
        config.validate()?;

        let engine = match (config.policy, config.ttl) {
            (EvictionPolicy::Ttl, Some(ttl)) => Engine::Ttl(TtlCache::new(
                config.max_entries,
                ttl,
                config.refresh_on_read,
            )),
            // validate() guarantees the TTL policy always carries a ttl
            (_, ttl) => Engine::Lru(LruCache::new(config.max_entries, ttl)),
        };

        info!(
            policy = %config.policy,
            max_entries = config.max_entries,
            ttl_ms = config
                .ttl
                .map(|ttl| u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX)),
            refresh_on_read = config.refresh_on_read,
            "cache created"
        );

        Ok(Self {
            engine: Mutex::new(engine),
            policy: config.policy,
        })
    }

    /// LRU cache bounded only by entry count.
    pub fn lru(max_entries: usize) -> Self {
        Self {
            engine: Mutex::new(Engine::Lru(LruCache::new(max_entries, None))),
            policy: EvictionPolicy::Lru,
        }
    }

    /// LRU cache whose entries also expire `ttl` after their last write.
    pub fn lru_with_ttl(max_entries: usize, ttl: Duration) -> Result<Self> {
        Self::new(CacheConfig::lru_with_ttl(max_entries, ttl))
    }

    /// TTL cache, optionally sliding expiry forward on every hit.
    pub fn ttl(max_entries: usize, ttl: Duration, refresh_on_read: bool) -> Result<Self> {
        Self::new(CacheConfig::ttl(max_entries, ttl, refresh_on_read))
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    // == Insert ==
    /// Stores a key-value pair, overwriting and refreshing any existing entry.
    pub fn insert(&self, key: K, value: V) {
        let mut engine = self.engine.lock();
        let now = Instant::now();
        engine.core().insert(key, value, now);
    }

    // == Lookup ==
    /// Returns a clone of the live value for `key`.
    ///
    /// `None` covers both absent and expired keys.
    pub fn lookup(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        let mut engine = self.engine.lock();
        let now = Instant::now();
        engine.core().lookup(key, now).cloned()
    }

    // == Remove ==
    /// Removes `key`, returning its value. Absent keys are a no-op.
    pub fn remove(&self, key: &K) -> Option<V> {
        self.engine.lock().core().remove(key)
    }

    /// Number of tracked entries, including expired ones not yet swept.
    pub fn size(&self) -> usize {
        self.engine.lock().core_ref().size()
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    pub fn clear(&self) {
        self.engine.lock().core().clear();
    }

    /// Checks for a live entry without counting as a use.
    pub fn contains(&self, key: &K) -> bool {
        let engine = self.engine.lock();
        let now = Instant::now();
        engine.core_ref().contains(key, now)
    }

    // == Purge Expired ==
    /// Removes every expired entry now rather than waiting for lookups.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        let mut engine = self.engine.lock();
        let now = Instant::now();
        engine.core().purge_expired(now)
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.engine.lock().core_ref().stats()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CacheError;

    #[test]
    fn test_cache_new_selects_engine() {
        let lru: Cache<String, String> = Cache::new(CacheConfig::lru(10)).unwrap();
        assert_eq!(lru.policy(), EvictionPolicy::Lru);

        let ttl: Cache<String, String> =
            Cache::new(CacheConfig::ttl(10, Duration::from_secs(1), true)).unwrap();
        assert_eq!(ttl.policy(), EvictionPolicy::Ttl);
    }

    #[test]
    fn test_cache_new_rejects_invalid_config() {
        let result: Result<Cache<String, String>> = Cache::ttl(10, Duration::ZERO, false);
        assert!(matches!(result, Err(CacheError::InvalidConfig(_))));
    }

    #[test]
    fn test_cache_insert_lookup_remove() {
        let cache = Cache::lru(10);

        cache.insert("key1".to_string(), "value1".to_string());

        assert_eq!(cache.lookup(&"key1".to_string()), Some("value1".to_string()));
        assert_eq!(cache.remove(&"key1".to_string()), Some("value1".to_string()));
        assert_eq!(cache.lookup(&"key1".to_string()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_cache_remove_absent_is_noop() {
        let cache = Cache::lru(10);
        cache.insert(1, "one");

        assert_eq!(cache.remove(&2), None);
        assert_eq!(cache.size(), 1);
    }

    #[test]
    fn test_cache_clear() {
        let cache = Cache::ttl(10, Duration::from_secs(60), false).unwrap();
        cache.insert(1, 10);
        cache.insert(2, 20);

        cache.clear();

        assert_eq!(cache.size(), 0);
        assert_eq!(cache.lookup(&1), None);
    }

    #[test]
    fn test_cache_stats() {
        let cache = Cache::lru(10);

        cache.insert("key1", 1);
        cache.lookup(&"key1");
        cache.lookup(&"nonexistent");

        let stats = cache.stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.total_entries, 1);
    }
}
