//! TTL Engine Module
//!
//! Time-bounded cache that evicts the entries closest to expiry when the
//! entry bound is exceeded, with optional sliding expiration on read.

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::cache::{CacheCore, CacheEntry, CacheStats, Expiry};

// Position of an entry in the expiry index. `seq` orders keys that share an
// expiry by when they were indexed.
type IndexKey = (Expiry, u64);

#[derive(Debug)]
struct Slot<V> {
    entry: CacheEntry<V>,
    seq: u64,
}

impl<V> Slot<V> {
    fn index_key(&self) -> IndexKey {
        (self.entry.expires_at, self.seq)
    }
}

// == TTL Cache ==
/// Expiry-ordered engine.
///
/// `table` holds the entries and `expiry_index` maps `(expiry, seq)` back to
/// the key, soonest first. Every key in `table` has exactly one index record,
/// found directly from the slot's own expiry and sequence number.
#[derive(Debug)]
pub struct TtlCache<K, V> {
    table: HashMap<K, Slot<V>>,
    expiry_index: BTreeMap<IndexKey, K>,
    next_seq: u64,
    /// Maximum number of entries, 0 = unbounded
    max_entries: usize,
    /// Lifetime granted on each write (and on each read when refreshing)
    ttl: Duration,
    /// Slide expiry forward on every successful lookup
    refresh_on_read: bool,
    stats: CacheStats,
}

impl<K, V> TtlCache<K, V>
where
    K: Clone + Eq + Hash,
{
    // == Constructor ==
    /// Creates an empty TTL engine.
    ///
    /// # Arguments
    /// * `max_entries` - Entry bound, 0 for unbounded
    /// * `ttl` - Lifetime applied on insert; expected to be non-zero
    /// * `refresh_on_read` - Whether lookups extend the entry's lifetime
    pub fn new(max_entries: usize, ttl: Duration, refresh_on_read: bool) -> Self {
        Self {
            table: HashMap::new(),
            expiry_index: BTreeMap::new(),
            next_seq: 0,
            max_entries,
            ttl,
            refresh_on_read,
            stats: CacheStats::new(),
        }
    }

    fn deadline(&self, now: Instant) -> Expiry {
        Expiry::after(now, Some(self.ttl))
    }

    fn index_insert(&mut self, expires_at: Expiry, key: K) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.expiry_index.insert((expires_at, seq), key);
        seq
    }

    // Moves `key` to the index record for `fresh`, dropping the stale one first.
    fn reindex(&mut self, key: &K, fresh: Expiry) {
        let Some(stale) = self.table.get(key).map(Slot::index_key) else {
            return;
        };
        self.expiry_index.remove(&stale);
        let seq = self.index_insert(fresh, key.clone());
        if let Some(slot) = self.table.get_mut(key) {
            slot.entry.expires_at = fresh;
            slot.seq = seq;
        }
    }

    fn remove_entry(&mut self, key: &K) -> Option<CacheEntry<V>> {
        let slot = self.table.remove(key)?;
        self.expiry_index.remove(&slot.index_key());
        Some(slot.entry)
    }

    // == Purge To Capacity ==
    /// Evicts soonest-to-expire entries until the bound holds again.
    fn purge_to_capacity(&mut self) {
        let mut evicted = 0usize;

        while self.table.len() > self.max_entries {
            let Some((_, key)) = self.expiry_index.pop_first() else {
                break;
            };
            if self.table.remove(&key).is_some() {
                self.stats.record_eviction();
                evicted += 1;
            }
        }

        debug!(
            evicted,
            max_entries = self.max_entries,
            "ttl: purged entries to capacity"
        );
    }

    /// Keys ordered from soonest to latest expiry.
    pub fn keys_by_expiry(&self) -> impl Iterator<Item = &K> + '_ {
        self.expiry_index.values()
    }
}

impl<K, V> CacheCore<K, V> for TtlCache<K, V>
where
    K: Clone + Eq + Hash,
{
    // == Insert ==
    /// Stores `value` expiring `ttl` from `now`.
    ///
    /// Overwriting moves the entry to its new expiry. A new key that pushes
    /// the size past the bound triggers a purge pass.
    fn insert(&mut self, key: K, value: V, now: Instant) {
        let expires_at = self.deadline(now);

        if let Some(slot) = self.table.get_mut(&key) {
            slot.entry.value = value;
            self.reindex(&key, expires_at);
            return;
        }

        let seq = self.index_insert(expires_at, key.clone());
        self.table.insert(
            key,
            Slot {
                entry: CacheEntry::new(value, expires_at),
                seq,
            },
        );

        if self.max_entries != 0 && self.table.len() > self.max_entries {
            self.purge_to_capacity();
        }
    }

    fn size(&self) -> usize {
        self.table.len()
    }

    // == Lookup ==
    /// Returns the value, sliding its expiry forward when refresh is enabled.
    ///
    /// A refresh never moves a deadline earlier. An expired entry is dropped
    /// and reported as a miss.
    fn lookup(&mut self, key: &K, now: Instant) -> Option<&V> {
        let Some(stale) = self.table.get(key).map(|slot| slot.entry.expires_at) else {
            self.stats.record_miss();
            return None;
        };

        if stale.has_passed(now) {
            self.remove_entry(key);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            trace!("ttl: dropped expired entry on lookup");
            return None;
        }

        if self.refresh_on_read {
            let fresh = self.deadline(now);
            if fresh > stale {
                self.reindex(key, fresh);
            }
        }

        self.stats.record_hit();
        self.table.get(key).map(|slot| &slot.entry.value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        self.remove_entry(key).map(|entry| entry.value)
    }

    fn clear(&mut self) {
        self.table.clear();
        self.expiry_index.clear();
    }

    fn contains(&self, key: &K, now: Instant) -> bool {
        self.table
            .get(key)
            .is_some_and(|slot| !slot.entry.is_expired(now))
    }

    // == Purge Expired ==
    /// Removes all expired entries. Only runs when a caller asks for it.
    ///
    /// Expired entries are exactly the index prefix strictly before `now`.
    fn purge_expired(&mut self, now: Instant) -> usize {
        let live = self.expiry_index.split_off(&(Expiry::At(now), 0));
        let expired = std::mem::replace(&mut self.expiry_index, live);

        let mut count = 0usize;
        for key in expired.into_values() {
            if self.table.remove(&key).is_some() {
                count += 1;
            }
        }

        self.stats.record_expirations(count);
        if count > 0 {
            debug!(count, "ttl: purged expired entries");
        }
        count
    }

    fn stats(&self) -> CacheStats {
        self.stats.with_total_entries(self.table.len())
    }
}
