//! LRU Engine Module
//!
//! Size-bounded least-recently-used cache with an optional per-entry TTL.

use std::collections::HashMap;
use std::hash::Hash;
use std::time::{Duration, Instant};

use tracing::{debug, trace};

use crate::cache::{CacheCore, CacheEntry, CacheStats, Expiry};

// Recency list node. Links are positions in `LruCache::nodes`.
#[derive(Debug)]
struct Node<K, V> {
    key: K,
    entry: CacheEntry<V>,
    prev: Option<usize>,
    next: Option<usize>,
}

// == LRU Cache ==
/// Least-recently-used engine.
///
/// Entries live in a dense arena and form a doubly linked list through
/// index links:
/// - `head` = most recently used
/// - `tail` = least recently used
///
/// `index` maps every key to its arena slot. Removal swaps the last slot into
/// the hole and re-points that node's neighbours, so the arena never holds gaps.
#[derive(Debug)]
pub struct LruCache<K, V> {
    nodes: Vec<Node<K, V>>,
    index: HashMap<K, usize>,
    head: Option<usize>,
    tail: Option<usize>,
    /// Maximum number of entries, 0 = unbounded
    max_entries: usize,
    /// Lifetime granted on each write, None = entries never expire
    ttl: Option<Duration>,
    stats: CacheStats,
}

impl<K, V> LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    // == Constructor ==
    /// Creates an empty LRU engine.
    ///
    /// # Arguments
    /// * `max_entries` - Entry bound, 0 for unbounded
    /// * `ttl` - Optional lifetime applied on every insert
    pub fn new(max_entries: usize, ttl: Option<Duration>) -> Self {
        Self {
            nodes: Vec::new(),
            index: HashMap::new(),
            head: None,
            tail: None,
            max_entries,
            ttl,
            stats: CacheStats::new(),
        }
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
    }

    fn push_front(&mut self, idx: usize) {
        self.nodes[idx].prev = None;
        self.nodes[idx].next = self.head;
        match self.head {
            Some(h) => self.nodes[h].prev = Some(idx),
            None => self.tail = Some(idx),
        }
        self.head = Some(idx);
    }

    fn move_to_front(&mut self, idx: usize) {
        if self.head != Some(idx) {
            self.unlink(idx);
            self.push_front(idx);
        }
    }

    // Detaches the node at `idx` from the list, the arena and the index.
    fn remove_at(&mut self, idx: usize) -> Node<K, V> {
        self.unlink(idx);
        let node = self.nodes.swap_remove(idx);
        self.index.remove(&node.key);

        // The former last node now occupies `idx`.
        if idx < self.nodes.len() {
            let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
            match prev {
                Some(p) => self.nodes[p].next = Some(idx),
                None => self.head = Some(idx),
            }
            match next {
                Some(n) => self.nodes[n].prev = Some(idx),
                None => self.tail = Some(idx),
            }
            if let Some(slot) = self.index.get_mut(&self.nodes[idx].key) {
                *slot = idx;
            }
        }
        node
    }

    // == Evict Oldest ==
    /// Removes the entry at the back of the recency list.
    fn evict_oldest(&mut self) {
        if let Some(tail) = self.tail {
            self.remove_at(tail);
            self.stats.record_eviction();
            debug!(
                max_entries = self.max_entries,
                "lru: evicted least recently used entry"
            );
        }
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        std::iter::successors(self.head, move |&idx| self.nodes[idx].next)
            .map(move |idx| &self.nodes[idx].key)
    }
}

impl<K, V> CacheCore<K, V> for LruCache<K, V>
where
    K: Clone + Eq + Hash,
{
    // == Insert ==
    /// Stores `value` as the most recently used entry.
    ///
    /// Overwriting refreshes the expiry and recency without changing the size.
    /// A new key that pushes the size past the bound evicts the tail.
    fn insert(&mut self, key: K, value: V, now: Instant) {
        let expires_at = Expiry::after(now, self.ttl);

        if let Some(&idx) = self.index.get(&key) {
            let entry = &mut self.nodes[idx].entry;
            entry.value = value;
            entry.expires_at = expires_at;
            self.move_to_front(idx);
            return;
        }

        let idx = self.nodes.len();
        self.nodes.push(Node {
            key: key.clone(),
            entry: CacheEntry::new(value, expires_at),
            prev: None,
            next: None,
        });
        self.index.insert(key, idx);
        self.push_front(idx);

        if self.max_entries != 0 && self.nodes.len() > self.max_entries {
            self.evict_oldest();
        }
    }

    fn size(&self) -> usize {
        self.nodes.len()
    }

    // == Lookup ==
    /// Returns the value and marks it most recently used.
    ///
    /// An expired entry is dropped and reported as a miss.
    fn lookup(&mut self, key: &K, now: Instant) -> Option<&V> {
        let Some(&idx) = self.index.get(key) else {
            self.stats.record_miss();
            return None;
        };

        if self.nodes[idx].entry.is_expired(now) {
            self.remove_at(idx);
            self.stats.record_expirations(1);
            self.stats.record_miss();
            trace!("lru: dropped expired entry on lookup");
            return None;
        }

        self.move_to_front(idx);
        self.stats.record_hit();
        Some(&self.nodes[idx].entry.value)
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let idx = *self.index.get(key)?;
        Some(self.remove_at(idx).entry.value)
    }

    fn clear(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.head = None;
        self.tail = None;
    }

    fn contains(&self, key: &K, now: Instant) -> bool {
        self.index
            .get(key)
            .is_some_and(|&idx| !self.nodes[idx].entry.is_expired(now))
    }

    // == Purge Expired ==
    /// Removes all expired entries. Only runs when a caller asks for it.
    fn purge_expired(&mut self, now: Instant) -> usize {
        let expired: Vec<K> = self
            .nodes
            .iter()
            .filter(|node| node.entry.is_expired(now))
            .map(|node| node.key.clone())
            .collect();

        for key in &expired {
            if let Some(&idx) = self.index.get(key) {
                self.remove_at(idx);
            }
        }

        let count = expired.len();
        self.stats.record_expirations(count);
        if count > 0 {
            debug!(count, "lru: purged expired entries");
        }
        count
    }

    fn stats(&self) -> CacheStats {
        self.stats.with_total_entries(self.nodes.len())
    }
}
