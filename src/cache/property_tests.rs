//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check both engines against their eviction invariants.

use proptest::prelude::*;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::cache::{CacheCore, LruCache, TtlCache};

// == Test Configuration ==
const TEST_TTL: Duration = Duration::from_millis(100);

// == Strategies ==
/// Small key space so sequences revisit keys often
fn key_strategy() -> impl Strategy<Value = u8> {
    0u8..16
}

/// Operations a generated sequence can apply, including clock advances
#[derive(Debug, Clone)]
enum CacheOp {
    Insert { key: u8, value: u32 },
    Lookup { key: u8 },
    Remove { key: u8 },
    Advance { ms: u64 },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        4 => (key_strategy(), any::<u32>()).prop_map(|(key, value)| CacheOp::Insert { key, value }),
        3 => key_strategy().prop_map(|key| CacheOp::Lookup { key }),
        1 => key_strategy().prop_map(|key| CacheOp::Remove { key }),
        1 => (0u64..40).prop_map(|ms| CacheOp::Advance { ms }),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // *For any* sequence of inserts, the LRU engine's size never exceeds a
    // positive entry bound.
    #[test]
    fn prop_lru_capacity_enforcement(
        max_entries in 1usize..10,
        keys in prop::collection::vec(key_strategy(), 1..200)
    ) {
        let now = Instant::now();
        let mut cache = LruCache::new(max_entries, None);

        for key in keys {
            cache.insert(key, key, now);
            prop_assert!(
                cache.size() <= max_entries,
                "Cache size {} exceeds max {}",
                cache.size(),
                max_entries
            );
        }
    }

    // *For any* sequence of inserts, the TTL engine's purge keeps the size
    // within a positive entry bound.
    #[test]
    fn prop_ttl_capacity_enforcement(
        max_entries in 1usize..10,
        ops in prop::collection::vec(cache_op_strategy(), 1..200)
    ) {
        let mut now = Instant::now();
        let mut cache = TtlCache::new(max_entries, TEST_TTL, true);

        for op in ops {
            match op {
                CacheOp::Insert { key, value } => cache.insert(key, value, now),
                CacheOp::Lookup { key } => { cache.lookup(&key, now); }
                CacheOp::Remove { key } => { cache.remove(&key); }
                CacheOp::Advance { ms } => now += Duration::from_millis(ms),
            }
            prop_assert!(cache.size() <= max_entries);
            prop_assert_eq!(cache.keys_by_expiry().count(), cache.size());
        }
    }

    // *For any* operation sequence without TTL, the LRU engine matches a
    // reference recency list: same hits, same order, same evictions.
    #[test]
    fn prop_lru_matches_reference_model(
        max_entries in 1usize..8,
        ops in prop::collection::vec(cache_op_strategy(), 1..150)
    ) {
        let now = Instant::now();
        let mut cache = LruCache::new(max_entries, None);
        // Front = most recently used
        let mut model: VecDeque<(u8, u32)> = VecDeque::new();

        for op in ops {
            match op {
                CacheOp::Insert { key, value } => {
                    cache.insert(key, value, now);
                    model.retain(|(k, _)| *k != key);
                    model.push_front((key, value));
                    model.truncate(max_entries);
                }
                CacheOp::Lookup { key } => {
                    let pos = model.iter().position(|(k, _)| *k == key);
                    let expected = pos.and_then(|pos| model.remove(pos)).map(|hit| {
                        model.push_front(hit);
                        hit.1
                    });
                    prop_assert_eq!(cache.lookup(&key, now).copied(), expected);
                }
                CacheOp::Remove { key } => {
                    let pos = model.iter().position(|(k, _)| *k == key);
                    let expected = pos.and_then(|pos| model.remove(pos)).map(|(_, v)| v);
                    prop_assert_eq!(cache.remove(&key), expected);
                }
                CacheOp::Advance { .. } => {}
            }

            let order: Vec<u8> = cache.keys().copied().collect();
            let expected: Vec<u8> = model.iter().map(|(k, _)| *k).collect();
            prop_assert_eq!(order, expected);
        }
    }

    // *For any* sequence of inserts at increasing instants, a TTL purge always
    // keeps the most recently written keys.
    #[test]
    fn prop_ttl_purge_keeps_latest_expiries(
        max_entries in 1usize..8,
        keys in prop::collection::hash_set(any::<u16>(), 1..40)
    ) {
        let start = Instant::now();
        let mut cache = TtlCache::new(max_entries, TEST_TTL, false);
        let keys: Vec<u16> = keys.into_iter().collect();

        for (i, key) in keys.iter().enumerate() {
            cache.insert(*key, i, start + Duration::from_millis(i as u64));
        }

        let survivors: Vec<u16> = cache.keys_by_expiry().copied().collect();
        let skip = keys.len().saturating_sub(max_entries);
        prop_assert_eq!(survivors, keys[skip..].to_vec());
    }

    // *For any* populated engine, clear() leaves nothing behind.
    #[test]
    fn prop_clear_empties_both_engines(keys in prop::collection::vec(key_strategy(), 1..50)) {
        let now = Instant::now();
        let mut lru = LruCache::new(0, Some(TEST_TTL));
        let mut ttl = TtlCache::new(0, TEST_TTL, false);

        for key in &keys {
            lru.insert(*key, (), now);
            ttl.insert(*key, (), now);
        }
        lru.clear();
        ttl.clear();

        prop_assert_eq!(lru.size(), 0);
        prop_assert_eq!(ttl.size(), 0);
        for key in &keys {
            prop_assert!(lru.lookup(key, now).is_none());
            prop_assert!(ttl.lookup(key, now).is_none());
        }
    }
}
