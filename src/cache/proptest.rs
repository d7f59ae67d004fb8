//! Property-Based Tests for the cache tiers
//!
//! # Test Properties
//!
//! 1. **Model Agreement**: the recency table behaves like a naive LRU list
//! 2. **Capacity Bound**: no tier ever holds more than its capacity
//! 3. **Recency Retention**: after only puts, the newest `C` distinct keys remain
//! 4. **Idle Expiry**: an L2 entry is live exactly while idle < timeout
//! 5. **Store Uniqueness**: count equals distinct inserted keys

#![cfg(test)]

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use proptest::prelude::*;

use super::entry::Key;
use super::l1::{L1Cache, L1Config};
use super::l2::{L2Cache, L2Config};
use super::recency::RecencyTable;
use super::store::{DurableStore, InMemoryStore};

// =============================================================================
// Property Strategies
// =============================================================================

#[derive(Debug, Clone)]
enum Op {
    Insert(Key),
    Get(Key),
    Remove(Key),
}

/// Keys from a small domain so operations collide often
fn key_strategy() -> impl Strategy<Value = Key> {
    0i64..32
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => key_strategy().prop_map(Op::Insert),
        2 => key_strategy().prop_map(Op::Get),
        1 => key_strategy().prop_map(Op::Remove),
    ]
}

/// Naive LRU: front is least recently used
#[derive(Default)]
struct ModelLru {
    capacity: usize,
    order: VecDeque<(Key, Key)>,
}

impl ModelLru {
    fn touch(&mut self, key: Key) -> Option<(Key, Key)> {
        let pos = self.order.iter().position(|(k, _)| *k == key)?;
        let entry = self.order.remove(pos)?;
        self.order.push_back(entry);
        Some(entry)
    }

    fn insert(&mut self, key: Key, value: Key) -> Option<Key> {
        if let Some(pos) = self.order.iter().position(|(k, _)| *k == key) {
            self.order.remove(pos);
            self.order.push_back((key, value));
            return None;
        }
        let evicted = if self.order.len() >= self.capacity {
            self.order.pop_front().map(|(k, _)| k)
        } else {
            None
        };
        self.order.push_back((key, value));
        evicted
    }

    fn remove(&mut self, key: Key) -> Option<Key> {
        let pos = self.order.iter().position(|(k, _)| *k == key)?;
        self.order.remove(pos).map(|(_, v)| v)
    }

    fn keys(&self) -> Vec<Key> {
        self.order.iter().map(|(k, _)| *k).collect()
    }
}

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

// =============================================================================
// Recency Table Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every operation returns what the naive model returns, and the
    /// recency order matches afterwards.
    #[test]
    fn prop_recency_table_matches_model(
        capacity in 1usize..8,
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let mut table = RecencyTable::with_capacity(capacity);
        let mut model = ModelLru { capacity, ..Default::default() };

        for (step, op) in ops.into_iter().enumerate() {
            let stamp = step as Key;
            match op {
                Op::Insert(key) => {
                    let evicted = table.insert(key, stamp).map(|(k, _)| k);
                    prop_assert_eq!(evicted, model.insert(key, stamp));
                }
                Op::Get(key) => {
                    let got = table.get_mut(&key).copied();
                    prop_assert_eq!(got, model.touch(key).map(|(_, v)| v));
                }
                Op::Remove(key) => {
                    prop_assert_eq!(table.remove(&key), model.remove(key));
                }
            }

            let keys: Vec<Key> = table.iter().map(|(k, _)| k).collect();
            prop_assert_eq!(keys, model.keys());
            prop_assert!(table.len() <= capacity);
        }
    }
}

// =============================================================================
// L1 Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_l1_never_exceeds_capacity(
        capacity in 1usize..16,
        ops in prop::collection::vec(op_strategy(), 1..300),
    ) {
        let cache = L1Cache::with_config(L1Config { capacity });
        for op in ops {
            match op {
                Op::Insert(key) => cache.put(key, format!("Value{}", key)),
                Op::Get(key) => { cache.get(key); }
                Op::Remove(key) => { cache.remove(key); }
            }
            prop_assert!(cache.len() <= capacity);
        }
    }

    /// With puts only, the cache holds exactly the `capacity` most recently
    /// written distinct keys.
    #[test]
    fn prop_l1_retains_most_recent_keys(
        capacity in 1usize..16,
        keys in prop::collection::vec(key_strategy(), 1..200),
    ) {
        let cache = L1Cache::with_config(L1Config { capacity });
        for &key in &keys {
            cache.put(key, format!("Value{}", key));
        }

        let mut expected = Vec::new();
        for &key in keys.iter().rev() {
            if !expected.contains(&key) {
                expected.push(key);
            }
            if expected.len() == capacity {
                break;
            }
        }
        expected.reverse();

        prop_assert_eq!(cache.keys_by_recency(), expected);
    }
}

// =============================================================================
// L2 Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_l2_live_iff_idle_below_timeout(
        timeout_ms in 1u64..1_000,
        idle_ms in 0u64..2_000,
    ) {
        let rt = paused_runtime();
        let live = rt.block_on(async {
            let cache = L2Cache::with_config(L2Config {
                capacity: 4,
                idle_timeout: Duration::from_millis(timeout_ms),
            });
            cache.put(1, "Value1");
            tokio::time::advance(Duration::from_millis(idle_ms)).await;
            cache.get(1).is_some()
        });

        prop_assert_eq!(live, idle_ms < timeout_ms);
    }

    #[test]
    fn prop_l2_never_exceeds_capacity(
        capacity in 1usize..16,
        steps in prop::collection::vec((key_strategy(), 0u64..50), 1..100),
    ) {
        let rt = paused_runtime();
        let result: Result<(), TestCaseError> = rt.block_on(async {
            let cache = L2Cache::with_config(L2Config {
                capacity,
                idle_timeout: Duration::from_millis(100),
            });
            for (key, pause_ms) in steps {
                cache.put(key, format!("Value{}", key));
                tokio::time::advance(Duration::from_millis(pause_ms)).await;
                prop_assert!(cache.len() <= capacity);
            }
            Ok(())
        });
        result?;
    }
}

// =============================================================================
// Store Properties
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    #[test]
    fn prop_store_count_is_distinct_keys(keys in prop::collection::vec(any::<i64>(), 0..100)) {
        let store = InMemoryStore::new();
        let mut seen = HashSet::new();

        for &key in &keys {
            let inserted = tokio_test::block_on(store.insert(key, "x")).is_ok();
            prop_assert_eq!(inserted, seen.insert(key));
        }

        let count = tokio_test::block_on(store.count()).unwrap();
        prop_assert_eq!(count, seen.len() as u64);
    }
}
