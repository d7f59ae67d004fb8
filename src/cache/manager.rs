//! Tiered Cache - L1 → L2 → durable store
//!
//! Owns both cache tiers and a handle to the shared store. Reads fall
//! through the tiers and promote upward according to [`PromotionPolicy`];
//! writes go to exactly the tier the caller names.
//!
//! There is no cross-tier coherence: a store write neither refreshes nor
//! invalidates L1/L2, so cached reads may be stale relative to the store.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::debug;

use super::entry::Key;
use super::l1::{L1Cache, L1Config};
use super::l2::{L2Cache, L2Config};
use super::metrics::{CacheMetrics, LatencyTracker, MetricsSnapshot};
use super::policy::PromotionPolicy;
use super::store::{DurableStore, InMemoryStore};
use crate::error::Result;

/// Cache tier enum
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTier {
    /// L1 - capacity-bounded LRU
    L1,
    /// L2 - idle-expiry
    L2,
    /// Durable record store
    Store,
}

impl std::fmt::Display for CacheTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CacheTier::L1 => write!(f, "L1 (LRU)"),
            CacheTier::L2 => write!(f, "L2 (Idle-Expiry)"),
            CacheTier::Store => write!(f, "Store (Durable)"),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// L1 configuration
    pub l1: L1Config,
    /// L2 configuration
    pub l2: L2Config,
    /// Promotion policy
    pub promotion_policy: PromotionPolicy,
}

/// Successful lookup
#[derive(Debug, Clone)]
pub struct Lookup {
    /// The value found
    pub value: String,
    /// Which tier answered
    pub tier: CacheTier,
    /// Lookup latency
    pub latency: Duration,
}

/// Three-tier cache
pub struct TieredCache {
    /// L1 (LRU) cache
    l1: L1Cache,
    /// L2 (idle-expiry) cache
    l2: L2Cache,
    /// Durable store, shared with the benchmark harness
    store: Arc<dyn DurableStore>,
    /// Configuration
    config: CacheConfig,
    /// Metrics collector
    metrics: Arc<CacheMetrics>,
}

impl TieredCache {
    /// Create a tiered cache with default configuration
    pub fn new(store: Arc<dyn DurableStore>) -> Self {
        Self::with_config(CacheConfig::default(), store)
    }

    /// Create a tiered cache with custom configuration
    pub fn with_config(config: CacheConfig, store: Arc<dyn DurableStore>) -> Self {
        Self {
            l1: L1Cache::with_config(config.l1.clone()),
            l2: L2Cache::with_config(config.l2.clone()),
            store,
            config,
            metrics: Arc::new(CacheMetrics::new()),
        }
    }

    /// Create with an in-memory store (for testing)
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }

    /// Read through L1, L2 and the store.
    ///
    /// `Ok(None)` is a miss at every tier. Only a failing store call is an error.
    pub async fn get(&self, key: Key) -> Result<Option<Lookup>> {
        let start = Instant::now();

        // Try L1 first
        let tracker = LatencyTracker::start();
        if let Some(value) = self.l1.get(key) {
            self.metrics.record_l1_hit();
            self.metrics.record_l1_read_latency(tracker.elapsed());
            return Ok(Some(Lookup {
                value,
                tier: CacheTier::L1,
                latency: start.elapsed(),
            }));
        }
        self.metrics.record_l1_miss();

        // Try L2
        let tracker = LatencyTracker::start();
        if let Some(value) = self.l2.get(key) {
            self.metrics.record_l2_hit();
            self.metrics.record_l2_read_latency(tracker.elapsed());
            self.promote(CacheTier::L2, key, &value);

            return Ok(Some(Lookup {
                value,
                tier: CacheTier::L2,
                latency: start.elapsed(),
            }));
        }
        self.metrics.record_l2_miss();

        // Fall through to the store
        let tracker = LatencyTracker::start();
        let found = self.store.retrieve(key).await.inspect_err(|_| {
            self.metrics.record_store_error();
        })?;
        self.metrics.record_store_read_latency(tracker.elapsed());

        match found {
            Some(value) => {
                self.metrics.record_store_hit();
                self.promote(CacheTier::Store, key, &value);
                Ok(Some(Lookup {
                    value,
                    tier: CacheTier::Store,
                    latency: start.elapsed(),
                }))
            }
            None => {
                self.metrics.record_store_miss();
                Ok(None)
            }
        }
    }

    /// Write to exactly one tier. Nothing cascades to the other tiers.
    pub async fn put(&self, tier: CacheTier, key: Key, value: impl Into<String>) -> Result<()> {
        let tracker = LatencyTracker::start();
        match tier {
            CacheTier::L1 => self.l1.put(key, value),
            CacheTier::L2 => self.l2.put(key, value),
            CacheTier::Store => {
                let value = value.into();
                self.store.insert(key, &value).await?;
            }
        }
        self.metrics.record_write_latency(tracker.elapsed());
        Ok(())
    }

    /// Copy a value found in `found_in` into the tiers the policy names
    fn promote(&self, found_in: CacheTier, key: Key, value: &str) {
        for &target in self.config.promotion_policy.targets(found_in) {
            match (found_in, target) {
                (CacheTier::L2, CacheTier::L1) => {
                    self.l1.put(key, value);
                    self.metrics.record_promotion_l2_to_l1();
                }
                (CacheTier::Store, CacheTier::L2) => {
                    self.l2.put(key, value);
                    self.metrics.record_promotion_store_to_l2();
                }
                (CacheTier::Store, CacheTier::L1) => {
                    self.l1.put(key, value);
                    self.metrics.record_promotion_store_to_l1();
                }
                _ => continue,
            }
            debug!(key, from = %found_in, to = %target, "Promoted entry");
        }
    }

    /// Get metrics snapshot
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.update_entries(self.l1.len() as u64, self.l2.len() as u64);
        self.metrics.snapshot()
    }

    /// Get reference to L1 cache
    pub fn l1(&self) -> &L1Cache {
        &self.l1
    }

    /// Get reference to L2 cache
    pub fn l2(&self) -> &L2Cache {
        &self.l2
    }

    /// Get the durable store
    pub fn store(&self) -> &Arc<dyn DurableStore> {
        &self.store
    }

    /// Get configuration
    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Clear both cache tiers; the store is untouched
    pub fn clear(&self) {
        self.l1.clear();
        self.l2.clear();
    }

    /// Get total entries across the cache tiers (excluding the store)
    pub fn total_cached_entries(&self) -> usize {
        self.l1.len() + self.l2.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
