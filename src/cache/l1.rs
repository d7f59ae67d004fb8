//! L1 Cache - Capacity-bounded LRU Tier
//!
//! Smallest and fastest tier. Entries never expire; they live until capacity
//! pressure evicts them.
//!
//! # Design
//!
//! - [`RecencyTable`] arena with an intrusive recency list (O(1) get/put)
//! - Exactly one LRU entry is evicted per over-capacity insert
//! - A single mutex serializes access; the eviction order is not safe for
//!   uncoordinated concurrent mutation

use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use super::entry::Key;
use super::recency::RecencyTable;
use super::DEFAULT_L1_CAPACITY;

/// L1 Cache configuration
#[derive(Debug, Clone)]
pub struct L1Config {
    /// Maximum number of entries
    pub capacity: usize,
}

impl Default for L1Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_L1_CAPACITY,
        }
    }
}

/// L1 Cache - access-ordered, capacity-evicted
pub struct L1Cache {
    /// Recency-ordered storage
    table: Mutex<RecencyTable<String>>,
    /// Configuration
    config: L1Config,
    /// Hit count
    hits: AtomicU64,
    /// Miss count
    misses: AtomicU64,
    /// Eviction count
    evictions: AtomicU64,
}

impl L1Cache {
    /// Create a new L1 cache with default configuration
    pub fn new() -> Self {
        Self::with_config(L1Config::default())
    }

    /// Create a new L1 cache with custom configuration
    pub fn with_config(config: L1Config) -> Self {
        Self {
            table: Mutex::new(RecencyTable::with_capacity(config.capacity)),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    /// Get a value, marking the key most recently used on a hit
    pub fn get(&self, key: Key) -> Option<String> {
        let value = self.table.lock().get_mut(&key).cloned();

        match value {
            Some(_) => self.hits.fetch_add(1, Ordering::Relaxed),
            None => self.misses.fetch_add(1, Ordering::Relaxed),
        };

        value
    }

    /// Insert or overwrite a value.
    ///
    /// A new key arriving at capacity evicts the least recently used entry first.
    pub fn put(&self, key: Key, value: impl Into<String>) {
        let evicted = self.table.lock().insert(key, value.into());

        if evicted.is_some() {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Remove an entry from the cache
    pub fn remove(&self, key: Key) -> Option<String> {
        self.table.lock().remove(&key)
    }

    /// Check presence without touching recency
    pub fn contains(&self, key: Key) -> bool {
        self.table.lock().contains(&key)
    }

    /// Keys from least to most recently used
    pub fn keys_by_recency(&self) -> Vec<Key> {
        self.table.lock().iter().map(|(k, _)| k).collect()
    }

    /// Get capacity (entries)
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Get number of entries
    pub fn len(&self) -> usize {
        self.table.lock().len()
    }

    /// Check if cache is empty
    pub fn is_empty(&self) -> bool {
        self.table.lock().is_empty()
    }

    /// Get hit count
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Get miss count
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Get hit ratio
    pub fn hit_ratio(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total == 0.0 {
            0.0
        } else {
            hits / total
        }
    }

    /// Get eviction count
    pub fn evictions(&self) -> u64 {
        self.evictions.load(Ordering::Relaxed)
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.table.lock().clear();
    }

    /// Fraction of capacity in use (0.0 - 1.0)
    pub fn utilization(&self) -> f64 {
        if self.capacity() == 0 {
            return 0.0;
        }
        self.len() as f64 / self.capacity() as f64
    }
}

impl Default for L1Cache {
    fn default() -> Self {
        Self::new()
    }
}

/// L1 cache statistics
#[derive(Debug, Clone)]
pub struct L1Stats {
    /// Number of entries
    pub entries: usize,
    /// Capacity in entries
    pub capacity: usize,
    /// Hit count
    pub hits: u64,
    /// Miss count
    pub misses: u64,
    /// Hit ratio (0.0 - 1.0)
    pub hit_ratio: f64,
    /// Eviction count
    pub evictions: u64,
}

impl L1Cache {
    /// Get cache statistics
    pub fn stats(&self) -> L1Stats {
        L1Stats {
            entries: self.len(),
            capacity: self.capacity(),
            hits: self.hits(),
            misses: self.misses(),
            hit_ratio: self.hit_ratio(),
            evictions: self.evictions(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
