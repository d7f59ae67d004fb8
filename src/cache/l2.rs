//! L2 Cache - Idle-expiry Tier
//!
//! Larger than L1. An entry expires once it has gone unread for the idle
//! timeout; every hit refreshes its last-access stamp (expire after access,
//! not after write).
//!
//! # Design
//!
//! - Same [`RecencyTable`] arena as L1; because every touch stamps "now"
//!   under the lock, list order equals last-access order, so the LRU head
//!   is always the entry with the oldest last access
//! - Expiry is checked on read. An expired entry found by `get` is dropped
//!   on the spot; others may keep occupying a slot until `purge_expired`
//!   or capacity pressure reclaims them, so `len()` can include expired
//!   entries while `get` never returns one
//! - Timestamps use `tokio::time::Instant`, which follows the runtime
//!   clock when it is paused

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;

use super::entry::Key;
use super::recency::RecencyTable;
use super::{DEFAULT_L2_CAPACITY, DEFAULT_L2_IDLE_TIMEOUT};

/// L2 Cache configuration
#[derive(Debug, Clone)]
pub struct L2Config {
    /// Maximum number of entries
    pub capacity: usize,
    /// Idle time after which an entry is treated as absent
    pub idle_timeout: Duration,
}

impl Default for L2Config {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_L2_CAPACITY,
            idle_timeout: DEFAULT_L2_IDLE_TIMEOUT,
        }
    }
}

/// Value plus its last-access stamp
#[derive(Debug)]
struct Stamped {
    value: String,
    last_access: Instant,
}

impl Stamped {
    #[inline]
    fn is_idle(&self, now: Instant, idle_timeout: Duration) -> bool {
        now.saturating_duration_since(self.last_access) >= idle_timeout
    }
}

enum ReadOutcome {
    Hit(String),
    Expired,
    Absent,
}

/// L2 Cache - capacity-bounded, expire-after-access
pub struct L2Cache {
    /// Recency-ordered storage
    table: Mutex<RecencyTable<Stamped>>,
    /// Configuration
    config: L2Config,
    /// Hit count
    hits: AtomicU64,
    /// Miss count (expired reads included)
    misses: AtomicU64,
    /// Capacity eviction count
    evictions: AtomicU64,
    /// Idle expiry count
    expirations: AtomicU64,
}

impl L2Cache {
    /// Create a new L2 cache with default configuration
    pub fn new() -> Self {
        Self::with_config(L2Config::default())
    }

    /// Create a new L2 cache with custom configuration
    pub fn with_config(config: L2Config) -> Self {
        Self {
            table: Mutex::new(RecencyTable::with_capacity(config.capacity)),
            config,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
            expirations: AtomicU64::new(0),
        }
    }

    /// Get a live value, refreshing its last access.
    ///
    /// An entry idle for at least the timeout is removed and reported absent.
    pub fn get(&self, key: Key) -> Option<String> {
        let mut table = self.table.lock();
        let now = Instant::now();
        let idle_timeout = self.config.idle_timeout;

        let outcome = match table.get_mut(&key) {
            None => ReadOutcome::Absent,
            Some(stamped) if stamped.is_idle(now, idle_timeout) => ReadOutcome::Expired,
            Some(stamped) => {
                stamped.last_access = now;
                ReadOutcome::Hit(stamped.value.clone())
            }
        };

        match outcome {
            ReadOutcome::Hit(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(value)
            }
            ReadOutcome::Expired => {
                table.remove(&key);
                self.expirations.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            ReadOutcome::Absent => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Insert or overwrite a value, stamping its last access as now.
    ///
    /// When full, expired entries are reclaimed first; if none are, the
    /// entry with the oldest last access is evicted.
    pub fn put(&self, key: Key, value: impl Into<String>) {
        let mut table = self.table.lock();
        let now = Instant::now();

        if table.len() >= table.capacity() && !table.contains(&key) {
            self.purge_locked(&mut table, now);
        }

        let stamped = Stamped {
            value: value.into(),
            last_access: now,
        };
        if table.insert(key, stamped).is_some() {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> usize {
        let mut table = self.table.lock();
        let now = Instant::now();
        self.purge_locked(&mut table, now)
    }

    /// Expired entries sit at the LRU end, so the sweep stops at the first live one
    fn purge_locked(&self, table: &mut RecencyTable<Stamped>, now: Instant) -> usize {
        let mut purged = 0;
        while let Some((_, stamped)) = table.peek_lru() {
            if !stamped.is_idle(now, self.config.idle_timeout) {
                break;
            }
            table.pop_lru();
            purged += 1;
        }
        if purged > 0 {
            self.expirations.fetch_add(purged as u64, Ordering::Relaxed);
        }
        purged
    }

    /// Remove an entry from the cache
    pub fn remove(&self, key: Key) -> Option<String> {
        self.table.lock().remove(&key).map(|s| s.value)
    }

    /// Check whether a slot is held for `key` (expired or not), without touching it
    pub fn contains(&self, key: Key) -> bool {
        self.table.lock().contains(&key)
    }

    /// Get capacity (entries)
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Idle timeout
    pub fn idle_timeout(&self) -> Duration {
        self.config.idle_timeout
    }

    /// Occupied slots, including expired entries not yet swept
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

    /// Get expiration count
    pub fn expirations(&self) -> u64 {
        self.expirations.load(Ordering::Relaxed)
    }

    /// Clear the cache
    pub fn clear(&self) {
        self.table.lock().clear();
    }

    /// Get configuration
    pub fn config(&self) -> &L2Config {
        &self.config
    }
}

impl Default for L2Cache {
    fn default() -> Self {
        Self::new()
    }
}

/// L2 cache statistics
#[derive(Debug, Clone)]
pub struct L2Stats {
    /// Occupied slots
    pub entries: usize,
    /// Capacity in entries
    pub capacity: usize,
    /// Hit count
    pub hits: u64,
    /// Miss count
    pub misses: u64,
    /// Hit ratio (0.0 - 1.0)
    pub hit_ratio: f64,
    /// Capacity eviction count
    pub evictions: u64,
    /// Idle expiry count
    pub expirations: u64,
}

impl L2Cache {
    /// Get cache statistics
    pub fn stats(&self) -> L2Stats {
        L2Stats {
            entries: self.len(),
            capacity: self.capacity(),
            hits: self.hits(),
            misses: self.misses(),
            hit_ratio: self.hit_ratio(),
            evictions: self.evictions(),
            expirations: self.expirations(),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
