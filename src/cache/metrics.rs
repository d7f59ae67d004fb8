//! Cache Metrics Collection
//!
//! Per-tier hit/miss counters, promotion counts and smoothed latencies for
//! the tiered read path.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Cache metrics collector
#[derive(Debug, Default)]
pub struct CacheMetrics {
    // L1 metrics
    l1_hits: AtomicU64,
    l1_misses: AtomicU64,
    l1_entries: AtomicU64,

    // L2 metrics
    l2_hits: AtomicU64,
    l2_misses: AtomicU64,
    l2_entries: AtomicU64,

    // Store metrics
    store_hits: AtomicU64,
    store_misses: AtomicU64,
    store_errors: AtomicU64,

    // Operation latencies (nanoseconds, exponential moving average)
    l1_read_latency_ns: AtomicU64,
    l2_read_latency_ns: AtomicU64,
    store_read_latency_ns: AtomicU64,
    write_latency_ns: AtomicU64,

    // Promotion metrics
    promotions_l2_to_l1: AtomicU64,
    promotions_store_to_l2: AtomicU64,
    promotions_store_to_l1: AtomicU64,
}

impl CacheMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    // L1 metrics
    pub fn record_l1_hit(&self) {
        self.l1_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_l1_miss(&self) {
        self.l1_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn l1_hits(&self) -> u64 {
        self.l1_hits.load(Ordering::Relaxed)
    }

    pub fn l1_misses(&self) -> u64 {
        self.l1_misses.load(Ordering::Relaxed)
    }

    // L2 metrics
    pub fn record_l2_hit(&self) {
        self.l2_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_l2_miss(&self) {
        self.l2_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn l2_hits(&self) -> u64 {
        self.l2_hits.load(Ordering::Relaxed)
    }

    pub fn l2_misses(&self) -> u64 {
        self.l2_misses.load(Ordering::Relaxed)
    }

    /// Refresh occupancy gauges
    pub fn update_entries(&self, l1_entries: u64, l2_entries: u64) {
        self.l1_entries.store(l1_entries, Ordering::Relaxed);
        self.l2_entries.store(l2_entries, Ordering::Relaxed);
    }

    // Store metrics
    pub fn record_store_hit(&self) {
        self.store_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_miss(&self) {
        self.store_misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_store_error(&self) {
        self.store_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn store_hits(&self) -> u64 {
        self.store_hits.load(Ordering::Relaxed)
    }

    pub fn store_misses(&self) -> u64 {
        self.store_misses.load(Ordering::Relaxed)
    }

    // Latency tracking
    pub fn record_l1_read_latency(&self, duration: Duration) {
        Self::update_latency_ema(&self.l1_read_latency_ns, duration);
    }

    pub fn record_l2_read_latency(&self, duration: Duration) {
        Self::update_latency_ema(&self.l2_read_latency_ns, duration);
    }

    pub fn record_store_read_latency(&self, duration: Duration) {
        Self::update_latency_ema(&self.store_read_latency_ns, duration);
    }

    pub fn record_write_latency(&self, duration: Duration) {
        Self::update_latency_ema(&self.write_latency_ns, duration);
    }

    fn update_latency_ema(target: &AtomicU64, duration: Duration) {
        let new_ns = duration.as_nanos().min(u64::MAX as u128) as u64;
        let alpha = 0.1; // EMA smoothing factor

        // fetch_update retries on contention; the closure never returns None
        let _ = target.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |current| {
            Some(if current == 0 {
                new_ns
            } else {
                ((1.0 - alpha) * current as f64 + alpha * new_ns as f64) as u64
            })
        });
    }

    pub fn l1_read_latency(&self) -> Duration {
        Duration::from_nanos(self.l1_read_latency_ns.load(Ordering::Relaxed))
    }

    pub fn l2_read_latency(&self) -> Duration {
        Duration::from_nanos(self.l2_read_latency_ns.load(Ordering::Relaxed))
    }

    pub fn store_read_latency(&self) -> Duration {
        Duration::from_nanos(self.store_read_latency_ns.load(Ordering::Relaxed))
    }

    pub fn write_latency(&self) -> Duration {
        Duration::from_nanos(self.write_latency_ns.load(Ordering::Relaxed))
    }

    // Promotion tracking
    pub fn record_promotion_l2_to_l1(&self) {
        self.promotions_l2_to_l1.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_promotion_store_to_l2(&self) {
        self.promotions_store_to_l2.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_promotion_store_to_l1(&self) {
        self.promotions_store_to_l1.fetch_add(1, Ordering::Relaxed);
    }

    /// Hits at any tier over all lookups that reached a final answer
    pub fn overall_hit_ratio(&self) -> f64 {
        let total_hits = self.l1_hits() + self.l2_hits() + self.store_hits();
        let total = total_hits + self.store_misses();

        if total == 0 {
            0.0
        } else {
            total_hits as f64 / total as f64
        }
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            l1_hits: self.l1_hits(),
            l1_misses: self.l1_misses(),
            l1_entries: self.l1_entries.load(Ordering::Relaxed),
            l1_read_latency: self.l1_read_latency(),

            l2_hits: self.l2_hits(),
            l2_misses: self.l2_misses(),
            l2_entries: self.l2_entries.load(Ordering::Relaxed),
            l2_read_latency: self.l2_read_latency(),

            store_hits: self.store_hits(),
            store_misses: self.store_misses(),
            store_errors: self.store_errors.load(Ordering::Relaxed),
            store_read_latency: self.store_read_latency(),

            write_latency: self.write_latency(),

            promotions_l2_to_l1: self.promotions_l2_to_l1.load(Ordering::Relaxed),
            promotions_store_to_l2: self.promotions_store_to_l2.load(Ordering::Relaxed),
            promotions_store_to_l1: self.promotions_store_to_l1.load(Ordering::Relaxed),

            overall_hit_ratio: self.overall_hit_ratio(),
        }
    }
}

/// Snapshot of all cache metrics
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    // L1
    pub l1_hits: u64,
    pub l1_misses: u64,
    pub l1_entries: u64,
    pub l1_read_latency: Duration,

    // L2
    pub l2_hits: u64,
    pub l2_misses: u64,
    pub l2_entries: u64,
    pub l2_read_latency: Duration,

    // Store
    pub store_hits: u64,
    pub store_misses: u64,
    pub store_errors: u64,
    pub store_read_latency: Duration,

    // Writes (any tier)
    pub write_latency: Duration,

    // Tier movement
    pub promotions_l2_to_l1: u64,
    pub promotions_store_to_l2: u64,
    pub promotions_store_to_l1: u64,

    // Overall
    pub overall_hit_ratio: f64,
}

/// Latency tracker helper
pub struct LatencyTracker {
    start: Instant,
}

impl LatencyTracker {
    /// Start tracking latency
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

// =============================================================================
// Tests
// =============================================================================
