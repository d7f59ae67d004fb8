//! Three-Tiered Cache Hierarchy
//!
//! L1 (bounded LRU), L2 (bounded idle-expiry) and a durable record store.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                          TieredCache                                      │
//! ├──────────────────────────────────────────────────────────────────────────┤
//! │  L1 Cache (LRU)       │ L2 Cache (idle)     │ Durable Store              │
//! │  ┌────────────────┐   │ ┌────────────────┐  │ ┌────────────────────┐     │
//! │  │ RecencyTable   │   │ │ RecencyTable   │  │ │ SQLite pool /      │     │
//! │  │ (slab + list)  │   │ │ + last access  │  │ │ in-memory map      │     │
//! │  │ Capacity: C1   │   │ │ Capacity: C2   │  │ │ Unbounded          │     │
//! │  └────────────────┘   │ └────────────────┘  │ └────────────────────┘     │
//! │         ▲             │         │           │           │                │
//! │         └─── promote ─┴─────────┘           │  (no promotion by default) │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Read path
//!
//! - L1 hit: returned as is
//! - L2 hit: copied into L1, then returned
//! - Store hit: returned; promotion only when [`PromotionPolicy`] asks for it
//! - Absent everywhere: `Ok(None)`
//!
//! Writes always target a single named tier; nothing cascades.

mod entry;
mod l1;
mod l2;
mod manager;
mod metrics;
mod policy;
#[cfg(test)]
mod proptest;
mod recency;
mod sqlite;
mod store;

pub use entry::{CacheEntry, Key};
pub use l1::{L1Cache, L1Config, L1Stats};
pub use l2::{L2Cache, L2Config, L2Stats};
pub use manager::{CacheConfig, CacheTier, Lookup, TieredCache};
pub use metrics::{CacheMetrics, LatencyTracker, MetricsSnapshot};
pub use policy::PromotionPolicy;
pub use sqlite::SqliteStore;
pub use store::{open_store, DurableStore, InMemoryStore, StoreStats, MEMORY_STORE_URL};

use std::time::Duration;

/// Default L1 capacity (entries)
pub const DEFAULT_L1_CAPACITY: usize = 1000;

/// Default L2 capacity (entries)
pub const DEFAULT_L2_CAPACITY: usize = 1000;

/// Default L2 idle timeout (10 minutes since last access)
pub const DEFAULT_L2_IDLE_TIMEOUT: Duration = Duration::from_secs(10 * 60);

// =============================================================================
// Tests
// =============================================================================
