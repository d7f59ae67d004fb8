//! Benchmark configuration
//!
//! Plain structs with defaults reproducing the reference run
//! (N=1000, C1=C2=1000, T=10 min, W=10, sample key 500, pool of 10).
//! The binary fills them from CLI flags and environment variables.

use std::time::Duration;

use serde::Serialize;

use crate::cache::{
    CacheConfig, L1Config, L2Config, PromotionPolicy, DEFAULT_L1_CAPACITY, DEFAULT_L2_CAPACITY,
    DEFAULT_L2_IDLE_TIMEOUT,
};
use crate::error::{Error, Result};

// =============================================================================
// Store Configuration
// =============================================================================

/// Durable store connection settings
#[derive(Debug, Clone, Serialize)]
pub struct StoreConfig {
    /// `sqlite://path` or `memory`
    pub url: String,

    /// Pool size
    pub max_connections: u32,

    /// How long a call waits for a pooled connection
    pub acquire_timeout: Duration,

    /// How long SQLite waits on a locked database before failing
    pub busy_timeout: Duration,

    /// Empty the records table during setup
    pub fresh: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://tierbench.db".to_string(),
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
            busy_timeout: Duration::from_secs(5),
            fresh: false,
        }
    }
}

impl StoreConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::Config("database url must not be empty".into()));
        }
        if self.max_connections == 0 {
            return Err(Error::Config("max_connections must be > 0".into()));
        }
        Ok(())
    }
}

// =============================================================================
// Benchmark Configuration
// =============================================================================

/// Full benchmark configuration
#[derive(Debug, Clone, Serialize)]
pub struct BenchConfig {
    /// Operations per phase (N); keys are `0..N`
    pub workload_size: u64,

    /// L1 capacity (C1)
    pub l1_capacity: usize,

    /// L2 capacity (C2)
    pub l2_capacity: usize,

    /// L2 idle timeout (T)
    pub l2_idle_timeout: Duration,

    /// Worker pool width for store phases (W)
    pub workers: usize,

    /// Key checked with `exists` for the report
    pub sample_key: i64,

    /// Promote store hits into L2 and L1
    pub promote_store_hits: bool,

    /// Store settings
    pub store: StoreConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            workload_size: 1000,
            l1_capacity: DEFAULT_L1_CAPACITY,
            l2_capacity: DEFAULT_L2_CAPACITY,
            l2_idle_timeout: DEFAULT_L2_IDLE_TIMEOUT,
            workers: 10,
            sample_key: 500,
            promote_store_hits: false,
            store: StoreConfig::default(),
        }
    }
}

impl BenchConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.workload_size == 0 {
            return Err(Error::Config("workload_size must be > 0".into()));
        }
        if self.workload_size > i64::MAX as u64 {
            return Err(Error::Config("workload_size must fit in a signed key".into()));
        }
        if self.l1_capacity == 0 {
            return Err(Error::Config("l1_capacity must be > 0".into()));
        }
        if self.l2_capacity == 0 {
            return Err(Error::Config("l2_capacity must be > 0".into()));
        }
        if self.l2_idle_timeout.is_zero() {
            return Err(Error::Config("l2_idle_timeout must be > 0".into()));
        }
        if self.workers == 0 {
            return Err(Error::Config("workers must be > 0".into()));
        }
        self.store.validate()
    }

    /// Cache tier settings derived from this configuration
    pub fn cache_config(&self) -> CacheConfig {
        let promotion_policy = if self.promote_store_hits {
            PromotionPolicy::full()
        } else {
            PromotionPolicy::read_through()
        };

        CacheConfig {
            l1: L1Config {
                capacity: self.l1_capacity,
            },
            l2: L2Config {
                capacity: self.l2_capacity,
                idle_timeout: self.l2_idle_timeout,
            },
            promotion_policy,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
