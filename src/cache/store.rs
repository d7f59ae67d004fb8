//! Durable Store - the tier below the caches
//!
//! Narrow key/value port consumed by [`TieredCache`](super::TieredCache) and
//! the benchmark harness. Implementations own their connection pooling and
//! must be safe to call from many workers at once.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::info;

use super::entry::Key;
use super::sqlite::SqliteStore;
use crate::config::StoreConfig;
use crate::error::{Error, Result};

/// Durable key/value store port
#[async_trait]
pub trait DurableStore: Send + Sync {
    /// Insert a new record. Inserting an existing key fails.
    async fn insert(&self, key: Key, value: &str) -> Result<()>;

    /// Point lookup
    async fn retrieve(&self, key: Key) -> Result<Option<String>>;

    /// Total stored records
    async fn count(&self) -> Result<u64>;

    /// Whether a record exists for `key`
    async fn exists(&self, key: Key) -> Result<bool>;

    /// Operation counters
    fn stats(&self) -> StoreStats;

    /// Short backend name for logs and reports
    fn name(&self) -> &'static str;

    /// Release pooled resources; later calls may fail
    async fn close(&self) {}
}

/// Store operation counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreStats {
    /// Successful reads (retrieve, exists, count)
    pub reads: u64,
    /// Successful inserts
    pub writes: u64,
    /// Failed calls of any kind
    pub failures: u64,
}

/// Shared counters for store implementations
#[derive(Debug, Default)]
pub(crate) struct StoreCounters {
    reads: AtomicU64,
    writes: AtomicU64,
    failures: AtomicU64,
}

impl StoreCounters {
    /// Count a read call by its outcome
    pub fn read<T>(&self, result: Result<T>) -> Result<T> {
        self.track(result, &self.reads)
    }

    /// Count a write call by its outcome
    pub fn write<T>(&self, result: Result<T>) -> Result<T> {
        self.track(result, &self.writes)
    }

    fn track<T>(&self, result: Result<T>, ok_counter: &AtomicU64) -> Result<T> {
        match &result {
            Ok(_) => ok_counter.fetch_add(1, Ordering::Relaxed),
            Err(_) => self.failures.fetch_add(1, Ordering::Relaxed),
        };
        result
    }

    pub fn snapshot(&self) -> StoreStats {
        StoreStats {
            reads: self.reads.load(Ordering::Relaxed),
            writes: self.writes.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
        }
    }
}

/// In-memory store for tests and `memory` runs
/// Uses DashMap for sharded concurrent access
#[derive(Default)]
pub struct InMemoryStore {
    records: DashMap<Key, String>,
    counters: StoreCounters,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DurableStore for InMemoryStore {
    async fn insert(&self, key: Key, value: &str) -> Result<()> {
        let result = match self.records.entry(key) {
            Entry::Occupied(_) => Err(Error::DuplicateKey(key)),
            Entry::Vacant(slot) => {
                slot.insert(value.to_string());
                Ok(())
            }
        };
        self.counters.write(result)
    }

    async fn retrieve(&self, key: Key) -> Result<Option<String>> {
        let value = self.records.get(&key).map(|v| v.value().clone());
        self.counters.read(Ok(value))
    }

    async fn count(&self) -> Result<u64> {
        self.counters.read(Ok(self.records.len() as u64))
    }

    async fn exists(&self, key: Key) -> Result<bool> {
        self.counters.read(Ok(self.records.contains_key(&key)))
    }

    fn stats(&self) -> StoreStats {
        self.counters.snapshot()
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// URL selecting the in-memory store
pub const MEMORY_STORE_URL: &str = "memory";

/// Open the store named by `config.url`.
///
/// Connection and schema failures are setup errors; the run must not start.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn DurableStore>> {
    if config.url == MEMORY_STORE_URL {
        info!("Using in-memory durable store");
        return Ok(Arc::new(InMemoryStore::new()));
    }

    let store = SqliteStore::connect(config).await?;
    Ok(Arc::new(store))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[tokio::test]
    async fn test_in_memory_insert_retrieve() {
        let store = InMemoryStore::new();
        store.insert(1, "Value1").await.unwrap();

        assert_eq!(store.retrieve(1).await.unwrap().as_deref(), Some("Value1"));
        assert!(store.retrieve(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_in_memory_duplicate_insert_fails() {
        let store = InMemoryStore::new();
        store.insert(1, "a").await.unwrap();

        let err = store.insert(1, "b").await.unwrap_err();
        assert_matches!(err, Error::DuplicateKey(1));
        assert_eq!(store.retrieve(1).await.unwrap().as_deref(), Some("a"));
        assert_eq!(store.stats().failures, 1);
    }

    #[tokio::test]
    async fn test_in_memory_count_and_exists() {
        let store = InMemoryStore::new();
        for k in 0..10 {
            store.insert(k, "x").await.unwrap();
        }

        assert_eq!(store.count().await.unwrap(), 10);
        assert!(store.exists(9).await.unwrap());
        assert!(!store.exists(10).await.unwrap());
    }

    #[tokio::test]
    async fn test_in_memory_stats() {
        let store = InMemoryStore::new();
        store.insert(1, "x").await.unwrap();
        store.retrieve(1).await.unwrap();
        store.exists(2).await.unwrap();

        assert_eq!(
            store.stats(),
            StoreStats {
                reads: 2,
                writes: 1,
                failures: 0
            }
        );
        assert_eq!(store.name(), "memory");
    }

    #[tokio::test]
    async fn test_open_store_memory_url() {
        let config = StoreConfig {
            url: MEMORY_STORE_URL.to_string(),
            ..Default::default()
        };
        let store = open_store(&config).await.unwrap();
        assert_eq!(store.name(), "memory");
        assert_eq!(store.count().await.unwrap(), 0);
    }
}
