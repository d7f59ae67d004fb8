//! Tierbench Integration Tests
//!
//! - Cache tiers: LRU eviction, idle expiry, promotion, miss propagation
//! - Durable store: concurrent insert completeness over several pool widths
//! - Harness: full runs, unit failure accounting, setup failures, timing

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use tierbench::cache::{
    CacheConfig, CacheTier, DurableStore, InMemoryStore, Key, L1Cache, L1Config, L2Cache, L2Config,
    SqliteStore, StoreStats, TieredCache,
};
use tierbench::{BenchConfig, BenchmarkHarness, Error, Phase, StoreConfig};

fn sqlite_config(dir: &tempfile::TempDir) -> StoreConfig {
    StoreConfig {
        url: format!("sqlite://{}", dir.path().join("bench.db").display()),
        ..Default::default()
    }
}

// =============================================================================
// Cache Tier Tests
// =============================================================================

mod cache_tests {
    use super::*;

    #[test]
    fn test_l1_evicts_least_recently_used() {
        let l1 = L1Cache::with_config(L1Config { capacity: 1000 });
        for key in 0..1000 {
            l1.put(key, format!("Value{}", key));
        }
        l1.put(1000, "Value1000");

        assert_eq!(l1.len(), 1000);
        assert!(l1.get(0).is_none());
        for key in 1..=1000 {
            assert_eq!(l1.get(key), Some(format!("Value{}", key)), "key {}", key);
        }
    }

    #[test]
    fn test_l1_read_protects_from_eviction() {
        let l1 = L1Cache::with_config(L1Config { capacity: 3 });
        l1.put(1, "a");
        l1.put(2, "b");
        l1.put(3, "c");
        l1.get(1);
        l1.put(4, "d");

        assert!(l1.contains(1));
        assert!(!l1.contains(2));
        assert_eq!(l1.evictions(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_l2_idle_expiry() {
        let timeout = Duration::from_secs(600);
        let l2 = L2Cache::with_config(L2Config {
            capacity: 1000,
            idle_timeout: timeout,
        });
        l2.put(1, "untouched");
        l2.put(2, "touched");

        tokio::time::advance(timeout / 2).await;
        assert!(l2.get(2).is_some());

        tokio::time::advance(timeout / 2).await;
        assert!(l2.get(1).is_none());
        assert_eq!(l2.get(2).as_deref(), Some("touched"));
        assert_eq!(l2.expirations(), 1);
    }

    #[tokio::test]
    async fn test_l2_hit_promotes_into_l1() {
        let cache = TieredCache::in_memory();
        cache.put(CacheTier::L2, 42, "Value42").await.unwrap();

        let lookup = cache.get(42).await.unwrap().unwrap();
        assert_eq!(lookup.tier, CacheTier::L2);
        assert_eq!(cache.l1().get(42).as_deref(), Some("Value42"));
    }

    #[tokio::test]
    async fn test_absent_everywhere_is_a_miss() {
        let cache = TieredCache::in_memory();
        assert!(cache.get(7).await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_l2_entry_falls_through_to_store() {
        let config = CacheConfig {
            l2: L2Config {
                capacity: 10,
                idle_timeout: Duration::from_secs(1),
            },
            ..Default::default()
        };
        let cache = TieredCache::with_config(config, Arc::new(InMemoryStore::new()));
        cache.put(CacheTier::L2, 1, "stale").await.unwrap();
        cache.put(CacheTier::Store, 1, "durable").await.unwrap();

        tokio::time::advance(Duration::from_secs(1)).await;

        let lookup = cache.get(1).await.unwrap().unwrap();
        assert_eq!(lookup.tier, CacheTier::Store);
        assert_eq!(lookup.value, "durable");
        assert!(!cache.l1().contains(1));
    }

    #[tokio::test]
    async fn test_concurrent_tiered_reads() {
        let cache = Arc::new(TieredCache::in_memory());
        for key in 0..50 {
            cache.put(CacheTier::L2, key, format!("Value{}", key)).await.unwrap();
        }

        let mut join_set = tokio::task::JoinSet::new();
        for key in 0..50 {
            let cache = Arc::clone(&cache);
            join_set.spawn(async move { cache.get(key).await });
        }

        let mut hits = 0;
        while let Some(result) = join_set.join_next().await {
            if let Ok(Ok(Some(_))) = result {
                hits += 1;
            }
        }
        assert_eq!(hits, 50);
        assert_eq!(cache.l1().len(), 50);
    }
}

// =============================================================================
// Durable Store Tests
// =============================================================================

mod store_tests {
    use super::*;

    async fn assert_complete(store: &dyn DurableStore, n: i64) {
        assert_eq!(store.count().await.unwrap(), n as u64);
        for key in 0..n {
            assert!(store.exists(key).await.unwrap(), "key {} missing", key);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_insert_completeness_across_widths() {
        for workers in [1, 4, 10, 32] {
            let config = BenchConfig {
                workers,
                ..Default::default()
            };
            let store: Arc<dyn DurableStore> = Arc::new(InMemoryStore::new());
            let harness = BenchmarkHarness::new(config, Arc::clone(&store)).unwrap();

            let result = harness.run_phase(Phase::StoreInsert).await.unwrap();
            assert_eq!(result.succeeded, 1000, "W={}", workers);
            assert_complete(store.as_ref(), 1000).await;
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_sqlite_concurrent_insert_completeness() {
        let dir = tempfile::tempdir().unwrap();
        let config = BenchConfig {
            store: sqlite_config(&dir),
            ..Default::default()
        };
        let harness = BenchmarkHarness::connect(config).await.unwrap();

        let result = harness.run_phase(Phase::StoreInsert).await.unwrap();
        assert_eq!(result.failed, 0);
        assert_complete(harness.store().as_ref(), 1000).await;

        let result = harness.run_phase(Phase::StoreRetrieve).await.unwrap();
        assert_eq!(result.succeeded, 1000);

        harness.store().close().await;
    }

    #[tokio::test]
    async fn test_sqlite_store_behind_tiered_cache() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteStore::connect(&sqlite_config(&dir)).await.unwrap();
        let cache = TieredCache::new(Arc::new(store));

        cache.put(CacheTier::Store, 5, "Value5").await.unwrap();
        let lookup = cache.get(5).await.unwrap().unwrap();
        assert_eq!(lookup.tier, CacheTier::Store);
        assert_eq!(lookup.value, "Value5");
        assert!(cache.get(6).await.unwrap().is_none());
    }
}

// =============================================================================
// Harness Tests
// =============================================================================

mod harness_tests {
    use super::*;

    /// Fails every insert whose key is a multiple of ten
    #[derive(Default)]
    struct FlakyStore {
        inner: InMemoryStore,
        injected: AtomicU64,
    }

    #[async_trait]
    impl DurableStore for FlakyStore {
        async fn insert(&self, key: Key, value: &str) -> tierbench::Result<()> {
            if key % 10 == 0 {
                self.injected.fetch_add(1, Ordering::Relaxed);
                return Err(Error::StoreOperation {
                    operation: "insert",
                    key,
                    reason: "injected failure".into(),
                });
            }
            self.inner.insert(key, value).await
        }

        async fn retrieve(&self, key: Key) -> tierbench::Result<Option<String>> {
            self.inner.retrieve(key).await
        }

        async fn count(&self) -> tierbench::Result<u64> {
            self.inner.count().await
        }

        async fn exists(&self, key: Key) -> tierbench::Result<bool> {
            self.inner.exists(key).await
        }

        fn stats(&self) -> StoreStats {
            self.inner.stats()
        }

        fn name(&self) -> &'static str {
            "flaky"
        }
    }

    #[tokio::test]
    async fn test_full_run_reference_configuration() {
        let harness =
            BenchmarkHarness::new(BenchConfig::default(), Arc::new(InMemoryStore::new())).unwrap();
        let report = harness.run().await.unwrap();

        let phases: Vec<Phase> = report.phases.iter().map(|r| r.phase).collect();
        assert_eq!(phases, Phase::ALL.to_vec());
        assert!(report.phases.iter().all(|r| r.succeeded == 1000));
        assert_eq!(report.record_count, Some(1000));
        assert_eq!(report.sample_key, 500);
        assert_eq!(report.sample_exists, Some(true));
    }

    #[tokio::test]
    async fn test_full_run_sqlite_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let config = BenchConfig {
            workload_size: 200,
            sample_key: 150,
            store: StoreConfig {
                fresh: true,
                ..sqlite_config(&dir)
            },
            ..Default::default()
        };

        let report = BenchmarkHarness::connect(config.clone())
            .await
            .unwrap()
            .run()
            .await
            .unwrap();
        assert_eq!(report.record_count, Some(200));
        assert_eq!(report.total_failures(), 0);
        assert_eq!(report.store, "sqlite");

        // Fresh setup lets a second run insert cold again
        let report = BenchmarkHarness::connect(config).await.unwrap().run().await.unwrap();
        assert_eq!(report.total_failures(), 0);
        assert_eq!(report.record_count, Some(200));
    }

    #[tokio::test]
    async fn test_failing_units_are_counted() {
        let store = Arc::new(FlakyStore::default());
        let config = BenchConfig {
            workload_size: 100,
            sample_key: 50,
            ..Default::default()
        };
        let harness = BenchmarkHarness::new(config, store.clone()).unwrap();
        let report = harness.run().await.unwrap();

        let insert = report.phase(Phase::StoreInsert).unwrap();
        assert_eq!(insert.failed, 10);
        assert_eq!(insert.succeeded, 90);
        assert_eq!(store.injected.load(Ordering::Relaxed), 10);

        assert_eq!(report.record_count, Some(90));
        assert_eq!(report.sample_exists, Some(false));
        assert_eq!(report.total_failures(), 10);
    }

    #[tokio::test]
    async fn test_unreachable_store_is_setup_failure() {
        let dir = tempfile::tempdir().unwrap();
        let config = BenchConfig {
            store: StoreConfig {
                url: format!(
                    "sqlite://{}",
                    dir.path().join("missing").join("bench.db").display()
                ),
                ..Default::default()
            },
            ..Default::default()
        };

        let result = BenchmarkHarness::connect(config).await;
        assert!(matches!(result, Err(Error::StoreUnreachable { .. })));
    }

    #[tokio::test]
    async fn test_invalid_config_is_setup_failure() {
        let config = BenchConfig {
            workload_size: 0,
            store: StoreConfig {
                url: "memory".into(),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            BenchmarkHarness::connect(config).await,
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_rerun_rejected() {
        let config = BenchConfig {
            workload_size: 10,
            ..Default::default()
        };
        let harness = BenchmarkHarness::new(config, Arc::new(InMemoryStore::new())).unwrap();
        harness.run().await.unwrap();

        assert!(matches!(
            harness.run().await,
            Err(Error::PhaseReentered { .. })
        ));
    }

    #[tokio::test]
    async fn test_sequential_phase_time_grows_with_workload() {
        async fn l1_insert_ns(n: u64) -> u64 {
            let config = BenchConfig {
                workload_size: n,
                l1_capacity: n as usize,
                ..Default::default()
            };
            let harness = BenchmarkHarness::new(config, Arc::new(InMemoryStore::new())).unwrap();
            harness.run_phase(Phase::L1Insert).await.unwrap().elapsed_ns
        }

        let small = l1_insert_ns(100).await;
        let large = l1_insert_ns(100_000).await;
        assert!(large > small, "small={}ns large={}ns", small, large);
    }

    #[tokio::test]
    async fn test_report_json_round_trip_fields() {
        let config = BenchConfig {
            workload_size: 10,
            sample_key: 3,
            ..Default::default()
        };
        let harness = BenchmarkHarness::new(config, Arc::new(InMemoryStore::new())).unwrap();
        let report = harness.run().await.unwrap();

        let value: serde_json::Value = serde_json::from_str(&report.to_json().unwrap()).unwrap();
        assert_eq!(value["workload_size"], 10);
        assert_eq!(value["sample_exists"], true);
        assert_eq!(value["phases"][6]["phase"], "multilevel_retrieve");
        assert!(value["run_id"].as_str().is_some());
    }
}
