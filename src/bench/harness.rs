//! Benchmark harness
//!
//! Runs the seven phases in fixed order against one [`TieredCache`] and
//! its durable store. Store phases are spread over the worker pool; cache
//! phases run inline on the calling task.

use std::hint::black_box;
use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use super::phase::{Phase, PhaseTimings};
use super::pool::{UnitOutcome, WorkerPool};
use super::report::{BenchmarkReport, PhaseResult};
use crate::cache::{open_store, CacheEntry, DurableStore, Key, TieredCache};
use crate::config::BenchConfig;
use crate::error::Result;

// =============================================================================
// Context
// =============================================================================

/// Everything a phase runner touches
pub struct BenchmarkContext {
    /// Cache tiers and store handle
    pub cache: TieredCache,
    /// Per-phase timing record
    pub timings: PhaseTimings,
    /// Pool for the store phases
    pub pool: WorkerPool,
    /// Run configuration
    pub config: BenchConfig,
}

impl BenchmarkContext {
    fn keys(&self) -> impl Iterator<Item = Key> {
        0..self.config.workload_size as Key
    }
}

// =============================================================================
// Phase Runners
// =============================================================================

async fn store_insert(ctx: &BenchmarkContext) -> Result<UnitOutcome> {
    let store = Arc::clone(ctx.cache.store());
    ctx.pool
        .run(Phase::StoreInsert, ctx.config.workload_size, move |unit| {
            let store = Arc::clone(&store);
            async move {
                let entry = CacheEntry::synthetic(unit as Key);
                store.insert(entry.key(), entry.value()).await
            }
        })
        .await
}

async fn store_retrieve(ctx: &BenchmarkContext) -> Result<UnitOutcome> {
    let store = Arc::clone(ctx.cache.store());
    ctx.pool
        .run(Phase::StoreRetrieve, ctx.config.workload_size, move |unit| {
            let store = Arc::clone(&store);
            async move {
                black_box(store.retrieve(unit as Key).await?);
                Ok(())
            }
        })
        .await
}

fn l1_insert(ctx: &BenchmarkContext) -> UnitOutcome {
    let l1 = ctx.cache.l1();
    for key in ctx.keys() {
        let (key, value) = CacheEntry::synthetic(key).into_parts();
        l1.put(key, value);
    }
    UnitOutcome {
        succeeded: ctx.config.workload_size,
        failed: 0,
    }
}

fn l1_retrieve(ctx: &BenchmarkContext) -> UnitOutcome {
    let l1 = ctx.cache.l1();
    for key in ctx.keys() {
        black_box(l1.get(key));
    }
    UnitOutcome {
        succeeded: ctx.config.workload_size,
        failed: 0,
    }
}

fn l2_insert(ctx: &BenchmarkContext) -> UnitOutcome {
    let l2 = ctx.cache.l2();
    for key in ctx.keys() {
        let (key, value) = CacheEntry::synthetic(key).into_parts();
        l2.put(key, value);
    }
    UnitOutcome {
        succeeded: ctx.config.workload_size,
        failed: 0,
    }
}

fn l2_retrieve(ctx: &BenchmarkContext) -> UnitOutcome {
    let l2 = ctx.cache.l2();
    for key in ctx.keys() {
        black_box(l2.get(key));
    }
    UnitOutcome {
        succeeded: ctx.config.workload_size,
        failed: 0,
    }
}

async fn multilevel_retrieve(ctx: &BenchmarkContext) -> UnitOutcome {
    let phase = Phase::MultilevelRetrieve;
    let mut outcome = UnitOutcome::default();
    for key in ctx.keys() {
        match ctx.cache.get(key).await {
            Ok(found) => {
                black_box(found);
                outcome.succeeded += 1;
            }
            Err(e) => {
                warn!(phase = %phase, key, error = %e, "Unit of work failed");
                outcome.failed += 1;
            }
        }
    }
    outcome
}

// =============================================================================
// Harness
// =============================================================================

/// Drives one benchmark run
pub struct BenchmarkHarness {
    ctx: BenchmarkContext,
}

impl BenchmarkHarness {
    /// Build a harness around an already opened store
    pub fn new(config: BenchConfig, store: Arc<dyn DurableStore>) -> Result<Self> {
        config.validate()?;

        let cache = TieredCache::with_config(config.cache_config(), store);
        let pool = WorkerPool::new(config.workers);

        Ok(Self {
            ctx: BenchmarkContext {
                cache,
                timings: PhaseTimings::new(),
                pool,
                config,
            },
        })
    }

    /// Validate the configuration and open the configured store.
    ///
    /// Any failure here is a setup failure and no phase runs.
    pub async fn connect(config: BenchConfig) -> Result<Self> {
        config.validate()?;
        let store = open_store(&config.store).await?;
        Self::new(config, store)
    }

    pub fn context(&self) -> &BenchmarkContext {
        &self.ctx
    }

    pub fn store(&self) -> &Arc<dyn DurableStore> {
        self.ctx.cache.store()
    }

    /// Run every phase in order and build the report.
    ///
    /// Unit failures are counted in the report, and a failed record count or
    /// sample lookup leaves that field empty. A phase that cannot run (pool
    /// rejection, re-entry) aborts the run and no report is produced.
    pub async fn run(&self) -> Result<BenchmarkReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let store_name = self.ctx.cache.store().name();

        info!(
            %run_id,
            store = store_name,
            workload_size = self.ctx.config.workload_size,
            workers = self.ctx.pool.width(),
            "Starting benchmark run"
        );

        let mut phases = Vec::with_capacity(Phase::ALL.len());
        for phase in Phase::ALL {
            let result = self.run_phase(phase).await.inspect_err(|e| {
                error!(%run_id, phase = %phase, error = %e, "Benchmark phase aborted");
            })?;
            phases.push(result);
        }

        // A failed count or lookup is logged and left empty; the timings stand
        let store = self.ctx.cache.store();
        let record_count = store
            .count()
            .await
            .inspect_err(|e| warn!(%run_id, error = %e, "Record count unavailable"))
            .ok();
        let sample_key = self.ctx.config.sample_key;
        let sample_exists = store
            .exists(sample_key)
            .await
            .inspect_err(|e| warn!(%run_id, key = sample_key, error = %e, "Sample lookup failed"))
            .ok();

        Ok(BenchmarkReport {
            run_id,
            started_at,
            store: store_name.to_string(),
            workload_size: self.ctx.config.workload_size,
            workers: self.ctx.pool.width(),
            phases,
            record_count,
            sample_key,
            sample_exists,
            cache: self.ctx.cache.metrics(),
        })
    }

    /// Run a single phase through its state machine
    pub async fn run_phase(&self, phase: Phase) -> Result<PhaseResult> {
        let ctx = &self.ctx;
        let timer = ctx.timings.start(phase)?;

        let outcome = match phase {
            Phase::StoreInsert => store_insert(ctx).await,
            Phase::StoreRetrieve => store_retrieve(ctx).await,
            Phase::L1Insert => Ok(l1_insert(ctx)),
            Phase::L1Retrieve => Ok(l1_retrieve(ctx)),
            Phase::L2Insert => Ok(l2_insert(ctx)),
            Phase::L2Retrieve => Ok(l2_retrieve(ctx)),
            Phase::MultilevelRetrieve => Ok(multilevel_retrieve(ctx).await),
        };

        // The phase stays Running on error, so it can never be re-entered
        let outcome = outcome?;
        let elapsed = ctx.timings.complete(timer, outcome)?;

        info!(
            phase = %phase,
            elapsed_ns = elapsed.as_nanos() as u64,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "Phase completed"
        );

        Ok(PhaseResult {
            phase,
            elapsed_ns: elapsed.as_nanos() as u64,
            succeeded: outcome.succeeded,
            failed: outcome.failed,
        })
    }
}

// =============================================================================
// Tests
// =============================================================================
