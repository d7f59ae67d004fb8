//! Bounded worker pool for the store phases
//!
//! Submits `N` units, at most `W` in flight, and returns once every
//! submitted unit has finished. A failing or panicking unit is logged and
//! counted; it never stops the remaining units.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, warn};

use super::phase::Phase;
use crate::error::{Error, Result};

/// What a finished unit task hands back to the pool
type Joined = std::result::Result<(u64, Result<()>), JoinError>;

/// Per-phase unit tally
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct UnitOutcome {
    /// Units that returned `Ok`
    pub succeeded: u64,
    /// Units that returned an error or panicked
    pub failed: u64,
}

impl UnitOutcome {
    pub fn total(&self) -> u64 {
        self.succeeded + self.failed
    }

    fn record(&mut self, phase: Phase, joined: Joined) {
        match joined {
            Ok((_, Ok(()))) => self.succeeded += 1,
            Ok((unit, Err(e))) => {
                warn!(phase = %phase, unit, error = %e, "Unit of work failed");
                self.failed += 1;
            }
            Err(e) => {
                warn!(phase = %phase, error = %e, "Unit of work panicked or was cancelled");
                self.failed += 1;
            }
        }
    }
}

/// Fixed-width pool backed by a semaphore
#[derive(Debug, Clone)]
pub struct WorkerPool {
    width: usize,
    permits: Arc<Semaphore>,
}

impl WorkerPool {
    /// Create a pool running at most `width` units at once
    pub fn new(width: usize) -> Self {
        Self {
            width,
            permits: Arc::new(Semaphore::new(width)),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    /// Run units `0..units`, building each with `work`.
    ///
    /// Returns once all submitted units have finished. If the pool stops
    /// accepting work, in-flight units are drained and the phase fails with
    /// [`Error::PoolRejected`].
    pub async fn run<F, Fut>(&self, phase: Phase, units: u64, work: F) -> Result<UnitOutcome>
    where
        F: Fn(u64) -> Fut,
        Fut: Future<Output = Result<()>> + Send + 'static,
    {
        let mut join_set = JoinSet::new();
        let mut outcome = UnitOutcome::default();

        for unit in 0..units {
            let permit = match Arc::clone(&self.permits).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    while let Some(joined) = join_set.join_next().await {
                        outcome.record(phase, joined);
                    }
                    return Err(Error::PoolRejected {
                        phase: phase.name(),
                        unit,
                        reason: e.to_string(),
                    });
                }
            };

            let task = work(unit);
            join_set.spawn(async move {
                let result = task.await;
                drop(permit);
                (unit, result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            outcome.record(phase, joined);
        }

        debug!(
            phase = %phase,
            succeeded = outcome.succeeded,
            failed = outcome.failed,
            "Worker pool drained"
        );
        Ok(outcome)
    }

    /// Stop accepting work; later submissions are rejected
    pub fn close(&self) {
        self.permits.close();
    }

    pub fn is_closed(&self) -> bool {
        self.permits.is_closed()
    }
}

// =============================================================================
// Tests
// =============================================================================
