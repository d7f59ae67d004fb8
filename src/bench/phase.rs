//! Benchmark phases and their timing record
//!
//! Each phase moves `Idle → Running → Completed` exactly once. The timing
//! record is shared by reference with every phase runner and only read
//! back after the run.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

use super::pool::UnitOutcome;
use crate::error::{Error, Result};

// =============================================================================
// Phase
// =============================================================================

/// One timed segment of the benchmark
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    StoreInsert,
    StoreRetrieve,
    L1Insert,
    L1Retrieve,
    L2Insert,
    L2Retrieve,
    MultilevelRetrieve,
}

impl Phase {
    /// All phases in execution order
    pub const ALL: [Phase; 7] = [
        Phase::StoreInsert,
        Phase::StoreRetrieve,
        Phase::L1Insert,
        Phase::L1Retrieve,
        Phase::L2Insert,
        Phase::L2Retrieve,
        Phase::MultilevelRetrieve,
    ];

    /// Machine-readable name
    pub fn name(&self) -> &'static str {
        match self {
            Phase::StoreInsert => "store_insert",
            Phase::StoreRetrieve => "store_retrieve",
            Phase::L1Insert => "l1_insert",
            Phase::L1Retrieve => "l1_retrieve",
            Phase::L2Insert => "l2_insert",
            Phase::L2Retrieve => "l2_retrieve",
            Phase::MultilevelRetrieve => "multilevel_retrieve",
        }
    }

    /// Human-readable label used in the report
    pub fn label(&self) -> &'static str {
        match self {
            Phase::StoreInsert => "Database Insert",
            Phase::StoreRetrieve => "Database Retrieve",
            Phase::L1Insert => "L1 Cache Insert",
            Phase::L1Retrieve => "L1 Cache Retrieve",
            Phase::L2Insert => "L2 Cache Insert",
            Phase::L2Retrieve => "L2 Cache Retrieve",
            Phase::MultilevelRetrieve => "Multilevel Cache Retrieve",
        }
    }

    /// Whether the phase runs on the worker pool
    pub fn is_concurrent(&self) -> bool {
        matches!(self, Phase::StoreInsert | Phase::StoreRetrieve)
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// =============================================================================
// Phase State
// =============================================================================

/// Phase lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum PhaseState {
    Idle = 0,
    Running = 1,
    Completed = 2,
}

impl PhaseState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => PhaseState::Idle,
            1 => PhaseState::Running,
            _ => PhaseState::Completed,
        }
    }
}

// =============================================================================
// Timing Record
// =============================================================================

const PHASES: usize = Phase::ALL.len();

/// Handle for a running phase; consumed by [`PhaseTimings::complete`]
#[derive(Debug)]
#[must_use = "a started phase must be completed"]
pub struct PhaseTimer {
    phase: Phase,
    started: Instant,
}

impl PhaseTimer {
    pub fn phase(&self) -> Phase {
        self.phase
    }
}

/// Per-phase state, elapsed time and unit outcome
#[derive(Debug)]
pub struct PhaseTimings {
    states: [AtomicU8; PHASES],
    elapsed_ns: [AtomicU64; PHASES],
    succeeded: [AtomicU64; PHASES],
    failed: [AtomicU64; PHASES],
}

impl Default for PhaseTimings {
    fn default() -> Self {
        Self::new()
    }
}

impl PhaseTimings {
    pub fn new() -> Self {
        Self {
            states: std::array::from_fn(|_| AtomicU8::new(PhaseState::Idle as u8)),
            elapsed_ns: std::array::from_fn(|_| AtomicU64::new(0)),
            succeeded: std::array::from_fn(|_| AtomicU64::new(0)),
            failed: std::array::from_fn(|_| AtomicU64::new(0)),
        }
    }

    /// Move `phase` from idle to running and start its clock
    pub fn start(&self, phase: Phase) -> Result<PhaseTimer> {
        self.states[phase.index()]
            .compare_exchange(
                PhaseState::Idle as u8,
                PhaseState::Running as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| Error::PhaseReentered {
                phase: phase.name(),
            })?;

        Ok(PhaseTimer {
            phase,
            started: Instant::now(),
        })
    }

    /// Stop the clock and record the outcome
    pub fn complete(&self, timer: PhaseTimer, outcome: UnitOutcome) -> Result<Duration> {
        let elapsed = timer.started.elapsed();
        let i = timer.phase.index();

        self.elapsed_ns[i].store(elapsed.as_nanos() as u64, Ordering::Relaxed);
        self.succeeded[i].store(outcome.succeeded, Ordering::Relaxed);
        self.failed[i].store(outcome.failed, Ordering::Relaxed);

        self.states[i]
            .compare_exchange(
                PhaseState::Running as u8,
                PhaseState::Completed as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map_err(|_| Error::PhaseNotRunning {
                phase: timer.phase.name(),
            })?;

        Ok(elapsed)
    }

    pub fn state(&self, phase: Phase) -> PhaseState {
        PhaseState::from_u8(self.states[phase.index()].load(Ordering::Acquire))
    }

    /// Recorded wall-clock time; zero until the phase completes
    pub fn elapsed(&self, phase: Phase) -> Duration {
        Duration::from_nanos(self.elapsed_ns[phase.index()].load(Ordering::Relaxed))
    }

    pub fn outcome(&self, phase: Phase) -> UnitOutcome {
        let i = phase.index();
        UnitOutcome {
            succeeded: self.succeeded[i].load(Ordering::Relaxed),
            failed: self.failed[i].load(Ordering::Relaxed),
        }
    }

    /// Whether every phase has completed
    pub fn all_completed(&self) -> bool {
        Phase::ALL.iter().all(|&p| self.state(p) == PhaseState::Completed)
    }
}

// =============================================================================
// Tests
// =============================================================================
