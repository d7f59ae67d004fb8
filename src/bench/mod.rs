//! Benchmark Harness
//!
//! Seven phases of `N` operations each, run strictly in sequence:
//!
//! ```text
//! store insert ─▶ store retrieve ─▶ L1 insert ─▶ L1 retrieve
//!   (pool W)        (pool W)
//!        ─▶ L2 insert ─▶ L2 retrieve ─▶ multilevel retrieve
//! ```
//!
//! Store phases are dispatched over a [`WorkerPool`] of width `W` and timed
//! by wall clock from first submission to last completion. Cache phases run
//! sequentially on the calling task.

mod harness;
mod phase;
mod pool;
mod report;

pub use harness::{BenchmarkContext, BenchmarkHarness};
pub use phase::{Phase, PhaseState, PhaseTimer, PhaseTimings};
pub use pool::{UnitOutcome, WorkerPool};
pub use report::{BenchmarkReport, PhaseResult};
