//! Benchmark report

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::phase::Phase;
use crate::cache::MetricsSnapshot;
use crate::error::Result;

/// Result of one phase
#[derive(Debug, Clone, Serialize)]
pub struct PhaseResult {
    pub phase: Phase,
    /// Wall-clock time for the whole phase
    pub elapsed_ns: u64,
    pub succeeded: u64,
    pub failed: u64,
}

/// Outcome of a complete run
#[derive(Debug, Clone, Serialize)]
pub struct BenchmarkReport {
    /// Unique id of this run
    pub run_id: Uuid,

    /// When the first phase started
    pub started_at: DateTime<Utc>,

    /// Store backend name
    pub store: String,

    /// Operations per phase
    pub workload_size: u64,

    /// Worker pool width for the store phases
    pub workers: usize,

    /// Phases in execution order
    pub phases: Vec<PhaseResult>,

    /// Records in the store after the run; `None` if the count failed
    pub record_count: Option<u64>,

    /// Key checked for existence after the run
    pub sample_key: i64,

    /// Whether the sample key is stored; `None` if the lookup failed
    pub sample_exists: Option<bool>,

    /// Cache tier metrics at the end of the run
    pub cache: MetricsSnapshot,
}

impl BenchmarkReport {
    pub fn phase(&self, phase: Phase) -> Option<&PhaseResult> {
        self.phases.iter().find(|r| r.phase == phase)
    }

    /// Failed units across all phases
    pub fn total_failures(&self) -> u64 {
        self.phases.iter().map(|r| r.failed).sum()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Emit the report as log lines
    pub fn log(&self) {
        info!(run_id = %self.run_id, store = %self.store, "Benchmark complete");
        for result in &self.phases {
            info!(
                phase = %result.phase,
                failed = result.failed,
                "{} Time: {} ns",
                result.phase.label(),
                result.elapsed_ns
            );
        }
        info!("Database Size: {}", RecordCount(self.record_count));
        info!("ID {} exists: {}", self.sample_key, Existence(self.sample_exists));
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Run {} ({} store, N={}, W={})",
            self.run_id, self.store, self.workload_size, self.workers
        )?;
        for result in &self.phases {
            write!(
                f,
                "  {:<28}{:>14} ns",
                format!("{}:", result.phase.label()),
                result.elapsed_ns
            )?;
            if result.failed > 0 {
                write!(f, "  ({} failed)", result.failed)?;
            }
            writeln!(f)?;
        }
        writeln!(f, "  Database Size: {}", RecordCount(self.record_count))?;
        write!(f, "  ID {} exists: {}", self.sample_key, Existence(self.sample_exists))
    }
}

struct RecordCount(Option<u64>);

impl fmt::Display for RecordCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(rows) => write!(f, "{} rows", rows),
            None => f.write_str("unavailable"),
        }
    }
}

struct Existence(Option<bool>);

impl fmt::Display for Existence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(found) => write!(f, "{}", found),
            None => f.write_str("unknown"),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
