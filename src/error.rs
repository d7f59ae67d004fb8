//! Error types for the tiered cache and benchmark harness

use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while running the cache hierarchy or the benchmark
#[derive(Error, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Report serialization error
    #[error("Failed to serialize report: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    // =========================================================================
    // Durable Store Errors
    // =========================================================================
    /// Store could not be reached during setup
    #[error("Durable store unreachable at {url}: {reason}")]
    StoreUnreachable { url: String, reason: String },

    /// Schema creation or reset failed during setup
    #[error("Durable store schema setup failed: {0}")]
    StoreSchema(String),

    /// A single store call failed (transport, lock timeout, driver error)
    #[error("Durable store {operation} failed for key {key}: {reason}")]
    StoreOperation {
        operation: &'static str,
        key: i64,
        reason: String,
    },

    /// A store-wide query (count) failed
    #[error("Durable store query failed: {0}")]
    StoreQuery(String),

    /// Insert of a key that is already stored
    #[error("Duplicate key in durable store: {0}")]
    DuplicateKey(i64),

    // =========================================================================
    // Benchmark Errors
    // =========================================================================
    /// A phase was started a second time
    #[error("Phase '{phase}' was already started; phases cannot be re-entered")]
    PhaseReentered { phase: &'static str },

    /// A phase was completed without being started
    #[error("Phase '{phase}' is not running")]
    PhaseNotRunning { phase: &'static str },

    /// The worker pool refused a unit of work
    #[error("Worker pool rejected unit {unit} of phase '{phase}': {reason}")]
    PoolRejected {
        phase: &'static str,
        unit: u64,
        reason: String,
    },
}

impl Error {
    /// Per-unit failures that are recorded and skipped rather than aborting a run
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Error::StoreOperation { .. } | Error::DuplicateKey(_) | Error::StoreQuery(_)
        )
    }

    /// Failures that must stop the run before (or instead of) producing a report
    pub fn is_fatal(&self) -> bool {
        !self.is_transient()
    }

    pub(crate) fn store_op(operation: &'static str, key: i64, err: impl std::fmt::Display) -> Self {
        Error::StoreOperation {
            operation,
            key,
            reason: err.to_string(),
        }
    }
}
