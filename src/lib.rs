//! Tierbench - Three-Tier Cache Benchmark
//!
//! A bounded LRU cache (L1) and a bounded idle-expiry cache (L2) in front of
//! a durable record store, plus a harness that times each tier's raw insert
//! and retrieve cost.
//!
//! # Architecture
//!
//! ```text
//! BenchmarkHarness ──▶ TieredCache ──▶ L1 (LRU) ──▶ L2 (idle) ──▶ DurableStore
//!        │                                                            ▲
//!        └──────────── WorkerPool (store phases) ──────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`bench`] - Phases, worker pool, harness and report
//! - [`cache`] - Cache tiers, tiered read path and durable stores
//! - [`config`] - Run configuration
//! - [`error`] - Error types

pub mod bench;
pub mod cache;
pub mod config;
pub mod error;

// Re-export commonly used types
pub use bench::{BenchmarkHarness, BenchmarkReport, Phase};
pub use cache::{CacheTier, DurableStore, TieredCache};
pub use config::{BenchConfig, StoreConfig};
pub use error::{Error, Result};
