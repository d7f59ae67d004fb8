//! Tierbench
//!
//! Runs the three-tier cache benchmark once and prints the report.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                          tierbench                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │  Args ─▶ BenchConfig ─▶ open store ─▶ 7 phases ─▶ report      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tierbench::{BenchConfig, BenchmarkHarness, Error, StoreConfig};

// =============================================================================
// CLI Arguments
// =============================================================================

/// Tierbench - L1/L2/durable-store cache benchmark
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Durable store URL (`sqlite://path` or `memory`)
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://tierbench.db")]
    database_url: String,

    /// Store connection pool size
    #[arg(long, env = "DB_POOL_SIZE", default_value = "10")]
    pool_size: u32,

    /// Empty the records table before the run
    #[arg(long, env = "FRESH")]
    fresh: bool,

    /// Operations per phase
    #[arg(long, env = "WORKLOAD_SIZE", default_value = "1000")]
    workload_size: u64,

    /// L1 capacity
    #[arg(long, env = "L1_CAPACITY", default_value = "1000")]
    l1_capacity: usize,

    /// L2 capacity
    #[arg(long, env = "L2_CAPACITY", default_value = "1000")]
    l2_capacity: usize,

    /// L2 idle timeout in seconds
    #[arg(long, env = "L2_IDLE_TIMEOUT_SECONDS", default_value = "600")]
    l2_idle_timeout_seconds: u64,

    /// Worker pool width for store phases
    #[arg(long, env = "WORKERS", default_value = "10")]
    workers: usize,

    /// Key checked for existence after the run
    #[arg(long, env = "SAMPLE_KEY", default_value = "500")]
    sample_key: i64,

    /// Promote store hits into L2 and L1
    #[arg(long, env = "PROMOTE_STORE_HITS")]
    promote_store_hits: bool,

    /// Print the report as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,
}

impl Args {
    fn bench_config(&self) -> BenchConfig {
        BenchConfig {
            workload_size: self.workload_size,
            l1_capacity: self.l1_capacity,
            l2_capacity: self.l2_capacity,
            l2_idle_timeout: Duration::from_secs(self.l2_idle_timeout_seconds),
            workers: self.workers,
            sample_key: self.sample_key,
            promote_store_hits: self.promote_store_hits,
            store: StoreConfig {
                url: self.database_url.clone(),
                max_connections: self.pool_size,
                fresh: self.fresh,
                ..Default::default()
            },
        }
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Initialize logging
    init_logging(&args);

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("Benchmark failed: {:#}", e);
            match e.downcast_ref::<Error>() {
                Some(Error::Config(_)) => ExitCode::from(2),
                _ => ExitCode::FAILURE,
            }
        }
    }
}

async fn run(args: &Args) -> anyhow::Result<()> {
    let config = args.bench_config();

    info!("Starting tierbench");
    info!("  Database URL: {}", config.store.url);
    info!("  Workload size: {}", config.workload_size);
    info!("  L1 capacity: {}", config.l1_capacity);
    info!(
        "  L2 capacity: {} (idle timeout {:?})",
        config.l2_capacity, config.l2_idle_timeout
    );
    info!("  Workers: {}", config.workers);

    let harness = BenchmarkHarness::connect(config).await?;
    let outcome = harness.run().await;

    // Release the pool whether or not the run completed
    harness.store().close().await;

    let report = outcome?;
    if args.json {
        println!("{}", report.to_json()?);
    } else {
        report.log();
    }

    if report.total_failures() > 0 {
        info!(
            failed = report.total_failures(),
            "Some units of work failed; see warnings above"
        );
    }
    Ok(())
}

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let mut filter = EnvFilter::from_default_env().add_directive(level.into());
    if let Ok(directive) = "sqlx=warn".parse() {
        filter = filter.add_directive(directive);
    }

    // Logs go to stderr so `--json` output stays clean
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
