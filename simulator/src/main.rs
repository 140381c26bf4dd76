//! banksim Simulator
//!
//! Runs a concurrent bank-transfer simulation and validates the
//! conservation and accounting invariants at the end of the run.

use std::time::Duration;

use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use banksim_engine::EngineConfig;

mod controller;
mod generator;
mod report;
mod viz;

use controller::{SimulationConfig, SimulationController};

/// banksim Simulator CLI
#[derive(Parser, Debug)]
#[command(name = "simulator")]
#[command(about = "banksim concurrent transfer simulation")]
struct Args {
    /// Number of accounts to create
    #[arg(short, long, default_value = "6")]
    accounts: usize,

    /// Number of transfers to run
    #[arg(short, long, default_value = "1000")]
    transfers: usize,

    /// Executor pool size (defaults to BANKSIM_EXECUTORS or the
    /// account count)
    #[arg(short, long)]
    executors: Option<usize>,

    /// Starting balance per account
    #[arg(short, long, default_value = "1000")]
    balance: i64,

    /// Manager retry backoff in milliseconds (defaults to
    /// BANKSIM_BACKOFF_MS or 10)
    #[arg(long)]
    backoff_ms: Option<u64>,

    /// Random seed for reproducibility
    #[arg(long)]
    seed: Option<u64>,

    /// Emit DOT graphs of the bank state while running
    #[arg(long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();

    info!("Starting banksim simulator");
    info!("Accounts: {}", args.accounts);
    info!("Transfers: {}", args.transfers);

    // Environment variables supply engine defaults; explicit flags win.
    let mut engine = EngineConfig::from_env();
    if let Some(executors) = args.executors {
        engine.executors = executors;
    } else if std::env::var("BANKSIM_EXECUTORS").is_err() {
        engine.executors = args.accounts;
    }
    if let Some(backoff_ms) = args.backoff_ms {
        engine.retry_backoff = Duration::from_millis(backoff_ms);
    }
    // Size the queues to the full volume so the manager never blocks
    // on a full ready queue while holding locks.
    engine.queue_capacity = args.transfers.max(1);

    let config = SimulationConfig {
        accounts: args.accounts,
        transfers: args.transfers,
        starting_balance: args.balance,
        engine,
        seed: args.seed,
        debug: args.debug,
    };

    let controller = SimulationController::new(config)?;
    let bank = controller.bank().clone();

    let report = controller.run().await?;

    if args.debug {
        println!("{}", viz::render_dot(&bank.snapshot()));
    }

    info!("Simulation complete");
    info!("Expected transferred: {}", report.expected_transferred);
    info!("Actual transferred: {}", report.transferred);
    info!("Expected sum: {}", report.start_sum);
    info!("Actual sum: {}", report.final_sum);
    info!("{}", report.summary());

    Ok(())
}
