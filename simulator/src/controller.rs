//! Simulation controller (orchestrator).

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use banksim_bank::Bank;
use banksim_common::{BankError, Result};
use banksim_engine::{EngineConfig, TransferPipeline};

use crate::generator::Generator;
use crate::report::SimulationReport;
use crate::viz;

/// How often to emit a DOT snapshot in debug mode, in completions.
const DOT_SNAPSHOT_EVERY: usize = 100;

/// Simulation parameters.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    /// Number of accounts in the bank.
    pub accounts: usize,
    /// Number of transfers to submit.
    pub transfers: usize,
    /// Starting balance per account.
    pub starting_balance: i64,
    /// Pipeline configuration.
    pub engine: EngineConfig,
    /// Generator seed for reproducibility.
    pub seed: Option<u64>,
    /// Emit DOT graphs of the bank state while running.
    pub debug: bool,
}

/// Drives one full simulation run: builds the bank, feeds the
/// pipeline, waits for all completions, and validates the end-of-run
/// invariants.
#[derive(Debug)]
pub struct SimulationController {
    config: SimulationConfig,
    bank: Arc<Bank>,
    generator: Generator,
}

impl SimulationController {
    /// Create a controller with a fresh bank.
    ///
    /// Transfers always reference two distinct accounts, so a bank
    /// with fewer than two is rejected up front.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        if config.accounts < 2 {
            return Err(BankError::ConfigError(format!(
                "at least 2 accounts are required, got {}",
                config.accounts
            )));
        }

        let bank = Arc::new(Bank::new(config.accounts, config.starting_balance));
        let generator = Generator::new(config.seed);
        Ok(Self {
            config,
            bank,
            generator,
        })
    }

    /// The bank under simulation.
    pub fn bank(&self) -> &Arc<Bank> {
        &self.bank
    }

    /// Run the simulation to completion.
    ///
    /// Fatal errors (protocol violations, invariant breaches, wiring
    /// defects) surface immediately; lock contention is handled inside
    /// the pipeline and never reaches here.
    pub async fn run(mut self) -> Result<SimulationReport> {
        let started = Instant::now();
        let start_sum = self.bank.sum();

        info!(
            accounts = self.config.accounts,
            transfers = self.config.transfers,
            executors = self.config.engine.executors,
            start_sum,
            "starting simulation"
        );

        let mut pipeline = TransferPipeline::start(self.bank.clone(), self.config.engine.clone())?;

        let mut expected_transferred = 0i64;
        for _ in 0..self.config.transfers {
            let transfer = self.generator.next_transfer(&self.bank)?;
            expected_transferred += transfer.amount;
            pipeline.submit(transfer).await?;
        }
        pipeline.close_intake();
        debug!(
            transfers = self.config.transfers,
            "all transfers submitted, intake closed"
        );

        let mut completed = 0;
        while completed < self.config.transfers {
            match pipeline.next_completion().await {
                Some(()) => {
                    completed += 1;
                    if self.config.debug && completed % DOT_SNAPSHOT_EVERY == 0 {
                        println!("{}", viz::render_dot(&self.bank.snapshot()));
                    }
                }
                // All executors exited early; the join below surfaces why.
                None => break,
            }
        }

        let metrics = pipeline.metrics();
        pipeline.join().await?;

        if completed < self.config.transfers {
            return Err(BankError::UnprocessedTransfers {
                remaining: self.config.transfers - completed,
            });
        }

        let final_sum = self.bank.sum();
        if final_sum != start_sum {
            return Err(BankError::BalanceMismatch {
                expected: start_sum,
                actual: final_sum,
            });
        }

        let transferred = self.bank.transferred();
        if transferred != expected_transferred {
            return Err(BankError::TransferredMismatch {
                expected: expected_transferred,
                actual: transferred,
            });
        }

        let report = SimulationReport {
            transfers: completed,
            start_sum,
            final_sum,
            expected_transferred,
            transferred,
            elapsed: started.elapsed(),
            metrics,
        };

        info!(
            completed,
            final_sum,
            transferred,
            conflicts = metrics.conflicts,
            backoffs = metrics.backoffs,
            "simulation complete"
        );

        Ok(report)
    }
}
