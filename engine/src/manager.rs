//! The admission manager.
//!
//! Exactly one manager task runs per pipeline. It turns the unordered
//! intake stream into a stream of transfers for which both endpoint
//! accounts are exclusively locked, without ever deadlocking: any
//! conflict causes a full release-and-retry, so the manager never waits
//! while holding a partial lock, and the single acquiring thread rules
//! out the ABBA pattern.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{debug, info};

use banksim_bank::Bank;
use banksim_common::{BankError, LockOwner, Result, Transfer};

use crate::config::EngineConfig;
use crate::metrics::SharedMetrics;

/// Serializes lock acquisition for each transfer's two accounts.
pub struct Manager {
    /// The bank whose accounts are being locked.
    bank: Arc<Bank>,
    /// Pipeline configuration.
    config: EngineConfig,
    /// Pipeline metrics.
    metrics: SharedMetrics,
}

impl Manager {
    /// Create a new manager.
    pub fn new(bank: Arc<Bank>, config: EngineConfig, metrics: SharedMetrics) -> Self {
        Self {
            bank,
            config,
            metrics,
        }
    }

    /// Consume the intake queue until it is closed, admitting each
    /// transfer onto the ready queue once both of its accounts are
    /// locked. Dropping the ready sender on return is the sole
    /// termination signal for the executor pool.
    pub async fn run(
        self,
        mut intake: mpsc::Receiver<Transfer>,
        ready: mpsc::Sender<Transfer>,
    ) -> Result<()> {
        while let Some(transfer) = intake.recv().await {
            debug!(transfer_id = %transfer.id, %transfer, "manager processing transfer");
            self.admit(transfer, &ready).await?;
        }

        info!("manager drained intake queue");
        Ok(())
    }

    /// Acquire both locks for one transfer, retrying until it succeeds.
    ///
    /// Optimistic acquire-then-rollback: check both flags, lock `from`,
    /// re-check `to` (mandatory — another actor may have locked it in
    /// the window), and on conflict release `from` immediately and
    /// restart from the top.
    async fn admit(&self, transfer: Transfer, ready: &mpsc::Sender<Transfer>) -> Result<()> {
        loop {
            if self.bank.is_account_locked(transfer.from)
                || self.bank.is_account_locked(transfer.to)
            {
                self.metrics.record_backoff();
                tokio::time::sleep(self.config.retry_backoff).await;
                continue;
            }

            self.bank.lock_account(transfer.from, LockOwner::Manager);

            if self.bank.is_account_locked(transfer.to) {
                debug!(
                    transfer_id = %transfer.id,
                    contested = %transfer.to,
                    "destination locked after acquiring source, rolling back"
                );
                self.bank.unlock_account(transfer.from, LockOwner::Manager)?;
                self.metrics.record_conflict();
                tokio::time::sleep(self.config.retry_backoff).await;
                continue;
            }

            self.bank.lock_account(transfer.to, LockOwner::Manager);

            ready
                .send(transfer)
                .await
                .map_err(|_| BankError::QueueClosed("ready"))?;
            self.metrics.record_admission();
            debug!(transfer_id = %transfer.id, "transfer admitted to ready queue");
            return Ok(());
        }
    }
}
