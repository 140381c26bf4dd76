//! The executor pool.
//!
//! A fixed set of workers drains the ready queue until it is closed.
//! Every transfer arriving here has both accounts exclusively locked by
//! the manager, so executors never race on an account; receiving a
//! transfer with an unlocked account is a fatal protocol violation.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, error};

use banksim_bank::Bank;
use banksim_common::{BankError, LockOwner, Result, Transfer};

use crate::metrics::SharedMetrics;

/// Shared handle to the ready queue receiver.
///
/// Executors take turns receiving; the guard is released as soon as a
/// transfer (or the closed signal) arrives, so execution itself is
/// fully concurrent.
type SharedReady = Arc<Mutex<mpsc::Receiver<Transfer>>>;

/// A fixed pool of executor workers.
pub struct ExecutorPool {
    handles: Vec<JoinHandle<Result<()>>>,
}

impl ExecutorPool {
    /// Spawn `count` executors draining `ready`, signalling each
    /// completed transfer on `done`.
    pub fn spawn(
        count: usize,
        bank: Arc<Bank>,
        ready: mpsc::Receiver<Transfer>,
        done: mpsc::Sender<()>,
        metrics: SharedMetrics,
    ) -> Self {
        let ready: SharedReady = Arc::new(Mutex::new(ready));

        let handles = (0..count)
            .map(|id| {
                tokio::spawn(run_executor(
                    id,
                    bank.clone(),
                    ready.clone(),
                    done.clone(),
                    metrics.clone(),
                ))
            })
            .collect();

        Self { handles }
    }

    /// Wait for all executors to exit, propagating the first failure.
    pub async fn join(self) -> Result<()> {
        for handle in self.handles {
            handle
                .await
                .map_err(|e| BankError::Internal(format!("executor task panicked: {e}")))??;
        }
        Ok(())
    }
}

/// Single executor loop: receive, verify locks, mutate, unlock, report.
async fn run_executor(
    id: usize,
    bank: Arc<Bank>,
    ready: SharedReady,
    done: mpsc::Sender<()>,
    metrics: SharedMetrics,
) -> Result<()> {
    debug!(executor = id, "executor started");

    loop {
        let transfer = {
            let mut ready = ready.lock().await;
            ready.recv().await
        };
        let Some(transfer) = transfer else {
            break;
        };

        debug!(executor = id, transfer_id = %transfer.id, %transfer, "executing transfer");

        // Contract: the manager hands over both locks. Anything else is
        // a broken handoff and must surface, not be papered over.
        for account in [transfer.from, transfer.to] {
            if !bank.is_account_locked(account) {
                error!(
                    executor = id,
                    transfer_id = %transfer.id,
                    %account,
                    "received transfer with unlocked account"
                );
                return Err(BankError::AccountNotLocked {
                    transfer_id: transfer.id,
                    account,
                });
            }
        }

        bank.begin_in_progress(id, &transfer);
        bank.apply_transfer(&transfer)?;
        bank.unlock_account(transfer.from, LockOwner::Executor(id))?;
        bank.unlock_account(transfer.to, LockOwner::Executor(id))?;
        bank.finish_in_progress(transfer.id);
        metrics.record_execution();

        done.send(())
            .await
            .map_err(|_| BankError::QueueClosed("done"))?;
        debug!(executor = id, transfer_id = %transfer.id, "transfer completed");
    }

    debug!(executor = id, "ready queue drained, executor exiting");
    Ok(())
}
