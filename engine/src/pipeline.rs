//! Pipeline wiring: intake queue -> manager -> ready queue -> pool.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::info;

use banksim_bank::Bank;
use banksim_common::{BankError, Result, Transfer};

use crate::config::EngineConfig;
use crate::manager::Manager;
use crate::metrics::{EngineMetrics, MetricsSnapshot, SharedMetrics};
use crate::pool::ExecutorPool;

/// A running transfer pipeline.
///
/// Owns the intake sender, the completion receiver, and the task
/// handles of the manager and the executor pool. The caller submits
/// transfers, closes the intake, counts completions, and finally joins.
pub struct TransferPipeline {
    bank: Arc<Bank>,
    intake: Option<mpsc::Sender<Transfer>>,
    done: mpsc::Receiver<()>,
    manager: Option<JoinHandle<Result<()>>>,
    pool: Option<ExecutorPool>,
    metrics: SharedMetrics,
}

impl TransferPipeline {
    /// Validate the configuration, build the queues, and spawn the
    /// manager and the executor pool.
    pub fn start(bank: Arc<Bank>, config: EngineConfig) -> Result<Self> {
        config.validate()?;

        let metrics: SharedMetrics = Arc::new(EngineMetrics::new());

        let (intake_tx, intake_rx) = mpsc::channel(config.queue_capacity);
        let (ready_tx, ready_rx) = mpsc::channel(config.queue_capacity);
        let (done_tx, done_rx) = mpsc::channel(config.queue_capacity);

        info!(
            executors = config.executors,
            queue_capacity = config.queue_capacity,
            "starting transfer pipeline"
        );

        let manager = Manager::new(bank.clone(), config.clone(), metrics.clone());
        let manager = tokio::spawn(manager.run(intake_rx, ready_tx));

        let pool = ExecutorPool::spawn(
            config.executors,
            bank.clone(),
            ready_rx,
            done_tx,
            metrics.clone(),
        );

        Ok(Self {
            bank,
            intake: Some(intake_tx),
            done: done_rx,
            manager: Some(manager),
            pool: Some(pool),
            metrics,
        })
    }

    /// Submit a transfer to the intake queue.
    ///
    /// Bounds-checks both endpoints against the bank first, so
    /// transfers reaching the manager and the locking primitives
    /// always reference existing accounts.
    pub async fn submit(&self, transfer: Transfer) -> Result<()> {
        self.bank.validate_transfer(&transfer)?;

        let intake = self
            .intake
            .as_ref()
            .ok_or(BankError::QueueClosed("intake"))?;
        intake
            .send(transfer)
            .await
            .map_err(|_| BankError::QueueClosed("intake"))
    }

    /// Close the intake queue. The manager drains what remains and then
    /// closes the ready queue, which in turn stops the pool.
    pub fn close_intake(&mut self) {
        self.intake = None;
    }

    /// Wait for the next completion signal. Returns `None` once all
    /// executors have exited.
    pub async fn next_completion(&mut self) -> Option<()> {
        self.done.recv().await
    }

    /// Current pipeline metrics.
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Wait for the manager and the pool to exit, propagating the first
    /// fatal error.
    pub async fn join(mut self) -> Result<()> {
        let manager = match self.manager.take() {
            Some(handle) => handle
                .await
                .map_err(|e| BankError::Internal(format!("manager task panicked: {e}")))?,
            None => Ok(()),
        };

        let pool = match self.pool.take() {
            Some(pool) => pool.join().await,
            None => Ok(()),
        };

        manager?;
        pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use banksim_common::{AccountId, LockOwner};
    use std::time::Duration;
    use tokio::time::timeout;

    fn test_config(executors: usize) -> EngineConfig {
        EngineConfig {
            executors,
            retry_backoff: Duration::from_millis(1),
            queue_capacity: 1024,
        }
    }

    fn transfer(from: usize, to: usize, amount: i64) -> Transfer {
        Transfer::new(AccountId::new(from), AccountId::new(to), amount).unwrap()
    }

    #[tokio::test]
    async fn test_invalid_config_rejected() {
        let bank = Arc::new(Bank::new(2, 1000));
        assert!(TransferPipeline::start(bank, test_config(0)).is_err());
    }

    #[tokio::test]
    async fn test_submit_rejects_unknown_account() {
        let bank = Arc::new(Bank::new(2, 1000));
        let mut pipeline = TransferPipeline::start(bank, test_config(1)).unwrap();

        let err = pipeline.submit(transfer(0, 5, 10)).await.unwrap_err();
        assert!(matches!(err, BankError::UnknownAccount { size: 2, .. }));

        pipeline.close_intake();
        pipeline.join().await.unwrap();
    }

    #[tokio::test]
    async fn test_conservation_and_accounting_under_load() {
        let bank = Arc::new(Bank::new(6, 1000));
        let start_sum = bank.sum();
        assert_eq!(start_sum, 6000);

        let mut pipeline = TransferPipeline::start(bank.clone(), test_config(6)).unwrap();

        let count = 1000;
        let mut expected = 0i64;
        for i in 0..count {
            let from = i % 6;
            let to = (from + 1 + (i % 5)) % 6;
            let amount = (i % 100 + 1) as i64;
            expected += amount;
            pipeline.submit(transfer(from, to, amount)).await.unwrap();
        }
        pipeline.close_intake();

        for _ in 0..count {
            timeout(Duration::from_secs(30), pipeline.next_completion())
                .await
                .unwrap()
                .unwrap();
        }

        let metrics = pipeline.metrics();
        pipeline.join().await.unwrap();

        assert_eq!(bank.sum(), start_sum);
        assert_eq!(bank.transferred(), expected);
        assert_eq!(metrics.admitted, count as u64);
        assert_eq!(metrics.executed, count as u64);

        // Every lock was handed back.
        let snapshot = bank.snapshot();
        assert!(snapshot.accounts.iter().all(|a| !a.locked));
        assert!(snapshot.in_progress.is_empty());
    }

    #[tokio::test]
    async fn test_opposing_transfers_both_apply_exactly_once() {
        let bank = Arc::new(Bank::new(2, 1000));
        let mut pipeline = TransferPipeline::start(bank.clone(), test_config(2)).unwrap();

        pipeline.submit(transfer(0, 1, 50)).await.unwrap();
        pipeline.submit(transfer(1, 0, 30)).await.unwrap();
        pipeline.close_intake();

        for _ in 0..2 {
            timeout(Duration::from_secs(5), pipeline.next_completion())
                .await
                .unwrap()
                .unwrap();
        }
        pipeline.join().await.unwrap();

        // Net effect regardless of execution order: A -= 20, B += 20.
        let snapshot = bank.snapshot();
        assert_eq!(snapshot.accounts[0].balance, 980);
        assert_eq!(snapshot.accounts[1].balance, 1020);
        assert_eq!(bank.transferred(), 80);
    }

    #[tokio::test]
    async fn test_transfer_waits_for_contested_account() {
        let bank = Arc::new(Bank::new(3, 1000));
        let mut pipeline = TransferPipeline::start(bank.clone(), test_config(2)).unwrap();

        // Simulate another in-flight transfer holding account 1.
        bank.lock_account(AccountId::new(1), LockOwner::Executor(9));

        pipeline.submit(transfer(0, 1, 25)).await.unwrap();
        pipeline.close_intake();

        // Must not execute while the lock is held.
        assert!(
            timeout(Duration::from_millis(100), pipeline.next_completion())
                .await
                .is_err()
        );
        assert_eq!(bank.snapshot().accounts[0].balance, 1000);
        assert_eq!(bank.transferred(), 0);

        // Releasing the lock lets it through.
        bank.unlock_account(AccountId::new(1), LockOwner::Executor(9))
            .unwrap();
        timeout(Duration::from_secs(5), pipeline.next_completion())
            .await
            .unwrap()
            .unwrap();
        pipeline.join().await.unwrap();

        let snapshot = bank.snapshot();
        assert_eq!(snapshot.accounts[0].balance, 975);
        assert_eq!(snapshot.accounts[1].balance, 1025);
    }

    #[tokio::test]
    async fn test_single_executor_is_still_correct() {
        let bank = Arc::new(Bank::new(4, 100));
        let mut pipeline = TransferPipeline::start(bank.clone(), test_config(1)).unwrap();

        for i in 0..20 {
            let from = i % 4;
            let to = (from + 1 + (i % 3)) % 4;
            pipeline.submit(transfer(from, to, 5)).await.unwrap();
        }
        pipeline.close_intake();

        for _ in 0..20 {
            timeout(Duration::from_secs(5), pipeline.next_completion())
                .await
                .unwrap()
                .unwrap();
        }
        pipeline.join().await.unwrap();

        assert_eq!(bank.sum(), 400);
        assert_eq!(bank.transferred(), 100);
    }
}
