//! Metrics collection for pipeline monitoring.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Pipeline metrics.
pub struct EngineMetrics {
    /// Transfers admitted to the ready queue with both locks held.
    pub admitted: AtomicU64,
    /// Acquire-then-rollback conflicts (second account found locked
    /// after the first was acquired).
    pub conflicts: AtomicU64,
    /// Backoff sleeps taken because an account was already locked.
    pub backoffs: AtomicU64,
    /// Transfers executed by the pool.
    pub executed: AtomicU64,
}

impl EngineMetrics {
    /// Create new metrics instance.
    pub fn new() -> Self {
        Self {
            admitted: AtomicU64::new(0),
            conflicts: AtomicU64::new(0),
            backoffs: AtomicU64::new(0),
            executed: AtomicU64::new(0),
        }
    }

    /// Record a transfer admitted with both locks held.
    pub fn record_admission(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an acquire-then-rollback conflict.
    pub fn record_conflict(&self) {
        self.conflicts.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a backoff sleep.
    pub fn record_backoff(&self) {
        self.backoffs.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an executed transfer.
    pub fn record_execution(&self) {
        self.executed.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            admitted: self.admitted.load(Ordering::Relaxed),
            conflicts: self.conflicts.load(Ordering::Relaxed),
            backoffs: self.backoffs.load(Ordering::Relaxed),
            executed: self.executed.load(Ordering::Relaxed),
        }
    }
}

impl Default for EngineMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub admitted: u64,
    pub conflicts: u64,
    pub backoffs: u64,
    pub executed: u64,
}

/// Shared metrics instance.
pub type SharedMetrics = Arc<EngineMetrics>;
