//! End-of-run report.

use std::time::Duration;

use banksim_engine::MetricsSnapshot;

/// Summary of a completed simulation run.
#[derive(Debug, Clone)]
pub struct SimulationReport {
    /// Transfers submitted and executed.
    pub transfers: usize,
    /// Total balance before the run.
    pub start_sum: i64,
    /// Total balance after the run.
    pub final_sum: i64,
    /// Sum of all submitted amounts.
    pub expected_transferred: i64,
    /// Amount the bank reports as transferred.
    pub transferred: i64,
    /// Wall-clock duration of the run.
    pub elapsed: Duration,
    /// Pipeline counters.
    pub metrics: MetricsSnapshot,
}

impl SimulationReport {
    /// Whether both end-of-run invariants hold.
    pub fn invariants_hold(&self) -> bool {
        self.final_sum == self.start_sum && self.transferred == self.expected_transferred
    }

    /// Throughput in transfers per second.
    pub fn throughput(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs == 0.0 {
            return 0.0;
        }
        self.transfers as f64 / secs
    }

    /// Human-readable one-paragraph summary.
    pub fn summary(&self) -> String {
        format!(
            "{} transfers in {:?} ({:.0}/s); sum {} -> {}; transferred {} (expected {}); \
             {} conflicts, {} backoffs",
            self.transfers,
            self.elapsed,
            self.throughput(),
            self.start_sum,
            self.final_sum,
            self.transferred,
            self.expected_transferred,
            self.metrics.conflicts,
            self.metrics.backoffs,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> SimulationReport {
        SimulationReport {
            transfers: 1000,
            start_sum: 6000,
            final_sum: 6000,
            expected_transferred: 50500,
            transferred: 50500,
            elapsed: Duration::from_secs(2),
            metrics: MetricsSnapshot {
                admitted: 1000,
                conflicts: 3,
                backoffs: 40,
                executed: 1000,
            },
        }
    }

    #[test]
    fn test_invariants_hold() {
        assert!(report().invariants_hold());

        let mut bad = report();
        bad.final_sum = 5999;
        assert!(!bad.invariants_hold());

        let mut bad = report();
        bad.transferred = 0;
        assert!(!bad.invariants_hold());
    }

    #[test]
    fn test_summary_mentions_counts() {
        let summary = report().summary();
        assert!(summary.contains("1000 transfers"));
        assert!(summary.contains("50500"));
    }
}
