//! Error types for banksim operations.

use crate::{AccountId, LockOwner, TransferId};
use thiserror::Error;

/// Main error type for banksim operations.
#[derive(Error, Debug)]
pub enum BankError {
    /// An executor received a transfer whose account was not locked.
    /// This signals a broken lock handoff and is never tolerated.
    #[error("account {account} not locked while handling transfer {transfer_id}")]
    AccountNotLocked {
        transfer_id: TransferId,
        account: AccountId,
    },

    /// An account was unlocked while no lock was held.
    #[error("account {account} unlocked by {owner} while not locked")]
    UnlockNotHeld {
        account: AccountId,
        owner: LockOwner,
    },

    /// A transfer names the same account as source and destination.
    #[error("transfer source and destination are the same account ({0})")]
    SelfTransfer(AccountId),

    /// A transfer amount must be strictly positive.
    #[error("transfer amount must be positive, got {0}")]
    NonPositiveAmount(i64),

    /// A transfer references an account index outside the bank.
    #[error("unknown account {account} (bank holds {size} accounts)")]
    UnknownAccount { account: AccountId, size: usize },

    /// End-of-run balance sum does not match the starting sum.
    #[error("balance sum mismatch: expected {expected}, got {actual}")]
    BalanceMismatch { expected: i64, actual: i64 },

    /// End-of-run transferred total does not match the submitted total.
    #[error("transferred total mismatch: expected {expected}, got {actual}")]
    TransferredMismatch { expected: i64, actual: i64 },

    /// Transfers were submitted but never executed.
    #[error("{remaining} transfers were never executed")]
    UnprocessedTransfers { remaining: usize },

    /// A channel endpoint was dropped while still needed.
    #[error("{0} queue closed unexpectedly")]
    QueueClosed(&'static str),

    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Internal error (task panic or wiring defect).
    #[error("internal error: {0}")]
    Internal(String),
}

impl BankError {
    /// Check if this error is a lock-protocol violation.
    ///
    /// Protocol violations indicate a logic defect in the lock handoff,
    /// not an operational fault, and terminate the run.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            BankError::AccountNotLocked { .. } | BankError::UnlockNotHeld { .. }
        )
    }

    /// Check if this error is an end-of-run invariant violation.
    pub fn is_invariant_violation(&self) -> bool {
        matches!(
            self,
            BankError::BalanceMismatch { .. }
                | BankError::TransferredMismatch { .. }
                | BankError::UnprocessedTransfers { .. }
        )
    }
}

/// Result type alias for banksim operations.
pub type Result<T> = std::result::Result<T, BankError>;
