//! The transfer type.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{AccountId, BankError, Result, TransferId};

/// A requested transfer of a fixed amount between two accounts.
///
/// Immutable once created; `from` and `to` are always distinct and the
/// amount is always positive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Unique transfer ID (diagnostics only).
    pub id: TransferId,
    /// Source account.
    pub from: AccountId,
    /// Destination account.
    pub to: AccountId,
    /// Amount to move from source to destination.
    pub amount: i64,
}

impl Transfer {
    /// Create a new transfer.
    ///
    /// Rejects self-transfers and non-positive amounts.
    pub fn new(from: AccountId, to: AccountId, amount: i64) -> Result<Self> {
        if from == to {
            return Err(BankError::SelfTransfer(from));
        }
        if amount <= 0 {
            return Err(BankError::NonPositiveAmount(amount));
        }
        Ok(Self {
            id: TransferId::new(),
            from,
            to,
            amount,
        })
    }
}

impl fmt::Display for Transfer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {} ({})", self.from, self.to, self.amount)
    }
}
