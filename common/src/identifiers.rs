//! Identifier types for banksim entities.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Index of an account within a bank's fixed account collection.
///
/// Accounts are created once at bank initialization and never resized,
/// so an index is a stable identifier for the lifetime of the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccountId(usize);

impl AccountId {
    /// Create an account ID from an index.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the underlying index.
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<usize> for AccountId {
    fn from(index: usize) -> Self {
        Self(index)
    }
}

/// Unique identifier for a transfer.
/// Uses UUID v7 for time-ordered identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransferId(Uuid);

impl TransferId {
    /// Create a new transfer ID.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TransferId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TransferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of the actor holding an account lock.
///
/// Recorded for diagnostics and visualization only; correctness never
/// depends on the owner value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LockOwner {
    /// The single admission manager.
    Manager,
    /// An executor worker, identified by its pool index.
    Executor(usize),
}

impl fmt::Display for LockOwner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockOwner::Manager => write!(f, "manager"),
            LockOwner::Executor(id) => write!(f, "executor-{}", id),
        }
    }
}
