//! Account definitions.

use banksim_common::LockOwner;
use serde::{Deserialize, Serialize};

/// A bank account.
///
/// The lock flag is the semantic "transfer lock" on the account; the
/// owner tag records who holds it, for diagnostics only. Both fields
/// and the balance may only be touched while the account's exclusion
/// mutex is held (see [`crate::Bank`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Stable account name.
    pub name: String,
    /// Current balance. Transfers are unconditional, so balances may
    /// go negative; that is accepted behavior, not a defect.
    pub balance: i64,
    /// Whether the account is locked for an in-flight transfer.
    locked: bool,
    /// Who holds the lock, if anyone.
    lock_owner: Option<LockOwner>,
}

impl Account {
    /// Create a new account with a starting balance.
    pub fn new(name: impl Into<String>, balance: i64) -> Self {
        Self {
            name: name.into(),
            balance,
            locked: false,
            lock_owner: None,
        }
    }

    /// Check if the account is locked.
    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Mark the account locked, recording the owner.
    pub fn lock(&mut self, owner: LockOwner) {
        self.locked = true;
        self.lock_owner = Some(owner);
    }

    /// Clear the lock state.
    pub fn unlock(&mut self) {
        self.locked = false;
        self.lock_owner = None;
    }

    /// Who currently holds the lock.
    pub fn lock_owner(&self) -> Option<LockOwner> {
        self.lock_owner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lock_unlock() {
        let mut account = Account::new("A", 1000);
        assert!(!account.is_locked());

        account.lock(LockOwner::Manager);
        assert!(account.is_locked());
        assert_eq!(account.lock_owner(), Some(LockOwner::Manager));

        account.unlock();
        assert!(!account.is_locked());
        assert_eq!(account.lock_owner(), None);
    }
}
