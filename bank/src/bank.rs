//! The bank: fixed account collection, per-account locking, invariants.

use std::sync::atomic::{AtomicI64, Ordering};

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::debug;

use banksim_common::{AccountId, BankError, LockOwner, Result, Transfer, TransferId};

use crate::account::Account;

/// A transfer currently being executed, for observability only.
#[derive(Debug, Clone)]
pub struct InProgress {
    /// The transfer being executed.
    pub transfer: Transfer,
    /// The executor working on it.
    pub executor: usize,
}

/// Read-only view of a single account for visualization.
#[derive(Debug, Clone)]
pub struct AccountView {
    pub name: String,
    pub balance: i64,
    pub locked: bool,
    pub lock_owner: Option<LockOwner>,
}

/// Read-only view of the whole bank for visualization.
#[derive(Debug, Clone)]
pub struct BankSnapshot {
    pub accounts: Vec<AccountView>,
    pub in_progress: Vec<InProgress>,
}

/// The bank owns the fixed-size account collection.
///
/// Each account is guarded by its own mutex, so the lock flag and the
/// balance of distinct accounts never contend on a shared lock. The
/// manager and the executors go through the same per-account mutex,
/// which keeps the flag itself race-free; the flag is what carries the
/// semantic transfer lock between them.
///
/// Account ids index the fixed collection directly. Transfers are
/// bounds-checked when they enter the pipeline
/// ([`Bank::validate_transfer`]), so the locking primitives and
/// `account_name` treat an out-of-range id as a caller bug and index
/// unconditionally.
#[derive(Debug)]
pub struct Bank {
    /// Account records, created once and never resized.
    accounts: Vec<Mutex<Account>>,
    /// Transfers currently being executed (observability only).
    in_progress: DashMap<TransferId, InProgress>,
    /// Total amount moved by executed transfers.
    transferred: AtomicI64,
}

impl Bank {
    /// Create a bank with `count` accounts, each starting at
    /// `starting_balance`. Accounts are named A, B, C, ... with a
    /// numbered fallback past Z.
    pub fn new(count: usize, starting_balance: i64) -> Self {
        let accounts = (0..count)
            .map(|i| {
                let name = if i < 26 {
                    ((b'A' + i as u8) as char).to_string()
                } else {
                    format!("ACC_{}", i)
                };
                Mutex::new(Account::new(name, starting_balance))
            })
            .collect();

        Self {
            accounts,
            in_progress: DashMap::new(),
            transferred: AtomicI64::new(0),
        }
    }

    /// Number of accounts.
    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    /// Whether the bank holds no accounts.
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Name of an account.
    pub fn account_name(&self, id: AccountId) -> String {
        self.accounts[id.index()].lock().name.clone()
    }

    /// Check that both endpoints of a transfer exist in this bank.
    ///
    /// The bounds gate for account ids: the pipeline calls this on
    /// every submitted transfer before it can reach the locking
    /// primitives.
    pub fn validate_transfer(&self, transfer: &Transfer) -> Result<()> {
        for account in [transfer.from, transfer.to] {
            if account.index() >= self.accounts.len() {
                return Err(BankError::UnknownAccount {
                    account,
                    size: self.accounts.len(),
                });
            }
        }
        Ok(())
    }

    /// Non-blocking read of an account's lock state.
    pub fn is_account_locked(&self, id: AccountId) -> bool {
        self.accounts[id.index()].lock().is_locked()
    }

    /// Unconditionally mark an account locked and record the owner.
    ///
    /// The caller must have verified the account was unlocked, or be
    /// prepared to re-verify afterwards; with a single admission
    /// manager the check-then-lock window is benign because the
    /// manager re-checks the second account after acquiring the first.
    pub fn lock_account(&self, id: AccountId, owner: LockOwner) {
        let mut account = self.accounts[id.index()].lock();
        account.lock(owner);
        debug!(account = %account.name, owner = %owner, "account locked");
    }

    /// Clear an account's lock state.
    ///
    /// Must only be called by the current holder of the semantic lock;
    /// unlocking an account that is not locked is a protocol violation.
    pub fn unlock_account(&self, id: AccountId, owner: LockOwner) -> Result<()> {
        let mut account = self.accounts[id.index()].lock();
        if !account.is_locked() {
            return Err(BankError::UnlockNotHeld { account: id, owner });
        }
        account.unlock();
        debug!(account = %account.name, owner = %owner, "account unlocked");
        Ok(())
    }

    /// Apply a transfer: debit `from`, credit `to`, accumulate the
    /// transferred total.
    ///
    /// The caller must hold the semantic lock on both accounts, so the
    /// two mutations need not be atomic with respect to each other.
    pub fn apply_transfer(&self, transfer: &Transfer) -> Result<()> {
        self.validate_transfer(transfer)?;

        self.accounts[transfer.from.index()].lock().balance -= transfer.amount;
        self.accounts[transfer.to.index()].lock().balance += transfer.amount;
        self.transferred.fetch_add(transfer.amount, Ordering::Relaxed);

        debug!(
            transfer_id = %transfer.id,
            from = %transfer.from,
            to = %transfer.to,
            amount = transfer.amount,
            "transfer applied"
        );
        Ok(())
    }

    /// Sum of all account balances.
    ///
    /// Constant across the run regardless of interleaving: every
    /// transfer subtracts from one account and adds to another.
    pub fn sum(&self) -> i64 {
        self.accounts.iter().map(|a| a.lock().balance).sum()
    }

    /// Total amount moved by executed transfers.
    pub fn transferred(&self) -> i64 {
        self.transferred.load(Ordering::Relaxed)
    }

    /// Record a transfer as being executed (observability only).
    pub fn begin_in_progress(&self, executor: usize, transfer: &Transfer) {
        self.in_progress.insert(
            transfer.id,
            InProgress {
                transfer: *transfer,
                executor,
            },
        );
    }

    /// Remove a transfer from the in-progress set.
    pub fn finish_in_progress(&self, id: TransferId) {
        self.in_progress.remove(&id);
    }

    /// Read-only snapshot of account and in-progress state.
    ///
    /// For visualization only; must not be used for correctness
    /// decisions since the state can change as soon as it is read.
    pub fn snapshot(&self) -> BankSnapshot {
        let accounts = self
            .accounts
            .iter()
            .map(|a| {
                let account = a.lock();
                AccountView {
                    name: account.name.clone(),
                    balance: account.balance,
                    locked: account.is_locked(),
                    lock_owner: account.lock_owner(),
                }
            })
            .collect();

        let in_progress = self.in_progress.iter().map(|e| e.value().clone()).collect();

        BankSnapshot {
            accounts,
            in_progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn transfer(from: usize, to: usize, amount: i64) -> Transfer {
        Transfer::new(AccountId::new(from), AccountId::new(to), amount).unwrap()
    }

    #[test]
    fn test_account_naming() {
        let bank = Bank::new(30, 1000);
        assert_eq!(bank.account_name(AccountId::new(0)), "A");
        assert_eq!(bank.account_name(AccountId::new(25)), "Z");
        assert_eq!(bank.account_name(AccountId::new(26)), "ACC_26");
    }

    #[test]
    fn test_lock_state_roundtrip() {
        let bank = Bank::new(2, 1000);
        let id = AccountId::new(0);

        assert!(!bank.is_account_locked(id));
        bank.lock_account(id, LockOwner::Manager);
        assert!(bank.is_account_locked(id));
        bank.unlock_account(id, LockOwner::Executor(0)).unwrap();
        assert!(!bank.is_account_locked(id));
    }

    #[test]
    fn test_unlock_without_lock_is_protocol_violation() {
        let bank = Bank::new(2, 1000);
        let err = bank
            .unlock_account(AccountId::new(1), LockOwner::Manager)
            .unwrap_err();
        assert!(err.is_protocol_violation());
    }

    #[test]
    fn test_apply_transfer_moves_balance() {
        let bank = Bank::new(2, 1000);
        let t = transfer(0, 1, 250);

        bank.apply_transfer(&t).unwrap();

        let snapshot = bank.snapshot();
        assert_eq!(snapshot.accounts[0].balance, 750);
        assert_eq!(snapshot.accounts[1].balance, 1250);
        assert_eq!(bank.transferred(), 250);
        assert_eq!(bank.sum(), 2000);
    }

    #[test]
    fn test_balances_may_go_negative() {
        let bank = Bank::new(2, 10);
        bank.apply_transfer(&transfer(0, 1, 100)).unwrap();

        assert_eq!(bank.snapshot().accounts[0].balance, -90);
        assert_eq!(bank.sum(), 20);
    }

    #[test]
    fn test_validate_transfer_unknown_account() {
        let bank = Bank::new(2, 1000);
        let t = transfer(0, 5, 10);
        let err = bank.validate_transfer(&t).unwrap_err();
        assert!(matches!(err, BankError::UnknownAccount { size: 2, .. }));
    }

    #[test]
    fn test_in_progress_set() {
        let bank = Bank::new(2, 1000);
        let t = transfer(0, 1, 10);

        bank.begin_in_progress(3, &t);
        let snapshot = bank.snapshot();
        assert_eq!(snapshot.in_progress.len(), 1);
        assert_eq!(snapshot.in_progress[0].executor, 3);

        bank.finish_in_progress(t.id);
        assert!(bank.snapshot().in_progress.is_empty());
    }

    #[test]
    fn test_snapshot_reflects_lock_owner() {
        let bank = Bank::new(2, 1000);
        bank.lock_account(AccountId::new(1), LockOwner::Executor(4));

        let snapshot = bank.snapshot();
        assert!(snapshot.accounts[1].locked);
        assert_eq!(snapshot.accounts[1].lock_owner, Some(LockOwner::Executor(4)));
        assert!(!snapshot.accounts[0].locked);
    }

    proptest! {
        /// Conservation: any sequence of transfers leaves the total
        /// balance unchanged and accounts for every moved unit.
        #[test]
        fn prop_sum_conserved(
            moves in prop::collection::vec((0usize..6, 0usize..6, 1i64..1000), 0..200)
        ) {
            let bank = Bank::new(6, 1000);
            let start_sum = bank.sum();
            let mut expected = 0i64;

            for (from, to, amount) in moves {
                if from == to {
                    continue;
                }
                let t = transfer(from, to, amount);
                bank.apply_transfer(&t).unwrap();
                expected += amount;
            }

            prop_assert_eq!(bank.sum(), start_sum);
            prop_assert_eq!(bank.transferred(), expected);
        }
    }
}
