//! banksim Bank
//!
//! The bank owns the fixed account collection and exposes the locking
//! primitives, the balance-mutation primitive, and the global invariant
//! queries used to validate a run.

pub mod account;
pub mod bank;

pub use account::Account;
pub use bank::{AccountView, Bank, BankSnapshot, InProgress};
