//! banksim Common Types
//!
//! This crate contains shared types used across the banksim workspace,
//! including identifiers, the transfer type, and the error taxonomy.

pub mod identifiers;
pub mod transfer;
pub mod error;

pub use identifiers::*;
pub use transfer::*;
pub use error::*;
