//! Random transfer generation.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use banksim_bank::Bank;
use banksim_common::{AccountId, BankError, Result, Transfer};

/// Generates random transfers between existing accounts.
#[derive(Debug)]
pub struct Generator {
    rng: StdRng,
}

impl Generator {
    /// Create a generator, seeded for reproducibility if a seed is
    /// given.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }

    /// Produce a transfer between two distinct accounts of `bank` with
    /// a positive amount.
    ///
    /// Distinct endpoints need at least two accounts; smaller banks
    /// are rejected rather than looping on the re-roll.
    pub fn next_transfer(&mut self, bank: &Bank) -> Result<Transfer> {
        if bank.len() < 2 {
            return Err(BankError::ConfigError(format!(
                "transfer generation needs at least 2 accounts, bank has {}",
                bank.len()
            )));
        }

        let from = self.rng.gen_range(0..bank.len());
        let mut to = self.rng.gen_range(0..bank.len());
        while to == from {
            to = self.rng.gen_range(0..bank.len());
        }
        let amount = self.rng.gen_range(1..=100);

        Transfer::new(AccountId::new(from), AccountId::new(to), amount)
    }
}
