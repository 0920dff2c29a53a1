use borsh::{BorshDeserialize, BorshSerialize};

use crate::error::RaffleError;

/// Pooled lamports for the current round
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FundsLedger {
    balance: u64,
}

impl FundsLedger {
    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// Credit an entry payment
    pub fn credit(&mut self, amount: u64) -> Result<u64, RaffleError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(RaffleError::AmountOverflow)?;
        Ok(self.balance)
    }

    /// Empty the pool, returning what it held
    pub fn drain(&mut self) -> u64 {
        std::mem::take(&mut self.balance)
    }
}
