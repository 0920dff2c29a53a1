use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::pubkey::Pubkey;

use crate::error::RaffleError;

/// Entries of the current round, in admission order.
///
/// A participant appears once per entry, so repeat entrants are weighted by
/// the number of slots they hold.
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryRegistry {
    players: Vec<Pubkey>,
}

impl EntryRegistry {
    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn push(&mut self, participant: Pubkey, capacity: usize) -> Result<(), RaffleError> {
        if self.players.len() >= capacity {
            return Err(RaffleError::RaffleFull);
        }
        self.players.push(participant);
        Ok(())
    }

    pub fn get(&self, index: usize) -> Result<Pubkey, RaffleError> {
        self.players
            .get(index)
            .copied()
            .ok_or(RaffleError::IndexOutOfRange)
    }

    /// Slot picked by `random_value mod len`
    pub fn winner_index(&self, random_value: u64) -> Option<usize> {
        if self.players.is_empty() {
            return None;
        }
        Some((random_value % self.players.len() as u64) as usize)
    }

    pub fn clear(&mut self) {
        self.players.clear();
    }
}
