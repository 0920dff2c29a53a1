// Notifications for off-chain observers
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{log::sol_log_data, msg, pubkey::Pubkey};

use crate::request::RequestId;

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub enum RaffleEvent {
    /// An entry was admitted
    EntryRecorded {
        participant: Pubkey,
        /// Lamports credited to the pool for this entry
        credited: u64,
        /// Lamports above the fee left with the player under the refund policy
        uncollected: u64,
        /// Pool balance after the entry
        balance: u64,
    },
    /// Entries closed and randomness requested
    DrawRequested { request_id: RequestId, round: u64 },
    /// Round completed and paid out
    WinnerPicked {
        winner: Pubkey,
        prize: u64,
        round: u64,
    },
}

impl RaffleEvent {
    /// Write the event to the program log, readable and borsh-encoded
    pub fn emit(&self) {
        msg!("{:?}", self);
        if let Ok(data) = self.try_to_vec() {
            sol_log_data(&[&data]);
        }
    }
}
