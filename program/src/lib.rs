// Recurring raffle with a two-phase randomness draw
//
// Players enter a round by paying the entrance fee. Once the interval has
// passed, anyone may close the round and request randomness; the oracle's
// fulfillment picks a winner, pays out the whole pool and reopens the round.

// Round state machine
pub mod ledger;
pub mod registry;
pub mod request;
pub mod upkeep;
pub mod raffle;

// Collaborator seams
pub mod automation;
pub mod oracle;
pub mod payout;

// Program
pub mod error;
pub mod events;
pub mod instruction;
pub mod processor;
pub mod state;

#[cfg(not(feature = "no-entrypoint"))]
pub mod entrypoint;

use solana_program::{account_info::AccountInfo, entrypoint::ProgramResult, pubkey::Pubkey};

pub fn process_instruction(
    program_id: &Pubkey,
    accounts: &[AccountInfo],
    instruction_data: &[u8],
) -> ProgramResult {
    processor::Processor::process_instruction(program_id, accounts, instruction_data)
}
