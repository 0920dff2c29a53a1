//! Eligibility predicate for triggering a draw.

use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::clock::UnixTimestamp;
use std::fmt;

use crate::state::RaffleState;

/// Why upkeep is or is not needed. Each flag is one clause of the predicate.
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpkeepDiagnostics {
    pub is_open: bool,
    pub time_passed: bool,
    pub has_players: bool,
    pub has_balance: bool,
}

impl UpkeepDiagnostics {
    pub fn upkeep_needed(&self) -> bool {
        self.is_open && self.time_passed && self.has_players && self.has_balance
    }
}

impl fmt::Display for UpkeepDiagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "open={} time_passed={} players={} balance={}",
            self.is_open, self.time_passed, self.has_players, self.has_balance
        )
    }
}

/// Evaluate the draw predicate. Pure: safe to poll at any frequency.
///
/// A clock that reads earlier than `last_timestamp` never counts as elapsed.
pub fn check_upkeep(
    state: RaffleState,
    last_timestamp: UnixTimestamp,
    interval: u64,
    player_count: usize,
    balance: u64,
    now: UnixTimestamp,
) -> (bool, UpkeepDiagnostics) {
    let elapsed = now.checked_sub(last_timestamp).unwrap_or(-1);
    let diagnostics = UpkeepDiagnostics {
        is_open: state == RaffleState::Open,
        time_passed: elapsed >= 0 && elapsed as u64 >= interval,
        has_players: player_count > 0,
        has_balance: balance > 0,
    };
    (diagnostics.upkeep_needed(), diagnostics)
}
