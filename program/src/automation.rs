//! Scheduler harness standing in for the automation network.
use solana_program::{clock::UnixTimestamp, msg};

use crate::{error::RaffleError, events::RaffleEvent, oracle::RandomnessOracle, raffle::Raffle};

/// Polls a raffle on a fixed cadence and triggers the draw when it is due
#[derive(Clone, Copy, Debug)]
pub struct Keeper {
    cadence: u64,
    last_poll: Option<UnixTimestamp>,
}

impl Keeper {
    /// `cadence` is the minimum number of seconds between two polls
    pub fn new(cadence: u64) -> Self {
        Self {
            cadence,
            last_poll: None,
        }
    }

    fn is_due(&self, now: UnixTimestamp) -> bool {
        match self.last_poll {
            None => true,
            Some(last) => now
                .checked_sub(last)
                .map_or(false, |elapsed| elapsed >= 0 && elapsed as u64 >= self.cadence),
        }
    }

    /// Run one scheduler tick.
    ///
    /// Returns the `DrawRequested` event when a draw was triggered, `None` when
    /// the tick was skipped or upkeep was not needed.
    pub fn tick<O: RandomnessOracle>(
        &mut self,
        raffle: &mut Raffle,
        oracle: &mut O,
        now: UnixTimestamp,
    ) -> Result<Option<RaffleEvent>, RaffleError> {
        if !self.is_due(now) {
            return Ok(None);
        }
        self.last_poll = Some(now);

        let (needed, diagnostics) = raffle.check_upkeep(now);
        if !needed {
            msg!("Keeper tick at {}: upkeep not needed ({})", now, diagnostics);
            return Ok(None);
        }
        raffle.perform_upkeep(now, oracle).map(Some)
    }
}
