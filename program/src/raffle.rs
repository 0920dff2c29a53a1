//! The raffle state machine.
//!
//! ```text
//! OPEN    --perform_upkeep-->            DRAWING
//! DRAWING --fulfill_randomness (ok)-->   OPEN     payout + reset
//! DRAWING --fulfill_randomness (err)-->  DRAWING  unchanged
//! ```
//!
//! Every operation either applies all of its effects or none of them.
use solana_program::{clock::UnixTimestamp, msg, pubkey::Pubkey};

use crate::{
    error::RaffleError,
    events::RaffleEvent,
    oracle::{DrawRequest, RandomnessOracle},
    payout::Payout,
    request::RequestId,
    state::{Config, OverpaymentPolicy, RaffleState, Round},
    upkeep::{self, UpkeepDiagnostics},
};

/// A raffle: its fixed configuration plus the round being played
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Raffle {
    config: Config,
    round: Round,
}

impl Raffle {
    /// Start a raffle with an empty, open round
    pub fn new(config: Config, started_at: UnixTimestamp) -> Result<Self, RaffleError> {
        config.validate()?;
        Ok(Self {
            config,
            round: Round::new(started_at),
        })
    }

    /// Reassemble a raffle from persisted accounts
    pub fn from_parts(config: Config, round: Round) -> Self {
        Self { config, round }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn round(&self) -> &Round {
        &self.round
    }

    /// Admit one entry for `participant`.
    ///
    /// Under [`OverpaymentPolicy::Retain`] the whole payment is pooled; under
    /// `Refund` only the fee is taken and the excess never leaves the player.
    pub fn enter(&mut self, participant: Pubkey, amount_paid: u64) -> Result<RaffleEvent, RaffleError> {
        if self.round.state != RaffleState::Open {
            msg!("Entry rejected: raffle is drawing");
            return Err(RaffleError::NotOpen);
        }
        if amount_paid < self.config.entrance_fee {
            msg!(
                "Entry rejected: paid {} lamports, fee is {}",
                amount_paid,
                self.config.entrance_fee
            );
            return Err(RaffleError::InsufficientFee);
        }

        let (credited, uncollected) = match self.config.overpayment {
            OverpaymentPolicy::Retain => (amount_paid, 0),
            OverpaymentPolicy::Refund => (
                self.config.entrance_fee,
                amount_paid - self.config.entrance_fee,
            ),
        };

        let mut ledger = self.round.ledger;
        let balance = ledger.credit(credited)?;
        self.round
            .registry
            .push(participant, self.config.max_players as usize)?;
        self.round.ledger = ledger;

        Ok(RaffleEvent::EntryRecorded {
            participant,
            credited,
            uncollected,
            balance,
        })
    }

    /// Whether a draw may be triggered at `now`, and why not if it may not
    pub fn check_upkeep(&self, now: UnixTimestamp) -> (bool, UpkeepDiagnostics) {
        upkeep::check_upkeep(
            self.round.state,
            self.round.last_timestamp,
            self.config.interval,
            self.round.registry.len(),
            self.round.ledger.balance(),
            now,
        )
    }

    /// Close entries and request randomness.
    ///
    /// Eligibility is re-evaluated here rather than trusted from the caller.
    /// The oracle is asked first, so a failed request leaves the round open.
    pub fn perform_upkeep<O: RandomnessOracle>(
        &mut self,
        now: UnixTimestamp,
        oracle: &mut O,
    ) -> Result<RaffleEvent, RaffleError> {
        let (needed, diagnostics) = self.check_upkeep(now);
        if !needed {
            msg!("Upkeep not needed: {}", diagnostics);
            return Err(RaffleError::UpkeepNotNeeded(diagnostics));
        }
        let round = self.round.round;
        let request_id = oracle.request_random_words(&DrawRequest::for_round(&self.config, round))?;
        self.round.requests.begin(request_id, round, now)?;
        self.round.state = RaffleState::Drawing;

        msg!(
            "Draw requested for round {} with {} players, request {}",
            round,
            self.round.registry.len(),
            request_id
        );
        Ok(RaffleEvent::DrawRequested { request_id, round })
    }

    /// Complete the round with the oracle's `random_value`.
    ///
    /// The round is reset before the payout is issued. If the payout fails the
    /// reset is undone and the request stays pending, so delivery can be retried.
    pub fn fulfill_randomness<P: Payout>(
        &mut self,
        request_id: RequestId,
        random_value: u64,
        now: UnixTimestamp,
        payout: &mut P,
    ) -> Result<RaffleEvent, RaffleError> {
        let matches_pending = self
            .round
            .requests
            .pending()
            .map_or(false, |pending| pending.request_id == request_id);
        if self.round.state != RaffleState::Drawing || !matches_pending {
            msg!("Fulfillment for unknown request {}", request_id);
            return Err(RaffleError::UnknownRequest);
        }
        let winner_index = self
            .round
            .registry
            .winner_index(random_value)
            .ok_or(RaffleError::UnknownRequest)?;
        let winner = self.round.registry.get(winner_index)?;
        let next_round = self
            .round
            .round
            .checked_add(1)
            .ok_or(RaffleError::AmountOverflow)?;

        let snapshot = self.round.clone();

        let pending = self.round.requests.consume(request_id)?;
        let prize = self.round.ledger.drain();
        self.round.registry.clear();
        self.round.recent_winner = Some(winner);
        self.round.last_timestamp = now;
        self.round.round = next_round;
        self.round.state = RaffleState::Open;

        if let Err(err) = payout.transfer(&winner, prize) {
            msg!("Payout of {} lamports to {} failed: {}", prize, winner, err);
            self.round = snapshot;
            return Err(RaffleError::PayoutFailed);
        }

        msg!(
            "Round {} won by {} (slot {}), prize {} lamports, drawn {}s after request",
            pending.round,
            winner,
            winner_index,
            prize,
            now.saturating_sub(pending.requested_at)
        );
        Ok(RaffleEvent::WinnerPicked {
            winner,
            prize,
            round: pending.round,
        })
    }

    pub fn entrance_fee(&self) -> u64 {
        self.config.entrance_fee
    }

    pub fn interval(&self) -> u64 {
        self.config.interval
    }

    pub fn number_of_players(&self) -> usize {
        self.round.registry.len()
    }

    pub fn player(&self, index: usize) -> Result<Pubkey, RaffleError> {
        self.round.registry.get(index)
    }

    pub fn recent_winner(&self) -> Option<Pubkey> {
        self.round.recent_winner
    }

    pub fn raffle_state(&self) -> RaffleState {
        self.round.state
    }

    pub fn latest_timestamp(&self) -> UnixTimestamp {
        self.round.last_timestamp
    }

    pub fn balance(&self) -> u64 {
        self.round.ledger.balance()
    }

    pub fn pending_request(&self) -> Option<RequestId> {
        self.round.requests.pending().map(|pending| pending.request_id)
    }

    /// Sequence number of the round currently being played
    pub fn current_round(&self) -> u64 {
        self.round.round
    }
}
