//! Randomness oracle seam.
//!
//! A draw is a two-phase handshake: [`RandomnessOracle::request_random_words`]
//! returns a request id immediately, and the oracle later delivers a random
//! value for that id through `Raffle::fulfill_randomness`.
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{clock::UnixTimestamp, msg, pubkey::Pubkey};
use std::collections::BTreeMap;

use crate::{
    error::RaffleError,
    events::RaffleEvent,
    payout::Payout,
    raffle::Raffle,
    request::RequestId,
    state::Config,
};

/// Parameters of a draw request, taken from the raffle config
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq, Eq)]
pub struct DrawRequest {
    /// Round the randomness is for
    pub round: u64,
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub request_confirmations: u16,
    pub callback_gas_limit: u32,
    pub num_words: u32,
}

impl DrawRequest {
    pub fn for_round(config: &Config, round: u64) -> Self {
        Self {
            round,
            key_hash: config.key_hash,
            subscription_id: config.subscription_id,
            request_confirmations: config.request_confirmations,
            callback_gas_limit: config.callback_gas_limit,
            num_words: config.num_words,
        }
    }
}

pub trait RandomnessOracle {
    /// Submit a request; the returned id correlates the later fulfillment.
    fn request_random_words(&mut self, request: &DrawRequest) -> Result<RequestId, RaffleError>;
}

/// Oracle adapter used by the on-chain program.
///
/// Exactly one request is made per round, so the round number is a request
/// id that stays unique for the lifetime of the raffle. The request itself
/// is published in the program log for the off-chain oracle to pick up.
pub struct ProgramOracle<'a> {
    pub raffle: &'a Pubkey,
    pub oracle_authority: &'a Pubkey,
}

impl<'a> RandomnessOracle for ProgramOracle<'a> {
    fn request_random_words(&mut self, request: &DrawRequest) -> Result<RequestId, RaffleError> {
        if *self.oracle_authority == Pubkey::default() {
            msg!("No oracle authority configured for raffle {}", self.raffle);
            return Err(RaffleError::OracleUnavailable);
        }
        msg!(
            "Randomness requested: raffle={} round={} words={} confirmations={} oracle={}",
            self.raffle,
            request.round,
            request.num_words,
            request.request_confirmations,
            self.oracle_authority
        );
        Ok(request.round)
    }
}

/// In-process coordinator for local runs and tests.
///
/// Issues ids from 1 upward, refuses to deliver for ids it never issued and
/// forgets a request only once it has been fulfilled successfully.
#[derive(Debug)]
pub struct MockCoordinator {
    next_request_id: RequestId,
    requests: BTreeMap<RequestId, DrawRequest>,
    available: bool,
}

impl Default for MockCoordinator {
    fn default() -> Self {
        Self {
            next_request_id: 1,
            requests: BTreeMap::new(),
            available: true,
        }
    }
}

impl MockCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent requests fail, as an unreachable oracle would
    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    pub fn is_pending(&self, request_id: RequestId) -> bool {
        self.requests.contains_key(&request_id)
    }

    pub fn pending_requests(&self) -> usize {
        self.requests.len()
    }

    /// Deliver `random_value` for `request_id` to the raffle
    pub fn fulfill_random_words<P: Payout>(
        &mut self,
        request_id: RequestId,
        raffle: &mut Raffle,
        random_value: u64,
        now: UnixTimestamp,
        payout: &mut P,
    ) -> Result<RaffleEvent, RaffleError> {
        if !self.requests.contains_key(&request_id) {
            msg!("nonexistent request {}", request_id);
            return Err(RaffleError::UnknownRequest);
        }
        let event = raffle.fulfill_randomness(request_id, random_value, now, payout)?;
        self.requests.remove(&request_id);
        Ok(event)
    }
}

impl RandomnessOracle for MockCoordinator {
    fn request_random_words(&mut self, request: &DrawRequest) -> Result<RequestId, RaffleError> {
        if !self.available {
            return Err(RaffleError::OracleUnavailable);
        }
        let request_id = self.next_request_id;
        self.next_request_id += 1;
        self.requests.insert(request_id, request.clone());
        Ok(request_id)
    }
}

/// Reduce a 32-byte VRF output to one random word (first 8 bytes, little-endian)
pub fn random_word_from_vrf(vrf_result: &[u8; 32]) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&vrf_result[..8]);
    u64::from_le_bytes(bytes)
}
