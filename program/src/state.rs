// Raffle account layouts
use arrayref::{array_mut_ref, array_ref, array_refs, mut_array_refs};
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    clock::UnixTimestamp,
    entrypoint::ProgramResult,
    program_error::ProgramError,
    program_pack::{IsInitialized, Pack, Sealed},
    pubkey::Pubkey,
};
use std::convert::TryFrom;

use crate::{error::RaffleError, ledger::FundsLedger, registry::EntryRegistry, request::RequestTracker};

pub const DEFAULT_MAX_PLAYERS: u32 = 128;
pub const DEFAULT_REQUEST_CONFIRMATIONS: u16 = 3;
pub const DEFAULT_CALLBACK_GAS_LIMIT: u32 = 500_000;
pub const DEFAULT_NUM_WORDS: u32 = 1;

/// Lifecycle of a round
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum RaffleState {
    /// Accepting entries
    Open,
    /// Randomness requested, waiting for fulfillment
    Drawing,
}

impl Default for RaffleState {
    fn default() -> Self {
        RaffleState::Open
    }
}

/// What happens to lamports paid above the entrance fee
#[derive(BorshSerialize, BorshDeserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverpaymentPolicy {
    /// The whole payment goes into the pool
    Retain,
    /// Only the entrance fee is collected
    Refund,
}

impl TryFrom<u8> for OverpaymentPolicy {
    type Error = ProgramError;

    fn try_from(val: u8) -> Result<Self, Self::Error> {
        match val {
            0 => Ok(OverpaymentPolicy::Retain),
            1 => Ok(OverpaymentPolicy::Refund),
            _ => Err(ProgramError::InvalidAccountData),
        }
    }
}

impl From<OverpaymentPolicy> for u8 {
    fn from(policy: OverpaymentPolicy) -> Self {
        match policy {
            OverpaymentPolicy::Retain => 0,
            OverpaymentPolicy::Refund => 1,
        }
    }
}

/// Per-raffle configuration, fixed at initialization.
///
/// Stored at the head of the raffle account, ahead of the [`Round`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
    /// Is the account initialized
    pub is_initialized: bool,
    /// Raffle account this config was written into
    pub raffle: Pubkey,
    /// Only signer allowed to deliver randomness
    pub oracle_authority: Pubkey,
    /// Lamports required per entry
    pub entrance_fee: u64,
    /// Minimum seconds between draws
    pub interval: u64,
    /// Capacity of the round account
    pub max_players: u32,
    pub overpayment: OverpaymentPolicy,
    /// Oracle gas lane
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub callback_gas_limit: u32,
    pub request_confirmations: u16,
    pub num_words: u32,
}

impl Config {
    pub fn new(entrance_fee: u64, interval: u64) -> Self {
        Self {
            is_initialized: true,
            raffle: Pubkey::default(),
            oracle_authority: Pubkey::default(),
            entrance_fee,
            interval,
            max_players: DEFAULT_MAX_PLAYERS,
            overpayment: OverpaymentPolicy::Retain,
            key_hash: [0u8; 32],
            subscription_id: 0,
            callback_gas_limit: DEFAULT_CALLBACK_GAS_LIMIT,
            request_confirmations: DEFAULT_REQUEST_CONFIRMATIONS,
            num_words: DEFAULT_NUM_WORDS,
        }
    }

    pub fn with_overpayment(mut self, overpayment: OverpaymentPolicy) -> Self {
        self.overpayment = overpayment;
        self
    }

    pub fn with_max_players(mut self, max_players: u32) -> Self {
        self.max_players = max_players;
        self
    }

    pub fn validate(&self) -> Result<(), RaffleError> {
        if self.entrance_fee == 0 || self.max_players == 0 || self.num_words == 0 {
            return Err(RaffleError::InvalidConfig);
        }
        Ok(())
    }
}

impl Sealed for Config {}

impl IsInitialized for Config {
    fn is_initialized(&self) -> bool {
        self.is_initialized
    }
}

impl Pack for Config {
    const LEN: usize = 1 + 32 + 32 + 8 + 8 + 4 + 1 + 32 + 8 + 4 + 2 + 4;

    fn unpack_from_slice(src: &[u8]) -> Result<Self, ProgramError> {
        let src = array_ref![src, 0, Config::LEN];
        let (
            is_initialized,
            raffle,
            oracle_authority,
            entrance_fee,
            interval,
            max_players,
            overpayment,
            key_hash,
            subscription_id,
            callback_gas_limit,
            request_confirmations,
            num_words,
        ) = array_refs![src, 1, 32, 32, 8, 8, 4, 1, 32, 8, 4, 2, 4];

        Ok(Config {
            is_initialized: is_initialized[0] != 0,
            raffle: Pubkey::new_from_array(*raffle),
            oracle_authority: Pubkey::new_from_array(*oracle_authority),
            entrance_fee: u64::from_le_bytes(*entrance_fee),
            interval: u64::from_le_bytes(*interval),
            max_players: u32::from_le_bytes(*max_players),
            overpayment: OverpaymentPolicy::try_from(overpayment[0])?,
            key_hash: *key_hash,
            subscription_id: u64::from_le_bytes(*subscription_id),
            callback_gas_limit: u32::from_le_bytes(*callback_gas_limit),
            request_confirmations: u16::from_le_bytes(*request_confirmations),
            num_words: u32::from_le_bytes(*num_words),
        })
    }

    fn pack_into_slice(&self, dst: &mut [u8]) {
        let dst = array_mut_ref![dst, 0, Config::LEN];
        let (
            is_initialized_dst,
            raffle_dst,
            oracle_authority_dst,
            entrance_fee_dst,
            interval_dst,
            max_players_dst,
            overpayment_dst,
            key_hash_dst,
            subscription_id_dst,
            callback_gas_limit_dst,
            request_confirmations_dst,
            num_words_dst,
        ) = mut_array_refs![dst, 1, 32, 32, 8, 8, 4, 1, 32, 8, 4, 2, 4];

        is_initialized_dst[0] = self.is_initialized as u8;
        raffle_dst.copy_from_slice(self.raffle.as_ref());
        oracle_authority_dst.copy_from_slice(self.oracle_authority.as_ref());
        *entrance_fee_dst = self.entrance_fee.to_le_bytes();
        *interval_dst = self.interval.to_le_bytes();
        *max_players_dst = self.max_players.to_le_bytes();
        overpayment_dst[0] = self.overpayment.into();
        key_hash_dst.copy_from_slice(&self.key_hash);
        *subscription_id_dst = self.subscription_id.to_le_bytes();
        *callback_gas_limit_dst = self.callback_gas_limit.to_le_bytes();
        *request_confirmations_dst = self.request_confirmations.to_le_bytes();
        *num_words_dst = self.num_words.to_le_bytes();
    }
}

/// The single round of a raffle, reset in place after every payout.
///
/// `registry` is variable length and must stay the last field so the
/// account can be sized with [`Round::space`].
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Round {
    pub is_initialized: bool,
    pub state: RaffleState,
    /// Sequence number of the current round, starting at 1
    pub round: u64,
    /// Last completion time, or initialization time
    pub last_timestamp: UnixTimestamp,
    pub recent_winner: Option<Pubkey>,
    pub ledger: FundsLedger,
    pub requests: RequestTracker,
    pub registry: EntryRegistry,
}

impl Round {
    /// Fixed-size prefix before the player list entries
    pub const BASE_LEN: usize = 1 + 1 + 8 + 8 + (1 + 32) + 8 + (1 + 8 + 8 + 8) + 4;

    pub fn new(started_at: UnixTimestamp) -> Self {
        Self {
            is_initialized: true,
            round: 1,
            last_timestamp: started_at,
            ..Self::default()
        }
    }

    /// Account size for a round holding up to `max_players` entries
    pub fn space(max_players: u32) -> usize {
        Self::BASE_LEN + 32 * max_players as usize
    }

    /// Read a round from account data; trailing unused capacity is ignored
    pub fn unpack(src: &[u8]) -> Result<Self, ProgramError> {
        let round =
            Round::deserialize(&mut &src[..]).map_err(|_| ProgramError::InvalidAccountData)?;
        if !round.is_initialized {
            return Err(ProgramError::UninitializedAccount);
        }
        Ok(round)
    }

    pub fn pack(&self, dst: &mut [u8]) -> ProgramResult {
        self.serialize(&mut &mut dst[..])
            .map_err(|_| ProgramError::AccountDataTooSmall)
    }
}

/// Size of a raffle account: config header followed by the round
pub fn raffle_account_space(max_players: u32) -> usize {
    Config::LEN + Round::space(max_players)
}

/// Split raffle account data into its config and round
pub fn unpack_raffle_account(data: &[u8]) -> Result<(Config, Round), ProgramError> {
    if data.len() < Config::LEN {
        return Err(ProgramError::InvalidAccountData);
    }
    let (config_data, round_data) = data.split_at(Config::LEN);
    Ok((Config::unpack(config_data)?, Round::unpack(round_data)?))
}
