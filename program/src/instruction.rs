// Raffle program - instructions
use borsh::{BorshDeserialize, BorshSerialize};
use solana_program::{
    instruction::{AccountMeta, Instruction},
    program_error::ProgramError,
    pubkey::Pubkey,
    system_program,
};

use crate::state::{
    OverpaymentPolicy, DEFAULT_CALLBACK_GAS_LIMIT, DEFAULT_MAX_PLAYERS, DEFAULT_NUM_WORDS,
    DEFAULT_REQUEST_CONFIRMATIONS,
};

/// Settings fixed when a raffle is created
#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub struct InitializeArgs {
    /// Lamports required per entry
    pub entrance_fee: u64,
    /// Minimum seconds between draws
    pub interval: u64,
    /// Capacity the raffle account was sized for
    pub max_players: u32,
    pub overpayment: OverpaymentPolicy,
    pub key_hash: [u8; 32],
    pub subscription_id: u64,
    pub callback_gas_limit: u32,
    pub request_confirmations: u16,
    pub num_words: u32,
}

impl InitializeArgs {
    pub fn new(entrance_fee: u64, interval: u64) -> Self {
        Self {
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
}

#[derive(BorshSerialize, BorshDeserialize, Clone, Debug, PartialEq)]
pub enum RaffleInstruction {
    /// Write the config and first round into a raffle account
    ///
    /// Accounts expected:
    /// 0. `[signer]` The creator of the raffle
    /// 1. `[signer, writable]` The raffle account, pre-allocated with
    ///    `raffle_account_space(max_players)` bytes and owned by this program
    /// 2. `[]` The oracle authority allowed to deliver randomness
    Initialize(InitializeArgs),

    /// Enter the current round
    ///
    /// Accounts expected:
    /// 0. `[signer, writable]` The player paying the entrance fee
    /// 1. `[writable]` The raffle account
    /// 2. `[]` The system program
    Enter {
        /// Lamports offered, at least the entrance fee
        amount: u64,
    },

    /// Evaluate the draw predicate; diagnostics are set as return data
    ///
    /// Accounts expected:
    /// 0. `[]` The raffle account
    CheckUpkeep,

    /// Close entries and request randomness (anyone may call)
    ///
    /// Accounts expected:
    /// 0. `[signer]` The caller
    /// 1. `[writable]` The raffle account
    PerformUpkeep,

    /// Deliver randomness for the pending request and pay the winner
    ///
    /// Accounts expected:
    /// 0. `[signer]` The oracle authority
    /// 1. `[writable]` The raffle account
    /// 2. `[writable]` The winner, `players[word % players]` where `word` is
    ///    the first 8 bytes of `randomness`, little-endian
    FulfillRandomness {
        request_id: u64,
        /// Raw 32-byte VRF output
        randomness: [u8; 32],
    },
}

impl RaffleInstruction {
    /// Unpacks a byte buffer into a RaffleInstruction
    pub fn unpack(input: &[u8]) -> Result<Self, ProgramError> {
        Self::try_from_slice(input).map_err(|_| ProgramError::InvalidInstructionData)
    }

    /// Packs a RaffleInstruction into a byte buffer
    pub fn pack(&self) -> Result<Vec<u8>, ProgramError> {
        self.try_to_vec()
            .map_err(|_| ProgramError::InvalidInstructionData)
    }
}

/// Create initialize instruction
pub fn initialize(
    program_id: &Pubkey,
    creator: &Pubkey,
    raffle_account: &Pubkey,
    oracle_authority: &Pubkey,
    args: InitializeArgs,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::Initialize(args).pack()?;

    let accounts = vec![
        AccountMeta::new_readonly(*creator, true),
        AccountMeta::new(*raffle_account, true),
        AccountMeta::new_readonly(*oracle_authority, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create enter instruction
pub fn enter(
    program_id: &Pubkey,
    player: &Pubkey,
    raffle_account: &Pubkey,
    amount: u64,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::Enter { amount }.pack()?;

    let accounts = vec![
        AccountMeta::new(*player, true),
        AccountMeta::new(*raffle_account, false),
        AccountMeta::new_readonly(system_program::id(), false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create check_upkeep instruction
pub fn check_upkeep(program_id: &Pubkey, raffle_account: &Pubkey) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::CheckUpkeep.pack()?;

    let accounts = vec![
        AccountMeta::new_readonly(*raffle_account, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create perform_upkeep instruction
pub fn perform_upkeep(
    program_id: &Pubkey,
    caller: &Pubkey,
    raffle_account: &Pubkey,
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::PerformUpkeep.pack()?;

    let accounts = vec![
        AccountMeta::new_readonly(*caller, true),
        AccountMeta::new(*raffle_account, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}

/// Create fulfill_randomness instruction
pub fn fulfill_randomness(
    program_id: &Pubkey,
    oracle_authority: &Pubkey,
    raffle_account: &Pubkey,
    winner: &Pubkey,
    request_id: u64,
    randomness: [u8; 32],
) -> Result<Instruction, ProgramError> {
    let data = RaffleInstruction::FulfillRandomness {
        request_id,
        randomness,
    }
    .pack()?;

    let accounts = vec![
        AccountMeta::new_readonly(*oracle_authority, true),
        AccountMeta::new(*raffle_account, false),
        AccountMeta::new(*winner, false),
    ];

    Ok(Instruction {
        program_id: *program_id,
        accounts,
        data,
    })
}
