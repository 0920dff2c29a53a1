// Raffle program - instruction processor
use borsh::BorshSerialize;
use solana_program::{
    account_info::{next_account_info, AccountInfo},
    clock::Clock,
    entrypoint::ProgramResult,
    msg,
    program::{invoke, set_return_data},
    program_error::ProgramError,
    program_pack::Pack,
    pubkey::Pubkey,
    system_instruction,
    sysvar::Sysvar,
};

use crate::{
    error::RaffleError,
    instruction::{InitializeArgs, RaffleInstruction},
    oracle::{random_word_from_vrf, ProgramOracle},
    payout::LamportPayout,
    raffle::Raffle,
    state::{raffle_account_space, unpack_raffle_account, Config},
};

/// Program state handler.
pub struct Processor {}

impl Processor {
    pub fn process_instruction(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        instruction_data: &[u8],
    ) -> ProgramResult {
        let instruction = RaffleInstruction::unpack(instruction_data)?;

        match instruction {
            RaffleInstruction::Initialize(args) => {
                msg!("Instruction: Initialize");
                Self::process_initialize(program_id, accounts, args)
            }
            RaffleInstruction::Enter { amount } => {
                msg!("Instruction: Enter");
                Self::process_enter(program_id, accounts, amount)
            }
            RaffleInstruction::CheckUpkeep => {
                msg!("Instruction: Check Upkeep");
                Self::process_check_upkeep(program_id, accounts)
            }
            RaffleInstruction::PerformUpkeep => {
                msg!("Instruction: Perform Upkeep");
                Self::process_perform_upkeep(program_id, accounts)
            }
            RaffleInstruction::FulfillRandomness {
                request_id,
                randomness,
            } => {
                msg!("Instruction: Fulfill Randomness");
                Self::process_fulfill_randomness(program_id, accounts, request_id, &randomness)
            }
        }
    }

    /// Load the config header and round from a raffle account
    fn load_raffle(program_id: &Pubkey, raffle_info: &AccountInfo) -> Result<Raffle, ProgramError> {
        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let (config, round) = unpack_raffle_account(&raffle_info.data.borrow())?;
        if config.raffle != *raffle_info.key {
            msg!("Config does not belong to raffle {}", raffle_info.key);
            return Err(ProgramError::InvalidAccountData);
        }

        Ok(Raffle::from_parts(config, round))
    }

    fn save_round(raffle: &Raffle, raffle_info: &AccountInfo) -> ProgramResult {
        raffle
            .round()
            .pack(&mut raffle_info.data.borrow_mut()[Config::LEN..])
    }

    fn process_initialize(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        args: InitializeArgs,
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let creator_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let oracle_authority_info = next_account_info(account_info_iter)?;

        if !creator_info.is_signer {
            msg!("Creator must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        // Only the holder of the raffle keypair may configure it
        if !raffle_info.is_signer {
            msg!("Raffle account must sign its initialization");
            return Err(ProgramError::MissingRequiredSignature);
        }

        if raffle_info.owner != program_id {
            msg!("Raffle account must be owned by this program");
            return Err(ProgramError::IncorrectProgramId);
        }

        let required_space = raffle_account_space(args.max_players);
        if raffle_info.data_len() < required_space {
            msg!(
                "Raffle account too small for {} players. Need {} bytes",
                args.max_players,
                required_space
            );
            return Err(ProgramError::AccountDataTooSmall);
        }

        if Config::unpack(&raffle_info.data.borrow()[..Config::LEN]).is_ok() {
            msg!("Raffle account is already initialized");
            return Err(ProgramError::AccountAlreadyInitialized);
        }

        let config = Config {
            is_initialized: true,
            raffle: *raffle_info.key,
            oracle_authority: *oracle_authority_info.key,
            entrance_fee: args.entrance_fee,
            interval: args.interval,
            max_players: args.max_players,
            overpayment: args.overpayment,
            key_hash: args.key_hash,
            subscription_id: args.subscription_id,
            callback_gas_limit: args.callback_gas_limit,
            request_confirmations: args.request_confirmations,
            num_words: args.num_words,
        };

        let clock = Clock::get()?;
        let raffle = Raffle::new(config, clock.unix_timestamp)?;

        Config::pack(config, &mut raffle_info.data.borrow_mut()[..Config::LEN])?;
        Self::save_round(&raffle, raffle_info)?;

        msg!(
            "Raffle initialized: EntranceFee={} Interval={}s MaxPlayers={} Oracle={}",
            config.entrance_fee,
            config.interval,
            config.max_players,
            config.oracle_authority
        );
        Ok(())
    }

    fn process_enter(program_id: &Pubkey, accounts: &[AccountInfo], amount: u64) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let player_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let system_program_info = next_account_info(account_info_iter)?;

        if !player_info.is_signer {
            msg!("Player must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(program_id, raffle_info)?;
        let balance_before = raffle.balance();
        let event = raffle.enter(*player_info.key, amount)?;
        let credited = raffle
            .balance()
            .checked_sub(balance_before)
            .ok_or(RaffleError::AmountOverflow)?;

        invoke(
            &system_instruction::transfer(player_info.key, raffle_info.key, credited),
            &[
                player_info.clone(),
                raffle_info.clone(),
                system_program_info.clone(),
            ],
        )?;

        Self::save_round(&raffle, raffle_info)?;
        event.emit();
        Ok(())
    }

    fn process_check_upkeep(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let raffle_info = next_account_info(account_info_iter)?;

        let raffle = Self::load_raffle(program_id, raffle_info)?;
        let clock = Clock::get()?;
        let (needed, diagnostics) = raffle.check_upkeep(clock.unix_timestamp);

        let data = diagnostics
            .try_to_vec()
            .map_err(|_| ProgramError::InvalidAccountData)?;
        set_return_data(&data);

        msg!("Upkeep needed: {} ({})", needed, diagnostics);
        Ok(())
    }

    fn process_perform_upkeep(program_id: &Pubkey, accounts: &[AccountInfo]) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let caller_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;

        // Anyone can trigger the draw; eligibility is checked by the raffle itself
        if !caller_info.is_signer {
            msg!("Caller must sign the transaction");
            return Err(ProgramError::MissingRequiredSignature);
        }

        let mut raffle = Self::load_raffle(program_id, raffle_info)?;
        let oracle_authority = raffle.config().oracle_authority;
        let mut oracle = ProgramOracle {
            raffle: raffle_info.key,
            oracle_authority: &oracle_authority,
        };

        let clock = Clock::get()?;
        let event = raffle.perform_upkeep(clock.unix_timestamp, &mut oracle)?;

        Self::save_round(&raffle, raffle_info)?;
        event.emit();
        Ok(())
    }

    fn process_fulfill_randomness(
        program_id: &Pubkey,
        accounts: &[AccountInfo],
        request_id: u64,
        randomness: &[u8; 32],
    ) -> ProgramResult {
        let account_info_iter = &mut accounts.iter();
        let oracle_info = next_account_info(account_info_iter)?;
        let raffle_info = next_account_info(account_info_iter)?;
        let winner_info = next_account_info(account_info_iter)?;

        let mut raffle = Self::load_raffle(program_id, raffle_info)?;

        if !oracle_info.is_signer || *oracle_info.key != raffle.config().oracle_authority {
            msg!("Fulfillment must be signed by the oracle authority");
            return Err(RaffleError::UnauthorizedOracle.into());
        }

        let random_value = random_word_from_vrf(randomness);
        let clock = Clock::get()?;
        let mut payout = LamportPayout {
            pool: raffle_info,
            winner: winner_info,
        };
        let event =
            raffle.fulfill_randomness(request_id, random_value, clock.unix_timestamp, &mut payout)?;

        Self::save_round(&raffle, raffle_info)?;
        event.emit();
        Ok(())
    }
}
