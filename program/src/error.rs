use solana_program::{
    decode_error::DecodeError,
    msg,
    program_error::{PrintProgramError, ProgramError},
};
use thiserror::Error;

use crate::upkeep::UpkeepDiagnostics;

/// Errors that may be returned by the raffle
#[derive(Error, Debug, Copy, Clone, PartialEq, Eq)]
pub enum RaffleError {
    /// Payment is below the entrance fee
    #[error("Not enough lamports paid to enter the raffle")]
    InsufficientFee,

    /// Entry attempted while a draw is in flight
    #[error("Raffle is not open")]
    NotOpen,

    /// Draw trigger called while the eligibility predicate is false
    #[error("Upkeep not needed: {0}")]
    UpkeepNotNeeded(UpkeepDiagnostics),

    /// Fulfillment for a request that is not the pending one
    #[error("Unknown or stale randomness request")]
    UnknownRequest,

    /// Transfer of the pool to the winner failed
    #[error("Payout to the winner failed")]
    PayoutFailed,

    /// Player index past the end of the registry
    #[error("Player index out of range")]
    IndexOutOfRange,

    /// The oracle did not accept the randomness request
    #[error("Randomness oracle unavailable")]
    OracleUnavailable,

    /// The round account cannot hold more entries
    #[error("Raffle is full")]
    RaffleFull,

    /// A randomness request is already outstanding
    #[error("A randomness request is already in flight")]
    RequestInFlight,

    /// Fulfillment not signed by the configured oracle authority
    #[error("Fulfillment not signed by the oracle authority")]
    UnauthorizedOracle,

    #[error("Invalid raffle configuration")]
    InvalidConfig,

    #[error("Amount overflow")]
    AmountOverflow,
}

impl RaffleError {
    /// Stable code surfaced as `ProgramError::Custom`
    pub fn code(&self) -> u32 {
        match self {
            RaffleError::InsufficientFee => 0,
            RaffleError::NotOpen => 1,
            RaffleError::UpkeepNotNeeded(_) => 2,
            RaffleError::UnknownRequest => 3,
            RaffleError::PayoutFailed => 4,
            RaffleError::IndexOutOfRange => 5,
            RaffleError::OracleUnavailable => 6,
            RaffleError::RaffleFull => 7,
            RaffleError::RequestInFlight => 8,
            RaffleError::UnauthorizedOracle => 9,
            RaffleError::InvalidConfig => 10,
            RaffleError::AmountOverflow => 11,
        }
    }
}

impl From<RaffleError> for ProgramError {
    fn from(e: RaffleError) -> Self {
        ProgramError::Custom(e.code())
    }
}

impl<T> DecodeError<T> for RaffleError {
    fn type_of() -> &'static str {
        "Raffle Error"
    }
}

impl PrintProgramError for RaffleError {
    fn print<E>(&self) {
        msg!(&self.to_string());
    }
}
