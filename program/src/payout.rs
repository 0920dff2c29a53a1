use solana_program::{
    account_info::AccountInfo, msg, program_error::ProgramError, pubkey::Pubkey,
};

/// Moves the prize to the winner. Called after the round has been reset.
pub trait Payout {
    fn transfer(&mut self, winner: &Pubkey, amount: u64) -> Result<(), ProgramError>;
}

/// Pays out of the program-owned raffle account by moving lamports directly
pub struct LamportPayout<'a, 'info> {
    pub pool: &'a AccountInfo<'info>,
    pub winner: &'a AccountInfo<'info>,
}

impl<'a, 'info> Payout for LamportPayout<'a, 'info> {
    fn transfer(&mut self, winner: &Pubkey, amount: u64) -> Result<(), ProgramError> {
        if self.winner.key != winner {
            msg!(
                "Winner account {} does not match selected winner {}",
                self.winner.key,
                winner
            );
            return Err(ProgramError::InvalidArgument);
        }
        if !self.winner.is_writable {
            msg!("Winner account must be writable");
            return Err(ProgramError::InvalidArgument);
        }

        let pool_lamports = self
            .pool
            .lamports()
            .checked_sub(amount)
            .ok_or(ProgramError::InsufficientFunds)?;
        let winner_lamports = self
            .winner
            .lamports()
            .checked_add(amount)
            .ok_or(ProgramError::InvalidArgument)?;

        **self.pool.try_borrow_mut_lamports()? = pool_lamports;
        **self.winner.try_borrow_mut_lamports()? = winner_lamports;

        msg!("Transferred {} lamports to {}", amount, winner);
        Ok(())
    }
}
