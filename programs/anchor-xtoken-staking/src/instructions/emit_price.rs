use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, TokenAccount};

use crate::constants::VAULT_SEED;
use crate::error::StakingError;
use crate::events::PriceSnapshot;
use crate::math;
use crate::state::Vault;

/// Read-only: reports the current exchange rate as an event.
#[derive(Accounts)]
pub struct EmitPrice<'info> {
    #[account(
        seeds = [VAULT_SEED, vault.underlying_mint.as_ref()],
        bump = vault.bump,
        has_one = x_mint @ StakingError::InvalidShareMint,
        has_one = stake_vault @ StakingError::InvalidCustody,
    )]
    pub vault: Account<'info, Vault>,

    pub x_mint: Account<'info, Mint>,

    pub stake_vault: Account<'info, TokenAccount>,
}

pub fn handler(ctx: Context<EmitPrice>) -> Result<()> {
    let custody_balance = ctx.accounts.stake_vault.amount;
    let share_supply = ctx.accounts.x_mint.supply;
    let price = math::price_per_share_e9(custody_balance, share_supply)?;

    emit!(PriceSnapshot {
        underlying_mint: ctx.accounts.vault.underlying_mint,
        custody_balance,
        share_supply,
        underlying_per_share_e9: price,
    });

    msg!("Vault assets: {}", custody_balance);
    msg!("Shares supply: {}", share_supply);
    msg!("Underlying per share (e9): {}", price);

    Ok(())
}
