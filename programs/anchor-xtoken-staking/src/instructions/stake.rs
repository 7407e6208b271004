use anchor_lang::prelude::*;
use anchor_spl::token::{
    mint_to, transfer_checked, Mint, MintTo, Token, TokenAccount, TransferChecked,
};

use crate::authority::XMintSigner;
use crate::constants::{STAKE_VAULT_SEED, VAULT_SEED, X_MINT_SEED};
use crate::error::StakingError;
use crate::events::{PriceChange, Staked};
use crate::math;
use crate::state::Vault;

#[derive(Accounts)]
pub struct Stake<'info> {
    #[account(
        seeds = [VAULT_SEED, underlying_mint.key().as_ref()],
        bump = vault.bump,
        has_one = underlying_mint,
        has_one = x_mint @ StakingError::InvalidShareMint,
        has_one = stake_vault @ StakingError::InvalidCustody,
    )]
    pub vault: Account<'info, Vault>,

    pub underlying_mint: Account<'info, Mint>,

    #[account(
        mut,
        seeds = [X_MINT_SEED, underlying_mint.key().as_ref()],
        bump = vault.x_mint_bump,
    )]
    pub x_mint: Account<'info, Mint>,

    #[account(
        mut,
        seeds = [STAKE_VAULT_SEED, underlying_mint.key().as_ref()],
        bump = vault.stake_vault_bump,
    )]
    pub stake_vault: Account<'info, TokenAccount>,

    /// Source of the staked tokens
    #[account(
        mut,
        token::mint = underlying_mint,
        token::authority = staker,
    )]
    pub staker_underlying_account: Account<'info, TokenAccount>,

    /// Receives the minted x-tokens
    #[account(
        mut,
        token::mint = x_mint,
        token::authority = staker,
    )]
    pub staker_x_account: Account<'info, TokenAccount>,

    pub staker: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<Stake>, x_mint_bump: u8, amount: u64) -> Result<()> {
    require!(amount > 0, StakingError::ZeroAmount);

    // The caller's bump must re-derive the x-mint it passed in
    let signer = XMintSigner::new(ctx.accounts.underlying_mint.key(), x_mint_bump);
    require_keys_eq!(
        signer.address()?,
        ctx.accounts.x_mint.key(),
        StakingError::InvalidBump
    );

    // Snapshot before any transfer; accounts are loaded fresh per instruction
    let custody_balance = ctx.accounts.stake_vault.amount;
    let share_supply = ctx.accounts.x_mint.supply;

    let shares_to_mint = math::shares_for_stake(amount, custody_balance, share_supply)?;
    require!(shares_to_mint > 0, StakingError::ZeroSharesMinted);

    let old_price = math::price_per_share_e9(custody_balance, share_supply)?;

    let transfer_accounts = TransferChecked {
        from: ctx.accounts.staker_underlying_account.to_account_info(),
        mint: ctx.accounts.underlying_mint.to_account_info(),
        to: ctx.accounts.stake_vault.to_account_info(),
        authority: ctx.accounts.staker.to_account_info(),
    };

    let cpi_ctx = CpiContext::new(
        ctx.accounts.token_program.to_account_info(),
        transfer_accounts,
    );

    transfer_checked(cpi_ctx, amount, ctx.accounts.underlying_mint.decimals)?;

    let seeds = signer.seeds();
    let signer_seeds = &[&seeds[..]];

    let mint_accounts = MintTo {
        mint: ctx.accounts.x_mint.to_account_info(),
        to: ctx.accounts.staker_x_account.to_account_info(),
        authority: ctx.accounts.x_mint.to_account_info(),
    };

    let cpi_ctx = CpiContext::new_with_signer(
        ctx.accounts.token_program.to_account_info(),
        mint_accounts,
        signer_seeds,
    );

    mint_to(cpi_ctx, shares_to_mint)?;

    let new_balance = custody_balance
        .checked_add(amount)
        .ok_or(StakingError::MathOverflow)?;
    let new_supply = share_supply
        .checked_add(shares_to_mint)
        .ok_or(StakingError::MathOverflow)?;
    let new_price = math::price_per_share_e9(new_balance, new_supply)?;

    let underlying_mint = ctx.accounts.underlying_mint.key();
    emit!(Staked {
        underlying_mint,
        staker: ctx.accounts.staker.key(),
        amount,
        shares_minted: shares_to_mint,
    });
    emit!(PriceChange {
        underlying_mint,
        old_underlying_per_share_e9: old_price,
        new_underlying_per_share_e9: new_price,
    });

    msg!("Stake successful!");
    msg!("Staked: {} tokens", amount);
    msg!("Minted: {} shares", shares_to_mint);
    msg!("Total vault assets: {}", new_balance);
    msg!("Total shares supply: {}", new_supply);

    Ok(())
}
