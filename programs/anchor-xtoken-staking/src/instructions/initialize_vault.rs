use anchor_lang::prelude::*;
use anchor_spl::token::{Mint, Token, TokenAccount};

use crate::constants::{STAKE_VAULT_SEED, VAULT_SEED, X_MINT_SEED};
use crate::events::VaultInitialized;
use crate::state::Vault;

#[derive(Accounts)]
pub struct InitializeVault<'info> {
    /// One vault per underlying mint; a second init fails on the existing account
    #[account(
        init,
        payer = payer,
        space = Vault::LEN,
        seeds = [VAULT_SEED, underlying_mint.key().as_ref()],
        bump
    )]
    pub vault: Account<'info, Vault>,

    /// The token being staked. Classic SPL Token only: Token-2022 mints
    /// (transfer fees in particular) are rejected by the owner check.
    pub underlying_mint: Account<'info, Mint>,

    /// The x-token mint, its own mint authority
    #[account(
        init,
        payer = payer,
        mint::decimals = underlying_mint.decimals,
        mint::authority = x_mint,
        seeds = [X_MINT_SEED, underlying_mint.key().as_ref()],
        bump
    )]
    pub x_mint: Account<'info, Mint>,

    /// Custody of all staked tokens, owned by the x-mint PDA
    #[account(
        init,
        payer = payer,
        token::mint = underlying_mint,
        token::authority = x_mint,
        seeds = [STAKE_VAULT_SEED, underlying_mint.key().as_ref()],
        bump
    )]
    pub stake_vault: Account<'info, TokenAccount>,

    #[account(mut)]
    pub payer: Signer<'info>,

    pub system_program: Program<'info, System>,
    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<InitializeVault>) -> Result<()> {
    let vault = &mut ctx.accounts.vault;

    vault.underlying_mint = ctx.accounts.underlying_mint.key();
    vault.x_mint = ctx.accounts.x_mint.key();
    vault.stake_vault = ctx.accounts.stake_vault.key();
    vault.x_mint_bump = ctx.bumps.x_mint;
    vault.stake_vault_bump = ctx.bumps.stake_vault;
    vault.bump = ctx.bumps.vault;

    emit!(VaultInitialized {
        vault: vault.key(),
        underlying_mint: vault.underlying_mint,
        x_mint: vault.x_mint,
        stake_vault: vault.stake_vault,
    });

    msg!("Vault initialized successfully!");
    msg!("Vault: {}", vault.key());
    msg!("Underlying Mint: {}", vault.underlying_mint);
    msg!("X Mint: {} (bump {})", vault.x_mint, vault.x_mint_bump);
    msg!("Stake Vault: {} (bump {})", vault.stake_vault, vault.stake_vault_bump);

    Ok(())
}
