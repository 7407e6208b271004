use anchor_lang::prelude::*;
use anchor_spl::token::{
    burn, transfer_checked, Burn, Mint, Token, TokenAccount, TransferChecked,
};

use crate::authority::XMintSigner;
use crate::constants::{STAKE_VAULT_SEED, VAULT_SEED, X_MINT_SEED};
use crate::error::StakingError;
use crate::events::{PriceChange, Unstaked};
use crate::math;
use crate::state::Vault;

#[derive(Accounts)]
pub struct Unstake<'info> {
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

    /// x-tokens are burned from here
    #[account(
        mut,
        token::mint = x_mint,
        token::authority = staker,
    )]
    pub staker_x_account: Account<'info, TokenAccount>,

    /// Receives the redeemed tokens
    #[account(
        mut,
        token::mint = underlying_mint,
        token::authority = staker,
    )]
    pub staker_underlying_account: Account<'info, TokenAccount>,

    pub staker: Signer<'info>,

    pub token_program: Program<'info, Token>,
}

pub fn handler(ctx: Context<Unstake>, x_mint_bump: u8, amount: u64) -> Result<()> {
    require!(amount > 0, StakingError::ZeroAmount);

    // The caller's bump must re-derive the x-mint it passed in
    let signer = XMintSigner::new(ctx.accounts.underlying_mint.key(), x_mint_bump);
    require_keys_eq!(
        signer.address()?,
        ctx.accounts.x_mint.key(),
        StakingError::InvalidBump
    );
    require!(
        ctx.accounts.staker_x_account.amount >= amount,
        StakingError::InsufficientShareBalance
    );

    let custody_balance = ctx.accounts.stake_vault.amount;
    let share_supply = ctx.accounts.x_mint.supply;

    let underlying_to_return = math::underlying_for_unstake(amount, custody_balance, share_supply)?;
    require!(underlying_to_return > 0, StakingError::ZeroUnderlyingRedeemed);

    let old_price = math::price_per_share_e9(custody_balance, share_supply)?;

    let burn_accounts = Burn {
        mint: ctx.accounts.x_mint.to_account_info(),
        from: ctx.accounts.staker_x_account.to_account_info(),
        authority: ctx.accounts.staker.to_account_info(),
    };

    let cpi_ctx = CpiContext::new(
        ctx.accounts.token_program.to_account_info(),
        burn_accounts,
    );

    burn(cpi_ctx, amount)?;

    let seeds = signer.seeds();
    let signer_seeds = &[&seeds[..]];

    let transfer_accounts = TransferChecked {
        from: ctx.accounts.stake_vault.to_account_info(),
        mint: ctx.accounts.underlying_mint.to_account_info(),
        to: ctx.accounts.staker_underlying_account.to_account_info(),
        authority: ctx.accounts.x_mint.to_account_info(),
    };

    let cpi_ctx = CpiContext::new_with_signer(
        ctx.accounts.token_program.to_account_info(),
        transfer_accounts,
        signer_seeds,
    );

    transfer_checked(cpi_ctx, underlying_to_return, ctx.accounts.underlying_mint.decimals)?;

    // underlying_for_unstake bounds both subtractions
    let remaining_balance = custody_balance - underlying_to_return;
    let remaining_supply = share_supply - amount;
    let new_price = math::price_per_share_e9(remaining_balance, remaining_supply)?;

    let underlying_mint = ctx.accounts.underlying_mint.key();
    emit!(Unstaked {
        underlying_mint,
        staker: ctx.accounts.staker.key(),
        shares_burned: amount,
        amount: underlying_to_return,
    });
    emit!(PriceChange {
        underlying_mint,
        old_underlying_per_share_e9: old_price,
        new_underlying_per_share_e9: new_price,
    });

    msg!("Unstake successful!");
    msg!("Shares burned: {}", amount);
    msg!("Underlying returned: {}", underlying_to_return);
    msg!("Remaining vault assets: {}", remaining_balance);
    msg!("Remaining shares supply: {}", remaining_supply);

    Ok(())
}
