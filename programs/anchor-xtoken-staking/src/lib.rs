pub mod authority;
pub mod constants;
pub mod error;
pub mod events;
pub mod instructions;
pub mod math;
pub mod state;

use anchor_lang::prelude::*;

pub use constants::*;
pub use instructions::*;
pub use state::*;

declare_id!("9eQmoUcpxKDc6fLfVW6YtdsKXsmMcthWaq5D9iQjX6tw");

#[program]
pub mod anchor_xtoken_staking {
    use super::*;

    pub fn initialize_vault(ctx: Context<InitializeVault>) -> Result<()> {
        initialize_vault::handler(ctx)
    }

    pub fn stake(ctx: Context<Stake>, x_mint_bump: u8, amount: u64) -> Result<()> {
        stake::handler(ctx, x_mint_bump, amount)
    }

    pub fn unstake(ctx: Context<Unstake>, x_mint_bump: u8, amount: u64) -> Result<()> {
        unstake::handler(ctx, x_mint_bump, amount)
    }

    pub fn emit_price(ctx: Context<EmitPrice>) -> Result<()> {
        emit_price::handler(ctx)
    }
}
