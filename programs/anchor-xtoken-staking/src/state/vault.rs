use anchor_lang::prelude::*;

#[account]
pub struct Vault {
    /// The mint of the token being staked
    pub underlying_mint: Pubkey,
    /// The share mint (x-token), PDA of [X_MINT_SEED, underlying_mint]
    pub x_mint: Pubkey,
    /// The custody token account, PDA of [STAKE_VAULT_SEED, underlying_mint]
    pub stake_vault: Pubkey,
    /// Bump of the x-mint PDA, which signs for the mint and the stake vault
    pub x_mint_bump: u8,
    /// Bump of the stake vault PDA
    pub stake_vault_bump: u8,
    /// Bump of this account's PDA
    pub bump: u8,
}

impl Vault {
    pub const LEN: usize = 8 + // discriminator
        32 + // underlying_mint
        32 + // x_mint
        32 + // stake_vault
        1 + // x_mint_bump
        1 + // stake_vault_bump
        1; // bump
}
