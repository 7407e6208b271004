use anchor_lang::prelude::*;

#[event]
pub struct VaultInitialized {
    pub vault: Pubkey,
    pub underlying_mint: Pubkey,
    pub x_mint: Pubkey,
    pub stake_vault: Pubkey,
}

#[event]
pub struct Staked {
    pub underlying_mint: Pubkey,
    pub staker: Pubkey,
    pub amount: u64,
    pub shares_minted: u64,
}

#[event]
pub struct Unstaked {
    pub underlying_mint: Pubkey,
    pub staker: Pubkey,
    pub shares_burned: u64,
    pub amount: u64,
}

/// Emitted by stake and unstake. Prices are underlying per share * 1e9.
#[event]
pub struct PriceChange {
    pub underlying_mint: Pubkey,
    pub old_underlying_per_share_e9: u64,
    pub new_underlying_per_share_e9: u64,
}

#[event]
pub struct PriceSnapshot {
    pub underlying_mint: Pubkey,
    pub custody_balance: u64,
    pub share_supply: u64,
    pub underlying_per_share_e9: u64,
}
