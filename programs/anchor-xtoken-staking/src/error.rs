use anchor_lang::prelude::*;

#[error_code]
pub enum StakingError {
    #[msg("Amount must be greater than zero")]
    ZeroAmount,
    #[msg("Supplied bump does not match the vault's x-mint bump")]
    InvalidBump,
    #[msg("Share mint does not match the vault's x-mint")]
    InvalidShareMint,
    #[msg("Custody account does not match the vault's stake vault")]
    InvalidCustody,
    #[msg("No valid program address exists for the given seeds")]
    DerivationFailed,
    #[msg("No shares exist in circulation")]
    NoSharesOutstanding,
    #[msg("Shares are outstanding but the stake vault is empty")]
    EmptyCustody,
    #[msg("Share amount exceeds the outstanding share supply")]
    ExceedsShareSupply,
    #[msg("Share balance is lower than the requested amount")]
    InsufficientShareBalance,
    #[msg("Stake amount is too small to mint any shares")]
    ZeroSharesMinted,
    #[msg("Share amount is too small to redeem any underlying tokens")]
    ZeroUnderlyingRedeemed,
    #[msg("Math operation overflow")]
    MathOverflow,
}
