use anchor_lang::prelude::*;

use crate::constants::{STAKE_VAULT_SEED, VAULT_SEED, X_MINT_SEED};
use crate::error::StakingError;

/// Derive a program address for `seed_tag` scoped to one underlying mint.
///
/// Any client recomputing the same inputs gets the same `(address, bump)`,
/// which is what lets the program authenticate the accounts it is handed.
pub fn derive(seed_tag: &[u8], underlying_mint: &Pubkey, program_id: &Pubkey) -> Result<(Pubkey, u8)> {
    Pubkey::try_find_program_address(&[seed_tag, underlying_mint.as_ref()], program_id)
        .ok_or_else(|| error!(StakingError::DerivationFailed))
}

pub fn derive_x_mint(underlying_mint: &Pubkey) -> Result<(Pubkey, u8)> {
    derive(X_MINT_SEED, underlying_mint, &crate::ID)
}

pub fn derive_stake_vault(underlying_mint: &Pubkey) -> Result<(Pubkey, u8)> {
    derive(STAKE_VAULT_SEED, underlying_mint, &crate::ID)
}

pub fn derive_vault(underlying_mint: &Pubkey) -> Result<(Pubkey, u8)> {
    derive(VAULT_SEED, underlying_mint, &crate::ID)
}

/// Signing capability of the x-mint PDA.
///
/// The x-mint is its own mint authority and the owner of the stake vault,
/// so every program-signed CPI (mint on stake, custody transfer on unstake)
/// goes through these seeds. Handlers build it from the caller's bump and
/// check `address()` against the x-mint before signing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct XMintSigner {
    underlying_mint: Pubkey,
    bump: [u8; 1],
}

impl XMintSigner {
    pub fn new(underlying_mint: Pubkey, bump: u8) -> Self {
        Self {
            underlying_mint,
            bump: [bump],
        }
    }

    /// Seeds in the layout expected by `CpiContext::new_with_signer`.
    pub fn seeds(&self) -> [&[u8]; 3] {
        [X_MINT_SEED, self.underlying_mint.as_ref(), &self.bump]
    }

    /// Address these seeds sign for. Fails when the bump pushes the seeds
    /// onto the curve.
    pub fn address(&self) -> Result<Pubkey> {
        Pubkey::create_program_address(&self.seeds(), &crate::ID)
            .map_err(|_| error!(StakingError::InvalidBump))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derivation_is_deterministic() {
        let mint = Pubkey::new_unique();
        assert_eq!(derive_x_mint(&mint).unwrap(), derive_x_mint(&mint).unwrap());
        assert_eq!(
            derive_stake_vault(&mint).unwrap(),
            derive_stake_vault(&mint).unwrap()
        );
    }

    #[test]
    fn seed_tags_yield_distinct_accounts() {
        let mint = Pubkey::new_unique();
        let (x_mint, _) = derive_x_mint(&mint).unwrap();
        let (stake_vault, _) = derive_stake_vault(&mint).unwrap();
        let (vault, _) = derive_vault(&mint).unwrap();

        assert_ne!(x_mint, stake_vault);
        assert_ne!(x_mint, vault);
        assert_ne!(stake_vault, vault);
    }

    #[test]
    fn vaults_for_different_mints_do_not_collide() {
        let (a, _) = derive_x_mint(&Pubkey::new_unique()).unwrap();
        let (b, _) = derive_x_mint(&Pubkey::new_unique()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn derivation_matches_raw_find_program_address() {
        let mint = Pubkey::new_unique();
        let expected = Pubkey::find_program_address(&[b"x-mint", mint.as_ref()], &crate::ID);
        assert_eq!(derive_x_mint(&mint).unwrap(), expected);
    }

    #[test]
    fn signer_seeds_sign_for_the_x_mint() {
        let mint = Pubkey::new_unique();
        let (x_mint, bump) = derive_x_mint(&mint).unwrap();
        let signer = XMintSigner::new(mint, bump);

        assert_eq!(signer.address().unwrap(), x_mint);
    }

    #[test]
    fn signer_with_wrong_bump_does_not_sign_for_the_x_mint() {
        let mint = Pubkey::new_unique();
        let (x_mint, bump) = derive_x_mint(&mint).unwrap();
        let signer = XMintSigner::new(mint, bump.wrapping_sub(1));

        match signer.address() {
            Ok(address) => assert_ne!(address, x_mint),
            Err(_) => {}
        }
    }
}
