/// Seed of the share mint PDA. The x-mint is also the signing authority
/// for itself and for the stake vault.
pub const X_MINT_SEED: &[u8] = b"x-mint";

/// Seed of the custody token account PDA.
pub const STAKE_VAULT_SEED: &[u8] = b"stake-vault";

/// Seed of the vault record PDA.
pub const VAULT_SEED: &[u8] = b"vault";

/// Fixed-point scale for reported share prices (9 decimals).
pub const PRICE_SCALE: u64 = 1_000_000_000;
