pub mod emit_price;
pub mod initialize_vault;
pub mod stake;
pub mod unstake;

pub use emit_price::*;
pub use initialize_vault::*;
pub use stake::*;
pub use unstake::*;
