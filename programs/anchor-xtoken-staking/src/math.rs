//! Share accounting.
//!
//! Every function here works on the pre-operation snapshot of the stake
//! vault balance and the x-mint supply. Division always floors, so rounding
//! dust stays in the pool with the existing holders.

use crate::constants::PRICE_SCALE;
use crate::error::StakingError;

/// `floor(a * b / c)` with a `u128` intermediate.
fn mul_div_floor(a: u64, b: u64, c: u64) -> Result<u64, StakingError> {
    let result = (a as u128)
        .checked_mul(b as u128)
        .ok_or(StakingError::MathOverflow)?
        .checked_div(c as u128)
        .ok_or(StakingError::MathOverflow)?;

    u64::try_from(result).map_err(|_| StakingError::MathOverflow)
}

/// Shares minted for a deposit of `deposit_amount` underlying tokens.
///
/// With no shares outstanding the vault bootstraps at 1:1, and any residual
/// custody balance goes to that first staker.
pub fn shares_for_stake(
    deposit_amount: u64,
    custody_balance: u64,
    share_supply: u64,
) -> Result<u64, StakingError> {
    if share_supply == 0 {
        return Ok(deposit_amount);
    }
    if custody_balance == 0 {
        return Err(StakingError::EmptyCustody);
    }

    mul_div_floor(deposit_amount, share_supply, custody_balance)
}

/// Underlying tokens paid out for burning `share_amount` shares.
pub fn underlying_for_unstake(
    share_amount: u64,
    custody_balance: u64,
    share_supply: u64,
) -> Result<u64, StakingError> {
    if share_supply == 0 {
        return Err(StakingError::NoSharesOutstanding);
    }
    if custody_balance == 0 {
        return Err(StakingError::EmptyCustody);
    }
    if share_amount > share_supply {
        return Err(StakingError::ExceedsShareSupply);
    }

    // share_amount <= share_supply keeps the result <= custody_balance
    mul_div_floor(share_amount, custody_balance, share_supply)
}

/// Underlying per share scaled by `PRICE_SCALE`. Reports parity when no
/// shares exist, which is the rate the next stake will get.
pub fn price_per_share_e9(custody_balance: u64, share_supply: u64) -> Result<u64, StakingError> {
    if share_supply == 0 {
        return Ok(PRICE_SCALE);
    }

    let scaled = (custody_balance as u128)
        .checked_mul(PRICE_SCALE as u128)
        .ok_or(StakingError::MathOverflow)?
        / share_supply as u128;

    u64::try_from(scaled).map_err(|_| StakingError::MathOverflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_mints_at_parity() {
        assert_eq!(shares_for_stake(1_000, 0, 0).unwrap(), 1_000);
        assert_eq!(shares_for_stake(1, 0, 0).unwrap(), 1);
    }

    #[test]
    fn bootstrap_ignores_residual_custody() {
        // leftover reward dust after everyone unstaked
        assert_eq!(shares_for_stake(500, 7, 0).unwrap(), 500);
    }

    #[test]
    fn stake_dilution_fixture() {
        assert_eq!(shares_for_stake(75, 300, 200).unwrap(), 50);
    }

    #[test]
    fn stake_rounds_down() {
        // 10 * 3 / 7 = 4.28...
        assert_eq!(shares_for_stake(10, 7, 3).unwrap(), 4);
        // tiny deposit against an expensive share
        assert_eq!(shares_for_stake(1, 1_000, 1).unwrap(), 0);
    }

    #[test]
    fn zero_deposit_is_zero_shares() {
        assert_eq!(shares_for_stake(0, 300, 200).unwrap(), 0);
        assert_eq!(shares_for_stake(0, 0, 0).unwrap(), 0);
    }

    #[test]
    fn stake_against_empty_custody_is_rejected() {
        assert!(matches!(
            shares_for_stake(10, 0, 5),
            Err(StakingError::EmptyCustody)
        ));
    }

    #[test]
    fn unstake_proportionality_fixture() {
        assert_eq!(underlying_for_unstake(100, 400, 250).unwrap(), 160);
    }

    #[test]
    fn unstake_rounds_down() {
        // 1 * 10 / 3 = 3.33...
        assert_eq!(underlying_for_unstake(1, 10, 3).unwrap(), 3);
        assert_eq!(underlying_for_unstake(1, 2, 3).unwrap(), 0);
    }

    #[test]
    fn unstake_all_shares_drains_custody() {
        assert_eq!(underlying_for_unstake(250, 400, 250).unwrap(), 400);
    }

    #[test]
    fn unstake_with_no_supply_is_rejected() {
        assert!(matches!(
            underlying_for_unstake(1, 100, 0),
            Err(StakingError::NoSharesOutstanding)
        ));
    }

    #[test]
    fn unstake_against_empty_custody_is_rejected() {
        assert!(matches!(
            underlying_for_unstake(1, 0, 10),
            Err(StakingError::EmptyCustody)
        ));
    }

    #[test]
    fn unstake_more_than_supply_is_rejected() {
        assert!(matches!(
            underlying_for_unstake(11, 100, 10),
            Err(StakingError::ExceedsShareSupply)
        ));
    }

    #[test]
    fn large_values_do_not_overflow_intermediate() {
        let max = u64::MAX;
        assert_eq!(shares_for_stake(max, max, max).unwrap(), max);
        assert_eq!(underlying_for_unstake(max, max, max).unwrap(), max);
    }

    #[test]
    fn result_above_u64_is_an_overflow() {
        // cheap shares: 2^63 deposit at 1 underlying per 4 shares
        assert!(matches!(
            shares_for_stake(1 << 63, 1, 4),
            Err(StakingError::MathOverflow)
        ));
    }

    #[test]
    fn price_reporting() {
        assert_eq!(price_per_share_e9(0, 0).unwrap(), PRICE_SCALE);
        assert_eq!(price_per_share_e9(300, 200).unwrap(), 1_500_000_000);
        assert_eq!(price_per_share_e9(1, 3).unwrap(), 333_333_333);
    }

    /// In-memory pool driving the accounting functions the same way the
    /// instruction handlers drive the token program.
    #[derive(Debug, Default, Clone)]
    struct Pool {
        custody: u64,
        supply: u64,
    }

    impl Pool {
        fn stake(&mut self, amount: u64) -> u64 {
            let shares = shares_for_stake(amount, self.custody, self.supply).unwrap();
            self.custody += amount;
            self.supply += shares;
            shares
        }

        fn unstake(&mut self, shares: u64) -> u64 {
            let out = underlying_for_unstake(shares, self.custody, self.supply).unwrap();
            self.supply -= shares;
            self.custody -= out;
            out
        }

        fn reward(&mut self, amount: u64) {
            self.custody += amount;
        }

        fn price(&self) -> u64 {
            price_per_share_e9(self.custody, self.supply).unwrap()
        }
    }

    #[test]
    fn reward_strictly_raises_price() {
        let mut pool = Pool::default();
        pool.stake(1_000);
        let before = pool.price();
        pool.reward(1);
        assert!(pool.price() > before);
    }

    #[test]
    fn round_trip_without_rewards_never_gains() {
        for (first, second) in [(1_000u64, 333u64), (7, 3), (1_000_000, 1), (5, 5)] {
            let mut pool = Pool::default();
            pool.stake(first);
            pool.reward(first / 3);

            let shares = pool.stake(second);
            let back = pool.unstake(shares);
            assert!(back <= second, "staked {second}, got back {back}");
        }
    }

    #[test]
    fn price_never_decreases_across_stake_and_unstake() {
        let mut pool = Pool::default();
        pool.stake(1_000);
        pool.reward(337);

        let mut last = pool.price();
        for amount in [13u64, 1_000, 7, 250_000, 3] {
            pool.stake(amount);
            assert!(pool.price() >= last);
            last = pool.price();
        }
        for shares in [1u64, 10, 999] {
            pool.unstake(shares);
            assert!(pool.price() >= last);
            last = pool.price();
        }
    }

    #[test]
    fn reward_before_stake_goes_to_existing_holders() {
        let mut early = Pool::default();
        early.stake(100);
        early.reward(100);
        let late_shares = early.stake(100);

        let mut late = Pool::default();
        late.stake(100);
        let late_shares_no_reward = late.stake(100);
        late.reward(100);

        assert_eq!(late_shares, 50);
        assert_eq!(late_shares_no_reward, 100);
    }

    #[test]
    fn full_unstake_leaves_dust_for_next_bootstrap() {
        let mut pool = Pool::default();
        let a = pool.stake(3);
        let b = pool.stake(4);
        pool.reward(1);

        // the last holder out takes everything left
        assert_eq!(pool.unstake(a), 3);
        assert_eq!(pool.unstake(b), 5);
        assert_eq!((pool.custody, pool.supply), (0, 0));

        // a reward landing with no holders is stranded
        pool.reward(5);
        let dust = pool.custody;
        assert_eq!(pool.price(), PRICE_SCALE);

        // no shares, nothing can be redeemed
        assert!(matches!(
            underlying_for_unstake(1, pool.custody, pool.supply),
            Err(StakingError::NoSharesOutstanding)
        ));

        // next staker bootstraps 1:1 and inherits the dust
        let shares = pool.stake(10);
        assert_eq!(shares, 10);
        assert_eq!(pool.unstake(shares), 10 + dust);
    }

    #[test]
    fn pools_are_independent() {
        let mut a = Pool::default();
        let mut b = Pool::default();
        a.stake(1_000);
        b.stake(1_000);
        a.reward(500);

        assert_eq!(b.price(), PRICE_SCALE);
        assert_eq!(b.stake(100), 100);
        assert_eq!(a.stake(150), 100);
    }
}
