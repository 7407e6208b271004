#![no_main]

use anchor_xtoken_staking::error::StakingError;
use arbitrary::Arbitrary;
use fuzz_helpers::*;
use libfuzzer_sys::fuzz_target;

/// Fuzzable input for the unstake instruction
#[derive(Debug, Clone, Arbitrary)]
struct UnstakeFuzzInput {
    /// Underlying staked before unstaking
    stake_amount: u64,
    /// Shares to unstake, taken modulo the user's share balance + 1
    unstake_shares: u64,
    decimals: u8,
    /// Reward minted into the stake vault between stake and unstake
    reward_amount: u64,
}

async fn fuzz_unstake_once(input: UnstakeFuzzInput) -> FuzzResult<()> {
    let stake_amount = input.stake_amount.max(1);
    let decimals = input.decimals % 19;
    let reward_amount = input.reward_amount % 1_000_000_000;

    let (mut env, setup) = match setup_complete_environment(stake_amount, decimals).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Setup failed: {}", e);
            return Ok(());
        }
    };

    if stake(&mut env.context, &setup.vault, &setup.user, stake_amount)
        .await
        .is_err()
    {
        return Ok(());
    }

    if reward_amount > 0 {
        let _ = mint_tokens_to(
            &mut env.context,
            &setup.underlying.mint,
            &setup.underlying.mint_authority,
            &setup.vault.stake_vault,
            reward_amount,
        )
        .await;
    }

    let user_shares_before =
        get_token_balance(&mut env.context, &setup.user.x_token_account).await?;
    let shares = input.unstake_shares % user_shares_before.saturating_add(1);
    if shares == 0 {
        return Ok(());
    }

    let (custody_before, supply_before) = get_pool_snapshot(&mut env.context, &setup.vault).await?;
    let user_balance_before =
        get_token_balance(&mut env.context, &setup.user.underlying_token_account).await?;

    let result = unstake(&mut env.context, &setup.vault, &setup.user, shares).await;

    match result {
        Ok(()) => {
            let (custody_after, supply_after) =
                get_pool_snapshot(&mut env.context, &setup.vault).await?;
            let user_balance_after =
                get_token_balance(&mut env.context, &setup.user.underlying_token_account).await?;
            let user_shares_after =
                get_token_balance(&mut env.context, &setup.user.x_token_account).await?;

            let redeemed = user_balance_after - user_balance_before;

            assert_eq!(
                custody_before + user_balance_before,
                custody_after + user_balance_after,
                "Token conservation violated"
            );
            assert_eq!(supply_after, supply_before - shares);
            assert_eq!(user_shares_after, user_shares_before - shares);

            let expected = shares as u128 * custody_before as u128 / supply_before as u128;
            assert_eq!(
                redeemed as u128, expected,
                "Redeemed {}, expected {} (shares={}, custody={}, supply={})",
                redeemed, expected, shares, custody_before, supply_before
            );
            assert!(redeemed <= custody_before);

            // Remaining holders never lose value
            if supply_after > 0 {
                let before = custody_before as u128 * supply_after as u128;
                let after = custody_after as u128 * supply_before as u128;
                assert!(after >= before, "Share price decreased after unstake");
            } else {
                assert_eq!(custody_after, 0, "Last holder out must drain the vault");
            }

            println!(
                "PASS unstake={} redeemed={} custody {}->{} supply {}->{}",
                shares, redeemed, custody_before, custody_after, supply_before, supply_after
            );
        }
        Err(e) => {
            println!("Unstake failed: shares={}, error={:?}", shares, e);

            if !is_staking_error(&e, StakingError::ZeroUnderlyingRedeemed) {
                panic!("Unexpected error during unstake: {:?}\nInput: {:?}", e, input);
            }

            let (custody_after, supply_after) =
                get_pool_snapshot(&mut env.context, &setup.vault).await?;
            assert_eq!((custody_after, supply_after), (custody_before, supply_before));
        }
    }

    Ok(())
}

fuzz_target!(|input: UnstakeFuzzInput| {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();
    runtime.block_on(async {
        if let Err(e) = fuzz_unstake_once(input).await {
            eprintln!("Fuzz iteration failed: {}", e);
        }
    });
});
