use anchor_lang::AccountDeserialize;
use anchor_lang::InstructionData;
use anchor_lang::ToAccountMetas;
use anchor_xtoken_staking::authority::{derive_stake_vault, derive_vault, derive_x_mint};
use anchor_xtoken_staking::error::StakingError;
use anchor_xtoken_staking::state::Vault;
use solana_program_test::*;
use solana_sdk::{
    instruction::{Instruction, InstructionError},
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::{Transaction, TransactionError},
};
use spl_token::instruction as token_instruction;

pub use solana_program_test::{BanksClientError, ProgramTestContext};

pub type FuzzResult<T> = std::result::Result<T, Box<dyn std::error::Error>>;

const MINT_LEN: usize = 82;
const TOKEN_ACCOUNT_LEN: usize = 165;

/// Test environment with program loaded
pub struct FuzzTestEnv {
    pub program_id: Pubkey,
    pub context: ProgramTestContext,
}

/// Underlying token mint accounts
#[derive(Debug)]
pub struct UnderlyingMintAccounts {
    pub mint: Pubkey,
    pub mint_authority: Keypair,
    pub decimals: u8,
}

/// Vault-specific accounts
#[derive(Debug, Clone)]
pub struct VaultAccounts {
    pub vault: Pubkey,
    pub underlying_mint: Pubkey,
    pub x_mint: Pubkey,
    pub x_mint_bump: u8,
    pub stake_vault: Pubkey,
}

/// A staker's token accounts
#[derive(Debug)]
pub struct UserAccounts {
    pub owner: Keypair,
    pub underlying_token_account: Pubkey,
    pub x_token_account: Pubkey,
}

/// Complete setup with all accounts
pub struct CompleteSetup {
    pub underlying: UnderlyingMintAccounts,
    pub vault: VaultAccounts,
    pub user: UserAccounts,
}

// ============================================================================
// Core Setup Functions
// ============================================================================

/// Starts a program-test bank with the compiled staking program loaded
/// from `target/deploy` (or `BPF_OUT_DIR`).
pub async fn setup_program_test() -> FuzzTestEnv {
    let program_id = anchor_xtoken_staking::id();
    let mut program_test = ProgramTest::new("anchor_xtoken_staking", program_id, None);
    program_test.prefer_bpf(true);

    let context = program_test.start_with_context().await;

    FuzzTestEnv {
        program_id,
        context,
    }
}

/// Signs with `payer` plus any extra signers and processes the instructions
pub async fn process_instructions(
    context: &mut ProgramTestContext,
    instructions: &[Instruction],
    payer: &Keypair,
    extra_signers: &[&Keypair],
) -> Result<(), BanksClientError> {
    let mut signers = vec![payer];
    signers.extend_from_slice(extra_signers);

    let tx = Transaction::new_signed_with_payer(
        instructions,
        Some(&payer.pubkey()),
        &signers[..],
        context.last_blockhash,
    );

    context.banks_client.process_transaction(tx).await
}

/// Transfers lamports from the bank payer
pub async fn fund_account(
    context: &mut ProgramTestContext,
    account: &Pubkey,
    lamports: u64,
) -> FuzzResult<()> {
    let ix = solana_sdk::system_instruction::transfer(&context.payer.pubkey(), account, lamports);

    let tx = Transaction::new_signed_with_payer(
        &[ix],
        Some(&context.payer.pubkey()),
        &[&context.payer],
        context.last_blockhash,
    );

    context.banks_client.process_transaction(tx).await?;
    Ok(())
}

/// Creates a funded keypair (1 SOL above rent)
pub async fn new_funded_keypair(context: &mut ProgramTestContext) -> FuzzResult<Keypair> {
    let keypair = Keypair::new();
    let rent = context.banks_client.get_rent().await?;
    fund_account(
        context,
        &keypair.pubkey(),
        rent.minimum_balance(0) + 1_000_000_000,
    )
    .await?;
    Ok(keypair)
}

/// Creates a new SPL token mint to serve as underlying asset
pub async fn setup_underlying_mint(
    context: &mut ProgramTestContext,
    decimals: u8,
) -> FuzzResult<UnderlyingMintAccounts> {
    let mint_authority = Keypair::new();
    let mint_keypair = Keypair::new();
    let mint = mint_keypair.pubkey();

    let rent = context.banks_client.get_rent().await?;

    let create_account_ix = solana_sdk::system_instruction::create_account(
        &context.payer.pubkey(),
        &mint,
        rent.minimum_balance(MINT_LEN),
        MINT_LEN as u64,
        &spl_token::id(),
    );

    let init_mint_ix = token_instruction::initialize_mint(
        &spl_token::id(),
        &mint,
        &mint_authority.pubkey(),
        None,
        decimals,
    )?;

    let tx = Transaction::new_signed_with_payer(
        &[create_account_ix, init_mint_ix],
        Some(&context.payer.pubkey()),
        &[&context.payer, &mint_keypair],
        context.last_blockhash,
    );

    context.banks_client.process_transaction(tx).await?;

    Ok(UnderlyingMintAccounts {
        mint,
        mint_authority,
        decimals,
    })
}

/// Creates a plain Token-2022 mint (no extensions)
pub async fn setup_token_2022_mint(
    context: &mut ProgramTestContext,
    decimals: u8,
) -> FuzzResult<UnderlyingMintAccounts> {
    use anchor_spl::token_2022::spl_token_2022;

    let mint_authority = Keypair::new();
    let mint_keypair = Keypair::new();
    let mint = mint_keypair.pubkey();

    let rent = context.banks_client.get_rent().await?;

    let create_account_ix = solana_sdk::system_instruction::create_account(
        &context.payer.pubkey(),
        &mint,
        rent.minimum_balance(MINT_LEN),
        MINT_LEN as u64,
        &spl_token_2022::id(),
    );

    let init_mint_ix = spl_token_2022::instruction::initialize_mint2(
        &spl_token_2022::id(),
        &mint,
        &mint_authority.pubkey(),
        None,
        decimals,
    )?;

    let tx = Transaction::new_signed_with_payer(
        &[create_account_ix, init_mint_ix],
        Some(&context.payer.pubkey()),
        &[&context.payer, &mint_keypair],
        context.last_blockhash,
    );

    context.banks_client.process_transaction(tx).await?;

    Ok(UnderlyingMintAccounts {
        mint,
        mint_authority,
        decimals,
    })
}

/// Derives every vault account for an underlying mint
pub fn vault_accounts(underlying_mint: &Pubkey) -> FuzzResult<VaultAccounts> {
    let (vault, _) = derive_vault(underlying_mint).map_err(|e| e.to_string())?;
    let (x_mint, x_mint_bump) = derive_x_mint(underlying_mint).map_err(|e| e.to_string())?;
    let (stake_vault, _) = derive_stake_vault(underlying_mint).map_err(|e| e.to_string())?;

    Ok(VaultAccounts {
        vault,
        underlying_mint: *underlying_mint,
        x_mint,
        x_mint_bump,
        stake_vault,
    })
}

pub fn initialize_vault_ix(vault: &VaultAccounts, payer: &Pubkey) -> Instruction {
    let accounts = anchor_xtoken_staking::accounts::InitializeVault {
        vault: vault.vault,
        underlying_mint: vault.underlying_mint,
        x_mint: vault.x_mint,
        stake_vault: vault.stake_vault,
        payer: *payer,
        system_program: solana_sdk::system_program::ID,
        token_program: spl_token::id(),
    };

    Instruction {
        program_id: anchor_xtoken_staking::id(),
        accounts: accounts.to_account_metas(None),
        data: anchor_xtoken_staking::instruction::InitializeVault {}.data(),
    }
}

pub fn stake_ix(vault: &VaultAccounts, user: &UserAccounts, x_mint_bump: u8, amount: u64) -> Instruction {
    let accounts = anchor_xtoken_staking::accounts::Stake {
        vault: vault.vault,
        underlying_mint: vault.underlying_mint,
        x_mint: vault.x_mint,
        stake_vault: vault.stake_vault,
        staker_underlying_account: user.underlying_token_account,
        staker_x_account: user.x_token_account,
        staker: user.owner.pubkey(),
        token_program: spl_token::id(),
    };

    Instruction {
        program_id: anchor_xtoken_staking::id(),
        accounts: accounts.to_account_metas(None),
        data: anchor_xtoken_staking::instruction::Stake {
            x_mint_bump,
            amount,
        }
        .data(),
    }
}

pub fn unstake_ix(vault: &VaultAccounts, user: &UserAccounts, x_mint_bump: u8, amount: u64) -> Instruction {
    let accounts = anchor_xtoken_staking::accounts::Unstake {
        vault: vault.vault,
        underlying_mint: vault.underlying_mint,
        x_mint: vault.x_mint,
        stake_vault: vault.stake_vault,
        staker_x_account: user.x_token_account,
        staker_underlying_account: user.underlying_token_account,
        staker: user.owner.pubkey(),
        token_program: spl_token::id(),
    };

    Instruction {
        program_id: anchor_xtoken_staking::id(),
        accounts: accounts.to_account_metas(None),
        data: anchor_xtoken_staking::instruction::Unstake {
            x_mint_bump,
            amount,
        }
        .data(),
    }
}

pub fn emit_price_ix(vault: &VaultAccounts) -> Instruction {
    let accounts = anchor_xtoken_staking::accounts::EmitPrice {
        vault: vault.vault,
        x_mint: vault.x_mint,
        stake_vault: vault.stake_vault,
    };

    Instruction {
        program_id: anchor_xtoken_staking::id(),
        accounts: accounts.to_account_metas(None),
        data: anchor_xtoken_staking::instruction::EmitPrice {}.data(),
    }
}

/// Initializes a vault for a given underlying mint
pub async fn setup_vault(
    context: &mut ProgramTestContext,
    underlying_mint: &Pubkey,
    payer: &Keypair,
) -> FuzzResult<VaultAccounts> {
    let vault = vault_accounts(underlying_mint)?;
    let ix = initialize_vault_ix(&vault, &payer.pubkey());

    process_instructions(context, &[ix], payer, &[]).await?;

    Ok(vault)
}

/// Creates underlying and x-token accounts for a new funded staker
pub async fn setup_user_accounts(
    context: &mut ProgramTestContext,
    underlying_mint: &Pubkey,
    x_mint: &Pubkey,
) -> FuzzResult<UserAccounts> {
    let owner = new_funded_keypair(context).await?;
    let rent = context.banks_client.get_rent().await?;

    let underlying_token_account = Keypair::new();
    let create_underlying_ix = solana_sdk::system_instruction::create_account(
        &context.payer.pubkey(),
        &underlying_token_account.pubkey(),
        rent.minimum_balance(TOKEN_ACCOUNT_LEN),
        TOKEN_ACCOUNT_LEN as u64,
        &spl_token::id(),
    );

    let init_underlying_ix = token_instruction::initialize_account(
        &spl_token::id(),
        &underlying_token_account.pubkey(),
        underlying_mint,
        &owner.pubkey(),
    )?;

    let x_token_account = Keypair::new();
    let create_x_ix = solana_sdk::system_instruction::create_account(
        &context.payer.pubkey(),
        &x_token_account.pubkey(),
        rent.minimum_balance(TOKEN_ACCOUNT_LEN),
        TOKEN_ACCOUNT_LEN as u64,
        &spl_token::id(),
    );

    let init_x_ix = token_instruction::initialize_account(
        &spl_token::id(),
        &x_token_account.pubkey(),
        x_mint,
        &owner.pubkey(),
    )?;

    let tx = Transaction::new_signed_with_payer(
        &[create_underlying_ix, init_underlying_ix, create_x_ix, init_x_ix],
        Some(&context.payer.pubkey()),
        &[&context.payer, &underlying_token_account, &x_token_account],
        context.last_blockhash,
    );

    context.banks_client.process_transaction(tx).await?;

    Ok(UserAccounts {
        owner,
        underlying_token_account: underlying_token_account.pubkey(),
        x_token_account: x_token_account.pubkey(),
    })
}

/// Mints underlying tokens to any token account. Pointed at the stake
/// vault this is a reward deposit: custody grows, supply does not.
pub async fn mint_tokens_to(
    context: &mut ProgramTestContext,
    mint: &Pubkey,
    mint_authority: &Keypair,
    destination: &Pubkey,
    amount: u64,
) -> FuzzResult<()> {
    let mint_to_ix = token_instruction::mint_to(
        &spl_token::id(),
        mint,
        destination,
        &mint_authority.pubkey(),
        &[],
        amount,
    )?;

    let tx = Transaction::new_signed_with_payer(
        &[mint_to_ix],
        Some(&context.payer.pubkey()),
        &[&context.payer, mint_authority],
        context.last_blockhash,
    );

    context.banks_client.process_transaction(tx).await?;

    Ok(())
}

/// Sets up an underlying mint, its vault and one staker holding
/// `initial_user_balance` underlying tokens
pub async fn setup_complete_environment(
    initial_user_balance: u64,
    decimals: u8,
) -> FuzzResult<(FuzzTestEnv, CompleteSetup)> {
    let mut env = setup_program_test().await;

    let underlying = setup_underlying_mint(&mut env.context, decimals).await?;

    let initializer = new_funded_keypair(&mut env.context).await?;
    let vault = setup_vault(&mut env.context, &underlying.mint, &initializer).await?;

    let user = setup_user_accounts(&mut env.context, &underlying.mint, &vault.x_mint).await?;

    if initial_user_balance > 0 {
        mint_tokens_to(
            &mut env.context,
            &underlying.mint,
            &underlying.mint_authority,
            &user.underlying_token_account,
            initial_user_balance,
        )
        .await?;
    }

    let setup = CompleteSetup {
        underlying,
        vault,
        user,
    };

    Ok((env, setup))
}

pub async fn stake(
    context: &mut ProgramTestContext,
    vault: &VaultAccounts,
    user: &UserAccounts,
    amount: u64,
) -> Result<(), BanksClientError> {
    let ix = stake_ix(vault, user, vault.x_mint_bump, amount);
    process_instructions(context, &[ix], &user.owner, &[]).await
}

pub async fn unstake(
    context: &mut ProgramTestContext,
    vault: &VaultAccounts,
    user: &UserAccounts,
    amount: u64,
) -> Result<(), BanksClientError> {
    let ix = unstake_ix(vault, user, vault.x_mint_bump, amount);
    process_instructions(context, &[ix], &user.owner, &[]).await
}

// ============================================================================
// Error Helpers
// ============================================================================

/// Program error number as reported in `InstructionError::Custom`
pub fn staking_error_code(error: StakingError) -> u32 {
    anchor_lang::error::ERROR_CODE_OFFSET + error as u32
}

/// Custom error number carried by a failed transaction, if any
pub fn custom_error_code(error: &BanksClientError) -> Option<u32> {
    let tx_error = match error {
        BanksClientError::TransactionError(err) => err,
        BanksClientError::SimulationError { err, .. } => err,
        _ => return None,
    };

    match tx_error {
        TransactionError::InstructionError(_, InstructionError::Custom(code)) => Some(*code),
        _ => None,
    }
}

pub fn is_staking_error(error: &BanksClientError, expected: StakingError) -> bool {
    custom_error_code(error) == Some(staking_error_code(expected))
}

// ============================================================================
// Account State Verification Helpers
// ============================================================================

/// Fetch and return vault state
pub async fn get_vault_state(context: &mut ProgramTestContext, vault: &Pubkey) -> FuzzResult<Vault> {
    let account = context
        .banks_client
        .get_account(*vault)
        .await?
        .ok_or("Vault account not found")?;

    let vault_data = Vault::try_deserialize(&mut account.data.as_ref())?;
    Ok(vault_data)
}

/// Get token account balance
pub async fn get_token_balance(context: &mut ProgramTestContext, account: &Pubkey) -> FuzzResult<u64> {
    let account_data = context
        .banks_client
        .get_account(*account)
        .await?
        .ok_or("Token account not found")?;

    // Token account layout: amount is at offset 64 (u64)
    if account_data.data.len() < 72 {
        return Err("Invalid token account data".into());
    }

    let amount = u64::from_le_bytes(
        account_data.data[64..72]
            .try_into()
            .map_err(|_| "Failed to parse amount")?,
    );

    Ok(amount)
}

/// Get mint supply
pub async fn get_mint_supply(context: &mut ProgramTestContext, mint: &Pubkey) -> FuzzResult<u64> {
    let account = context
        .banks_client
        .get_account(*mint)
        .await?
        .ok_or("Mint account not found")?;

    // Mint layout: supply is at offset 36 (u64)
    if account.data.len() < 44 {
        return Err("Invalid mint account data".into());
    }

    let supply = u64::from_le_bytes(
        account.data[36..44]
            .try_into()
            .map_err(|_| "Failed to parse supply")?,
    );

    Ok(supply)
}

/// Custody balance and share supply, the inputs of every share calculation
pub async fn get_pool_snapshot(
    context: &mut ProgramTestContext,
    vault: &VaultAccounts,
) -> FuzzResult<(u64, u64)> {
    let custody = get_token_balance(context, &vault.stake_vault).await?;
    let supply = get_mint_supply(context, &vault.x_mint).await?;
    Ok((custody, supply))
}
