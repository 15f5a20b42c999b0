//! Deposit and withdrawal tests.
//!
//! Covers share minting, the exact round trip, partial liquidity from the
//! yield source and the principal/interest breakdown.

mod common;

use common::*;
use prize_savings::events::{DepositEvent, WithdrawEvent, WithdrawalFailedEvent};
use prize_savings::PrizeSavingsError;
use prize_savings::share_ledger::PRICE_PRECISION;
use prize_savings_interface::UNIT;

/// Depositing then immediately withdrawing the same amount returns it exactly
/// and unregisters the receiver.
#[test]
fn test_deposit_withdraw_round_trip() {
    let (mut pool, _clock) = setup_pool();

    let receipt = pool.deposit(&ALICE, 100 * UNIT).expect("deposit should succeed");
    assert_eq!(receipt.amount, 100 * UNIT);
    assert_eq!(pool.registry().len(), 1);
    assert_eq!(pool.ledger().total_assets(), u128::from(100 * UNIT));

    let outcome = pool.withdraw(&ALICE, 100 * UNIT).expect("withdraw should succeed");
    assert!(outcome.is_complete());
    assert_eq!(outcome.released, 100 * UNIT);
    assert_eq!(outcome.shares_burned, receipt.shares_minted);

    assert_eq!(pool.ledger().shares_of(&ALICE), 0);
    assert_eq!(pool.ledger().total_shares(), 0);
    assert!(pool.registry().is_empty());
    assert_eq!(pool.connector().balance, 0);
    assert_eq!(pool.pending_ledgers().total_staked, 0);
}

/// A later depositor can withdraw their deposit after yield has moved the
/// share price, losing at most one base unit to rounding.
#[test]
fn test_round_trip_after_price_change() {
    let (mut pool, _clock) = setup_pool();
    pool.deposit(&ALICE, 100 * UNIT).expect("deposit should succeed");
    pool.connector_mut().accrue(10 * UNIT);
    pool.sync_with_yield_source().expect("sync should succeed");

    let deposit = 37 * UNIT + 12_345;
    pool.deposit(&BOB, deposit).expect("deposit should succeed");

    let balance = pool.user_balance(&BOB).expect("balance should compute");
    assert!(balance.total_balance <= deposit);
    assert!(deposit - balance.total_balance <= 1);

    let outcome = pool
        .withdraw(&BOB, balance.total_balance)
        .expect("withdraw should succeed");
    assert_eq!(outcome.released, balance.total_balance);
    assert_eq!(pool.ledger().shares_of(&BOB), 0);
    assert!(!pool.registry().contains(&BOB));
}

/// Deposits below the minimum or of zero are rejected before any state change.
#[test]
fn test_deposit_validation() {
    let (mut pool, _clock) = setup_pool();

    assert_eq!(pool.deposit(&ALICE, 0), Err(PrizeSavingsError::InvalidAmount));
    assert_eq!(
        pool.deposit(&ALICE, UNIT - 1),
        Err(PrizeSavingsError::BelowMinimumDeposit)
    );
    assert!(pool.registry().is_empty());
    assert!(pool.events().is_empty());
}

/// The yield connector may accept less than offered; only the accepted
/// amount is credited, and accepting nothing is an error.
#[test]
fn test_deposit_capped_by_connector() {
    let (mut pool, _clock) = setup_pool();

    pool.connector_mut().deposit_cap = Some(40 * UNIT);
    let receipt = pool.deposit(&ALICE, 100 * UNIT).expect("deposit should succeed");
    assert_eq!(receipt.amount, 40 * UNIT);
    assert_eq!(pool.account(&ALICE).map(|a| a.principal), Some(40 * UNIT));

    pool.connector_mut().deposit_cap = Some(0);
    assert_eq!(
        pool.deposit(&BOB, 10 * UNIT),
        Err(PrizeSavingsError::DepositNotAccepted)
    );
    assert!(!pool.registry().contains(&BOB));
}

/// Withdrawal validation errors.
#[test]
fn test_withdraw_validation() {
    let (mut pool, _clock) = setup_pool();

    assert_eq!(pool.withdraw(&ALICE, UNIT), Err(PrizeSavingsError::NoShares));

    pool.deposit(&ALICE, 10 * UNIT).expect("deposit should succeed");
    assert_eq!(pool.withdraw(&ALICE, 0), Err(PrizeSavingsError::InvalidAmount));
    assert_eq!(
        pool.withdraw(&ALICE, 10 * UNIT + 1),
        Err(PrizeSavingsError::InsufficientShares)
    );
}

/// Pool with Alice holding shares worth about 1.5 base units each, already
/// reconciled with the yield source.
fn setup_appreciated_pool(minimum_deposit: u64) -> TestPool {
    let mut config = default_config();
    config.minimum_deposit = minimum_deposit;
    let (mut pool, _clock) = setup_pool_with(config);
    pool.deposit(&ALICE, 10 * UNIT).expect("deposit should succeed");
    pool.connector_mut().accrue(10 * UNIT);
    pool.sync_with_yield_source().expect("sync should succeed");
    pool
}

/// A connector that will only take less than the minimum deposit refuses the
/// deposit before any funds move.
#[test]
fn test_connector_capacity_below_minimum() {
    let mut pool = setup_appreciated_pool(UNIT);
    let before = snapshot(&pool);

    pool.connector_mut().deposit_cap = Some(UNIT / 2);
    assert_eq!(
        pool.deposit(&BOB, UNIT),
        Err(PrizeSavingsError::BelowMinimumDeposit)
    );
    assert_eq!(snapshot(&pool), before);
    assert!(pool.account(&BOB).is_none());
}

/// Capacity too small to mint a share is refused before any funds move.
#[test]
fn test_connector_capacity_mints_no_shares() {
    let mut pool = setup_appreciated_pool(1);
    assert!(pool.share_price().expect("share price should compute") > PRICE_PRECISION);
    let before = snapshot(&pool);

    pool.connector_mut().deposit_cap = Some(1);
    assert_eq!(pool.deposit(&BOB, UNIT), Err(PrizeSavingsError::InvalidAmount));
    assert_eq!(snapshot(&pool), before);
    assert!(!pool.registry().contains(&BOB));
}

/// A connector accepting less than it quoted has the uncreditable amount
/// withdrawn again, and the deposit fails with nothing credited.
#[test]
fn test_connector_short_of_quote_is_refunded() {
    let mut pool = setup_appreciated_pool(UNIT);
    let before = snapshot(&pool);

    // Below the minimum deposit
    pool.connector_mut().unquoted_cap = Some(UNIT / 2);
    assert_eq!(
        pool.deposit(&BOB, 2 * UNIT),
        Err(PrizeSavingsError::DepositNotAccepted)
    );
    assert_eq!(snapshot(&pool), before);

    // Too small to mint a share
    let mut pool = setup_appreciated_pool(1);
    let before = snapshot(&pool);
    pool.connector_mut().unquoted_cap = Some(1);
    assert_eq!(
        pool.deposit(&BOB, UNIT),
        Err(PrizeSavingsError::DepositNotAccepted)
    );
    assert_eq!(snapshot(&pool), before);
    assert!(pool.account(&BOB).is_none());
}

/// Rejected deposits and withdrawals leave ledgers, yield source balance,
/// registry and event log untouched.
#[test]
fn test_rejected_operations_leave_state_unchanged() {
    let (mut pool, _clock) = setup_pool();
    pool.deposit(&ALICE, 10 * UNIT).expect("deposit should succeed");
    pool.connector_mut().accrue(3 * UNIT);
    pool.sync_with_yield_source().expect("sync should succeed");
    let before = snapshot(&pool);

    assert_eq!(pool.deposit(&BOB, 0), Err(PrizeSavingsError::InvalidAmount));
    assert_eq!(
        pool.deposit(&BOB, UNIT - 1),
        Err(PrizeSavingsError::BelowMinimumDeposit)
    );
    pool.connector_mut().deposit_cap = Some(0);
    assert_eq!(
        pool.deposit(&BOB, UNIT),
        Err(PrizeSavingsError::DepositNotAccepted)
    );
    pool.connector_mut().deposit_cap = None;

    assert_eq!(pool.withdraw(&BOB, UNIT), Err(PrizeSavingsError::NoShares));
    assert_eq!(pool.withdraw(&ALICE, 0), Err(PrizeSavingsError::InvalidAmount));
    assert_eq!(
        pool.withdraw(&ALICE, 20 * UNIT),
        Err(PrizeSavingsError::InsufficientShares)
    );
    assert_eq!(snapshot(&pool), before);

    pool.critical_ops(&OWNER)
        .expect("owner should hold every role")
        .enable_emergency_mode("yield source audit");
    let before = snapshot(&pool);
    assert_eq!(
        pool.deposit(&BOB, UNIT),
        Err(PrizeSavingsError::DepositsDisabled)
    );
    assert_eq!(snapshot(&pool), before);

    pool.critical_ops(&OWNER)
        .expect("owner should hold every role")
        .pause("incident");
    let before = snapshot(&pool);
    assert_eq!(pool.deposit(&BOB, UNIT), Err(PrizeSavingsError::PoolPaused));
    assert_eq!(pool.withdraw(&ALICE, UNIT), Err(PrizeSavingsError::PoolPaused));
    assert_eq!(snapshot(&pool), before);
}

/// A short yield source releases what it can; the shortfall is reported, not
/// raised, and increments the failure counter.
#[test]
fn test_partial_liquidity() {
    let (mut pool, _clock) = setup_pool();
    pool.deposit(&ALICE, 100 * UNIT).expect("deposit should succeed");

    pool.connector_mut().liquidity = Some(30 * UNIT);
    let outcome = pool.withdraw(&ALICE, 50 * UNIT).expect("withdraw should succeed");
    assert!(!outcome.is_complete());
    assert_eq!(outcome.released, 30 * UNIT);
    assert_eq!(pool.emergency().consecutive_withdraw_failures(), 1);

    let balance = pool.user_balance(&ALICE).expect("balance should compute");
    assert_eq!(balance.total_balance, 70 * UNIT);
    assert_eq!(pool.pending_ledgers().total_staked, 70 * UNIT);

    let failed = pool.events().of_type::<WithdrawalFailedEvent>();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].requested, 50 * UNIT);
    assert_eq!(failed[0].released, 30 * UNIT);
    assert_eq!(failed[0].consecutive_failures, 1);

    let withdrawn = pool.events().of_type::<WithdrawEvent>();
    assert_eq!(withdrawn.len(), 1);
    assert_eq!(withdrawn[0].amount, 30 * UNIT);

    pool.connector_mut().liquidity = None;
    let outcome = pool.withdraw(&ALICE, 10 * UNIT).expect("withdraw should succeed");
    assert!(outcome.is_complete());
    assert_eq!(pool.emergency().consecutive_withdraw_failures(), 0);
}

/// An illiquid yield source releases nothing; shares are untouched.
#[test]
fn test_zero_liquidity() {
    let (mut pool, _clock) = setup_pool();
    let receipt = pool.deposit(&ALICE, 100 * UNIT).expect("deposit should succeed");

    pool.connector_mut().liquidity = Some(0);
    let outcome = pool.withdraw(&ALICE, 100 * UNIT).expect("withdraw should succeed");
    assert_eq!(outcome.released, 0);
    assert_eq!(outcome.shares_burned, 0);
    assert_eq!(pool.ledger().shares_of(&ALICE), receipt.shares_minted);
    assert!(pool.registry().contains(&ALICE));
    assert!(pool.events().of_type::<WithdrawEvent>().is_empty());
}

/// Withdrawals debit accrued interest before principal.
#[test]
fn test_interest_debited_before_principal() {
    let (mut pool, _clock) = setup_pool();
    pool.deposit(&ALICE, 100 * UNIT).expect("deposit should succeed");
    pool.connector_mut().accrue(10 * UNIT);
    pool.sync_with_yield_source().expect("sync should succeed");

    let before = pool.user_balance(&ALICE).expect("balance should compute");
    assert_eq!(before.principal, 100 * UNIT);
    assert!(before.pending_interest > 4 * UNIT);

    pool.withdraw(&ALICE, UNIT).expect("withdraw should succeed");
    let after = pool.user_balance(&ALICE).expect("balance should compute");
    assert_eq!(after.principal, 100 * UNIT);
    assert!(after.pending_interest < before.pending_interest);

    pool.withdraw(&ALICE, 10 * UNIT).expect("withdraw should succeed");
    let last = pool.user_balance(&ALICE).expect("balance should compute");
    assert!(last.principal < 100 * UNIT);
    assert!(last.principal > 90 * UNIT);
}

/// Deposit events carry the credited amount and minted shares.
#[test]
fn test_deposit_event() {
    let (mut pool, clock) = setup_pool();
    let receipt = pool.deposit(&ALICE, 5 * UNIT).expect("deposit should succeed");

    let events = pool.events().of_type::<DepositEvent>();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].receiver, ALICE);
    assert_eq!(events[0].amount, 5 * UNIT);
    assert_eq!(events[0].shares_minted, receipt.shares_minted);
    assert_eq!(events[0].timestamp, clock.timestamp());
}

/// `preview_deposit` matches what a deposit mints.
#[test]
fn test_preview_deposit() {
    let (mut pool, _clock) = setup_pool();
    pool.deposit(&ALICE, 100 * UNIT).expect("deposit should succeed");
    pool.connector_mut().accrue(3 * UNIT);
    pool.sync_with_yield_source().expect("sync should succeed");

    let preview = pool.preview_deposit(7 * UNIT).expect("preview should succeed");
    let receipt = pool.deposit(&BOB, 7 * UNIT).expect("deposit should succeed");
    assert_eq!(preview, receipt.shares_minted);
}
