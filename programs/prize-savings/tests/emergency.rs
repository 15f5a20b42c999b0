//! Emergency state tests.
//!
//! Covers automatic trigger and recovery from the health score, manual
//! states, and the gating each state applies.

mod common;

use common::*;
use prize_savings::events::EmergencyStateChangedEvent;
use prize_savings::{EmergencyConfig, EmergencyState, PrizeSavingsError};
use prize_savings_interface::UNIT;

/// Drive `failures` short withdrawals against an illiquid yield source.
fn fail_withdrawals(pool: &mut TestPool, failures: u32) {
    pool.connector_mut().liquidity = Some(0);
    for _ in 0..failures {
        let outcome = pool.withdraw(&ALICE, UNIT).expect("withdraw should succeed");
        assert_eq!(outcome.released, 0);
    }
}

/// Repeated withdrawal failures trigger emergency mode on the next
/// operation; a healthy score afterwards recovers automatically.
#[test]
fn test_failures_trigger_and_recover() {
    let (mut pool, _clock) = setup_pool();
    pool.deposit(&ALICE, 100 * UNIT).expect("deposit should succeed");

    fail_withdrawals(&mut pool, 3);
    assert_eq!(pool.emergency().state(), EmergencyState::Normal);
    assert_eq!(pool.emergency_info().health_bps, 5_000 + 5_000 / 4);

    pool.sync_with_yield_source().expect("sync should succeed");
    let info = pool.emergency_info();
    assert_eq!(info.state, EmergencyState::EmergencyMode);
    assert!(info.auto_triggered);
    assert!(info.reason.is_some());

    assert_eq!(
        pool.deposit(&BOB, 10 * UNIT),
        Err(PrizeSavingsError::DepositsDisabled)
    );

    // Withdrawals stay open; a full one resets the failure count
    pool.connector_mut().liquidity = None;
    pool.withdraw(&ALICE, UNIT).expect("withdraw should succeed");
    assert_eq!(pool.emergency().state(), EmergencyState::EmergencyMode);

    pool.sync_with_yield_source().expect("sync should succeed");
    assert_eq!(pool.emergency().state(), EmergencyState::Normal);
    assert_eq!(pool.emergency().consecutive_withdraw_failures(), 0);

    let transitions = pool.events().of_type::<EmergencyStateChangedEvent>();
    assert_eq!(transitions.len(), 2);
    assert_eq!(transitions[0].to, EmergencyState::EmergencyMode as u8);
    assert_eq!(transitions[0].auto, 1);
    assert_eq!(transitions[1].to, EmergencyState::Normal as u8);
}

/// A mediocre score recovers only once the maximum duration has elapsed.
#[test]
fn test_time_based_recovery() {
    let (mut pool, clock) = setup_pool();
    pool.deposit(&ALICE, 100 * UNIT).expect("deposit should succeed");
    fail_withdrawals(&mut pool, 3);
    pool.sync_with_yield_source().expect("sync should succeed");
    assert_eq!(pool.emergency().state(), EmergencyState::EmergencyMode);

    clock.advance(86_400 - 1);
    pool.sync_with_yield_source().expect("sync should succeed");
    assert_eq!(pool.emergency().state(), EmergencyState::EmergencyMode);

    clock.advance(1);
    pool.sync_with_yield_source().expect("sync should succeed");
    assert_eq!(pool.emergency().state(), EmergencyState::Normal);
}

/// A yield source reporting too little triggers emergency mode before the
/// loss is absorbed; once absorbed, health recovers on the next operation.
#[test]
fn test_balance_shortfall_trigger() {
    let mut config = default_config();
    config.emergency.min_yield_source_health_bps = 6_000;
    let (mut pool, _clock) = setup_pool_with(config);
    pool.deposit(&ALICE, 100 * UNIT).expect("deposit should succeed");

    pool.connector_mut().lose(10 * UNIT);
    pool.sync_with_yield_source().expect("sync should succeed");
    assert_eq!(pool.emergency().state(), EmergencyState::EmergencyMode);
    assert_eq!(pool.pending_ledgers().total_staked, 90 * UNIT);

    pool.sync_with_yield_source().expect("sync should succeed");
    assert_eq!(pool.emergency().state(), EmergencyState::Normal);
}

/// Manually entered states never recover on their own.
#[test]
fn test_manual_emergency_mode() {
    let (mut pool, _clock) = setup_pool();
    pool.deposit(&ALICE, 100 * UNIT).expect("deposit should succeed");

    pool.critical_ops(&OWNER)
        .expect("owner should hold every role")
        .enable_emergency_mode("yield source audit");
    pool.sync_with_yield_source().expect("sync should succeed");

    let info = pool.emergency_info();
    assert_eq!(info.state, EmergencyState::EmergencyMode);
    assert!(!info.auto_triggered);
    assert_eq!(info.reason.as_deref(), Some("yield source audit"));
    assert_eq!(info.health_bps, 10_000);

    assert_eq!(
        pool.deposit(&ALICE, 10 * UNIT),
        Err(PrizeSavingsError::DepositsDisabled)
    );
    pool.withdraw(&ALICE, 10 * UNIT).expect("withdraw should succeed");

    pool.critical_ops(&OWNER)
        .expect("owner should hold every role")
        .disable_emergency_mode();
    let info = pool.emergency_info();
    assert_eq!(info.state, EmergencyState::Normal);
    assert_eq!(info.reason, None);
    pool.deposit(&ALICE, 10 * UNIT).expect("deposit should succeed");
}

/// Paused blocks deposits, withdrawals and draws.
#[test]
fn test_paused_blocks_everything() {
    let (mut pool, clock) = setup_pool();
    pool.deposit(&ALICE, 100 * UNIT).expect("deposit should succeed");
    clock.advance(ROUND_DURATION);

    let mut ops = pool.critical_ops(&OWNER).expect("owner should hold every role");
    ops.pause("incident");
    assert_eq!(ops.start_draw(), Err(PrizeSavingsError::PoolPaused));
    drop(ops);

    assert_eq!(pool.deposit(&ALICE, UNIT), Err(PrizeSavingsError::PoolPaused));
    assert_eq!(pool.withdraw(&ALICE, UNIT), Err(PrizeSavingsError::PoolPaused));
}

/// Partial mode caps deposit size and blocks draws.
#[test]
fn test_partial_mode() {
    let (mut pool, clock) = setup_pool();
    pool.critical_ops(&OWNER)
        .expect("owner should hold every role")
        .set_partial_mode("capacity review");

    assert_eq!(
        pool.deposit(&ALICE, 100 * UNIT + 1),
        Err(PrizeSavingsError::DepositLimitExceeded)
    );
    pool.deposit(&ALICE, 100 * UNIT).expect("deposit should succeed");

    clock.advance(ROUND_DURATION);
    assert_eq!(
        pool.critical_ops(&OWNER)
            .expect("owner should hold every role")
            .start_draw(),
        Err(PrizeSavingsError::DrawsDisabled)
    );
}

/// Emergency mode entered mid-draw blocks the remaining phases until
/// cleared, then the draw resumes where it stopped.
#[test]
fn test_emergency_blocks_draw_completion() {
    let (mut pool, clock) = setup_pool();
    pool.deposit(&ALICE, 100 * UNIT).expect("deposit should succeed");
    clock.advance(ROUND_DURATION);

    let mut ops = pool.critical_ops(&OWNER).expect("owner should hold every role");
    ops.start_draw().expect("start_draw should succeed");
    ops.process_draw_batch(10).expect("process_draw_batch should succeed");
    ops.enable_emergency_mode("oracle review");
    assert_eq!(
        ops.request_draw_randomness(),
        Err(PrizeSavingsError::DrawsDisabled)
    );

    ops.disable_emergency_mode();
    ops.request_draw_randomness()
        .expect("request_draw_randomness should succeed");
    clock.next_slot();
    ops.complete_draw().expect("complete_draw should succeed");
}

/// Invalid thresholds are rejected.
#[test]
fn test_set_emergency_config_validation() {
    let (mut pool, _clock) = setup_pool();
    let mut ops = pool.critical_ops(&OWNER).expect("owner should hold every role");

    let bad = EmergencyConfig {
        min_balance_threshold_bps: 10_001,
        ..EmergencyConfig::default()
    };
    assert_eq!(
        ops.set_emergency_config(bad),
        Err(PrizeSavingsError::InvalidThreshold)
    );

    let stricter = EmergencyConfig {
        max_withdraw_failures: 1,
        ..EmergencyConfig::default()
    };
    ops.set_emergency_config(stricter.clone())
        .expect("set_emergency_config should succeed");
    drop(ops);
    assert_eq!(pool.emergency().config(), &stricter);
    assert_eq!(pool.config().emergency, stricter);
}
