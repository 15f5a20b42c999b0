//! Yield reconciliation through the pool.
//!
//! Losses reported by the yield source are absorbed treasury first, then
//! lottery, then depositor savings, each ledger taking its planned share plus
//! whatever the previous one could not cover.

mod common;

use common::*;
use prize_savings::events::DeficitAppliedEvent;
use prize_savings::yield_sync::{DeficitApplied, SurplusApplied};
use prize_savings::{DistributionStrategy, EmergencyState, SyncOutcome};
use prize_savings_interface::UNIT;

/// Treasury and lottery cover their planned shares and pass any shortfall
/// down the cascade; savings take the rest out of `total_staked`.
#[test]
fn test_deficit_cascade() {
    let mut config = default_config();
    config.distribution =
        DistributionStrategy::fixed(0, 9_500, 500).expect("distribution should be valid");
    let (mut pool, _clock) = setup_pool_with(config);
    pool.deposit(&ALICE, 100 * UNIT).expect("deposit should succeed");

    pool.connector_mut().accrue(20 * UNIT);
    let outcome = pool.sync_with_yield_source().expect("sync should succeed");
    assert_eq!(
        outcome,
        SyncOutcome::Surplus(SurplusApplied {
            excess: 20 * UNIT,
            savings_accrued: 0,
            savings_redirected: 0,
            lottery: 19 * UNIT,
            treasury: UNIT,
        })
    );

    pool.critical_ops(&OWNER)
        .expect("owner should hold every role")
        .set_distribution_strategy(
            DistributionStrategy::fixed(5_000, 3_000, 2_000)
                .expect("distribution should be valid"),
        )
        .expect("set_distribution_strategy should succeed");

    // Plan 5/3/2: treasury holds only 1, lottery covers 3 + 1
    pool.connector_mut().lose(10 * UNIT);
    let outcome = pool.sync_with_yield_source().expect("sync should succeed");
    assert_eq!(
        outcome,
        SyncOutcome::Deficit(DeficitApplied {
            deficit: 10 * UNIT,
            treasury_absorbed: UNIT,
            lottery_absorbed: 4 * UNIT,
            savings_absorbed: 5 * UNIT,
        })
    );
    let pending = pool.pending_ledgers();
    assert_eq!(pending.pending_treasury, 0);
    assert_eq!(pending.pending_lottery, 15 * UNIT);
    assert_eq!(pending.total_staked, 95 * UNIT);
    assert_eq!(pool.ledger().total_assets(), u128::from(95 * UNIT));

    // Plan 20/12/8: treasury is empty, lottery caps at 15 of its 20
    pool.connector_mut().lose(40 * UNIT);
    pool.sync_with_yield_source().expect("sync should succeed");
    let pending = pool.pending_ledgers();
    assert_eq!(pending.pending_treasury, 0);
    assert_eq!(pending.pending_lottery, 0);
    assert_eq!(pending.total_staked, 70 * UNIT);
    assert_eq!(pool.connector().balance, 70 * UNIT);

    let deficits = pool.events().of_type::<DeficitAppliedEvent>();
    assert_eq!(deficits.len(), 2);
    assert_eq!(deficits[1].deficit, 40 * UNIT);
    assert_eq!(deficits[1].treasury_absorbed, 0);
    assert_eq!(deficits[1].lottery_absorbed, 15 * UNIT);
    assert_eq!(deficits[1].savings_absorbed, 25 * UNIT);
    assert_eq!(deficits[1].unabsorbed, 0);

    // Half health: balance below threshold, no withdrawal failures
    assert_eq!(pool.emergency().state(), EmergencyState::Normal);
}
