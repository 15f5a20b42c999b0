//! Pool construction and draw helpers.

#![allow(dead_code)]

use prize_savings::{
    DistributionStrategy, DrawPhase, DrawResult, EmergencyConfig, PendingLedgers, Pool,
    PoolConfig, PoolCounters, PrizeDistribution,
};
use prize_savings_interface::{ReceiverId, UNIT};

use super::mock_collaborators::{ManualClock, MockRandomness, MockYieldConnector};

/// Pool wired to in-memory collaborators.
pub type TestPool = Pool<MockYieldConnector, MockRandomness, ManualClock>;

/// Pool owner.
pub const OWNER: ReceiverId = [0xAA; 32];
/// First depositor.
pub const ALICE: ReceiverId = [1; 32];
/// Second depositor.
pub const BOB: ReceiverId = [2; 32];
/// Third depositor.
pub const CAROL: ReceiverId = [3; 32];

/// One week.
pub const ROUND_DURATION: u64 = 604_800;
/// Pool creation time.
pub const GENESIS: u64 = 1_700_000_000;

/// 50/40/10 savings/lottery/treasury, single winner, default emergency config.
pub fn default_config() -> PoolConfig {
    PoolConfig {
        asset: "FLOW".to_string(),
        minimum_deposit: UNIT,
        round_duration: ROUND_DURATION,
        distribution: DistributionStrategy::fixed(5_000, 4_000, 1_000)
            .expect("distribution should be valid"),
        prize_distribution: PrizeDistribution::single_winner(),
        emergency: EmergencyConfig::default(),
    }
}

/// Create a pool with `config`; returns it with a handle on its clock.
pub fn setup_pool_with(config: PoolConfig) -> (TestPool, ManualClock) {
    let clock = ManualClock::at(GENESIS);
    let pool = Pool::new(
        1,
        config,
        OWNER,
        MockYieldConnector::default(),
        MockRandomness::with_seed(42),
        clock.clone(),
    )
    .expect("pool creation should succeed");
    (pool, clock)
}

/// Create a pool with [`default_config`].
pub fn setup_pool() -> (TestPool, ManualClock) {
    setup_pool_with(default_config())
}

/// Drive the full four-phase draw, advancing one slot before completion.
pub fn run_draw(pool: &mut TestPool, clock: &ManualClock, batch_limit: usize) -> DrawResult {
    let mut ops = pool.critical_ops(&OWNER).expect("owner should hold every role");
    ops.start_draw().expect("start_draw should succeed");
    while ops
        .process_draw_batch(batch_limit)
        .expect("process_draw_batch should succeed")
        > 0
    {}
    ops.request_draw_randomness()
        .expect("request_draw_randomness should succeed");
    clock.next_slot();
    ops.complete_draw().expect("complete_draw should succeed")
}

/// Sum of every holder's shares.
pub fn sum_of_shares(pool: &TestPool) -> u128 {
    pool.ledger().holders().map(|(_, shares)| *shares).sum()
}

/// Observable pool state that a rejected operation must leave untouched.
#[derive(Debug, PartialEq, Eq)]
pub struct PoolSnapshot {
    /// Staked, lottery and treasury ledgers
    pub pending: PendingLedgers,
    /// Aggregate counters
    pub counters: PoolCounters,
    /// Yield source balance
    pub connector_balance: u64,
    /// Ledger share supply
    pub total_shares: u128,
    /// Ledger assets
    pub total_assets: u128,
    /// Holder shares, sorted by receiver
    pub shares: Vec<(ReceiverId, u128)>,
    /// Draw phase
    pub phase: DrawPhase,
    /// Registered receivers
    pub registered: usize,
    /// Events recorded so far
    pub event_count: usize,
}

/// Capture [`PoolSnapshot`] for `pool`.
pub fn snapshot(pool: &TestPool) -> PoolSnapshot {
    let mut shares: Vec<_> = pool
        .ledger()
        .holders()
        .map(|(receiver, shares)| (*receiver, *shares))
        .collect();
    shares.sort();
    PoolSnapshot {
        pending: *pool.pending_ledgers(),
        counters: *pool.counters(),
        connector_balance: pool.connector().balance,
        total_shares: pool.ledger().total_shares(),
        total_assets: pool.ledger().total_assets(),
        shares,
        phase: pool.draw_status().phase,
        registered: pool.registry().len(),
        event_count: pool.events().len(),
    }
}
