//! Prize Savings
//!
//! No-loss prize-linked savings pool. Depositors keep their principal; the
//! yield it earns is split between compounding savings, a periodic prize and
//! a treasury.
//!
//! # Architecture
//!
//! ```text
//!  deposit / withdraw ──► ShareLedger ◄── YieldSyncEngine ◄── yield source balance
//!          │                                   │
//!          ▼                                   ▼
//!   Round (TWAB projections)          pending lottery / treasury
//!          │                                   │
//!          ▼                                   ▼
//!   WeightAccumulator ──► select_winners ──► PrizeDistribution ──► compounded prizes
//! ```
//!
//! Draws run in four separately invoked phases so weight capture is bounded
//! per call and randomness is fulfilled strictly after it is requested.
//!
//! # Modules
//!
//! - [`config`]: JSON-loadable pool configuration
//! - [`distribution`]: Yield split between savings, lottery and treasury
//! - [`emergency`]: Emergency states, health score and gating
//! - [`errors`]: Error codes
//! - [`events`]: Pod events and the in-memory event log
//! - [`pool`]: Pool coordinator, draw state machine and admin façades
//! - [`prize`]: Prize split strategies
//! - [`registry`]: Dense receiver registry
//! - [`rng`]: Seeded generator behind winner selection
//! - [`round`]: Time-weighted balance projections
//! - [`share_ledger`]: Share accounting with virtual offsets
//! - [`slot`]: Move-only optional slot
//! - [`weights`]: Batched weight capture and weighted selection
//! - [`yield_sync`]: Surplus and deficit reconciliation

pub mod config;
pub mod distribution;
pub mod emergency;
pub mod errors;
pub mod events;
pub mod pool;
pub mod prize;
pub mod registry;
pub mod rng;
pub mod round;
pub mod share_ledger;
pub mod slot;
pub mod weights;
pub mod yield_sync;

// Error and event types
pub use errors::{PrizeSavingsError, PrizeSavingsResult};
pub use events::{EmittedEvent, Event, EventLog, EventType};

// Core types
pub use config::PoolConfig;
pub use distribution::{DistributionPlan, DistributionStrategy};
pub use emergency::{EmergencyConfig, EmergencyController, EmergencyState};
pub use pool::{
    BonusWeight, DepositReceipt, DrawPhase, DrawReceipt, DrawResult, FundingDestination, Pool,
    PoolCounters, ReceiverAccount, WithdrawOutcome,
};
pub use prize::{PrizeAllocation, PrizeDistribution, PrizeTier};
pub use round::Round;
pub use share_ledger::ShareLedger;
pub use weights::WeightAccumulator;
pub use yield_sync::{PendingLedgers, SyncOutcome, YieldSyncEngine};
