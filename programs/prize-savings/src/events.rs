//! Event definitions for the prize savings pool.
//!
//! Events are serialized as `discriminator (u64 LE) || bytes_of(event)`,
//! written to the program log with `sol_log_data`, and kept in an in-memory
//! [`EventLog`] that hosts and tests can drain and decode.
//!
//! # Event Pattern
//!
//! Every event is a `#[repr(C)]` `Pod` struct with no implicit padding.
//! Structs carrying a `u128` put it first and pad the tail to 16 bytes.

use std::collections::VecDeque;

use bytemuck::{Pod, Zeroable};
use pinocchio::log::sol_log_data;

/// Event type discriminators.
///
/// # Ranges
/// - **1-15**: Core events (deposit, withdrawal, yield sync)
/// - **16-31**: Draw events
/// - **32-47**: Admin and emergency events
#[repr(u64)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::IntoStaticStr)]
pub enum EventType {
    // =========================================================================
    // Core Events (1-15)
    // =========================================================================
    /// Deposit credited
    Deposit = 1,
    /// Withdrawal completed (possibly partial)
    Withdraw = 2,
    /// Yield source released less than requested
    WithdrawalFailed = 3,
    /// Surplus distributed
    SurplusApplied = 4,
    /// Deficit absorbed
    DeficitApplied = 5,
    // Reserved: 6-15

    // =========================================================================
    // Draw Events (16-31)
    // =========================================================================
    /// Draw started, new round opened
    DrawStarted = 16,
    /// Batch of weights captured
    DrawBatchProcessed = 17,
    /// Prize materialized and randomness committed
    RandomnessRequested = 18,
    /// Draw completed
    DrawCompleted = 19,
    /// Prize awarded to one winner
    PrizeAwarded = 20,
    /// Non-fungible prize claimed
    NftClaimed = 21,
    // Reserved: 22-31

    // =========================================================================
    // Admin Events (32-47)
    // =========================================================================
    /// Treasury funds forwarded or parked
    TreasuryForwarded = 32,
    /// Emergency state changed
    EmergencyStateChanged = 33,
    /// Bonus weight set or removed
    BonusWeightUpdated = 34,
    /// Funds added directly to lottery or treasury
    DirectFunding = 35,
    // Reserved: 36-47
}

/// Pod event with a fixed discriminator.
pub trait Event: Pod {
    /// Discriminator written before the payload.
    const EVENT_TYPE: EventType;
}

macro_rules! impl_event {
    ($($ty:ident => $variant:ident),* $(,)?) => {
        $(impl Event for $ty {
            const EVENT_TYPE: EventType = EventType::$variant;
        })*
    };
}

// ============================================================================
// Core events
// ============================================================================

/// Emitted when a deposit is credited.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct DepositEvent {
    /// Shares minted
    pub shares_minted: u128,
    /// Depositor
    pub receiver: [u8; 32],
    /// Amount deposited (base units)
    pub amount: u64,
    /// Execution timestamp
    pub timestamp: u64,
}

/// Emitted when a withdrawal releases funds.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct WithdrawEvent {
    /// Shares burned
    pub shares_burned: u128,
    /// Withdrawer
    pub receiver: [u8; 32],
    /// Amount requested
    pub requested: u64,
    /// Amount actually released by the yield source
    pub amount: u64,
    /// Execution timestamp
    pub timestamp: u64,
    /// Padding for 16-byte alignment
    pub _padding: u64,
}

/// Emitted when the yield source releases less than requested.
///
/// Emitted alongside [`WithdrawEvent`] for partial withdrawals, alone for
/// zero-liquidity withdrawals.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct WithdrawalFailedEvent {
    /// Withdrawer
    pub receiver: [u8; 32],
    /// Amount requested
    pub requested: u64,
    /// Amount released
    pub released: u64,
    /// Consecutive failures after this one
    pub consecutive_failures: u64,
    /// Execution timestamp
    pub timestamp: u64,
}

/// Emitted when a yield surplus is distributed.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct SurplusAppliedEvent {
    /// Balance above allocated funds
    pub excess: u64,
    /// Net savings accrued to depositors
    pub savings_accrued: u64,
    /// Savings redirected to treasury
    pub savings_redirected: u64,
    /// Added to pending lottery
    pub lottery: u64,
    /// Added to pending treasury
    pub treasury: u64,
    /// Execution timestamp
    pub timestamp: u64,
}

/// Emitted when a yield deficit is absorbed.
///
/// Indexers can verify: `treasury_absorbed + lottery_absorbed +
/// savings_absorbed + unabsorbed == deficit`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct DeficitAppliedEvent {
    /// Allocated funds above the reported balance
    pub deficit: u64,
    /// Taken from pending treasury
    pub treasury_absorbed: u64,
    /// Taken from pending lottery
    pub lottery_absorbed: u64,
    /// Taken from depositor assets
    pub savings_absorbed: u64,
    /// Not covered by any ledger
    pub unabsorbed: u64,
    /// Execution timestamp
    pub timestamp: u64,
}

// ============================================================================
// Draw events
// ============================================================================

/// Emitted by `start_draw`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawStartedEvent {
    /// Round frozen for the draw
    pub round_id: u64,
    /// Round opened in its place
    pub new_round_id: u64,
    /// Receivers eligible for the draw
    pub snapshot_count: u64,
    /// Execution timestamp
    pub timestamp: u64,
}

/// Emitted by each `process_draw_batch`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawBatchProcessedEvent {
    /// Total weight captured so far
    pub total_weight: u128,
    /// Round being drawn
    pub round_id: u64,
    /// Receivers visited by this batch
    pub processed: u64,
    /// Receivers left to visit
    pub remaining: u64,
    /// Padding for 16-byte alignment
    pub _padding: u64,
}

/// Emitted by `request_draw_randomness`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct RandomnessRequestedEvent {
    /// Round being drawn
    pub round_id: u64,
    /// Oracle request id
    pub request_id: u64,
    /// Slot the request is bound to
    pub requested_at_slot: u64,
    /// Prize committed to the draw
    pub prize_amount: u64,
    /// Treasury amount withdrawn for forwarding
    pub treasury_amount: u64,
}

/// Emitted by `complete_draw`.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct DrawCompletedEvent {
    /// Round drawn
    pub round_id: u64,
    /// Winners awarded
    pub winner_count: u64,
    /// Fungible prize awarded
    pub total_awarded: u64,
    /// Prize left in the vault for the next draw
    pub carried_over: u64,
    /// Execution timestamp
    pub timestamp: u64,
}

/// Emitted once per winner.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct PrizeAwardedEvent {
    /// Winner
    pub receiver: [u8; 32],
    /// Round drawn
    pub round_id: u64,
    /// Fungible amount compounded into the winner's shares
    pub amount: u64,
    /// Non-fungible prizes queued for claim
    pub nft_count: u64,
    /// Execution timestamp
    pub timestamp: u64,
}

/// Emitted when a receiver claims a non-fungible prize.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct NftClaimedEvent {
    /// Claimant
    pub receiver: [u8; 32],
    /// Prize id
    pub nft_id: u64,
    /// Execution timestamp
    pub timestamp: u64,
}

// ============================================================================
// Admin events
// ============================================================================

/// Emitted whenever treasury funds leave the yield source.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct TreasuryForwardedEvent {
    /// Delivered to the treasury receiver
    pub delivered: u64,
    /// Parked as unclaimed
    pub parked: u64,
    /// Execution timestamp
    pub timestamp: u64,
}

/// Emitted on every emergency state transition.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct EmergencyStateChangedEvent {
    /// Previous state code
    pub from: u8,
    /// New state code
    pub to: u8,
    /// 1 if automatic
    pub auto: u8,
    /// Padding for 8-byte alignment
    pub _padding: [u8; 5],
    /// Health score at the transition
    pub health_bps: u64,
    /// Execution timestamp
    pub timestamp: u64,
}

/// Emitted when a bonus weight is set, added to or removed.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct BonusWeightUpdatedEvent {
    /// Receiver
    pub receiver: [u8; 32],
    /// New bonus weight per second (0 when removed)
    pub bonus_per_second: u64,
    /// Execution timestamp
    pub timestamp: u64,
}

/// Emitted by direct funding.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct DirectFundingEvent {
    /// 0 = lottery, 1 = treasury
    pub destination: u64,
    /// Amount funded
    pub amount: u64,
    /// Execution timestamp
    pub timestamp: u64,
}

impl_event! {
    DepositEvent => Deposit,
    WithdrawEvent => Withdraw,
    WithdrawalFailedEvent => WithdrawalFailed,
    SurplusAppliedEvent => SurplusApplied,
    DeficitAppliedEvent => DeficitApplied,
    DrawStartedEvent => DrawStarted,
    DrawBatchProcessedEvent => DrawBatchProcessed,
    RandomnessRequestedEvent => RandomnessRequested,
    DrawCompletedEvent => DrawCompleted,
    PrizeAwardedEvent => PrizeAwarded,
    NftClaimedEvent => NftClaimed,
    TreasuryForwardedEvent => TreasuryForwarded,
    EmergencyStateChangedEvent => EmergencyStateChanged,
    BonusWeightUpdatedEvent => BonusWeightUpdated,
    DirectFundingEvent => DirectFunding,
}

// ============================================================================
// Event log
// ============================================================================

/// One recorded event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmittedEvent {
    /// Discriminator
    pub event_type: EventType,
    /// Pod payload (without discriminator)
    pub data: Vec<u8>,
}

impl EmittedEvent {
    /// Event name for log lines.
    pub fn name(&self) -> &'static str {
        self.event_type.into()
    }

    /// Decode the payload as `E`; `None` on a type mismatch.
    pub fn decode<E: Event>(&self) -> Option<E> {
        if self.event_type != E::EVENT_TYPE {
            return None;
        }
        bytemuck::try_pod_read_unaligned(&self.data).ok()
    }

    /// Wire form: discriminator followed by the payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(8 + self.data.len());
        bytes.extend_from_slice(&(self.event_type as u64).to_le_bytes());
        bytes.extend_from_slice(&self.data);
        bytes
    }
}

/// Events kept by [`EventLog::default`] before the oldest are dropped.
pub const DEFAULT_EVENT_LOG_CAPACITY: usize = 4_096;

/// In-memory record of emitted events.
///
/// Bounded: once `capacity` events are held, each new event evicts the
/// oldest and bumps [`EventLog::dropped`]. Hosts that need every event must
/// [`drain`](EventLog::drain) after each operation; `sol_log_data` output is
/// never dropped.
#[derive(Debug, Clone)]
pub struct EventLog {
    events: VecDeque<EmittedEvent>,
    capacity: usize,
    dropped: u64,
}

impl Default for EventLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_EVENT_LOG_CAPACITY)
    }
}

impl EventLog {
    /// Log keeping at most `capacity` events (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            events: VecDeque::new(),
            capacity: capacity.max(1),
            dropped: 0,
        }
    }

    /// Log `event` via `sol_log_data` and record it.
    pub fn emit<E: Event>(&mut self, event: &E) {
        let discriminator = (E::EVENT_TYPE as u64).to_le_bytes();
        let payload = bytemuck::bytes_of(event);
        sol_log_data(&[discriminator.as_slice(), payload]);
        if self.events.len() == self.capacity {
            self.events.pop_front();
            self.dropped = self.dropped.saturating_add(1);
        }
        self.events.push_back(EmittedEvent {
            event_type: E::EVENT_TYPE,
            data: payload.to_vec(),
        });
    }

    /// Recorded events, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &EmittedEvent> {
        self.events.iter()
    }

    /// Remove and return every recorded event.
    pub fn drain(&mut self) -> Vec<EmittedEvent> {
        self.events.drain(..).collect()
    }

    /// Number of recorded events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Maximum number of events held.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Events evicted since creation because the log was full.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Decoded events of type `E`, oldest first.
    pub fn of_type<E: Event>(&self) -> Vec<E> {
        self.events.iter().filter_map(EmittedEvent::decode::<E>).collect()
    }
}
