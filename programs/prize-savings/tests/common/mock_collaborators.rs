//! In-memory collaborators for pool tests.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use prize_savings_interface::{
    Clock, ClockSnapshot, CollaboratorError, RandomnessOracle, RandomnessRequest,
    TreasuryReceiver, WinnerRecord, WinnerTracker, YieldConnector,
};

// ============================================================================
// Yield connector
// ============================================================================

/// Yield venue with a controllable balance and liquidity cap.
#[derive(Debug, Default)]
pub struct MockYieldConnector {
    /// Balance reported to the pool
    pub balance: u64,
    /// Maximum released per withdrawal (`None` = unlimited)
    pub liquidity: Option<u64>,
    /// Maximum accepted per deposit (`None` = unlimited)
    pub deposit_cap: Option<u64>,
    /// Maximum accepted per deposit that `deposit_limit` does not report
    pub unquoted_cap: Option<u64>,
}

impl MockYieldConnector {
    /// Simulate yield earned by the venue.
    pub fn accrue(&mut self, amount: u64) {
        self.balance += amount;
    }

    /// Simulate a loss at the venue.
    pub fn lose(&mut self, amount: u64) {
        self.balance = self.balance.saturating_sub(amount);
    }
}

impl YieldConnector for MockYieldConnector {
    fn deposit_limit(&self) -> u64 {
        self.deposit_cap.unwrap_or(u64::MAX)
    }

    fn deposit_capacity(&mut self, amount: u64) -> u64 {
        let accepted = self
            .deposit_cap
            .into_iter()
            .chain(self.unquoted_cap)
            .fold(amount, u64::min);
        self.balance += accepted;
        accepted
    }

    fn minimum_available(&self) -> u64 {
        self.balance
    }

    fn withdraw_available(&mut self, max_amount: u64) -> u64 {
        let released = max_amount
            .min(self.balance)
            .min(self.liquidity.unwrap_or(u64::MAX));
        self.balance -= released;
        released
    }
}

// ============================================================================
// Randomness oracle
// ============================================================================

/// Commit/reveal oracle that refuses same-slot reveals.
#[derive(Debug, Default)]
pub struct MockRandomness {
    /// Base mixed into every revealed value
    pub seed: u64,
    /// Reject every request
    pub unavailable: bool,
    next_id: u64,
    fulfilled: Vec<u64>,
}

impl MockRandomness {
    /// Oracle revealing values derived from `seed`.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Self::default()
        }
    }
}

impl RandomnessOracle for MockRandomness {
    fn request_randomness(&mut self, slot: u64) -> Result<RandomnessRequest, CollaboratorError> {
        if self.unavailable {
            return Err(CollaboratorError::Unavailable);
        }
        self.next_id += 1;
        Ok(RandomnessRequest {
            request_id: self.next_id,
            requested_at_slot: slot,
        })
    }

    fn fulfill_random_request(
        &mut self,
        request: RandomnessRequest,
        slot: u64,
    ) -> Result<u64, CollaboratorError> {
        if request.request_id == 0 || request.request_id > self.next_id {
            return Err(CollaboratorError::UnknownRequest);
        }
        if !request.is_ready_at(slot) {
            return Err(CollaboratorError::RevealTooEarly);
        }
        if self.fulfilled.contains(&request.request_id) {
            return Err(CollaboratorError::AlreadyFulfilled);
        }
        self.fulfilled.push(request.request_id);
        Ok(self.seed ^ request.request_id.wrapping_mul(0x9E37_79B9_7F4A_7C15))
    }
}

// ============================================================================
// Clock
// ============================================================================

/// Shared manual clock; clones observe the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<ClockSnapshot>>,
}

impl ManualClock {
    /// Clock at `unix_timestamp`, slot 1.
    pub fn at(unix_timestamp: u64) -> Self {
        Self {
            now: Rc::new(Cell::new(ClockSnapshot {
                slot: 1,
                unix_timestamp,
            })),
        }
    }

    /// Move time forward by `seconds` and the slot by one.
    pub fn advance(&self, seconds: u64) {
        let now = self.now.get();
        self.now.set(ClockSnapshot {
            slot: now.slot + 1,
            unix_timestamp: now.unix_timestamp + seconds,
        });
    }

    /// Move to the next slot without moving time.
    pub fn next_slot(&self) {
        self.advance(0);
    }

    /// Current timestamp.
    pub fn timestamp(&self) -> u64 {
        self.now.get().unix_timestamp
    }
}

impl Clock for ManualClock {
    fn now(&self) -> ClockSnapshot {
        self.now.get()
    }
}

// ============================================================================
// Optional sinks
// ============================================================================

/// Treasury receiver recording every delivery.
#[derive(Debug, Clone, Default)]
pub struct RecordingTreasury {
    /// Amounts received
    pub received: Rc<RefCell<Vec<u64>>>,
    /// Refuse every delivery
    pub refuse: bool,
}

impl TreasuryReceiver for RecordingTreasury {
    fn receive(&mut self, amount: u64) -> Result<(), CollaboratorError> {
        if self.refuse {
            return Err(CollaboratorError::Rejected);
        }
        self.received.borrow_mut().push(amount);
        Ok(())
    }
}

/// Winner tracker recording every award.
#[derive(Debug, Clone, Default)]
pub struct RecordingTracker {
    /// Records received
    pub records: Rc<RefCell<Vec<WinnerRecord>>>,
    /// Fail every call
    pub fail: bool,
}

impl WinnerTracker for RecordingTracker {
    fn record_winner(
        &mut self,
        record: &WinnerRecord,
        _nft_ids: &[u64],
    ) -> Result<(), CollaboratorError> {
        if self.fail {
            return Err(CollaboratorError::Unavailable);
        }
        self.records.borrow_mut().push(*record);
        Ok(())
    }
}
