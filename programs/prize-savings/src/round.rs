//! Time-weighted balance projection for one accounting period.
//!
//! Instead of integrating balances at draw time, each round stores, per
//! receiver, the share-seconds they *will* have accumulated by `end_time`
//! assuming no further changes. Every deposit or withdrawal corrects the
//! projection for the time remaining:
//!
//! ```text
//! first touch:   projection = old_shares × duration
//! increase:      projection += (new − old) × (end_time − now)
//! decrease:      projection −= (old − new) × (end_time − now)   (floored at 0)
//! ```
//!
//! A receiver with no entry was never touched this round and is credited
//! `current_shares × duration`, so a round rollover does not need to visit
//! every receiver.

use std::collections::HashMap;

use prize_savings_interface::ReceiverId;

use crate::errors::{PrizeSavingsError, PrizeSavingsResult};

/// One fixed-duration lottery accounting period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Round {
    id: u64,
    start_time: u64,
    duration: u64,
    end_time: u64,
    /// Projected share-seconds at `end_time`. Absent = untouched this round.
    projections: HashMap<ReceiverId, u128>,
}

impl Round {
    /// Open a round starting at `start_time`.
    ///
    /// # Errors
    /// - [`PrizeSavingsError::InvalidRoundDuration`] if `duration` is zero
    /// - [`PrizeSavingsError::ArithmeticOverflow`] if the end time overflows
    pub fn new(id: u64, start_time: u64, duration: u64) -> PrizeSavingsResult<Self> {
        if duration == 0 {
            return Err(PrizeSavingsError::InvalidRoundDuration);
        }
        let end_time = start_time
            .checked_add(duration)
            .ok_or(PrizeSavingsError::ArithmeticOverflow)?;
        Ok(Self {
            id,
            start_time,
            duration,
            end_time,
            projections: HashMap::new(),
        })
    }

    /// Round identifier.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Start timestamp.
    #[inline]
    pub fn start_time(&self) -> u64 {
        self.start_time
    }

    /// Round length in seconds.
    #[inline]
    pub fn duration(&self) -> u64 {
        self.duration
    }

    /// End timestamp (`start_time + duration`).
    #[inline]
    pub fn end_time(&self) -> u64 {
        self.end_time
    }

    /// Whether the round is over at `now`.
    #[inline]
    pub fn has_ended(&self, now: u64) -> bool {
        now >= self.end_time
    }

    /// Seconds left at `now`; zero once ended.
    #[inline]
    pub fn remaining_time(&self, now: u64) -> u64 {
        self.end_time.saturating_sub(now.max(self.start_time))
    }

    /// Whether `receiver` has been touched this round.
    #[inline]
    pub fn has_projection(&self, receiver: &ReceiverId) -> bool {
        self.projections.contains_key(receiver)
    }

    /// Number of receivers with an explicit projection.
    #[inline]
    pub fn projection_count(&self) -> usize {
        self.projections.len()
    }

    fn full_round_weight(&self, shares: u128) -> PrizeSavingsResult<u128> {
        shares
            .checked_mul(u128::from(self.duration))
            .ok_or(PrizeSavingsError::ArithmeticOverflow)
    }

    /// Correct `receiver`'s projection for a balance change at `at_time`.
    ///
    /// No-op once the round has ended.
    ///
    /// # Errors
    /// [`PrizeSavingsError::ArithmeticOverflow`] on overflow.
    pub fn adjust_projection(
        &mut self,
        receiver: &ReceiverId,
        old_shares: u128,
        new_shares: u128,
        at_time: u64,
    ) -> PrizeSavingsResult<()> {
        if self.has_ended(at_time) {
            return Ok(());
        }
        let remaining = u128::from(self.remaining_time(at_time));

        let current = match self.projections.get(receiver) {
            Some(projection) => *projection,
            None => self.full_round_weight(old_shares)?,
        };

        let updated = if new_shares >= old_shares {
            let delta = (new_shares - old_shares)
                .checked_mul(remaining)
                .ok_or(PrizeSavingsError::ArithmeticOverflow)?;
            current
                .checked_add(delta)
                .ok_or(PrizeSavingsError::ArithmeticOverflow)?
        } else {
            let delta = (old_shares - new_shares)
                .checked_mul(remaining)
                .ok_or(PrizeSavingsError::ArithmeticOverflow)?;
            current.saturating_sub(delta)
        };

        self.projections.insert(*receiver, updated);
        Ok(())
    }

    /// Set `receiver`'s projection to `shares × duration` unless already set.
    ///
    /// Freezes a receiver's credit for a round that has ended but not yet been
    /// drawn, before their balance changes.
    ///
    /// # Errors
    /// [`PrizeSavingsError::ArithmeticOverflow`] on overflow.
    pub fn initialize_if_needed(
        &mut self,
        receiver: &ReceiverId,
        shares: u128,
    ) -> PrizeSavingsResult<()> {
        if !self.projections.contains_key(receiver) {
            let weight = self.full_round_weight(shares)?;
            self.projections.insert(*receiver, weight);
        }
        Ok(())
    }

    /// Projected share-seconds for `receiver` at round end.
    ///
    /// Falls back to `current_shares × duration` for untouched receivers.
    ///
    /// # Errors
    /// [`PrizeSavingsError::ArithmeticOverflow`] on overflow.
    pub fn projected_twab(
        &self,
        receiver: &ReceiverId,
        current_shares: u128,
    ) -> PrizeSavingsResult<u128> {
        match self.projections.get(receiver) {
            Some(projection) => Ok(*projection),
            None => self.full_round_weight(current_shares),
        }
    }
}
