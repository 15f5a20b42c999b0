//! Batched weight capture and weighted selection without replacement.
//!
//! # Capture
//!
//! A [`WeightAccumulator`] is created at draw start with a frozen
//! `snapshot_count`: only registry positions `0..snapshot_count` are visited,
//! so receivers registered after the draw started cannot extend or bias the
//! batch. Each batch call advances the cursor and appends positive weights as
//! a running cumulative sum:
//!
//! ```text
//! weights:     [ 30, 0, 50, 20 ]
//! entries:     [ (A, 30), (C, 80), (D, 100) ]      // B skipped (zero weight)
//! total:       100
//! ```
//!
//! # Selection
//!
//! The first winner is found by binary search over the cumulative table
//! (first entry whose cumulative weight exceeds the random value). Later
//! winners are found by a linear scan over the entries not yet chosen, with
//! each chosen entry's weight removed from the remaining total.

use prize_savings_interface::ReceiverId;

use crate::errors::{PrizeSavingsError, PrizeSavingsResult};
use crate::rng::SeededRng;

/// One captured receiver with its cumulative weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightEntry {
    /// Receiver
    pub receiver: ReceiverId,
    /// Sum of weights up to and including this entry
    pub cumulative: u128,
}

/// Cumulative weight table for one draw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeightAccumulator {
    entries: Vec<WeightEntry>,
    total_weight: u128,
    cursor: usize,
    snapshot_count: usize,
}

impl WeightAccumulator {
    /// Accumulator that will visit registry positions `0..snapshot_count`.
    pub fn new(snapshot_count: usize) -> Self {
        Self {
            entries: Vec::new(),
            total_weight: 0,
            cursor: 0,
            snapshot_count,
        }
    }

    /// Captured entries in insertion order.
    #[inline]
    pub fn entries(&self) -> &[WeightEntry] {
        &self.entries
    }

    /// Sum of all captured weights.
    #[inline]
    pub fn total_weight(&self) -> u128 {
        self.total_weight
    }

    /// Next registry position to capture.
    #[inline]
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Registry size frozen at draw start.
    #[inline]
    pub fn snapshot_count(&self) -> usize {
        self.snapshot_count
    }

    /// Positions left to capture.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.snapshot_count.saturating_sub(self.cursor)
    }

    /// Whether the cursor has consumed the whole snapshot.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.cursor >= self.snapshot_count
    }

    /// Capture progress in basis points (10_000 when complete or empty).
    pub fn progress_bps(&self) -> u64 {
        if self.snapshot_count == 0 {
            return 10_000;
        }
        let done = self.cursor.min(self.snapshot_count) as u128;
        (done * 10_000 / self.snapshot_count as u128) as u64
    }

    /// Range of registry positions the next batch of at most `limit` covers.
    pub fn next_batch(&self, limit: usize) -> core::ops::Range<usize> {
        let end = self.cursor.saturating_add(limit).min(self.snapshot_count);
        self.cursor.min(end)..end
    }

    /// Move the cursor past `count` positions.
    pub fn advance(&mut self, count: usize) {
        self.cursor = self.cursor.saturating_add(count).min(self.snapshot_count);
    }

    /// Append `receiver` with `weight`; zero weights are skipped.
    ///
    /// # Errors
    /// [`PrizeSavingsError::ArithmeticOverflow`] if the total overflows.
    pub fn add_entry(&mut self, receiver: ReceiverId, weight: u128) -> PrizeSavingsResult<()> {
        if weight == 0 {
            return Ok(());
        }
        let cumulative = self
            .total_weight
            .checked_add(weight)
            .ok_or(PrizeSavingsError::ArithmeticOverflow)?;
        self.entries.push(WeightEntry { receiver, cumulative });
        self.total_weight = cumulative;
        Ok(())
    }

    /// Index of the first entry whose cumulative weight exceeds `random_value`.
    ///
    /// `None` when `random_value >= total_weight`.
    pub fn find_winner_index(&self, random_value: u128) -> Option<usize> {
        let index = self
            .entries
            .partition_point(|entry| entry.cumulative <= random_value);
        (index < self.entries.len()).then_some(index)
    }

    #[inline]
    fn weight_at(&self, index: usize) -> u128 {
        let previous = match index {
            0 => 0,
            i => self.entries[i - 1].cumulative,
        };
        self.entries[index].cumulative - previous
    }

    /// Select up to `count` distinct winners, deterministically from `seed`.
    ///
    /// - No entries or `count == 0`: empty
    /// - One entry: that receiver
    /// - Zero total weight: the first `count` entries in insertion order
    /// - Otherwise: weighted sampling without replacement until `count`
    ///   winners are chosen or the weight is exhausted
    pub fn select_winners(&self, count: usize, seed: u64) -> Vec<ReceiverId> {
        if self.entries.is_empty() || count == 0 {
            return Vec::new();
        }
        if self.entries.len() == 1 {
            return vec![self.entries[0].receiver];
        }
        let count = count.min(self.entries.len());
        if self.total_weight == 0 {
            return self.entries[..count].iter().map(|e| e.receiver).collect();
        }

        let mut rng = SeededRng::from_seed(seed);
        let mut selected = vec![false; self.entries.len()];
        let mut winners = Vec::with_capacity(count);

        let first_roll = rng.next_below(self.total_weight);
        let Some(first) = self.find_winner_index(first_roll) else {
            return winners;
        };
        selected[first] = true;
        winners.push(self.entries[first].receiver);
        let mut remaining_weight = self.total_weight - self.weight_at(first);

        while winners.len() < count && remaining_weight > 0 {
            let roll = rng.next_below(remaining_weight);
            let mut running = 0u128;
            for index in 0..self.entries.len() {
                if selected[index] {
                    continue;
                }
                let weight = self.weight_at(index);
                running += weight;
                if running > roll {
                    selected[index] = true;
                    winners.push(self.entries[index].receiver);
                    remaining_weight -= weight;
                    break;
                }
            }
        }

        winners
    }
}
