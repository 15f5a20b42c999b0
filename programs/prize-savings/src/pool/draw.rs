//! Four-phase draw state machine.
//!
//! ```text
//!            start_draw               request_draw_randomness
//!   Idle ─────────────► BatchCapturing ─────────────────────► RandomnessRequested
//!    ▲                   │  ▲                                          │
//!    │                   └──┘ process_draw_batch                       │
//!    └─────────────────────────────────────────────────────────────────┘
//!                               complete_draw
//! ```
//!
//! The phase is derived from which [`Slot`]s are filled, never stored
//! separately:
//!
//! | pending round | accumulator | receipt | phase               |
//! |---------------|-------------|---------|---------------------|
//! | empty         | empty       | empty   | Idle                |
//! | filled        | filled      | empty   | BatchCapturing      |
//! | filled        | filled      | filled  | RandomnessRequested |
//!
//! Every phase validates before mutating, so a rejected call leaves the pool
//! untouched. There is no cancellation: an unfinished draw blocks the next
//! `start_draw` until it is driven to completion.

use pinocchio_log::log;
use prize_savings_interface::{
    Clock, RandomnessOracle, RandomnessRequest, ReceiverId, WinnerRecord, YieldConnector,
};

use super::Pool;
use crate::errors::{PrizeSavingsError, PrizeSavingsResult};
use crate::events::{
    DirectFundingEvent, DrawBatchProcessedEvent, DrawCompletedEvent, DrawStartedEvent,
    PrizeAwardedEvent, RandomnessRequestedEvent, TreasuryForwardedEvent,
};
use crate::round::Round;
use crate::slot::Slot;
use crate::weights::WeightAccumulator;

/// Draw phase, derived from [`DrawState`].
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::IntoStaticStr)]
pub enum DrawPhase {
    /// No draw in progress
    Idle = 0,
    /// Weights are being captured in batches
    BatchCapturing = 1,
    /// Prize committed, waiting for the randomness to be revealed
    RandomnessRequested = 2,
}

/// Receipt for a committed draw. Consumed exactly once by `complete_draw`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawReceipt {
    /// Round being drawn
    pub round_id: u64,
    /// Prize committed from the vault
    pub prize_amount: u64,
    /// Oracle commitment
    pub request: RandomnessRequest,
}

/// Slots carrying an in-progress draw.
#[derive(Debug, Default)]
pub struct DrawState {
    pub(crate) pending_round: Slot<Round>,
    pub(crate) accumulator: Slot<WeightAccumulator>,
    pub(crate) receipt: Slot<DrawReceipt>,
}

impl DrawState {
    /// Current phase.
    pub fn phase(&self) -> DrawPhase {
        if self.receipt.is_filled() {
            DrawPhase::RandomnessRequested
        } else if self.accumulator.is_filled() {
            DrawPhase::BatchCapturing
        } else {
            DrawPhase::Idle
        }
    }

    /// Round awaiting its draw.
    pub fn pending_round(&self) -> Option<&Round> {
        self.pending_round.as_ref()
    }

    /// Weight table under construction.
    pub fn accumulator(&self) -> Option<&WeightAccumulator> {
        self.accumulator.as_ref()
    }

    /// Outstanding receipt.
    pub fn receipt(&self) -> Option<&DrawReceipt> {
        self.receipt.as_ref()
    }
}

/// Outcome of `complete_draw`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrawResult {
    /// Round drawn
    pub round_id: u64,
    /// Winners, in selection order
    pub winners: Vec<ReceiverId>,
    /// Amount compounded for each winner
    pub amounts: Vec<u64>,
    /// Non-fungible prizes queued for each winner
    pub nft_assignments: Vec<Vec<u64>>,
    /// Sum of `amounts`
    pub total_awarded: u64,
    /// Prize left in the vault for the next draw
    pub carried_over: u64,
}

/// Target of direct funding.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FundingDestination {
    /// Prize vault of the next draw
    Lottery = 0,
    /// Treasury receiver (or unclaimed holding)
    Treasury = 1,
}

impl<Y, R, C> Pool<Y, R, C>
where
    Y: YieldConnector,
    R: RandomnessOracle,
    C: Clock,
{
    /// Current draw state.
    pub fn draw_state(&self) -> &DrawState {
        &self.draw
    }

    // ========================================================================
    // Phase 1: start
    // ========================================================================

    pub(crate) fn start_draw(&mut self) -> PrizeSavingsResult<u64> {
        let now = self.clock.now().unix_timestamp;
        self.refresh_emergency(now);
        self.emergency.check_draw()?;

        if self.draw.phase() != DrawPhase::Idle {
            return Err(PrizeSavingsError::DrawInProgress);
        }
        if !self.active_round.has_ended(now) {
            return Err(PrizeSavingsError::RoundNotEnded);
        }

        let new_round_id = self.next_round_id;
        let next_round_id = new_round_id
            .checked_add(1)
            .ok_or(PrizeSavingsError::ArithmeticOverflow)?;
        let new_round = Round::new(new_round_id, now, self.config.round_duration)?;
        let snapshot_count = self.registry.len();

        let ended = core::mem::replace(&mut self.active_round, new_round);
        let round_id = ended.id();
        self.next_round_id = next_round_id;
        self.draw.pending_round.put(ended)?;
        self.draw
            .accumulator
            .put(WeightAccumulator::new(snapshot_count))?;

        self.events.emit(&DrawStartedEvent {
            round_id,
            new_round_id,
            snapshot_count: snapshot_count as u64,
            timestamp: now,
        });
        log!(
            "start_draw: round {} frozen with {} receivers",
            round_id,
            snapshot_count as u64
        );
        Ok(round_id)
    }

    // ========================================================================
    // Phase 2: batch capture
    // ========================================================================

    pub(crate) fn process_draw_batch(&mut self, limit: usize) -> PrizeSavingsResult<usize> {
        if limit == 0 {
            return Err(PrizeSavingsError::InvalidBatchLimit);
        }
        match self.draw.phase() {
            DrawPhase::Idle => return Err(PrizeSavingsError::NoDrawInProgress),
            DrawPhase::RandomnessRequested => return Err(PrizeSavingsError::BatchAlreadyComplete),
            DrawPhase::BatchCapturing => {}
        }

        let accumulator = self
            .draw
            .accumulator
            .as_ref()
            .ok_or(PrizeSavingsError::NoDrawInProgress)?;
        let round = self
            .draw
            .pending_round
            .as_ref()
            .ok_or(PrizeSavingsError::NoDrawInProgress)?;
        let batch = accumulator.next_batch(limit);
        let processed = batch.len();

        let mut weights = Vec::with_capacity(processed);
        for position in batch {
            let Some(receiver) = self.registry.get(position) else {
                continue;
            };
            let shares = self.ledger.shares_of(receiver);
            let twab = round.projected_twab(receiver, shares)?;
            let bonus = match self.accounts.get(receiver).and_then(|a| a.bonus.as_ref()) {
                Some(bonus) => u128::from(bonus.bonus_per_second)
                    .checked_mul(u128::from(round.duration()))
                    .ok_or(PrizeSavingsError::ArithmeticOverflow)?,
                None => 0,
            };
            let weight = twab
                .checked_add(bonus)
                .ok_or(PrizeSavingsError::ArithmeticOverflow)?;
            weights.push((*receiver, weight));
        }
        let round_id = round.id();

        let accumulator = self
            .draw
            .accumulator
            .as_mut()
            .ok_or(PrizeSavingsError::NoDrawInProgress)?;
        for (receiver, weight) in weights {
            accumulator.add_entry(receiver, weight)?;
        }
        accumulator.advance(processed);
        let remaining = accumulator.remaining();
        let total_weight = accumulator.total_weight();

        self.events.emit(&DrawBatchProcessedEvent {
            total_weight,
            round_id,
            processed: processed as u64,
            remaining: remaining as u64,
            _padding: 0,
        });
        log!(
            "process_draw_batch: {} processed, {} remaining",
            processed as u64,
            remaining as u64
        );
        Ok(remaining)
    }

    // ========================================================================
    // Phase 3: commit
    // ========================================================================

    pub(crate) fn request_draw_randomness(&mut self) -> PrizeSavingsResult<DrawReceipt> {
        match self.draw.phase() {
            DrawPhase::Idle => return Err(PrizeSavingsError::NoDrawInProgress),
            DrawPhase::RandomnessRequested => return Err(PrizeSavingsError::DrawInProgress),
            DrawPhase::BatchCapturing => {}
        }
        let round_id = match (self.draw.accumulator.as_ref(), self.draw.pending_round.as_ref()) {
            (Some(accumulator), Some(round)) if accumulator.is_complete() => round.id(),
            (Some(_), Some(_)) => return Err(PrizeSavingsError::BatchNotComplete),
            _ => return Err(PrizeSavingsError::NoDrawInProgress),
        };
        self.emergency.check_draw()?;

        let now = self.clock.now();
        self.sync_internal(now.unix_timestamp)?;

        let lottery = self.pending.pending_lottery;
        let treasury = self.pending.pending_treasury;
        self.counters
            .prize_vault
            .checked_add(lottery)
            .ok_or(PrizeSavingsError::ArithmeticOverflow)?;
        self.counters
            .unclaimed_treasury
            .checked_add(treasury)
            .ok_or(PrizeSavingsError::ArithmeticOverflow)?;

        let request = self.oracle.request_randomness(now.slot)?;

        let lottery_released = self.connector.withdraw_available(lottery).min(lottery);
        self.pending.pending_lottery -= lottery_released;
        self.counters.prize_vault = self
            .counters
            .prize_vault
            .checked_add(lottery_released)
            .ok_or(PrizeSavingsError::ArithmeticOverflow)?;

        let treasury_released = self.connector.withdraw_available(treasury).min(treasury);
        self.pending.pending_treasury -= treasury_released;
        self.forward_treasury(treasury_released, now.unix_timestamp)?;

        if lottery_released < lottery || treasury_released < treasury {
            log!("request_draw_randomness: yield source short, remainder stays pending");
        }

        let receipt = DrawReceipt {
            round_id,
            prize_amount: self.counters.prize_vault,
            request,
        };
        self.draw.receipt.put(receipt)?;

        self.events.emit(&RandomnessRequestedEvent {
            round_id,
            request_id: request.request_id,
            requested_at_slot: request.requested_at_slot,
            prize_amount: receipt.prize_amount,
            treasury_amount: treasury_released,
        });
        log!(
            "request_draw_randomness: prize of {} committed",
            receipt.prize_amount
        );
        Ok(receipt)
    }

    // ========================================================================
    // Phase 4: reveal and award
    // ========================================================================

    pub(crate) fn complete_draw(&mut self) -> PrizeSavingsResult<DrawResult> {
        match self.draw.phase() {
            DrawPhase::Idle => return Err(PrizeSavingsError::NoDrawInProgress),
            DrawPhase::BatchCapturing => return Err(PrizeSavingsError::RandomnessNotRequested),
            DrawPhase::RandomnessRequested => {}
        }
        self.emergency.check_draw()?;

        let now = self.clock.now();
        let receipt = *self
            .draw
            .receipt
            .as_ref()
            .ok_or(PrizeSavingsError::RandomnessNotRequested)?;
        if !receipt.request.is_ready_at(now.slot) {
            return Err(PrizeSavingsError::RandomnessNotReady);
        }

        self.sync_internal(now.unix_timestamp)?;

        let seed = self
            .oracle
            .fulfill_random_request(receipt.request, now.slot)?;

        let winners = self
            .draw
            .accumulator
            .as_ref()
            .map(|accumulator| {
                accumulator.select_winners(self.config.prize_distribution.winner_count(), seed)
            })
            .unwrap_or_default();
        let prize = receipt.prize_amount.min(self.counters.prize_vault);
        let allocation = self.config.prize_distribution.distribute(&winners, prize)?;

        // Randomness is consumed; the draw ends here
        self.draw.receipt.take()?;
        self.draw.accumulator.take()?;
        self.draw.pending_round.take()?;

        let mut result = DrawResult {
            round_id: receipt.round_id,
            ..DrawResult::default()
        };
        for ((winner, amount), nft_ids) in allocation
            .winners
            .iter()
            .zip(allocation.amounts.iter().copied())
            .zip(allocation.nft_assignments.iter())
        {
            let awarded = self.compound_prize(winner, amount, now.unix_timestamp)?;
            let claimed = self.assign_nft_prizes(winner, nft_ids);
            result.total_awarded = result
                .total_awarded
                .checked_add(awarded)
                .ok_or(PrizeSavingsError::ArithmeticOverflow)?;

            self.events.emit(&PrizeAwardedEvent {
                receiver: *winner,
                round_id: receipt.round_id,
                amount: awarded,
                nft_count: claimed.len() as u64,
                timestamp: now.unix_timestamp,
            });
            self.notify_winner_tracker(winner, receipt.round_id, awarded, &claimed);

            result.winners.push(*winner);
            result.amounts.push(awarded);
            result.nft_assignments.push(claimed);
        }

        for receiver in core::mem::take(&mut self.deferred_unregistrations) {
            if self.ledger.shares_of(&receiver) == 0 {
                self.registry.unregister(&receiver);
            }
        }

        self.counters.draw_count = self.counters.draw_count.saturating_add(1);
        self.counters.total_prizes_awarded = self
            .counters
            .total_prizes_awarded
            .saturating_add(u128::from(result.total_awarded));
        result.carried_over = self.counters.prize_vault;

        self.events.emit(&DrawCompletedEvent {
            round_id: receipt.round_id,
            winner_count: result.winners.len() as u64,
            total_awarded: result.total_awarded,
            carried_over: result.carried_over,
            timestamp: now.unix_timestamp,
        });
        log!(
            "complete_draw: round {} awarded {} to {} winners",
            receipt.round_id,
            result.total_awarded,
            result.winners.len() as u64
        );
        Ok(result)
    }

    // ========================================================================
    // Treasury and direct funding
    // ========================================================================

    /// Deliver `amount` to the treasury receiver, parking it as unclaimed if
    /// there is none or it refuses.
    pub(crate) fn forward_treasury(&mut self, amount: u64, now: u64) -> PrizeSavingsResult<()> {
        if amount == 0 {
            return Ok(());
        }
        let delivered = match self.treasury_receiver.as_mut() {
            Some(receiver) => match receiver.receive(amount) {
                Ok(()) => amount,
                Err(_) => {
                    log!("treasury: receiver refused {}, parked as unclaimed", amount);
                    0
                }
            },
            None => 0,
        };
        let parked = amount - delivered;

        self.counters.unclaimed_treasury = self
            .counters
            .unclaimed_treasury
            .checked_add(parked)
            .ok_or(PrizeSavingsError::ArithmeticOverflow)?;
        self.counters.total_treasury_forwarded = self
            .counters
            .total_treasury_forwarded
            .saturating_add(u128::from(delivered));

        self.events.emit(&TreasuryForwardedEvent {
            delivered,
            parked,
            timestamp: now,
        });
        Ok(())
    }

    pub(crate) fn fund_direct(
        &mut self,
        destination: FundingDestination,
        amount: u64,
    ) -> PrizeSavingsResult<()> {
        if amount == 0 {
            return Err(PrizeSavingsError::InvalidAmount);
        }
        let now = self.clock.now().unix_timestamp;
        match destination {
            FundingDestination::Lottery => {
                self.counters.prize_vault = self
                    .counters
                    .prize_vault
                    .checked_add(amount)
                    .ok_or(PrizeSavingsError::ArithmeticOverflow)?;
            }
            FundingDestination::Treasury => self.forward_treasury(amount, now)?,
        }

        self.events.emit(&DirectFundingEvent {
            destination: destination as u64,
            amount,
            timestamp: now,
        });
        log!("fund_direct: {} added", amount);
        Ok(())
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    /// Place `amount` from the prize vault with the yield connector and mint
    /// shares for it. Whatever the connector refuses stays in the vault.
    ///
    /// Only fails on arithmetic overflow.
    fn compound_prize(&mut self, winner: &ReceiverId, amount: u64, now: u64) -> PrizeSavingsResult<u64> {
        let quoted = amount.min(self.connector.deposit_limit());
        if quoted == 0 || self.ledger.convert_to_shares(quoted)? == 0 {
            if amount > 0 {
                log!("complete_draw: yield connector cannot take prize, carried over");
            }
            return Ok(0);
        }

        let accepted = self.connector.deposit_capacity(quoted).min(quoted);
        if self.ledger.convert_to_shares(accepted)? == 0 {
            let returned = self.connector.withdraw_available(accepted).min(accepted);
            let stranded = accepted - returned;
            // Stranded funds come back as surplus at the next sync
            self.counters.prize_vault = self.counters.prize_vault.saturating_sub(stranded);
            log!("complete_draw: yield connector refused prize, carried over");
            return Ok(0);
        }
        if accepted < amount {
            log!("complete_draw: {} of prize carried over", amount - accepted);
        }

        self.credit_shares(winner, accepted, now)?;
        let account = self.accounts.entry(*winner).or_default();
        account.principal = account.principal.saturating_add(accepted);
        account.lifetime_prizes = account.lifetime_prizes.saturating_add(accepted);
        self.counters.prize_vault = self.counters.prize_vault.saturating_sub(accepted);
        Ok(accepted)
    }

    /// Move the ids still in custody to `winner`'s pending claims.
    fn assign_nft_prizes(&mut self, winner: &ReceiverId, nft_ids: &[u64]) -> Vec<u64> {
        let mut claimed = Vec::new();
        for id in nft_ids {
            if let Some(position) = self.nft_custody.iter().position(|held| held == id) {
                self.nft_custody.remove(position);
                claimed.push(*id);
            }
        }
        if !claimed.is_empty() {
            self.accounts
                .entry(*winner)
                .or_default()
                .pending_nft_claims
                .extend_from_slice(&claimed);
        }
        claimed
    }

    fn notify_winner_tracker(&mut self, winner: &ReceiverId, round_id: u64, amount: u64, nft_ids: &[u64]) {
        let Some(tracker) = self.winner_tracker.as_mut() else {
            return;
        };
        let record = WinnerRecord {
            pool_id: self.id,
            round_id,
            amount,
            receiver: *winner,
        };
        if tracker.record_winner(&record, nft_ids).is_err() {
            log!("complete_draw: winner tracker failed, ignored");
        }
    }
}
