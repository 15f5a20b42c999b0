//! Read-only query surface.
//!
//! Nothing here touches the yield source's liquidity or mutates state; health
//! is computed from `minimum_available` without triggering transitions.

use prize_savings_interface::{Clock, RandomnessOracle, ReceiverId, YieldConnector};

use super::{BonusWeight, DrawPhase, Pool};
use crate::emergency::EmergencyState;
use crate::errors::{PrizeSavingsError, PrizeSavingsResult};

/// Draw progress snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawStatus {
    /// Current phase
    pub phase: DrawPhase,
    /// Whether any draw phase is outstanding
    pub is_draw_in_progress: bool,
    /// Whether batch capture has visited the full snapshot
    pub is_batch_complete: bool,
    /// Whether `complete_draw` would pass the reveal check now
    pub is_ready_for_completion: bool,
    /// Whether `start_draw` would pass its phase and round checks now
    pub can_draw_now: bool,
    /// Capture progress in basis points (10 000 when idle or complete)
    pub progress_bps: u64,
    /// Receivers frozen into the draw
    pub snapshot_count: u64,
    /// Receivers visited so far
    pub cursor: u64,
    /// Active round id
    pub current_round_id: u64,
    /// Active round end
    pub round_end_time: u64,
}

/// Pool-wide totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Sum of depositor assets
    pub total_assets: u128,
    /// Shares outstanding
    pub total_shares: u128,
    /// Funds the ledger owes to depositors
    pub total_staked: u64,
    /// Lottery yield not yet withdrawn
    pub pending_lottery: u64,
    /// Treasury yield not yet withdrawn
    pub pending_treasury: u64,
    /// Prize funds held for the next draw
    pub prize_vault: u64,
    /// Share price scaled by `PRICE_PRECISION`
    pub share_price: u128,
    /// Registered receivers
    pub receiver_count: u64,
    /// Completed draws
    pub draw_count: u64,
    /// Lifetime prizes awarded
    pub total_prizes_awarded: u128,
}

/// Emergency snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmergencyInfo {
    /// Current state
    pub state: EmergencyState,
    /// Reason given on entry
    pub reason: Option<String>,
    /// When the state was entered
    pub activated_at: Option<u64>,
    /// Whether the state was entered automatically
    pub auto_triggered: bool,
    /// Consecutive short withdrawals
    pub consecutive_withdraw_failures: u32,
    /// Current health score in basis points
    pub health_bps: u64,
}

/// Treasury snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreasuryStats {
    /// Treasury yield not yet withdrawn
    pub pending: u64,
    /// Held by the pool after failed or absent forwards
    pub unclaimed: u64,
    /// Lifetime amount delivered to the receiver
    pub total_forwarded: u128,
    /// Whether a treasury receiver is configured
    pub has_receiver: bool,
}

/// Balance breakdown for one receiver.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserBalance {
    /// Deposits plus compounded prizes, net of withdrawn principal
    pub principal: u64,
    /// Lifetime fungible prizes
    pub lifetime_prizes: u64,
    /// Value above principal
    pub pending_interest: u64,
    /// Current asset value
    pub total_balance: u64,
    /// Shares held
    pub shares: u128,
}

impl<Y, R, C> Pool<Y, R, C>
where
    Y: YieldConnector,
    R: RandomnessOracle,
    C: Clock,
{
    /// Draw progress.
    pub fn draw_status(&self) -> DrawStatus {
        let now = self.clock.now();
        let phase = self.draw.phase();
        let accumulator = self.draw.accumulator();

        DrawStatus {
            phase,
            is_draw_in_progress: phase != DrawPhase::Idle,
            is_batch_complete: accumulator.is_some_and(|a| a.is_complete()),
            is_ready_for_completion: self
                .draw
                .receipt()
                .is_some_and(|r| r.request.is_ready_at(now.slot)),
            can_draw_now: phase == DrawPhase::Idle
                && self.active_round.has_ended(now.unix_timestamp),
            progress_bps: accumulator.map_or(10_000, |a| a.progress_bps()),
            snapshot_count: accumulator.map_or(0, |a| a.snapshot_count() as u64),
            cursor: accumulator.map_or(0, |a| a.cursor() as u64),
            current_round_id: self.active_round.id(),
            round_end_time: self.active_round.end_time(),
        }
    }

    /// Pool-wide totals.
    ///
    /// # Errors
    /// [`PrizeSavingsError::ArithmeticOverflow`] if the share price overflows.
    pub fn pool_stats(&self) -> PrizeSavingsResult<PoolStats> {
        Ok(PoolStats {
            total_assets: self.ledger.total_assets(),
            total_shares: self.ledger.total_shares(),
            total_staked: self.pending.total_staked,
            pending_lottery: self.pending.pending_lottery,
            pending_treasury: self.pending.pending_treasury,
            prize_vault: self.counters.prize_vault,
            share_price: self.ledger.share_price()?,
            receiver_count: self.registry.len() as u64,
            draw_count: self.counters.draw_count,
            total_prizes_awarded: self.counters.total_prizes_awarded,
        })
    }

    /// Emergency snapshot.
    pub fn emergency_info(&self) -> EmergencyInfo {
        EmergencyInfo {
            state: self.emergency.state(),
            reason: self.emergency.reason().map(str::to_string),
            activated_at: self.emergency.activated_at(),
            auto_triggered: self.emergency.is_auto_triggered(),
            consecutive_withdraw_failures: self.emergency.consecutive_withdraw_failures(),
            health_bps: self.current_health_bps(),
        }
    }

    /// Treasury snapshot.
    pub fn treasury_stats(&self) -> TreasuryStats {
        TreasuryStats {
            pending: self.pending.pending_treasury,
            unclaimed: self.counters.unclaimed_treasury,
            total_forwarded: self.counters.total_treasury_forwarded,
            has_receiver: self.treasury_receiver.is_some(),
        }
    }

    /// Balance breakdown for `receiver`. All zero for unknown receivers.
    ///
    /// # Errors
    /// [`PrizeSavingsError::ArithmeticOverflow`] on overflow.
    pub fn user_balance(&self, receiver: &ReceiverId) -> PrizeSavingsResult<UserBalance> {
        let total_balance = self.ledger.user_asset_value(receiver)?;
        let (principal, lifetime_prizes) = self
            .accounts
            .get(receiver)
            .map_or((0, 0), |a| (a.principal, a.lifetime_prizes));

        Ok(UserBalance {
            principal,
            lifetime_prizes,
            pending_interest: total_balance.saturating_sub(principal),
            total_balance,
            shares: self.ledger.shares_of(receiver),
        })
    }

    /// Projected weight of `receiver` in the active round, bonus included.
    ///
    /// # Errors
    /// [`PrizeSavingsError::ArithmeticOverflow`] on overflow.
    pub fn user_entries(&self, receiver: &ReceiverId) -> PrizeSavingsResult<u128> {
        let shares = self.ledger.shares_of(receiver);
        let twab = self.active_round.projected_twab(receiver, shares)?;
        let bonus = match self.bonus_of(receiver) {
            Some(bonus) => u128::from(bonus.bonus_per_second)
                .checked_mul(u128::from(self.active_round.duration()))
                .ok_or(PrizeSavingsError::ArithmeticOverflow)?,
            None => 0,
        };
        twab.checked_add(bonus)
            .ok_or(PrizeSavingsError::ArithmeticOverflow)
    }

    /// Seconds until the active round ends (0 once it has).
    pub fn time_until_next_draw(&self) -> u64 {
        self.active_round
            .remaining_time(self.clock.now().unix_timestamp)
    }

    /// Shares a deposit of `amount` would mint at the current price.
    ///
    /// # Errors
    /// [`PrizeSavingsError::ArithmeticOverflow`] on overflow.
    pub fn preview_deposit(&self, amount: u64) -> PrizeSavingsResult<u128> {
        self.ledger.convert_to_shares(amount)
    }

    /// Share price scaled by `PRICE_PRECISION`.
    ///
    /// # Errors
    /// [`PrizeSavingsError::ArithmeticOverflow`] on overflow.
    pub fn share_price(&self) -> PrizeSavingsResult<u128> {
        self.ledger.share_price()
    }

    /// Non-fungible prizes `receiver` can claim.
    pub fn pending_nft_claims(&self, receiver: &ReceiverId) -> &[u64] {
        self.accounts
            .get(receiver)
            .map(|a| a.pending_nft_claims.as_slice())
            .unwrap_or_default()
    }

    /// Bonus weight of `receiver`.
    pub fn bonus_of(&self, receiver: &ReceiverId) -> Option<&BonusWeight> {
        self.accounts.get(receiver).and_then(|a| a.bonus.as_ref())
    }
}
