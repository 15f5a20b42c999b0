//! Reconciliation of the yield source balance against internal ledgers.
//!
//! # Allocated Funds
//!
//! ```text
//! allocated = total_staked + pending_lottery + pending_treasury
//! ```
//!
//! `total_staked` always equals the share ledger's `total_assets`. Lottery and
//! treasury yield stay in the yield source as *pending* amounts until a draw
//! withdraws them.
//!
//! # Surplus
//!
//! The excess is split by the [`DistributionStrategy`]. The savings portion is
//! accrued into the share ledger; the virtual holder's dust and any savings
//! yield arriving while no shares exist go to pending treasury.
//!
//! # Deficit
//!
//! The shortfall is split by the same strategy, then absorbed in an order
//! that protects principal last:
//!
//! ```text
//! treasury absorbs min(treasury_share, pending_treasury)
//! lottery  absorbs min(lottery_share + treasury_shortfall, pending_lottery)
//! savings  absorbs savings_share + lottery_shortfall   (share price drops)
//! ```
//!
//! # Example
//!
//! ```text
//! Split 50/30/20, deficit 10, pending_treasury 1, pending_lottery 20
//!   plan:     savings 5, lottery 3, treasury 2
//!   treasury: absorbs 1 (drained), shortfall 1
//!   lottery:  absorbs 3 + 1 = 4 → pending_lottery 16
//!   savings:  absorbs 5 via decrease_total_assets
//! ```

use crate::distribution::DistributionStrategy;
use crate::errors::{PrizeSavingsError, PrizeSavingsResult};
use crate::share_ledger::ShareLedger;

/// Internal balances the yield source must cover.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingLedgers {
    /// Assets backing depositor shares
    pub total_staked: u64,
    /// Lottery yield not yet withdrawn for a draw
    pub pending_lottery: u64,
    /// Treasury yield not yet withdrawn for forwarding
    pub pending_treasury: u64,
}

impl PendingLedgers {
    /// Sum of the three ledgers.
    ///
    /// # Errors
    /// [`PrizeSavingsError::ArithmeticOverflow`] on overflow.
    pub fn allocated(&self) -> PrizeSavingsResult<u64> {
        self.total_staked
            .checked_add(self.pending_lottery)
            .and_then(|sum| sum.checked_add(self.pending_treasury))
            .ok_or(PrizeSavingsError::ArithmeticOverflow)
    }
}

/// Surplus applied by a sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SurplusApplied {
    /// Balance above allocated funds
    pub excess: u64,
    /// Net savings accrued to depositors
    pub savings_accrued: u64,
    /// Savings portion redirected to treasury (dust or no shareholders)
    pub savings_redirected: u64,
    /// Added to pending lottery
    pub lottery: u64,
    /// Treasury portion added to pending treasury (excluding redirected savings)
    pub treasury: u64,
}

/// Deficit absorbed by a sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeficitApplied {
    /// Allocated funds above the reported balance
    pub deficit: u64,
    /// Taken from pending treasury
    pub treasury_absorbed: u64,
    /// Taken from pending lottery
    pub lottery_absorbed: u64,
    /// Taken from depositor assets
    pub savings_absorbed: u64,
}

impl DeficitApplied {
    /// Portion of the deficit no ledger could cover.
    pub fn unabsorbed(&self) -> u64 {
        self.deficit
            .saturating_sub(self.treasury_absorbed)
            .saturating_sub(self.lottery_absorbed)
            .saturating_sub(self.savings_absorbed)
    }
}

/// Result of one reconciliation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Balance matches allocated funds
    Balanced,
    /// Yield was distributed
    Surplus(SurplusApplied),
    /// Loss was absorbed
    Deficit(DeficitApplied),
}

/// Applies yield surpluses and deficits according to a strategy.
#[derive(Debug, Clone, Copy)]
pub struct YieldSyncEngine<'a> {
    strategy: &'a DistributionStrategy,
}

impl<'a> YieldSyncEngine<'a> {
    /// Engine splitting by `strategy`.
    pub fn new(strategy: &'a DistributionStrategy) -> Self {
        Self { strategy }
    }

    /// Reconcile `balance` reported by the yield source.
    ///
    /// # Errors
    /// [`PrizeSavingsError::ArithmeticOverflow`] on overflow; state is left
    /// unchanged in that case.
    pub fn sync(
        &self,
        balance: u64,
        ledgers: &mut PendingLedgers,
        shares: &mut ShareLedger,
    ) -> PrizeSavingsResult<SyncOutcome> {
        let allocated = ledgers.allocated()?;
        if balance > allocated {
            self.apply_surplus(balance - allocated, ledgers, shares)
                .map(SyncOutcome::Surplus)
        } else if balance < allocated {
            self.apply_deficit(allocated - balance, ledgers, shares)
                .map(SyncOutcome::Deficit)
        } else {
            Ok(SyncOutcome::Balanced)
        }
    }

    fn apply_surplus(
        &self,
        excess: u64,
        ledgers: &mut PendingLedgers,
        shares: &mut ShareLedger,
    ) -> PrizeSavingsResult<SurplusApplied> {
        let plan = self.strategy.plan(excess)?;

        // Check the lottery/treasury side before mutating the share ledger
        let pending_lottery = ledgers
            .pending_lottery
            .checked_add(plan.lottery)
            .ok_or(PrizeSavingsError::ArithmeticOverflow)?;
        let treasury_with_savings = ledgers
            .pending_treasury
            .checked_add(plan.treasury)
            .and_then(|t| t.checked_add(plan.savings))
            .ok_or(PrizeSavingsError::ArithmeticOverflow)?;
        let staked_ceiling = ledgers
            .total_staked
            .checked_add(plan.savings)
            .ok_or(PrizeSavingsError::ArithmeticOverflow)?;

        let savings_accrued = shares.accrue_yield(plan.savings)?;
        let savings_redirected = plan.savings - savings_accrued;

        ledgers.total_staked = staked_ceiling - savings_redirected;
        ledgers.pending_lottery = pending_lottery;
        ledgers.pending_treasury = treasury_with_savings - savings_accrued;

        Ok(SurplusApplied {
            excess,
            savings_accrued,
            savings_redirected,
            lottery: plan.lottery,
            treasury: plan.treasury,
        })
    }

    fn apply_deficit(
        &self,
        deficit: u64,
        ledgers: &mut PendingLedgers,
        shares: &mut ShareLedger,
    ) -> PrizeSavingsResult<DeficitApplied> {
        let plan = self.strategy.plan(deficit)?;

        let treasury_absorbed = plan.treasury.min(ledgers.pending_treasury);
        let treasury_shortfall = plan.treasury - treasury_absorbed;

        let lottery_target = plan.lottery + treasury_shortfall;
        let lottery_absorbed = lottery_target.min(ledgers.pending_lottery);
        let lottery_shortfall = lottery_target - lottery_absorbed;

        let savings_target = plan.savings + lottery_shortfall;
        let savings_absorbed = shares.decrease_total_assets(savings_target);

        ledgers.pending_treasury -= treasury_absorbed;
        ledgers.pending_lottery -= lottery_absorbed;
        ledgers.total_staked = ledgers.total_staked.saturating_sub(savings_absorbed);

        Ok(DeficitApplied {
            deficit,
            treasury_absorbed,
            lottery_absorbed,
            savings_absorbed,
        })
    }
}
