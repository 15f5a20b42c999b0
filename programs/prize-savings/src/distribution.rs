//! Yield split between savings, lottery and treasury.

use prize_savings_interface::{BASIS_POINTS, apply_bps};
use serde::{Deserialize, Serialize};

use crate::errors::{PrizeSavingsError, PrizeSavingsResult};

/// How an amount of yield (or loss) is apportioned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DistributionStrategy {
    /// Fixed basis-point split that must sum to 100%.
    FixedPercentage {
        /// Share auto-compounded into depositor balances
        savings_bps: u16,
        /// Share added to the lottery prize
        lottery_bps: u16,
        /// Share sent to the protocol treasury
        treasury_bps: u16,
    },
}

/// Per-destination amounts produced by [`DistributionStrategy::plan`].
///
/// The three fields always sum to the planned amount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DistributionPlan {
    /// Savings portion
    pub savings: u64,
    /// Lottery portion
    pub lottery: u64,
    /// Treasury portion
    pub treasury: u64,
}

impl DistributionStrategy {
    /// Fixed split in basis points.
    ///
    /// # Errors
    /// [`PrizeSavingsError::InvalidDistribution`] if the parts do not sum to
    /// [`BASIS_POINTS`].
    pub fn fixed(savings_bps: u16, lottery_bps: u16, treasury_bps: u16) -> PrizeSavingsResult<Self> {
        let strategy = Self::FixedPercentage {
            savings_bps,
            lottery_bps,
            treasury_bps,
        };
        strategy.validate()?;
        Ok(strategy)
    }

    /// Check the split sums to 100%.
    ///
    /// # Errors
    /// [`PrizeSavingsError::InvalidDistribution`] otherwise.
    pub fn validate(&self) -> PrizeSavingsResult<()> {
        match *self {
            Self::FixedPercentage {
                savings_bps,
                lottery_bps,
                treasury_bps,
            } => {
                let sum = u64::from(savings_bps) + u64::from(lottery_bps) + u64::from(treasury_bps);
                if sum != BASIS_POINTS {
                    return Err(PrizeSavingsError::InvalidDistribution);
                }
                Ok(())
            }
        }
    }

    /// Split `amount`. Lottery and treasury round down; savings takes the
    /// remainder.
    ///
    /// # Errors
    /// [`PrizeSavingsError::InvalidDistribution`] if the split is malformed.
    pub fn plan(&self, amount: u64) -> PrizeSavingsResult<DistributionPlan> {
        match *self {
            Self::FixedPercentage {
                lottery_bps,
                treasury_bps,
                ..
            } => {
                self.validate()?;
                let lottery =
                    apply_bps(amount, lottery_bps).ok_or(PrizeSavingsError::InvalidDistribution)?;
                let treasury =
                    apply_bps(amount, treasury_bps).ok_or(PrizeSavingsError::InvalidDistribution)?;
                // lottery + treasury <= amount since their bps sum <= BASIS_POINTS
                let savings = amount - lottery - treasury;
                Ok(DistributionPlan {
                    savings,
                    lottery,
                    treasury,
                })
            }
        }
    }

    /// Short human-readable label.
    pub fn description(&self) -> String {
        match *self {
            Self::FixedPercentage {
                savings_bps,
                lottery_bps,
                treasury_bps,
            } => format!(
                "Fixed split: savings {}bps, lottery {}bps, treasury {}bps",
                savings_bps, lottery_bps, treasury_bps
            ),
        }
    }
}
