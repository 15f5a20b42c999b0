//! Prize distribution strategies.
//!
//! A strategy maps an ordered winner list and a total prize to per-winner
//! amounts and non-fungible prize assignments. Strategies never choose
//! winners; [`WeightAccumulator`](crate::weights::WeightAccumulator) does.
//!
//! | Strategy           | Winners               | Amounts                                   |
//! |--------------------|-----------------------|-------------------------------------------|
//! | `SingleWinner`     | 1                     | Entire prize                              |
//! | `PercentageSplit`  | `splits_bps.len()`    | `prize × split[i]`, last takes remainder  |
//! | `FixedAmountTiers` | `Σ tier.winner_count` | Fixed per tier, all-or-nothing            |

use prize_savings_interface::{BASIS_POINTS, ReceiverId, apply_bps};
use serde::{Deserialize, Serialize};

use crate::errors::{PrizeSavingsError, PrizeSavingsResult};

/// One fixed-amount tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrizeTier {
    /// Amount paid to each winner in this tier
    pub amount: u64,
    /// Winners in this tier
    pub winner_count: u32,
    /// Non-fungible prizes shared round-robin among this tier's winners
    #[serde(default)]
    pub nft_ids: Vec<u64>,
}

/// Prize distribution strategy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PrizeDistribution {
    /// Entire prize to one winner.
    SingleWinner {
        /// Non-fungible prizes awarded alongside
        #[serde(default)]
        nft_ids: Vec<u64>,
    },
    /// Prize split by position.
    PercentageSplit {
        /// Basis points per position; must sum to 100%
        splits_bps: Vec<u16>,
        /// Non-fungible prizes per position
        #[serde(default)]
        nft_ids: Vec<Vec<u64>>,
    },
    /// Fixed amounts in ordered tiers.
    FixedAmountTiers {
        /// Tiers consumed in order against the winner list
        tiers: Vec<PrizeTier>,
    },
}

impl Default for PrizeDistribution {
    fn default() -> Self {
        Self::SingleWinner { nft_ids: Vec::new() }
    }
}

/// Output of [`PrizeDistribution::distribute`].
///
/// `winners`, `amounts` and `nft_assignments` are parallel vectors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrizeAllocation {
    /// Receivers awarded, in winner order
    pub winners: Vec<ReceiverId>,
    /// Fungible amount per winner
    pub amounts: Vec<u64>,
    /// Non-fungible prize ids per winner
    pub nft_assignments: Vec<Vec<u64>>,
}

impl PrizeAllocation {
    /// Whether nothing was awarded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.winners.is_empty()
    }

    /// Sum of fungible amounts.
    pub fn total(&self) -> u64 {
        self.amounts.iter().fold(0u64, |acc, a| acc.saturating_add(*a))
    }

    /// Every non-fungible id assigned.
    pub fn nft_ids(&self) -> impl Iterator<Item = u64> + '_ {
        self.nft_assignments.iter().flatten().copied()
    }
}

impl PrizeDistribution {
    /// Single-winner strategy without non-fungible prizes.
    pub fn single_winner() -> Self {
        Self::default()
    }

    /// Validated percentage split.
    ///
    /// # Errors
    /// [`PrizeSavingsError::InvalidPrizeSplits`] if the splits are empty or do
    /// not sum to 100%.
    pub fn percentage_split(splits_bps: Vec<u16>) -> PrizeSavingsResult<Self> {
        let strategy = Self::PercentageSplit {
            splits_bps,
            nft_ids: Vec::new(),
        };
        strategy.validate()?;
        Ok(strategy)
    }

    /// Validated fixed-amount tiers.
    ///
    /// # Errors
    /// [`PrizeSavingsError::EmptyPrizeTiers`] if the list or any tier is empty.
    pub fn fixed_amount_tiers(tiers: Vec<PrizeTier>) -> PrizeSavingsResult<Self> {
        let strategy = Self::FixedAmountTiers { tiers };
        strategy.validate()?;
        Ok(strategy)
    }

    /// Construction-time checks.
    ///
    /// # Errors
    /// - [`PrizeSavingsError::InvalidPrizeSplits`] for malformed splits
    /// - [`PrizeSavingsError::EmptyPrizeTiers`] for an empty tier list or tier
    /// - [`PrizeSavingsError::InvalidAmount`] for a zero-amount tier
    pub fn validate(&self) -> PrizeSavingsResult<()> {
        match self {
            Self::SingleWinner { .. } => Ok(()),
            Self::PercentageSplit { splits_bps, nft_ids } => {
                if splits_bps.is_empty() || nft_ids.len() > splits_bps.len() {
                    return Err(PrizeSavingsError::InvalidPrizeSplits);
                }
                let sum: u64 = splits_bps.iter().map(|s| u64::from(*s)).sum();
                if sum != BASIS_POINTS {
                    return Err(PrizeSavingsError::InvalidPrizeSplits);
                }
                Ok(())
            }
            Self::FixedAmountTiers { tiers } => {
                if tiers.is_empty() {
                    return Err(PrizeSavingsError::EmptyPrizeTiers);
                }
                for tier in tiers {
                    if tier.winner_count == 0 {
                        return Err(PrizeSavingsError::EmptyPrizeTiers);
                    }
                    if tier.amount == 0 {
                        return Err(PrizeSavingsError::InvalidAmount);
                    }
                }
                Ok(())
            }
        }
    }

    /// Number of winners to select.
    pub fn winner_count(&self) -> usize {
        match self {
            Self::SingleWinner { .. } => 1,
            Self::PercentageSplit { splits_bps, .. } => splits_bps.len(),
            Self::FixedAmountTiers { tiers } => {
                tiers.iter().map(|t| t.winner_count as usize).sum()
            }
        }
    }

    /// Non-fungible prize ids this strategy awards.
    pub fn nft_ids(&self) -> Vec<u64> {
        match self {
            Self::SingleWinner { nft_ids } => nft_ids.clone(),
            Self::PercentageSplit { nft_ids, .. } => nft_ids.iter().flatten().copied().collect(),
            Self::FixedAmountTiers { tiers } => {
                tiers.iter().flat_map(|t| t.nft_ids.iter().copied()).collect()
            }
        }
    }

    /// Compute per-winner amounts and non-fungible assignments.
    ///
    /// Returns an empty allocation when `winners` is empty, or for tiers when
    /// the prize or winner list cannot fill every tier.
    ///
    /// # Errors
    /// - [`PrizeSavingsError::InvalidPrizeSplits`] for malformed splits
    /// - [`PrizeSavingsError::ArithmeticOverflow`] on overflow
    pub fn distribute(
        &self,
        winners: &[ReceiverId],
        total_prize: u64,
    ) -> PrizeSavingsResult<PrizeAllocation> {
        if winners.is_empty() {
            return Ok(PrizeAllocation::default());
        }
        match self {
            Self::SingleWinner { nft_ids } => Ok(PrizeAllocation {
                winners: vec![winners[0]],
                amounts: vec![total_prize],
                nft_assignments: vec![nft_ids.clone()],
            }),
            Self::PercentageSplit { splits_bps, nft_ids } => {
                distribute_percentage(splits_bps, nft_ids, winners, total_prize)
            }
            Self::FixedAmountTiers { tiers } => distribute_tiers(tiers, winners, total_prize),
        }
    }

    /// Short human-readable label.
    pub fn description(&self) -> String {
        match self {
            Self::SingleWinner { .. } => "Single winner takes all".to_string(),
            Self::PercentageSplit { splits_bps, .. } => {
                format!("Percentage split across {} winners", splits_bps.len())
            }
            Self::FixedAmountTiers { tiers } => format!(
                "Fixed amounts: {} tiers, {} winners",
                tiers.len(),
                self.winner_count()
            ),
        }
    }
}

fn distribute_percentage(
    splits_bps: &[u16],
    nft_ids: &[Vec<u64>],
    winners: &[ReceiverId],
    total_prize: u64,
) -> PrizeSavingsResult<PrizeAllocation> {
    let count = winners.len().min(splits_bps.len());
    let mut allocation = PrizeAllocation::default();
    let mut distributed = 0u64;

    for (position, winner) in winners.iter().take(count).enumerate() {
        let amount = if position + 1 == count {
            total_prize
                .checked_sub(distributed)
                .ok_or(PrizeSavingsError::InvalidPrizeSplits)?
        } else {
            apply_bps(total_prize, splits_bps[position])
                .ok_or(PrizeSavingsError::InvalidPrizeSplits)?
        };
        distributed = distributed
            .checked_add(amount)
            .ok_or(PrizeSavingsError::ArithmeticOverflow)?;

        allocation.winners.push(*winner);
        allocation.amounts.push(amount);
        allocation
            .nft_assignments
            .push(nft_ids.get(position).cloned().unwrap_or_default());
    }

    Ok(allocation)
}

fn distribute_tiers(
    tiers: &[PrizeTier],
    winners: &[ReceiverId],
    total_prize: u64,
) -> PrizeSavingsResult<PrizeAllocation> {
    let mut required_prize = 0u64;
    let mut required_winners = 0usize;
    for tier in tiers {
        let tier_total = tier
            .amount
            .checked_mul(u64::from(tier.winner_count))
            .ok_or(PrizeSavingsError::ArithmeticOverflow)?;
        required_prize = required_prize
            .checked_add(tier_total)
            .ok_or(PrizeSavingsError::ArithmeticOverflow)?;
        required_winners += tier.winner_count as usize;
    }

    if total_prize < required_prize || winners.len() < required_winners {
        return Ok(PrizeAllocation::default());
    }

    let mut allocation = PrizeAllocation::default();
    let mut next = 0usize;
    for tier in tiers {
        let count = tier.winner_count as usize;
        let mut assignments = vec![Vec::new(); count];
        for (i, nft) in tier.nft_ids.iter().enumerate() {
            assignments[i % count].push(*nft);
        }
        for assignment in assignments {
            allocation.winners.push(winners[next]);
            allocation.amounts.push(tier.amount);
            allocation.nft_assignments.push(assignment);
            next += 1;
        }
    }

    Ok(allocation)
}
