//! Pool configuration.
//!
//! Loaded from JSON by hosts and validated once before a pool is created:
//!
//! ```json
//! {
//!   "asset": "FLOW",
//!   "minimum_deposit": 100000000,
//!   "round_duration": 604800,
//!   "distribution": { "type": "fixed_percentage", "savings_bps": 5000, "lottery_bps": 4000, "treasury_bps": 1000 },
//!   "prize_distribution": { "type": "single_winner" }
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::distribution::DistributionStrategy;
use crate::emergency::EmergencyConfig;
use crate::errors::{PrizeSavingsError, PrizeSavingsResult};
use crate::prize::PrizeDistribution;

/// Static configuration of one pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Asset type tag
    pub asset: String,
    /// Smallest accepted deposit (base units)
    pub minimum_deposit: u64,
    /// Round length in seconds for rounds opened from now on
    pub round_duration: u64,
    /// Yield split
    pub distribution: DistributionStrategy,
    /// Prize split
    #[serde(default)]
    pub prize_distribution: PrizeDistribution,
    /// Emergency thresholds
    #[serde(default)]
    pub emergency: EmergencyConfig,
}

impl PoolConfig {
    /// Check every construction-time rule.
    ///
    /// # Errors
    /// - [`PrizeSavingsError::InvalidRoundDuration`] for a zero round duration
    /// - [`PrizeSavingsError::InvalidConfig`] for an empty asset tag
    /// - Whatever the nested strategies and emergency config report
    pub fn validate(&self) -> PrizeSavingsResult<()> {
        if self.asset.is_empty() {
            return Err(PrizeSavingsError::InvalidConfig);
        }
        if self.round_duration == 0 {
            return Err(PrizeSavingsError::InvalidRoundDuration);
        }
        self.distribution.validate()?;
        self.prize_distribution.validate()?;
        self.emergency.validate()
    }

    /// Parse and validate a JSON configuration.
    ///
    /// # Errors
    /// [`PrizeSavingsError::InvalidConfig`] if the JSON is malformed, or the
    /// validation error otherwise.
    pub fn from_json(json: &str) -> PrizeSavingsResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|_| PrizeSavingsError::InvalidConfig)?;
        config.validate()?;
        Ok(config)
    }
}
