//! Emergency state machine.
//!
//! | State           | Deposits        | Withdrawals | Draws   |
//! |-----------------|-----------------|-------------|---------|
//! | `Normal`        | yes             | yes         | yes     |
//! | `Paused`        | no              | no          | no      |
//! | `EmergencyMode` | no              | yes         | no      |
//! | `PartialMode`   | capped          | yes         | no      |
//!
//! # Health Score
//!
//! ```text
//! health_bps = (balance >= total_staked × min_balance_threshold_bps ? 5_000 : 0)
//!            + 5_000 / (consecutive_withdraw_failures + 1)
//! ```
//!
//! From `Normal`, health below `min_yield_source_health_bps` or failures at
//! `max_withdraw_failures` enters `EmergencyMode`. An auto-triggered
//! emergency recovers immediately at [`IMMEDIATE_RECOVERY_HEALTH_BPS`], or
//! after `max_emergency_duration` once health reaches
//! `min_recovery_health_bps`. Manually entered states only leave through an
//! explicit call.

use num_enum::{IntoPrimitive, TryFromPrimitive};
use prize_savings_interface::{BASIS_POINTS, UNIT};
use serde::{Deserialize, Serialize};

use crate::errors::{PrizeSavingsError, PrizeSavingsResult};

/// Health at or above which an auto-triggered emergency ends at once.
pub const IMMEDIATE_RECOVERY_HEALTH_BPS: u64 = 9_000;

/// Half of the health score, awarded per component.
const HEALTH_COMPONENT_BPS: u64 = 5_000;

/// Operating state of a pool.
#[repr(u8)]
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    TryFromPrimitive,
    IntoPrimitive,
    strum::IntoStaticStr,
    Serialize,
    Deserialize,
)]
pub enum EmergencyState {
    /// Everything allowed
    #[default]
    Normal = 0,
    /// Everything blocked
    Paused = 1,
    /// Withdrawals only
    EmergencyMode = 2,
    /// Capped deposits and withdrawals, no draws
    PartialMode = 3,
}

/// Thresholds driving automatic emergency transitions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmergencyConfig {
    /// Seconds after which time-based recovery may apply
    pub max_emergency_duration: Option<u64>,
    /// Whether auto-triggered emergencies may recover on their own
    pub auto_recovery_enabled: bool,
    /// Health below which `Normal` enters `EmergencyMode`
    pub min_yield_source_health_bps: u16,
    /// Consecutive failed withdrawals that trigger `EmergencyMode`
    pub max_withdraw_failures: u32,
    /// Largest single deposit accepted in `PartialMode`
    pub partial_mode_deposit_limit: Option<u64>,
    /// Fraction of `total_staked` the yield source must report
    pub min_balance_threshold_bps: u16,
    /// Health required for time-based recovery
    pub min_recovery_health_bps: u16,
}

impl Default for EmergencyConfig {
    fn default() -> Self {
        Self {
            max_emergency_duration: Some(86_400),
            auto_recovery_enabled: true,
            min_yield_source_health_bps: 5_000,
            max_withdraw_failures: 3,
            partial_mode_deposit_limit: Some(100 * UNIT),
            min_balance_threshold_bps: 9_500,
            min_recovery_health_bps: 5_000,
        }
    }
}

impl EmergencyConfig {
    /// Construction-time checks.
    ///
    /// # Errors
    /// [`PrizeSavingsError::InvalidThreshold`] if a basis-point threshold
    /// exceeds 100% or `max_withdraw_failures` is zero.
    pub fn validate(&self) -> PrizeSavingsResult<()> {
        let bps_fields = [
            self.min_yield_source_health_bps,
            self.min_balance_threshold_bps,
            self.min_recovery_health_bps,
        ];
        if bps_fields.iter().any(|bps| u64::from(*bps) > BASIS_POINTS) {
            return Err(PrizeSavingsError::InvalidThreshold);
        }
        if self.max_withdraw_failures == 0 {
            return Err(PrizeSavingsError::InvalidThreshold);
        }
        Ok(())
    }
}

/// A state change made by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateTransition {
    /// Previous state
    pub from: EmergencyState,
    /// New state
    pub to: EmergencyState,
    /// Health score at the time of the change
    pub health_bps: u64,
}

/// Emergency state plus the bookkeeping behind automatic transitions.
#[derive(Debug, Clone, Default)]
pub struct EmergencyController {
    config: EmergencyConfig,
    state: EmergencyState,
    reason: Option<String>,
    activated_at: Option<u64>,
    auto_triggered: bool,
    consecutive_withdraw_failures: u32,
}

impl EmergencyController {
    /// Controller in `Normal` state.
    pub fn new(config: EmergencyConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Current state.
    #[inline]
    pub fn state(&self) -> EmergencyState {
        self.state
    }

    /// Active configuration.
    #[inline]
    pub fn config(&self) -> &EmergencyConfig {
        &self.config
    }

    /// Reason recorded when the current non-normal state was entered.
    #[inline]
    pub fn reason(&self) -> Option<&str> {
        self.reason.as_deref()
    }

    /// Timestamp the current non-normal state was entered.
    #[inline]
    pub fn activated_at(&self) -> Option<u64> {
        self.activated_at
    }

    /// Whether the current state was entered automatically.
    #[inline]
    pub fn is_auto_triggered(&self) -> bool {
        self.auto_triggered
    }

    /// Consecutive zero or partial withdrawals.
    #[inline]
    pub fn consecutive_withdraw_failures(&self) -> u32 {
        self.consecutive_withdraw_failures
    }

    /// Replace the configuration.
    ///
    /// # Errors
    /// See [`EmergencyConfig::validate`].
    pub fn set_config(&mut self, config: EmergencyConfig) -> PrizeSavingsResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Health score in basis points.
    pub fn health_bps(&self, balance: u64, total_staked: u64) -> u64 {
        let required = u128::from(total_staked) * u128::from(self.config.min_balance_threshold_bps);
        let available = u128::from(balance) * u128::from(BASIS_POINTS);
        let balance_component = if available >= required {
            HEALTH_COMPONENT_BPS
        } else {
            0
        };
        let failure_component =
            HEALTH_COMPONENT_BPS / (u64::from(self.consecutive_withdraw_failures) + 1);
        balance_component + failure_component
    }

    /// Whether `Normal` should enter `EmergencyMode` at `health_bps`.
    pub fn should_auto_trigger(&self, health_bps: u64) -> bool {
        self.state == EmergencyState::Normal
            && (health_bps < u64::from(self.config.min_yield_source_health_bps)
                || self.consecutive_withdraw_failures >= self.config.max_withdraw_failures)
    }

    /// Whether an auto-triggered emergency should end at `now`.
    pub fn should_auto_recover(&self, health_bps: u64, now: u64) -> bool {
        if self.state != EmergencyState::EmergencyMode
            || !self.auto_triggered
            || !self.config.auto_recovery_enabled
        {
            return false;
        }
        if health_bps >= IMMEDIATE_RECOVERY_HEALTH_BPS {
            return true;
        }
        match (self.config.max_emergency_duration, self.activated_at) {
            (Some(max_duration), Some(activated_at)) => {
                now.saturating_sub(activated_at) >= max_duration
                    && health_bps >= u64::from(self.config.min_recovery_health_bps)
            }
            _ => false,
        }
    }

    /// Apply automatic trigger or recovery for the current health.
    pub fn refresh(&mut self, balance: u64, total_staked: u64, now: u64) -> Option<StateTransition> {
        let health_bps = self.health_bps(balance, total_staked);
        if self.should_auto_trigger(health_bps) {
            Some(self.enter(
                EmergencyState::EmergencyMode,
                Some("auto-triggered: yield source unhealthy".to_string()),
                now,
                true,
                health_bps,
            ))
        } else if self.should_auto_recover(health_bps, now) {
            Some(self.enter(EmergencyState::Normal, None, now, false, health_bps))
        } else {
            None
        }
    }

    /// Move to `state` manually.
    pub fn set_state(
        &mut self,
        state: EmergencyState,
        reason: Option<String>,
        now: u64,
        health_bps: u64,
    ) -> StateTransition {
        self.enter(state, reason, now, false, health_bps)
    }

    fn enter(
        &mut self,
        state: EmergencyState,
        reason: Option<String>,
        now: u64,
        auto: bool,
        health_bps: u64,
    ) -> StateTransition {
        let from = self.state;
        self.state = state;
        if state == EmergencyState::Normal {
            self.reason = None;
            self.activated_at = None;
            self.auto_triggered = false;
            self.consecutive_withdraw_failures = 0;
        } else {
            self.reason = reason;
            self.activated_at = Some(now);
            self.auto_triggered = auto;
        }
        StateTransition {
            from,
            to: state,
            health_bps,
        }
    }

    /// Count a withdrawal that returned less than requested.
    pub fn record_withdraw_failure(&mut self) {
        self.consecutive_withdraw_failures = self.consecutive_withdraw_failures.saturating_add(1);
    }

    /// Count a fully satisfied withdrawal.
    pub fn record_withdraw_success(&mut self) {
        self.consecutive_withdraw_failures = 0;
    }

    /// Gate a deposit of `amount`.
    ///
    /// # Errors
    /// - [`PrizeSavingsError::PoolPaused`] when paused
    /// - [`PrizeSavingsError::DepositsDisabled`] in emergency mode
    /// - [`PrizeSavingsError::DepositLimitExceeded`] above the partial-mode cap
    pub fn check_deposit(&self, amount: u64) -> PrizeSavingsResult<()> {
        match self.state {
            EmergencyState::Normal => Ok(()),
            EmergencyState::Paused => Err(PrizeSavingsError::PoolPaused),
            EmergencyState::EmergencyMode => Err(PrizeSavingsError::DepositsDisabled),
            EmergencyState::PartialMode => match self.config.partial_mode_deposit_limit {
                Some(limit) if amount > limit => Err(PrizeSavingsError::DepositLimitExceeded),
                _ => Ok(()),
            },
        }
    }

    /// Gate a withdrawal.
    ///
    /// # Errors
    /// [`PrizeSavingsError::PoolPaused`] when paused.
    pub fn check_withdraw(&self) -> PrizeSavingsResult<()> {
        match self.state {
            EmergencyState::Paused => Err(PrizeSavingsError::PoolPaused),
            _ => Ok(()),
        }
    }

    /// Gate a draw phase.
    ///
    /// # Errors
    /// - [`PrizeSavingsError::PoolPaused`] when paused
    /// - [`PrizeSavingsError::DrawsDisabled`] in emergency or partial mode
    pub fn check_draw(&self) -> PrizeSavingsResult<()> {
        match self.state {
            EmergencyState::Normal => Ok(()),
            EmergencyState::Paused => Err(PrizeSavingsError::PoolPaused),
            EmergencyState::EmergencyMode | EmergencyState::PartialMode => {
                Err(PrizeSavingsError::DrawsDisabled)
            }
        }
    }
}
