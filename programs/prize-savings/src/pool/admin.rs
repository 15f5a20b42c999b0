//! Access control and role-scoped administrative façades.
//!
//! Permission is checked once, when a façade is obtained:
//!
//! ```ignore
//! pool.config_ops(&signer)?.set_bonus_weight(&receiver, 50, "early supporter")?;
//! pool.critical_ops(&signer)?.start_draw()?;
//! pool.owner_ops(&signer)?.grant_role(&operator, Role::Critical);
//! ```
//!
//! Façade methods never re-check the signer.

use std::collections::HashMap;

use pinocchio::program_error::ProgramError;
use pinocchio::pubkey::Pubkey;
use pinocchio_log::log;
use prize_savings_interface::authority::{
    accept_authority_impl, transfer_authority_impl, HasAuthority, Role, RoleSet,
};
use prize_savings_interface::{
    Clock, RandomnessOracle, ReceiverId, TreasuryReceiver, WinnerTracker, YieldConnector,
};

use super::{BonusWeight, DrawPhase, DrawReceipt, DrawResult, FundingDestination, Pool};
use crate::distribution::DistributionStrategy;
use crate::emergency::{EmergencyConfig, EmergencyState};
use crate::errors::{PrizeSavingsError, PrizeSavingsResult};
use crate::events::BonusWeightUpdatedEvent;
use crate::prize::PrizeDistribution;

// ============================================================================
// Access control
// ============================================================================

/// Owner key, pending successor and granted roles.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessControl {
    owner: Pubkey,
    pending_owner: Pubkey,
    roles: HashMap<Pubkey, RoleSet>,
}

impl HasAuthority for AccessControl {
    fn authority(&self) -> &Pubkey {
        &self.owner
    }

    fn authority_mut(&mut self) -> &mut Pubkey {
        &mut self.owner
    }

    fn pending_authority(&self) -> &Pubkey {
        &self.pending_owner
    }

    fn pending_authority_mut(&mut self) -> &mut Pubkey {
        &mut self.pending_owner
    }
}

impl AccessControl {
    /// Access control owned by `owner` with no roles granted.
    pub fn new(owner: Pubkey) -> Self {
        Self {
            owner,
            pending_owner: Pubkey::default(),
            roles: HashMap::new(),
        }
    }

    /// Current owner.
    pub fn owner(&self) -> &Pubkey {
        &self.owner
    }

    /// Nominated successor, if any.
    pub fn pending_owner(&self) -> Option<&Pubkey> {
        (self.pending_owner != Pubkey::default()).then_some(&self.pending_owner)
    }

    /// Roles explicitly granted to `account`.
    pub fn roles_of(&self, account: &Pubkey) -> RoleSet {
        self.roles.get(account).copied().unwrap_or_default()
    }

    /// Whether `account` may act with `role`. The owner holds every role.
    pub fn has_role(&self, account: &Pubkey, role: Role) -> bool {
        *account == self.owner || self.roles_of(account).contains(role)
    }

    fn grant(&mut self, account: &Pubkey, role: Role) {
        self.roles.entry(*account).or_default().insert(role);
    }

    fn revoke(&mut self, account: &Pubkey, role: Role) {
        if let Some(roles) = self.roles.get_mut(account) {
            roles.remove(role);
            if roles.is_empty() {
                self.roles.remove(account);
            }
        }
    }
}

// ============================================================================
// Façade entry points
// ============================================================================

impl<Y, R, C> Pool<Y, R, C>
where
    Y: YieldConnector,
    R: RandomnessOracle,
    C: Clock,
{
    /// Routine configuration façade.
    ///
    /// # Errors
    /// [`PrizeSavingsError::Unauthorized`] unless `signer` holds [`Role::Config`].
    pub fn config_ops(&mut self, signer: &Pubkey) -> PrizeSavingsResult<ConfigOps<'_, Y, R, C>> {
        if !self.access.has_role(signer, Role::Config) {
            return Err(PrizeSavingsError::Unauthorized);
        }
        Ok(ConfigOps { pool: self })
    }

    /// Safety-critical façade.
    ///
    /// # Errors
    /// [`PrizeSavingsError::Unauthorized`] unless `signer` holds [`Role::Critical`].
    pub fn critical_ops(&mut self, signer: &Pubkey) -> PrizeSavingsResult<CriticalOps<'_, Y, R, C>> {
        if !self.access.has_role(signer, Role::Critical) {
            return Err(PrizeSavingsError::Unauthorized);
        }
        Ok(CriticalOps { pool: self })
    }

    /// Owner-only façade.
    ///
    /// # Errors
    /// [`PrizeSavingsError::Unauthorized`] unless `signer` is the owner.
    pub fn owner_ops(&mut self, signer: &Pubkey) -> PrizeSavingsResult<OwnerOps<'_, Y, R, C>> {
        if self.access.owner() != signer {
            return Err(PrizeSavingsError::Unauthorized);
        }
        Ok(OwnerOps {
            pool: self,
            signer: *signer,
        })
    }

    /// Complete an ownership transfer started by the owner.
    ///
    /// # Errors
    /// - [`PrizeSavingsError::NoPendingAuthority`] if no successor is nominated
    /// - [`PrizeSavingsError::Unauthorized`] if `signer` is not the nominee
    pub fn accept_authority(&mut self, signer: &Pubkey) -> PrizeSavingsResult<()> {
        accept_authority_impl(&mut self.access, signer).map_err(|e| match e {
            ProgramError::UninitializedAccount => PrizeSavingsError::NoPendingAuthority,
            _ => PrizeSavingsError::Unauthorized,
        })?;
        log!("accept_authority: ownership transferred");
        Ok(())
    }
}

// ============================================================================
// Config role
// ============================================================================

/// Operations available to [`Role::Config`].
pub struct ConfigOps<'a, Y, R, C> {
    pool: &'a mut Pool<Y, R, C>,
}

impl<Y, R, C> ConfigOps<'_, Y, R, C>
where
    Y: YieldConnector,
    R: RandomnessOracle,
    C: Clock,
{
    /// Replace `receiver`'s bonus weight.
    ///
    /// # Errors
    /// [`PrizeSavingsError::InvalidAmount`] for a zero bonus (use
    /// [`Self::remove_bonus_weight`]).
    pub fn set_bonus_weight(
        &mut self,
        receiver: &ReceiverId,
        bonus_per_second: u64,
        reason: &str,
    ) -> PrizeSavingsResult<()> {
        if bonus_per_second == 0 {
            return Err(PrizeSavingsError::InvalidAmount);
        }
        self.write_bonus(receiver, bonus_per_second, reason);
        Ok(())
    }

    /// Add `additional` to `receiver`'s bonus weight.
    ///
    /// # Errors
    /// - [`PrizeSavingsError::InvalidAmount`] for zero
    /// - [`PrizeSavingsError::ArithmeticOverflow`] on overflow
    pub fn add_bonus_weight(
        &mut self,
        receiver: &ReceiverId,
        additional: u64,
        reason: &str,
    ) -> PrizeSavingsResult<()> {
        if additional == 0 {
            return Err(PrizeSavingsError::InvalidAmount);
        }
        let current = self.pool.bonus_of(receiver).map_or(0, |b| b.bonus_per_second);
        let updated = current
            .checked_add(additional)
            .ok_or(PrizeSavingsError::ArithmeticOverflow)?;
        self.write_bonus(receiver, updated, reason);
        Ok(())
    }

    /// Drop `receiver`'s bonus weight. Returns whether one existed.
    pub fn remove_bonus_weight(&mut self, receiver: &ReceiverId) -> bool {
        let now = self.pool.clock.now().unix_timestamp;
        let removed = self
            .pool
            .accounts
            .get_mut(receiver)
            .and_then(|account| account.bonus.take())
            .is_some();
        if removed {
            self.pool.events.emit(&BonusWeightUpdatedEvent {
                receiver: *receiver,
                bonus_per_second: 0,
                timestamp: now,
            });
            log!("bonus: removed");
        }
        removed
    }

    fn write_bonus(&mut self, receiver: &ReceiverId, bonus_per_second: u64, reason: &str) {
        let now = self.pool.clock.now().unix_timestamp;
        self.pool.accounts.entry(*receiver).or_default().bonus = Some(BonusWeight {
            bonus_per_second,
            reason: reason.to_string(),
            updated_at: now,
        });
        self.pool.events.emit(&BonusWeightUpdatedEvent {
            receiver: *receiver,
            bonus_per_second,
            timestamp: now,
        });
        log!("bonus: set to {} per second", bonus_per_second);
    }

    /// Change the duration of rounds opened from now on.
    ///
    /// # Errors
    /// [`PrizeSavingsError::InvalidRoundDuration`] for zero.
    pub fn update_round_duration(&mut self, duration: u64) -> PrizeSavingsResult<()> {
        if duration == 0 {
            return Err(PrizeSavingsError::InvalidRoundDuration);
        }
        self.pool.config.round_duration = duration;
        log!("config: round duration set to {}", duration);
        Ok(())
    }

    /// Install or clear the treasury receiver.
    pub fn set_treasury_receiver(&mut self, receiver: Option<Box<dyn TreasuryReceiver>>) {
        self.pool.treasury_receiver = receiver;
    }

    /// Install or clear the winner tracker.
    pub fn set_winner_tracker(&mut self, tracker: Option<Box<dyn WinnerTracker>>) {
        self.pool.winner_tracker = tracker;
    }

    /// Take custody of non-fungible prize `id`.
    ///
    /// # Errors
    /// [`PrizeSavingsError::DuplicateNft`] if already held.
    pub fn deposit_nft_prize(&mut self, id: u64) -> PrizeSavingsResult<()> {
        if self.pool.nft_custody.contains(&id) {
            return Err(PrizeSavingsError::DuplicateNft);
        }
        self.pool.nft_custody.push(id);
        log!("nft: prize {} deposited", id);
        Ok(())
    }

    /// Release non-fungible prize `id` from custody.
    ///
    /// # Errors
    /// [`PrizeSavingsError::NftNotFound`] if not held.
    pub fn withdraw_nft_prize(&mut self, id: u64) -> PrizeSavingsResult<()> {
        let position = self
            .pool
            .nft_custody
            .iter()
            .position(|held| *held == id)
            .ok_or(PrizeSavingsError::NftNotFound)?;
        self.pool.nft_custody.remove(position);
        log!("nft: prize {} withdrawn", id);
        Ok(())
    }
}

// ============================================================================
// Critical role
// ============================================================================

/// Operations available to [`Role::Critical`].
pub struct CriticalOps<'a, Y, R, C> {
    pool: &'a mut Pool<Y, R, C>,
}

impl<Y, R, C> CriticalOps<'_, Y, R, C>
where
    Y: YieldConnector,
    R: RandomnessOracle,
    C: Clock,
{
    /// Freeze the ended round and open the next one. Returns the frozen
    /// round's id.
    ///
    /// # Errors
    /// - Emergency gating errors
    /// - [`PrizeSavingsError::DrawInProgress`]
    /// - [`PrizeSavingsError::RoundNotEnded`]
    pub fn start_draw(&mut self) -> PrizeSavingsResult<u64> {
        self.pool.start_draw()
    }

    /// Capture up to `limit` weights. Returns receivers left to visit.
    ///
    /// # Errors
    /// - [`PrizeSavingsError::InvalidBatchLimit`]
    /// - [`PrizeSavingsError::NoDrawInProgress`]
    /// - [`PrizeSavingsError::BatchAlreadyComplete`]
    pub fn process_draw_batch(&mut self, limit: usize) -> PrizeSavingsResult<usize> {
        self.pool.process_draw_batch(limit)
    }

    /// Materialize the prize and commit to future randomness.
    ///
    /// # Errors
    /// - [`PrizeSavingsError::NoDrawInProgress`]
    /// - [`PrizeSavingsError::BatchNotComplete`]
    /// - [`PrizeSavingsError::DrawInProgress`] if already requested
    /// - [`PrizeSavingsError::RandomnessOracleFailure`]
    pub fn request_draw_randomness(&mut self) -> PrizeSavingsResult<DrawReceipt> {
        self.pool.request_draw_randomness()
    }

    /// Reveal the randomness, select winners and compound their prizes.
    ///
    /// # Errors
    /// - [`PrizeSavingsError::NoDrawInProgress`]
    /// - [`PrizeSavingsError::RandomnessNotRequested`]
    /// - [`PrizeSavingsError::RandomnessNotReady`] in the request's own slot
    pub fn complete_draw(&mut self) -> PrizeSavingsResult<DrawResult> {
        self.pool.complete_draw()
    }

    /// Block deposits and draws; withdrawals stay open.
    pub fn enable_emergency_mode(&mut self, reason: &str) {
        self.pool
            .set_emergency_state(EmergencyState::EmergencyMode, Some(reason.to_string()));
    }

    /// Return to normal operation.
    pub fn disable_emergency_mode(&mut self) {
        self.pool.set_emergency_state(EmergencyState::Normal, None);
    }

    /// Cap deposits and block draws.
    pub fn set_partial_mode(&mut self, reason: &str) {
        self.pool
            .set_emergency_state(EmergencyState::PartialMode, Some(reason.to_string()));
    }

    /// Block every operation.
    pub fn pause(&mut self, reason: &str) {
        self.pool
            .set_emergency_state(EmergencyState::Paused, Some(reason.to_string()));
    }

    /// Replace the emergency thresholds.
    ///
    /// # Errors
    /// [`PrizeSavingsError::InvalidThreshold`] for out-of-range values.
    pub fn set_emergency_config(&mut self, config: EmergencyConfig) -> PrizeSavingsResult<()> {
        self.pool.emergency.set_config(config.clone())?;
        self.pool.config.emergency = config;
        Ok(())
    }

    /// Add `amount` to the prize vault or the treasury.
    ///
    /// # Errors
    /// [`PrizeSavingsError::InvalidAmount`] for zero.
    pub fn fund_direct(&mut self, destination: FundingDestination, amount: u64) -> PrizeSavingsResult<()> {
        self.pool.fund_direct(destination, amount)
    }

    /// Replace the yield split. Yield up to now is reconciled with the old one.
    ///
    /// # Errors
    /// - [`PrizeSavingsError::DrawInProgress`]
    /// - [`PrizeSavingsError::InvalidDistribution`]
    pub fn set_distribution_strategy(&mut self, strategy: DistributionStrategy) -> PrizeSavingsResult<()> {
        self.ensure_idle()?;
        strategy.validate()?;
        let now = self.pool.clock.now().unix_timestamp;
        self.pool.sync_internal(now)?;
        let description = strategy.description();
        log!("config: distribution set to {}", description.as_str());
        self.pool.config.distribution = strategy;
        Ok(())
    }

    /// Replace the prize split.
    ///
    /// # Errors
    /// - [`PrizeSavingsError::DrawInProgress`]
    /// - Validation errors of [`PrizeDistribution::validate`]
    pub fn set_prize_distribution(&mut self, distribution: PrizeDistribution) -> PrizeSavingsResult<()> {
        self.ensure_idle()?;
        distribution.validate()?;
        let description = distribution.description();
        log!("config: prize distribution set to {}", description.as_str());
        self.pool.config.prize_distribution = distribution;
        Ok(())
    }

    fn ensure_idle(&self) -> PrizeSavingsResult<()> {
        if self.pool.draw.phase() != DrawPhase::Idle {
            return Err(PrizeSavingsError::DrawInProgress);
        }
        Ok(())
    }
}

// ============================================================================
// Owner
// ============================================================================

/// Operations reserved to the owner.
pub struct OwnerOps<'a, Y, R, C> {
    pool: &'a mut Pool<Y, R, C>,
    signer: Pubkey,
}

impl<Y, R, C> OwnerOps<'_, Y, R, C>
where
    Y: YieldConnector,
    R: RandomnessOracle,
    C: Clock,
{
    /// Grant `role` to `account`.
    pub fn grant_role(&mut self, account: &Pubkey, role: Role) {
        self.pool.access.grant(account, role);
        log!("roles: granted");
    }

    /// Revoke `role` from `account`.
    pub fn revoke_role(&mut self, account: &Pubkey, role: Role) {
        self.pool.access.revoke(account, role);
        log!("roles: revoked");
    }

    /// Release `amount` of parked treasury funds to the owner.
    ///
    /// # Errors
    /// - [`PrizeSavingsError::InvalidAmount`] for zero
    /// - [`PrizeSavingsError::InsufficientUnclaimed`] above the parked balance
    pub fn withdraw_unclaimed_treasury(&mut self, amount: u64) -> PrizeSavingsResult<u64> {
        if amount == 0 {
            return Err(PrizeSavingsError::InvalidAmount);
        }
        let counters = &mut self.pool.counters;
        counters.unclaimed_treasury = counters
            .unclaimed_treasury
            .checked_sub(amount)
            .ok_or(PrizeSavingsError::InsufficientUnclaimed)?;
        log!("treasury: {} unclaimed withdrawn", amount);
        Ok(amount)
    }

    /// Nominate `new_owner`; they must call [`Pool::accept_authority`].
    ///
    /// # Errors
    /// [`PrizeSavingsError::Unauthorized`] if ownership moved meanwhile.
    pub fn transfer_authority(&mut self, new_owner: &Pubkey) -> PrizeSavingsResult<()> {
        transfer_authority_impl(&mut self.pool.access, &self.signer, new_owner)
            .map_err(|_| PrizeSavingsError::Unauthorized)?;
        log!("transfer_authority: successor nominated");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: Pubkey = [1; 32];
    const OPERATOR: Pubkey = [2; 32];

    #[test]
    fn test_owner_holds_every_role() {
        let access = AccessControl::new(OWNER);
        assert!(access.has_role(&OWNER, Role::Config));
        assert!(access.has_role(&OWNER, Role::Critical));
        assert!(!access.has_role(&OPERATOR, Role::Config));
    }

    #[test]
    fn test_grant_and_revoke() {
        let mut access = AccessControl::new(OWNER);
        access.grant(&OPERATOR, Role::Critical);
        assert!(access.has_role(&OPERATOR, Role::Critical));
        assert!(!access.has_role(&OPERATOR, Role::Config));

        access.revoke(&OPERATOR, Role::Critical);
        assert_eq!(access.roles_of(&OPERATOR), RoleSet::EMPTY);
    }

    #[test]
    fn test_pending_owner() {
        let mut access = AccessControl::new(OWNER);
        assert_eq!(access.pending_owner(), None);

        transfer_authority_impl(&mut access, &OWNER, &OPERATOR)
            .expect("owner should nominate");
        assert_eq!(access.pending_owner(), Some(&OPERATOR));

        accept_authority_impl(&mut access, &OPERATOR).expect("nominee should accept");
        assert_eq!(access.owner(), &OPERATOR);
        assert_eq!(access.pending_owner(), None);
    }
}
