//! Pool coordinator.
//!
//! A [`Pool`] owns one [`ShareLedger`], the active [`Round`], the draw state
//! machine and the emergency controller, and drives its collaborators:
//!
//! ```text
//!            deposit / withdraw
//!                   │
//!                   ▼
//!   ┌──────────── Pool ─────────────┐
//!   │ ShareLedger ◄── YieldSync ◄───┼── YieldConnector.minimum_available
//!   │ Round (active / pending)      │
//!   │ Draw: Idle → BatchCapturing   │── RandomnessOracle
//!   │       → RandomnessRequested   │
//!   │       → Idle                  │── TreasuryReceiver / WinnerTracker
//!   └───────────────────────────────┘
//! ```
//!
//! # Ghost Receivers
//!
//! A receiver whose shares reach zero is unregistered by swap-and-pop,
//! except while a batch capture is walking the registry. Then the receiver
//! stays registered with zero shares (a "ghost") and is unregistered when the
//! draw completes, so registry positions inside the frozen snapshot never move.
//!
//! # Gap Period
//!
//! Between the end of the active round and the next `start_draw`, balance
//! changes freeze the ended round's entry at pre-transaction shares; the next
//! round's lazy default then credits the new balance for its full duration.
//!
//! # Submodules
//!
//! - [`admin`]: Access control and role-scoped administrative façades
//! - [`draw`]: Four-phase draw state machine
//! - [`views`]: Read-only query surface

pub mod admin;
pub mod draw;
pub mod views;

use std::collections::HashMap;

use pinocchio_log::log;
use prize_savings_interface::{
    Clock, RandomnessOracle, ReceiverId, TreasuryReceiver, WinnerTracker, YieldConnector,
};

use crate::config::PoolConfig;
use crate::emergency::{EmergencyController, EmergencyState, StateTransition};
use crate::errors::{PrizeSavingsError, PrizeSavingsResult};
use crate::events::{
    DeficitAppliedEvent, DepositEvent, EmergencyStateChangedEvent, EventLog, NftClaimedEvent,
    SurplusAppliedEvent, WithdrawEvent, WithdrawalFailedEvent,
};
use crate::registry::ReceiverRegistry;
use crate::round::Round;
use crate::share_ledger::ShareLedger;
use crate::yield_sync::{PendingLedgers, SyncOutcome, YieldSyncEngine};

pub use admin::{AccessControl, ConfigOps, CriticalOps, OwnerOps};
pub use draw::{DrawPhase, DrawReceipt, DrawResult, DrawState, FundingDestination};
pub use views::{DrawStatus, EmergencyInfo, PoolStats, TreasuryStats, UserBalance};

/// Extra draw weight granted to a receiver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BonusWeight {
    /// Weight added per second of round duration
    pub bonus_per_second: u64,
    /// Why the bonus was granted
    pub reason: String,
    /// Timestamp of the last change
    pub updated_at: u64,
}

/// Per-receiver bookkeeping outside the share ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReceiverAccount {
    /// Deposits plus compounded prizes, excluding interest
    pub principal: u64,
    /// Sum of all fungible prizes won
    pub lifetime_prizes: u64,
    /// Bonus weight, if any
    pub bonus: Option<BonusWeight>,
    /// Non-fungible prizes awaiting claim
    pub pending_nft_claims: Vec<u64>,
}

/// Aggregate counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolCounters {
    /// Lifetime deposits (base units)
    pub total_deposited: u128,
    /// Lifetime withdrawals released (base units)
    pub total_withdrawn: u128,
    /// Lifetime treasury funds delivered to the receiver
    pub total_treasury_forwarded: u128,
    /// Treasury funds held by the pool after a failed or absent forward
    pub unclaimed_treasury: u64,
    /// Prize funds withdrawn from the yield source and not yet awarded
    pub prize_vault: u64,
    /// Lifetime fungible prizes awarded
    pub total_prizes_awarded: u128,
    /// Completed draws
    pub draw_count: u64,
}

/// Result of a deposit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepositReceipt {
    /// Amount the yield connector accepted and the ledger credited
    pub amount: u64,
    /// Shares minted
    pub shares_minted: u128,
}

/// Result of a withdrawal.
///
/// `released < requested` is not an error: the yield source was short of
/// liquidity and the failure counter was incremented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WithdrawOutcome {
    /// Amount asked for
    pub requested: u64,
    /// Amount the yield source released
    pub released: u64,
    /// Shares burned for `released`
    pub shares_burned: u128,
}

impl WithdrawOutcome {
    /// Whether the full amount was released.
    #[inline]
    pub fn is_complete(&self) -> bool {
        self.released == self.requested
    }
}

/// Prize-linked savings pool.
pub struct Pool<Y, R, C> {
    id: u64,
    config: PoolConfig,
    connector: Y,
    oracle: R,
    clock: C,
    treasury_receiver: Option<Box<dyn TreasuryReceiver>>,
    winner_tracker: Option<Box<dyn WinnerTracker>>,
    ledger: ShareLedger,
    pending: PendingLedgers,
    active_round: Round,
    next_round_id: u64,
    draw: DrawState,
    registry: ReceiverRegistry,
    deferred_unregistrations: Vec<ReceiverId>,
    accounts: HashMap<ReceiverId, ReceiverAccount>,
    emergency: EmergencyController,
    counters: PoolCounters,
    nft_custody: Vec<u64>,
    access: AccessControl,
    events: EventLog,
}

impl<Y, R, C> Pool<Y, R, C>
where
    Y: YieldConnector,
    R: RandomnessOracle,
    C: Clock,
{
    /// Create a pool and open its first round at the current time.
    ///
    /// # Errors
    /// Any validation error from [`PoolConfig::validate`].
    pub fn new(
        id: u64,
        config: PoolConfig,
        owner: ReceiverId,
        connector: Y,
        oracle: R,
        clock: C,
    ) -> PrizeSavingsResult<Self> {
        config.validate()?;
        let now = clock.now();
        let active_round = Round::new(1, now.unix_timestamp, config.round_duration)?;
        let emergency = EmergencyController::new(config.emergency.clone());

        log!("pool {}: created", id);

        Ok(Self {
            id,
            config,
            connector,
            oracle,
            clock,
            treasury_receiver: None,
            winner_tracker: None,
            ledger: ShareLedger::new(),
            pending: PendingLedgers::default(),
            active_round,
            next_round_id: 2,
            draw: DrawState::default(),
            registry: ReceiverRegistry::new(),
            deferred_unregistrations: Vec::new(),
            accounts: HashMap::new(),
            emergency,
            counters: PoolCounters::default(),
            nft_custody: Vec::new(),
            access: AccessControl::new(owner),
            events: EventLog::default(),
        })
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Pool identifier.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Current configuration.
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Share ledger.
    pub fn ledger(&self) -> &ShareLedger {
        &self.ledger
    }

    /// Internal balances the yield source must cover.
    pub fn pending_ledgers(&self) -> &PendingLedgers {
        &self.pending
    }

    /// Round currently accumulating weight.
    pub fn active_round(&self) -> &Round {
        &self.active_round
    }

    /// Receiver registry.
    pub fn registry(&self) -> &ReceiverRegistry {
        &self.registry
    }

    /// Aggregate counters.
    pub fn counters(&self) -> &PoolCounters {
        &self.counters
    }

    /// Emergency controller.
    pub fn emergency(&self) -> &EmergencyController {
        &self.emergency
    }

    /// Bookkeeping for `receiver`, if they ever interacted.
    pub fn account(&self, receiver: &ReceiverId) -> Option<&ReceiverAccount> {
        self.accounts.get(receiver)
    }

    /// Access control state.
    pub fn access(&self) -> &AccessControl {
        &self.access
    }

    /// Recorded events.
    pub fn events(&self) -> &EventLog {
        &self.events
    }

    /// Mutable event log, for draining.
    pub fn events_mut(&mut self) -> &mut EventLog {
        &mut self.events
    }

    /// Yield connector.
    pub fn connector(&self) -> &Y {
        &self.connector
    }

    /// Mutable yield connector.
    pub fn connector_mut(&mut self) -> &mut Y {
        &mut self.connector
    }

    /// Randomness oracle.
    pub fn oracle(&self) -> &R {
        &self.oracle
    }

    /// Mutable randomness oracle.
    pub fn oracle_mut(&mut self) -> &mut R {
        &mut self.oracle
    }

    /// Non-fungible prize ids in custody.
    pub fn nft_custody(&self) -> &[u64] {
        &self.nft_custody
    }

    /// Receivers kept registered with zero shares until the draw completes.
    pub fn deferred_unregistrations(&self) -> &[ReceiverId] {
        &self.deferred_unregistrations
    }

    // ========================================================================
    // Deposit / Withdraw
    // ========================================================================

    /// Deposit `amount` for `receiver`.
    ///
    /// Reconciles with the yield source first, then mints shares for the
    /// amount the yield connector accepts. The connector's `deposit_limit`
    /// is checked against the minimum deposit before any funds move.
    ///
    /// # Errors
    /// - [`PrizeSavingsError::InvalidAmount`] for zero or share-less amounts
    /// - [`PrizeSavingsError::BelowMinimumDeposit`] when the amount, or the
    ///   part of it the connector will take, is under the minimum
    /// - Emergency gating errors (see [`EmergencyController::check_deposit`])
    /// - [`PrizeSavingsError::DepositNotAccepted`] if the connector takes
    ///   nothing, or accepts too little to credit; accepted funds are then
    ///   withdrawn again
    pub fn deposit(&mut self, receiver: &ReceiverId, amount: u64) -> PrizeSavingsResult<DepositReceipt> {
        if amount == 0 {
            return Err(PrizeSavingsError::InvalidAmount);
        }
        if amount < self.config.minimum_deposit {
            log!("deposit: below minimum deposit");
            return Err(PrizeSavingsError::BelowMinimumDeposit);
        }

        let now = self.clock.now().unix_timestamp;
        self.refresh_emergency(now);
        self.emergency.check_deposit(amount)?;
        self.sync_internal(now)?;

        let quoted = amount.min(self.connector.deposit_limit());
        if quoted == 0 {
            log!("deposit: yield connector accepts nothing");
            return Err(PrizeSavingsError::DepositNotAccepted);
        }
        if quoted < self.config.minimum_deposit {
            log!("deposit: yield connector capacity below minimum deposit");
            return Err(PrizeSavingsError::BelowMinimumDeposit);
        }
        if self.ledger.convert_to_shares(quoted)? == 0 {
            return Err(PrizeSavingsError::InvalidAmount);
        }

        let accepted = self.connector.deposit_capacity(quoted).min(quoted);
        if accepted < self.config.minimum_deposit || self.ledger.convert_to_shares(accepted)? == 0 {
            log!("deposit: yield connector accepted {} of quoted {}", accepted, quoted);
            self.return_to_connector(accepted);
            return Err(PrizeSavingsError::DepositNotAccepted);
        }

        let shares_minted = self.credit_shares(receiver, accepted, now)?;

        let account = self.accounts.entry(*receiver).or_default();
        account.principal = account.principal.saturating_add(accepted);
        self.counters.total_deposited = self
            .counters
            .total_deposited
            .saturating_add(u128::from(accepted));

        self.events.emit(&DepositEvent {
            shares_minted,
            receiver: *receiver,
            amount: accepted,
            timestamp: now,
        });
        log!("deposit: {} base units credited", accepted);

        Ok(DepositReceipt {
            amount: accepted,
            shares_minted,
        })
    }

    /// Withdraw up to `amount` for `receiver`.
    ///
    /// The yield source may release less than requested, including nothing;
    /// the outcome reports what was released and the failure counter grows.
    ///
    /// # Errors
    /// - [`PrizeSavingsError::PoolPaused`]
    /// - Ledger validation errors (see [`ShareLedger::preview_withdraw`])
    pub fn withdraw(&mut self, receiver: &ReceiverId, amount: u64) -> PrizeSavingsResult<WithdrawOutcome> {
        let now = self.clock.now().unix_timestamp;
        self.refresh_emergency(now);
        self.emergency.check_withdraw()?;
        self.sync_internal(now)?;

        self.ledger.preview_withdraw(receiver, amount)?;

        let released = self.connector.withdraw_available(amount).min(amount);
        if released < amount {
            self.emergency.record_withdraw_failure();
            self.events.emit(&WithdrawalFailedEvent {
                receiver: *receiver,
                requested: amount,
                released,
                consecutive_failures: u64::from(self.emergency.consecutive_withdraw_failures()),
                timestamp: now,
            });
            log!(
                "withdraw: yield source released {} of {}",
                released,
                amount
            );
        } else {
            self.emergency.record_withdraw_success();
        }

        if released == 0 {
            return Ok(WithdrawOutcome {
                requested: amount,
                released: 0,
                shares_burned: 0,
            });
        }

        let value_before = self.ledger.user_asset_value(receiver)?;
        let old_shares = self.ledger.shares_of(receiver);
        self.freeze_pending_entry(receiver, old_shares)?;
        self.ledger.withdraw(receiver, released)?;
        let new_shares = self.ledger.shares_of(receiver);
        self.update_active_round(receiver, old_shares, new_shares, now)?;

        self.pending.total_staked = self.pending.total_staked.saturating_sub(released);
        self.counters.total_withdrawn = self
            .counters
            .total_withdrawn
            .saturating_add(u128::from(released));

        let account = self.accounts.entry(*receiver).or_default();
        if new_shares == 0 {
            account.principal = 0;
            self.release_receiver(receiver);
        } else {
            // Interest is debited before principal
            let interest = value_before.saturating_sub(account.principal);
            let principal_debit = released.saturating_sub(interest);
            account.principal = account.principal.saturating_sub(principal_debit);
        }

        let shares_burned = old_shares - new_shares;
        self.events.emit(&WithdrawEvent {
            shares_burned,
            receiver: *receiver,
            requested: amount,
            amount: released,
            timestamp: now,
            _padding: 0,
        });
        log!("withdraw: {} base units released", released);

        Ok(WithdrawOutcome {
            requested: amount,
            released,
            shares_burned,
        })
    }

    /// Reconcile the yield source balance with the internal ledgers.
    ///
    /// Calling twice with no external change is a no-op the second time.
    ///
    /// # Errors
    /// [`PrizeSavingsError::ArithmeticOverflow`] on overflow.
    pub fn sync_with_yield_source(&mut self) -> PrizeSavingsResult<SyncOutcome> {
        let now = self.clock.now().unix_timestamp;
        self.refresh_emergency(now);
        self.sync_internal(now)
    }

    /// Claim the non-fungible prize at `index` of `receiver`'s pending list.
    ///
    /// # Errors
    /// [`PrizeSavingsError::ClaimNotFound`] if `index` is out of range.
    pub fn claim_nft_prize(&mut self, receiver: &ReceiverId, index: usize) -> PrizeSavingsResult<u64> {
        let now = self.clock.now().unix_timestamp;
        let claims = self
            .accounts
            .get_mut(receiver)
            .map(|account| &mut account.pending_nft_claims)
            .ok_or(PrizeSavingsError::ClaimNotFound)?;
        if index >= claims.len() {
            return Err(PrizeSavingsError::ClaimNotFound);
        }
        let nft_id = claims.remove(index);

        self.events.emit(&NftClaimedEvent {
            receiver: *receiver,
            nft_id,
            timestamp: now,
        });
        log!("claim_nft_prize: prize {} claimed", nft_id);
        Ok(nft_id)
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    fn sync_internal(&mut self, now: u64) -> PrizeSavingsResult<SyncOutcome> {
        let balance = self.connector.minimum_available();
        let engine = YieldSyncEngine::new(&self.config.distribution);
        let outcome = engine.sync(balance, &mut self.pending, &mut self.ledger)?;

        match outcome {
            SyncOutcome::Balanced => {}
            SyncOutcome::Surplus(applied) => {
                self.events.emit(&SurplusAppliedEvent {
                    excess: applied.excess,
                    savings_accrued: applied.savings_accrued,
                    savings_redirected: applied.savings_redirected,
                    lottery: applied.lottery,
                    treasury: applied.treasury,
                    timestamp: now,
                });
                log!("sync: surplus of {} distributed", applied.excess);
            }
            SyncOutcome::Deficit(applied) => {
                self.events.emit(&DeficitAppliedEvent {
                    deficit: applied.deficit,
                    treasury_absorbed: applied.treasury_absorbed,
                    lottery_absorbed: applied.lottery_absorbed,
                    savings_absorbed: applied.savings_absorbed,
                    unabsorbed: applied.unabsorbed(),
                    timestamp: now,
                });
                log!("sync: deficit of {} absorbed", applied.deficit);
            }
        }
        Ok(outcome)
    }

    fn refresh_emergency(&mut self, now: u64) {
        let balance = self.connector.minimum_available();
        if let Some(transition) = self.emergency.refresh(balance, self.pending.total_staked, now) {
            self.record_transition(transition, true, now);
        }
    }

    fn record_transition(&mut self, transition: StateTransition, auto: bool, now: u64) {
        self.events.emit(&EmergencyStateChangedEvent {
            from: transition.from.into(),
            to: transition.to.into(),
            auto: u8::from(auto),
            _padding: [0; 5],
            health_bps: transition.health_bps,
            timestamp: now,
        });
        let to: &'static str = transition.to.into();
        log!("emergency: entered {}", to);
    }

    fn current_health_bps(&self) -> u64 {
        self.emergency
            .health_bps(self.connector.minimum_available(), self.pending.total_staked)
    }

    fn set_emergency_state(&mut self, state: EmergencyState, reason: Option<String>) {
        let now = self.clock.now().unix_timestamp;
        let health_bps = self.current_health_bps();
        let transition = self.emergency.set_state(state, reason, now, health_bps);
        self.record_transition(transition, false, now);
    }

    /// Mint shares for `amount` already placed with the yield connector and
    /// update every round that tracks `receiver`.
    fn credit_shares(&mut self, receiver: &ReceiverId, amount: u64, now: u64) -> PrizeSavingsResult<u128> {
        let new_staked = self
            .pending
            .total_staked
            .checked_add(amount)
            .ok_or(PrizeSavingsError::ArithmeticOverflow)?;

        let old_shares = self.ledger.shares_of(receiver);
        self.freeze_pending_entry(receiver, old_shares)?;
        let minted = self.ledger.deposit(receiver, amount)?;
        let new_shares = self.ledger.shares_of(receiver);
        self.update_active_round(receiver, old_shares, new_shares, now)?;

        self.pending.total_staked = new_staked;
        self.registry.register(receiver);
        self.deferred_unregistrations.retain(|r| r != receiver);
        Ok(minted)
    }

    /// Take back funds the connector accepted but the pool cannot credit.
    ///
    /// Whatever the connector keeps shows up as surplus at the next sync.
    fn return_to_connector(&mut self, amount: u64) {
        if amount == 0 {
            return;
        }
        let released = self.connector.withdraw_available(amount).min(amount);
        if released < amount {
            let stranded = amount - released;
            log!("{} base units left with the yield connector", stranded);
        }
    }

    /// Pin `receiver`'s weight in the round awaiting its draw before their
    /// balance changes.
    fn freeze_pending_entry(&mut self, receiver: &ReceiverId, old_shares: u128) -> PrizeSavingsResult<()> {
        match self.draw.pending_round.as_mut() {
            Some(round) => round.initialize_if_needed(receiver, old_shares),
            None => Ok(()),
        }
    }

    fn update_active_round(
        &mut self,
        receiver: &ReceiverId,
        old_shares: u128,
        new_shares: u128,
        now: u64,
    ) -> PrizeSavingsResult<()> {
        if self.active_round.has_ended(now) {
            // Gap period: the next round's lazy default covers the new balance
            self.active_round.initialize_if_needed(receiver, old_shares)
        } else {
            self.active_round
                .adjust_projection(receiver, old_shares, new_shares, now)
        }
    }

    /// Unregister a zero-share receiver, or defer while a batch is capturing.
    fn release_receiver(&mut self, receiver: &ReceiverId) {
        if self.draw.phase() == DrawPhase::BatchCapturing {
            if !self.deferred_unregistrations.contains(receiver) {
                self.deferred_unregistrations.push(*receiver);
            }
            log!("withdraw: unregistration deferred until draw completes");
        } else {
            self.registry.unregister(receiver);
        }
    }
}
