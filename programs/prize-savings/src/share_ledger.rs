//! ERC4626-style share accounting.
//!
//! # Virtual Offsets
//!
//! Share price is computed against totals padded by small fixed offsets:
//!
//! ```text
//! share_price = (total_assets + VIRTUAL_ASSETS) / (total_shares + VIRTUAL_SHARES)
//! ```
//!
//! The offsets behave like a dead-weight depositor that can never withdraw.
//! An attacker who donates assets to an empty pool to inflate the price must
//! also donate to the virtual holder, so the first-depositor attack becomes
//! unprofitable. The price is also strictly positive when the ledger is empty.
//!
//! # Yield Dust
//!
//! When yield accrues, the virtual holder's pro-rata slice
//! (`amount × VIRTUAL_SHARES / (total_shares + VIRTUAL_SHARES)`) is not added
//! to `total_assets`. [`ShareLedger::accrue_yield`] returns only the net
//! amount and callers route the dust elsewhere.
//!
//! # Example
//!
//! ```text
//! Empty ledger: price = (0 + 10_000) / (0 + 10_000) = 1.0
//! Deposit 100 tokens (1e10 base units): 1e10 shares minted, price = 1.0
//! Accrue 1 token: dust = 1e8 × 1e4 / (1e10 + 1e4) ≈ 99 base units
//!                 net  ≈ 99_999_901 base units added to total_assets
//! ```

use std::collections::HashMap;

use prize_savings_interface::{ReceiverId, mul_div_ceil, mul_div_floor};

use crate::errors::{PrizeSavingsError, PrizeSavingsResult};

/// Virtual assets added to `total_assets` in price computations (0.0001 token).
pub const VIRTUAL_ASSETS: u128 = 10_000;

/// Virtual shares added to `total_shares` in price computations (0.0001 share).
pub const VIRTUAL_SHARES: u128 = 10_000;

/// Fixed-point scale of [`ShareLedger::share_price`].
pub const PRICE_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Share/asset ledger for one pool.
///
/// Invariant: the sum of all per-receiver shares equals `total_shares`.
#[derive(Debug, Clone, Default)]
pub struct ShareLedger {
    total_shares: u128,
    total_assets: u128,
    shares: HashMap<ReceiverId, u128>,
}

impl ShareLedger {
    /// Empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Total shares outstanding.
    #[inline]
    pub fn total_shares(&self) -> u128 {
        self.total_shares
    }

    /// Total assets backing the shares (base units).
    #[inline]
    pub fn total_assets(&self) -> u128 {
        self.total_assets
    }

    /// Shares held by `receiver`; zero if the receiver holds none.
    #[inline]
    pub fn shares_of(&self, receiver: &ReceiverId) -> u128 {
        self.shares.get(receiver).copied().unwrap_or(0)
    }

    /// Number of receivers holding a non-zero share balance.
    #[inline]
    pub fn holder_count(&self) -> usize {
        self.shares.len()
    }

    /// Iterate `(receiver, shares)` pairs in unspecified order.
    pub fn holders(&self) -> impl Iterator<Item = (&ReceiverId, &u128)> {
        self.shares.iter()
    }

    #[inline]
    fn padded_assets(&self) -> PrizeSavingsResult<u128> {
        self.total_assets
            .checked_add(VIRTUAL_ASSETS)
            .ok_or(PrizeSavingsError::ArithmeticOverflow)
    }

    #[inline]
    fn padded_shares(&self) -> PrizeSavingsResult<u128> {
        self.total_shares
            .checked_add(VIRTUAL_SHARES)
            .ok_or(PrizeSavingsError::ArithmeticOverflow)
    }

    /// Assets per share, scaled by [`PRICE_PRECISION`]. Always positive.
    ///
    /// # Errors
    /// [`PrizeSavingsError::ArithmeticOverflow`] if the totals overflow.
    pub fn share_price(&self) -> PrizeSavingsResult<u128> {
        mul_div_floor(self.padded_assets()?, PRICE_PRECISION, self.padded_shares()?)
            .ok_or(PrizeSavingsError::ArithmeticOverflow)
    }

    /// Shares minted for `amount`, rounded down.
    ///
    /// # Errors
    /// [`PrizeSavingsError::ArithmeticOverflow`] on overflow.
    pub fn convert_to_shares(&self, amount: u64) -> PrizeSavingsResult<u128> {
        mul_div_floor(
            u128::from(amount),
            self.padded_shares()?,
            self.padded_assets()?,
        )
        .ok_or(PrizeSavingsError::ArithmeticOverflow)
    }

    /// Assets redeemable for `shares`, rounded down.
    ///
    /// # Errors
    /// [`PrizeSavingsError::ArithmeticOverflow`] on overflow or if the value
    /// does not fit in a `u64`.
    pub fn convert_to_assets(&self, shares: u128) -> PrizeSavingsResult<u64> {
        let assets = mul_div_floor(shares, self.padded_assets()?, self.padded_shares()?)
            .ok_or(PrizeSavingsError::ArithmeticOverflow)?;
        u64::try_from(assets).map_err(|_| PrizeSavingsError::ArithmeticOverflow)
    }

    /// Asset value of `receiver`'s shares, capped at `total_assets`.
    ///
    /// # Errors
    /// [`PrizeSavingsError::ArithmeticOverflow`] on overflow.
    pub fn user_asset_value(&self, receiver: &ReceiverId) -> PrizeSavingsResult<u64> {
        let value = self.convert_to_assets(self.shares_of(receiver))?;
        let cap = u64::try_from(self.total_assets).unwrap_or(u64::MAX);
        Ok(value.min(cap))
    }

    /// Check the ledger totals agree with each other.
    ///
    /// # Errors
    /// [`PrizeSavingsError::LedgerInconsistent`] if assets exist with no
    /// shares outstanding.
    pub fn ensure_consistent(&self) -> PrizeSavingsResult<()> {
        if self.total_shares == 0 && self.total_assets > 0 {
            return Err(PrizeSavingsError::LedgerInconsistent);
        }
        Ok(())
    }

    /// Shares that withdrawing `amount` would burn for `receiver`.
    ///
    /// Rounds against the withdrawer. A request for the receiver's full value
    /// burns every share they hold.
    ///
    /// # Errors
    /// - [`PrizeSavingsError::InvalidAmount`] for a zero amount
    /// - [`PrizeSavingsError::NoShares`] if the receiver holds nothing
    /// - [`PrizeSavingsError::LedgerInconsistent`] if the totals disagree
    /// - [`PrizeSavingsError::InsufficientShares`] if `amount` exceeds the
    ///   receiver's asset value
    pub fn preview_withdraw(&self, receiver: &ReceiverId, amount: u64) -> PrizeSavingsResult<u128> {
        if amount == 0 {
            return Err(PrizeSavingsError::InvalidAmount);
        }
        let held = self.shares_of(receiver);
        if held == 0 {
            return Err(PrizeSavingsError::NoShares);
        }
        self.ensure_consistent()?;
        if held > self.total_shares {
            return Err(PrizeSavingsError::LedgerInconsistent);
        }

        let value = self.user_asset_value(receiver)?;
        if amount > value {
            return Err(PrizeSavingsError::InsufficientShares);
        }
        if amount == value {
            return Ok(held);
        }

        let burn = mul_div_ceil(
            u128::from(amount),
            self.padded_shares()?,
            self.padded_assets()?,
        )
        .ok_or(PrizeSavingsError::ArithmeticOverflow)?;
        Ok(burn.min(held))
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Mint shares for `amount` deposited by `receiver`.
    ///
    /// Zero is a no-op returning zero shares.
    ///
    /// # Errors
    /// - [`PrizeSavingsError::InvalidAmount`] if `amount` is too small to mint
    ///   a single share
    /// - [`PrizeSavingsError::ArithmeticOverflow`] on overflow
    pub fn deposit(&mut self, receiver: &ReceiverId, amount: u64) -> PrizeSavingsResult<u128> {
        if amount == 0 {
            return Ok(0);
        }
        let minted = self.convert_to_shares(amount)?;
        if minted == 0 {
            return Err(PrizeSavingsError::InvalidAmount);
        }

        let new_total_shares = self
            .total_shares
            .checked_add(minted)
            .ok_or(PrizeSavingsError::ArithmeticOverflow)?;
        let new_total_assets = self
            .total_assets
            .checked_add(u128::from(amount))
            .ok_or(PrizeSavingsError::ArithmeticOverflow)?;
        let new_balance = self
            .shares_of(receiver)
            .checked_add(minted)
            .ok_or(PrizeSavingsError::ArithmeticOverflow)?;

        self.total_shares = new_total_shares;
        self.total_assets = new_total_assets;
        self.shares.insert(*receiver, new_balance);
        Ok(minted)
    }

    /// Burn shares worth `amount` from `receiver`; returns the amount debited.
    ///
    /// # Errors
    /// See [`ShareLedger::preview_withdraw`].
    pub fn withdraw(&mut self, receiver: &ReceiverId, amount: u64) -> PrizeSavingsResult<u64> {
        let burn = self.preview_withdraw(receiver, amount)?;
        let remaining = self.shares_of(receiver) - burn;

        self.total_shares = self
            .total_shares
            .checked_sub(burn)
            .ok_or(PrizeSavingsError::LedgerInconsistent)?;
        self.total_assets = self.total_assets.saturating_sub(u128::from(amount));
        if remaining == 0 {
            self.shares.remove(receiver);
        } else {
            self.shares.insert(*receiver, remaining);
        }
        Ok(amount)
    }

    /// Add yield to `total_assets`, keeping the virtual holder's slice out.
    ///
    /// Returns the net amount accrued. No-op returning zero when no shares
    /// are outstanding; callers must route such yield elsewhere.
    ///
    /// # Errors
    /// [`PrizeSavingsError::ArithmeticOverflow`] on overflow.
    pub fn accrue_yield(&mut self, amount: u64) -> PrizeSavingsResult<u64> {
        if amount == 0 || self.total_shares == 0 {
            return Ok(0);
        }
        let padded = self.padded_shares()?;
        let dust = mul_div_floor(u128::from(amount), VIRTUAL_SHARES, padded)
            .ok_or(PrizeSavingsError::ArithmeticOverflow)?;
        // dust < amount since VIRTUAL_SHARES < padded
        let net = amount - dust as u64;

        self.total_assets = self
            .total_assets
            .checked_add(u128::from(net))
            .ok_or(PrizeSavingsError::ArithmeticOverflow)?;
        Ok(net)
    }

    /// Reduce `total_assets` by up to `amount` without burning shares.
    ///
    /// Lowers the share price for every holder. Returns the actual decrease.
    pub fn decrease_total_assets(&mut self, amount: u64) -> u64 {
        let actual = u128::from(amount).min(self.total_assets);
        self.total_assets -= actual;
        actual as u64
    }
}

// ============================================================================
// Tests
// ============================================================================
