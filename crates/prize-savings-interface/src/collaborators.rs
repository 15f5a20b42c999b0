//! External collaborator traits.
//!
//! All calls against collaborators happen sequentially inside a single pool
//! operation. The pool treats every answer as authoritative and never retries.

use crate::{CollaboratorError, RandomnessRequest, WinnerRecord};

/// Yield-generating venue holding the pool's deposited assets.
///
/// # Liquidity
///
/// `withdraw_available` may return less than requested, including zero. The
/// pool must never assume full liquidity.
pub trait YieldConnector {
    /// Largest amount the venue will currently take in one deposit.
    ///
    /// A `deposit_capacity` call for at most this amount accepts all of it.
    fn deposit_limit(&self) -> u64 {
        u64::MAX
    }

    /// Deposit up to `amount`; returns the amount actually accepted.
    fn deposit_capacity(&mut self, amount: u64) -> u64;

    /// Balance the venue currently reports as available to the pool.
    fn minimum_available(&self) -> u64;

    /// Withdraw up to `max_amount`; returns the amount actually released.
    fn withdraw_available(&mut self, max_amount: u64) -> u64;
}

/// Commit/reveal randomness source.
///
/// A request is bound to the slot it was made at and must be fulfilled at a
/// strictly later slot, so the outcome cannot be known when it is committed.
pub trait RandomnessOracle {
    /// Commit to a future random value.
    fn request_randomness(&mut self, slot: u64) -> Result<RandomnessRequest, CollaboratorError>;

    /// Reveal the value committed by `request`.
    ///
    /// Must fail with [`CollaboratorError::RevealTooEarly`] when
    /// `slot <= request.requested_at_slot`.
    fn fulfill_random_request(
        &mut self,
        request: RandomnessRequest,
        slot: u64,
    ) -> Result<u64, CollaboratorError>;
}

/// Optional destination for protocol treasury funds.
pub trait TreasuryReceiver {
    /// Accept `amount` base units. An error leaves the funds with the pool.
    fn receive(&mut self, amount: u64) -> Result<(), CollaboratorError>;
}

/// Optional external leaderboard of draw winners.
pub trait WinnerTracker {
    /// Record one award. Failures are logged by the pool and otherwise ignored.
    fn record_winner(
        &mut self,
        record: &WinnerRecord,
        nft_ids: &[u64],
    ) -> Result<(), CollaboratorError>;
}
