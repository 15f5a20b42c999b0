//! Shared constants and fixed-point helpers.

use bytemuck::{Pod, Zeroable};
use pinocchio::pubkey::Pubkey;

/// Basis points precision (10000 = 100%)
pub const BASIS_POINTS: u64 = 10_000;

/// Base units per whole token (8 decimals).
pub const UNIT: u64 = 100_000_000;

/// Identity of a depositor ("receiver") inside a pool.
pub type ReceiverId = Pubkey;

// ============================================================================
// Fixed-point helpers
// ============================================================================

/// Apply a basis-point rate to an amount, rounding down.
///
/// # Example
/// ```
/// use prize_savings_interface::apply_bps;
///
/// assert_eq!(apply_bps(1_000, 2_500), Some(250));
/// assert_eq!(apply_bps(1_000, 10_001), None);
/// ```
///
/// # Returns
/// `None` if `bps` exceeds [`BASIS_POINTS`].
#[inline]
pub fn apply_bps(amount: u64, bps: u16) -> Option<u64> {
    if u64::from(bps) > BASIS_POINTS {
        return None;
    }
    let scaled = u128::from(amount)
        .checked_mul(u128::from(bps))?
        .checked_div(u128::from(BASIS_POINTS))?;
    // Safe: result <= amount since bps <= BASIS_POINTS
    Some(scaled as u64)
}

/// Compute `a × b / c`, rounding down.
///
/// Returns `None` on overflow or if `c` is zero.
#[inline]
pub fn mul_div_floor(a: u128, b: u128, c: u128) -> Option<u128> {
    a.checked_mul(b)?.checked_div(c)
}

/// Compute `a × b / c`, rounding up.
///
/// Returns `None` on overflow or if `c` is zero.
#[inline]
pub fn mul_div_ceil(a: u128, b: u128, c: u128) -> Option<u128> {
    if c == 0 {
        return None;
    }
    let product = a.checked_mul(b)?;
    let quotient = product / c;
    if product % c == 0 {
        Some(quotient)
    } else {
        quotient.checked_add(1)
    }
}

// ============================================================================
// Randomness request handle
// ============================================================================

/// Opaque handle returned by a randomness oracle.
///
/// The handle is bound to the execution slot at which it was requested; the
/// oracle refuses to fulfill it at that same slot.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct RandomnessRequest {
    /// Oracle-assigned request identifier
    pub request_id: u64,
    /// Execution slot at which the request was committed
    pub requested_at_slot: u64,
}

impl RandomnessRequest {
    /// Size in bytes
    pub const SIZE: usize = 16;

    /// Whether this request may be fulfilled at `slot`.
    #[inline]
    pub const fn is_ready_at(&self, slot: u64) -> bool {
        slot > self.requested_at_slot
    }
}

/// Record passed to a [`WinnerTracker`](crate::WinnerTracker) for each award.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct WinnerRecord {
    /// Pool that ran the draw
    pub pool_id: u64,
    /// Round the prize was drawn for
    pub round_id: u64,
    /// Fungible prize amount (base units)
    pub amount: u64,
    /// Winning receiver
    pub receiver: [u8; 32],
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_bps() {
        assert_eq!(apply_bps(100, 5_000), Some(50));
        assert_eq!(apply_bps(100, 0), Some(0));
        assert_eq!(apply_bps(100, 10_000), Some(100));
        assert_eq!(apply_bps(u64::MAX, 10_000), Some(u64::MAX));
    }

    #[test]
    fn test_apply_bps_rejects_over_100_percent() {
        assert_eq!(apply_bps(100, 10_001), None);
    }

    #[test]
    fn test_mul_div_rounding() {
        assert_eq!(mul_div_floor(10, 1, 3), Some(3));
        assert_eq!(mul_div_ceil(10, 1, 3), Some(4));
        assert_eq!(mul_div_ceil(9, 1, 3), Some(3));
        assert_eq!(mul_div_floor(1, 1, 0), None);
        assert_eq!(mul_div_ceil(u128::MAX, 2, 1), None);
    }

    #[test]
    fn test_randomness_request_readiness() {
        let request = RandomnessRequest { request_id: 7, requested_at_slot: 100 };
        assert!(!request.is_ready_at(99));
        assert!(!request.is_ready_at(100));
        assert!(request.is_ready_at(101));
    }

    #[test]
    fn test_pod_sizes() {
        assert_eq!(core::mem::size_of::<RandomnessRequest>(), RandomnessRequest::SIZE);
        // 3 × u64 + 32-byte receiver
        assert_eq!(core::mem::size_of::<WinnerRecord>(), 56);
    }
}
