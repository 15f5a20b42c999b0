//! Pool ownership and administrative roles.
//!
//! Ownership moves in two steps: the current owner nominates a successor,
//! and the successor accepts. Below the owner sit two grantable roles:
//!
//! | Role       | Covers                                                         |
//! |------------|----------------------------------------------------------------|
//! | `Config`   | Bonus weights, round duration, treasury and tracker sinks, NFTs |
//! | `Critical` | Draw phases, emergency controls, direct funding, strategies    |
//!
//! The owner implicitly holds every role.
//!
//! # Example
//!
//! ```ignore
//! impl HasAuthority for AccessControl {
//!     fn authority(&self) -> &Pubkey { &self.owner }
//!     fn authority_mut(&mut self) -> &mut Pubkey { &mut self.owner }
//!     fn pending_authority(&self) -> &Pubkey { &self.pending_owner }
//!     fn pending_authority_mut(&mut self) -> &mut Pubkey { &mut self.pending_owner }
//! }
//!
//! transfer_authority_impl(&mut access, &caller, &successor)?;
//! accept_authority_impl(&mut access, &successor)?;
//! ```

use pinocchio::{program_error::ProgramError, pubkey::Pubkey};

/// Types that support two-step authority transfer.
pub trait HasAuthority {
    /// Get the current authority pubkey.
    fn authority(&self) -> &Pubkey;
    /// Get mutable reference to authority pubkey.
    fn authority_mut(&mut self) -> &mut Pubkey;
    /// Get the pending authority pubkey.
    fn pending_authority(&self) -> &Pubkey;
    /// Get mutable reference to pending authority pubkey.
    fn pending_authority_mut(&mut self) -> &mut Pubkey;
}

/// Nominate `new_authority` as the pending authority.
///
/// # Errors
/// * `ProgramError::IllegalOwner` if `signer` is not the current authority
#[inline]
pub fn transfer_authority_impl<T: HasAuthority>(
    config: &mut T,
    signer: &Pubkey,
    new_authority: &Pubkey,
) -> Result<(), ProgramError> {
    if config.authority() != signer {
        return Err(ProgramError::IllegalOwner);
    }

    *config.pending_authority_mut() = *new_authority;

    Ok(())
}

/// Complete a two-step transfer, moving the pending authority into place.
///
/// # Errors
/// * `ProgramError::UninitializedAccount` if no pending authority is set
/// * `ProgramError::IllegalOwner` if `signer` is not the pending authority
#[inline]
pub fn accept_authority_impl<T: HasAuthority>(
    config: &mut T,
    signer: &Pubkey,
) -> Result<(), ProgramError> {
    if *config.pending_authority() == Pubkey::default() {
        return Err(ProgramError::UninitializedAccount);
    }

    if config.pending_authority() != signer {
        return Err(ProgramError::IllegalOwner);
    }

    *config.authority_mut() = *config.pending_authority();
    *config.pending_authority_mut() = Pubkey::default();

    Ok(())
}

// ============================================================================
// Roles
// ============================================================================

/// Grantable administrative role.
#[repr(u8)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Routine configuration
    Config = 0,
    /// Safety-critical configuration
    Critical = 1,
}

impl Role {
    #[inline]
    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

/// Compact set of [`Role`]s.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RoleSet(u8);

impl RoleSet {
    /// Empty set.
    pub const EMPTY: Self = Self(0);

    /// Set containing every role.
    pub const ALL: Self = Self(Role::Config.bit() | Role::Critical.bit());

    /// Whether `role` is in the set.
    #[inline]
    pub const fn contains(self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    /// Add `role`.
    #[inline]
    pub fn insert(&mut self, role: Role) {
        self.0 |= role.bit();
    }

    /// Remove `role`.
    #[inline]
    pub fn remove(&mut self, role: Role) {
        self.0 &= !role.bit();
    }

    /// Whether no role is held.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}
