//! Prize savings errors.

use pinocchio::program_error::ProgramError;
use prize_savings_interface::CollaboratorError;

/// Prize savings error codes.
///
/// # Ranges
/// - **0-15**: Pool state and emergency gating
/// - **16-31**: Accounting
/// - **32-47**: Construction-time validation
/// - **48-79**: Draw protocol violations
/// - **80-95**: Administration
/// - **96-111**: Collaborators
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, strum::IntoStaticStr)]
pub enum PrizeSavingsError {
    // =========================================================================
    // Pool state (0-15)
    // =========================================================================
    /// Pool is paused
    PoolPaused = 0,
    /// Deposits are blocked by the current emergency state
    DepositsDisabled = 1,
    /// Draws are blocked by the current emergency state
    DrawsDisabled = 2,
    /// Deposit is below the configured minimum
    BelowMinimumDeposit = 3,
    /// Deposit exceeds the partial-mode cap
    DepositLimitExceeded = 4,

    // =========================================================================
    // Accounting (16-31)
    // =========================================================================
    /// Invalid amount (zero or out of range)
    InvalidAmount = 16,
    /// Receiver holds no shares
    NoShares = 17,
    /// Requested amount exceeds the receiver's asset value
    InsufficientShares = 18,
    /// Ledger totals are inconsistent (e.g. assets with no shares)
    LedgerInconsistent = 19,
    /// Arithmetic overflow
    ArithmeticOverflow = 20,
    /// Yield connector accepted less than the deposited amount
    DepositNotAccepted = 21,

    // =========================================================================
    // Validation (32-47)
    // =========================================================================
    /// Yield distribution percentages do not sum to 100%
    InvalidDistribution = 32,
    /// Prize split percentages are malformed or do not sum to 100%
    InvalidPrizeSplits = 33,
    /// Fixed-amount tier list is empty or contains an empty tier
    EmptyPrizeTiers = 34,
    /// Emergency threshold outside its allowed range
    InvalidThreshold = 35,
    /// Round duration must be positive
    InvalidRoundDuration = 36,
    /// Pool configuration failed to parse or validate
    InvalidConfig = 37,

    // =========================================================================
    // Draw protocol (48-79)
    // =========================================================================
    /// Active round has not ended yet
    RoundNotEnded = 48,
    /// A draw is already in progress
    DrawInProgress = 49,
    /// No draw is in progress
    NoDrawInProgress = 50,
    /// Batch capture has not consumed the full snapshot
    BatchNotComplete = 51,
    /// Batch capture already finished
    BatchAlreadyComplete = 52,
    /// Randomness has not been requested
    RandomnessNotRequested = 53,
    /// Randomness cannot be fulfilled in the same execution step
    RandomnessNotReady = 54,
    /// Batch limit must be positive
    InvalidBatchLimit = 55,
    /// Slot is empty (value already taken)
    SlotEmpty = 56,
    /// Slot already holds a value
    SlotOccupied = 57,

    // =========================================================================
    // Administration (80-95)
    // =========================================================================
    /// Caller lacks the required role
    Unauthorized = 80,
    /// No pending authority to accept
    NoPendingAuthority = 81,
    /// Non-fungible prize id not found
    NftNotFound = 82,
    /// Requested amount exceeds unclaimed treasury funds
    InsufficientUnclaimed = 83,
    /// Claim index out of range
    ClaimNotFound = 84,
    /// Non-fungible prize id already in custody
    DuplicateNft = 85,

    // =========================================================================
    // Collaborators (96-111)
    // =========================================================================
    /// Randomness oracle rejected the call
    RandomnessOracleFailure = 96,
}

impl PrizeSavingsError {
    /// Human-readable error name.
    pub fn name(self) -> &'static str {
        self.into()
    }
}

impl From<PrizeSavingsError> for ProgramError {
    fn from(e: PrizeSavingsError) -> Self {
        ProgramError::Custom(e as u32)
    }
}

impl From<CollaboratorError> for PrizeSavingsError {
    fn from(e: CollaboratorError) -> Self {
        match e {
            CollaboratorError::RevealTooEarly => PrizeSavingsError::RandomnessNotReady,
            _ => PrizeSavingsError::RandomnessOracleFailure,
        }
    }
}

/// Result alias for pool operations.
pub type PrizeSavingsResult<T> = Result<T, PrizeSavingsError>;
