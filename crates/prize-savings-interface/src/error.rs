//! Collaborator error types.

use pinocchio::program_error::ProgramError;

/// Added to a [`CollaboratorError`] code when it is surfaced as
/// `ProgramError::Custom`, keeping it clear of pool error codes.
pub const COLLABORATOR_ERROR_OFFSET: u32 = 1_000;

/// Error codes reported by external collaborators.
///
/// The pool never propagates these from optional sinks (treasury receiver,
/// winner tracker); they are absorbed and logged. Randomness oracle errors
/// abort the draw phase that invoked the oracle.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CollaboratorError {
    /// Collaborator is not reachable or refused the call
    Unavailable = 0,

    /// Randomness request handle is unknown to the oracle
    UnknownRequest = 1,

    /// Randomness was asked for at the same slot it was requested
    RevealTooEarly = 2,

    /// Randomness request was already fulfilled
    AlreadyFulfilled = 3,

    /// Sink rejected the transfer
    Rejected = 4,
}

impl CollaboratorError {
    /// Convert to error code
    pub const fn to_u32(self) -> u32 {
        self as u32
    }

    /// Create from error code
    pub fn from_u32(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Unavailable),
            1 => Some(Self::UnknownRequest),
            2 => Some(Self::RevealTooEarly),
            3 => Some(Self::AlreadyFulfilled),
            4 => Some(Self::Rejected),
            _ => None,
        }
    }
}

impl From<CollaboratorError> for ProgramError {
    fn from(e: CollaboratorError) -> Self {
        ProgramError::Custom(COLLABORATOR_ERROR_OFFSET + e.to_u32())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_roundtrip() {
        let error = CollaboratorError::RevealTooEarly;
        let code = error.to_u32();
        assert_eq!(CollaboratorError::from_u32(code), Some(error));
        assert_eq!(CollaboratorError::from_u32(99), None);
    }

    #[test]
    fn test_program_error_code() {
        assert_eq!(
            ProgramError::from(CollaboratorError::Rejected),
            ProgramError::Custom(1_004)
        );
    }
}
