//! Move-only optional slot.

use crate::errors::{PrizeSavingsError, PrizeSavingsResult};

/// Holds at most one value that is consumed exactly once.
///
/// Unlike `Option`, filling an occupied slot or taking from an empty one is
/// an error rather than a silent overwrite or `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot<T>(Option<T>);

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Self(None)
    }
}

impl<T> Slot<T> {
    /// Empty slot.
    pub const fn empty() -> Self {
        Self(None)
    }

    /// Store `value`.
    ///
    /// # Errors
    /// [`PrizeSavingsError::SlotOccupied`] if the slot already holds a value.
    pub fn put(&mut self, value: T) -> PrizeSavingsResult<()> {
        if self.0.is_some() {
            return Err(PrizeSavingsError::SlotOccupied);
        }
        self.0 = Some(value);
        Ok(())
    }

    /// Extract the value, leaving the slot empty.
    ///
    /// # Errors
    /// [`PrizeSavingsError::SlotEmpty`] if nothing is stored.
    pub fn take(&mut self) -> PrizeSavingsResult<T> {
        self.0.take().ok_or(PrizeSavingsError::SlotEmpty)
    }

    /// Borrow the stored value, if any.
    pub fn as_ref(&self) -> Option<&T> {
        self.0.as_ref()
    }

    /// Mutably borrow the stored value, if any.
    pub fn as_mut(&mut self) -> Option<&mut T> {
        self.0.as_mut()
    }

    /// Whether a value is stored.
    pub const fn is_filled(&self) -> bool {
        self.0.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_exactly_once() {
        let mut slot = Slot::empty();
        slot.put(7u64).expect("put into empty slot should succeed");
        assert!(slot.is_filled());

        assert_eq!(slot.take(), Ok(7));
        assert_eq!(slot.take(), Err(PrizeSavingsError::SlotEmpty));
        assert!(!slot.is_filled());
    }

    #[test]
    fn test_put_rejects_occupied() {
        let mut slot = Slot::default();
        slot.put(1u8).expect("put into empty slot should succeed");
        assert_eq!(slot.put(2), Err(PrizeSavingsError::SlotOccupied));
        assert_eq!(slot.as_ref(), Some(&1));
    }
}
