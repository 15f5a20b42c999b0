//! Dense receiver registry.
//!
//! Receivers live in a contiguous list so a draw can walk positions
//! `0..snapshot_count` in bounded batches. Removal swaps the last receiver
//! into the vacated position, which is O(1) but reorders the tail; the pool
//! therefore defers removals while a batch capture is walking the list.

use std::collections::HashMap;

use prize_savings_interface::ReceiverId;

/// Id → index map plus index → id list.
#[derive(Debug, Clone, Default)]
pub struct ReceiverRegistry {
    index: HashMap<ReceiverId, usize>,
    receivers: Vec<ReceiverId>,
}

impl ReceiverRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `receiver` if absent. Returns whether it was added.
    pub fn register(&mut self, receiver: &ReceiverId) -> bool {
        if self.index.contains_key(receiver) {
            return false;
        }
        self.index.insert(*receiver, self.receivers.len());
        self.receivers.push(*receiver);
        true
    }

    /// Remove `receiver` by swap-and-pop. Returns whether it was present.
    pub fn unregister(&mut self, receiver: &ReceiverId) -> bool {
        let Some(position) = self.index.remove(receiver) else {
            return false;
        };
        self.receivers.swap_remove(position);
        if let Some(moved) = self.receivers.get(position) {
            self.index.insert(*moved, position);
        }
        true
    }

    /// Receiver at `position`.
    #[inline]
    pub fn get(&self, position: usize) -> Option<&ReceiverId> {
        self.receivers.get(position)
    }

    /// Position of `receiver`.
    #[inline]
    pub fn index_of(&self, receiver: &ReceiverId) -> Option<usize> {
        self.index.get(receiver).copied()
    }

    /// Whether `receiver` is registered.
    #[inline]
    pub fn contains(&self, receiver: &ReceiverId) -> bool {
        self.index.contains_key(receiver)
    }

    /// Number of registered receivers.
    #[inline]
    pub fn len(&self) -> usize {
        self.receivers.len()
    }

    /// Whether no receiver is registered.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.receivers.is_empty()
    }

    /// Receivers in position order.
    #[inline]
    pub fn as_slice(&self) -> &[ReceiverId] {
        &self.receivers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_is_idempotent() {
        let mut registry = ReceiverRegistry::new();
        assert!(registry.register(&[1; 32]));
        assert!(!registry.register(&[1; 32]));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_swap_and_pop_keeps_index_consistent() {
        let mut registry = ReceiverRegistry::new();
        for n in 1..=4u8 {
            registry.register(&[n; 32]);
        }

        assert!(registry.unregister(&[2; 32]));
        assert_eq!(registry.as_slice(), &[[1; 32], [4; 32], [3; 32]]);
        assert_eq!(registry.index_of(&[4; 32]), Some(1));
        assert_eq!(registry.index_of(&[2; 32]), None);

        assert!(registry.unregister(&[3; 32]));
        assert_eq!(registry.len(), 2);
        assert!(!registry.unregister(&[3; 32]));

        for (position, receiver) in registry.as_slice().iter().enumerate() {
            assert_eq!(registry.index_of(receiver), Some(position));
        }
    }
}
