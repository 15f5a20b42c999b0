//! Execution clock abstraction.
//!
//! Pool operations read the clock on entry. Round boundaries and
//! emergency durations use `unix_timestamp`; the randomness commit/reveal
//! separation uses `slot`, which must strictly advance between the request
//! and the fulfilment of a draw.

use bytemuck::{Pod, Zeroable};

/// Point-in-time reading of the execution environment.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct ClockSnapshot {
    /// Monotonic execution step (block height / slot)
    pub slot: u64,
    /// Wall-clock seconds used for round and emergency timing
    pub unix_timestamp: u64,
}

/// Source of the current execution time.
pub trait Clock {
    /// Current slot and timestamp.
    fn now(&self) -> ClockSnapshot;
}

impl<T: Clock + ?Sized> Clock for &T {
    fn now(&self) -> ClockSnapshot {
        (**self).now()
    }
}
