//! Prize Savings Interface
//!
//! Boundary types between the prize-linked savings pool and the systems it
//! depends on but does not own.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    prize-savings (Pool)                      │
//! │  • Share ledger + TWAB rounds                                │
//! │  • Batched weighted draw                                     │
//! │  • Yield surplus/deficit reconciliation                      │
//! └─────────────────────────────────────────────────────────────┘
//!       │               │                 │              │
//!       ▼               ▼                 ▼              ▼
//! ┌───────────┐  ┌─────────────┐  ┌──────────────┐  ┌──────────┐
//! │  Yield    │  │ Randomness  │  │  Treasury    │  │  Winner  │
//! │ connector │  │   oracle    │  │  receiver    │  │  tracker │
//! └───────────┘  └─────────────┘  └──────────────┘  └──────────┘
//! ```
//!
//! The pool never assumes full liquidity from the yield connector and never
//! propagates failures from the optional sinks; both are treated as
//! authoritative partial answers.
//!
//! # Modules
//!
//! - [`authority`]: Two-step authority transfer and administrative roles
//! - [`clock`]: Execution clock abstraction
//! - [`collaborators`]: Yield connector, randomness oracle and sink traits
//! - [`error`]: Collaborator error codes
//! - [`types`]: Shared constants and fixed-point helpers

#![no_std]

pub mod authority;
pub mod clock;
pub mod collaborators;
pub mod error;
pub mod types;

pub use clock::{Clock, ClockSnapshot};
pub use collaborators::*;
pub use error::*;
pub use types::*;
