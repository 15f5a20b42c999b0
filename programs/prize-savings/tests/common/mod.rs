//! Shared test helpers for prize-savings tests.

pub mod mock_collaborators;
pub mod setup;

pub use mock_collaborators::*;
pub use setup::*;
