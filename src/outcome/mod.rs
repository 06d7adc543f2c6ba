//! Outcome resolution
//!
//! Converts winner/loser/draw selections over teams into a validated,
//! tie-aware rank vector.

pub mod resolver;
pub mod selection;

// Re-export commonly used types
pub use resolver::{resolve_ranks, RankResolver};
pub use selection::OutcomeSelection;
