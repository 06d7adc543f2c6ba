//! Rating engines and player persistence
//!
//! Engines wrap the skillratings crate behind [`RatingEngine`]; the store
//! keeps ratings, match counters and game records.

pub mod engine;
pub mod storage;
pub mod trueskill;
pub mod weng_lin;

// Re-export commonly used types
pub use engine::RatingEngine;
pub use storage::{GameRecord, InMemoryPlayerStore, PlayerRecord, PlayerStore, ResultUpdate};
pub use trueskill::{TrueSkillEngine, TrueSkillSettings};
pub use weng_lin::{WengLinEngine, WengLinSettings};

#[cfg(test)]
pub use engine::MockRatingEngine;
