//! Scrimmage - team formation and match outcome resolution
//!
//! This crate splits a roster into balanced teams, validates the reported
//! outcome of a match into a tie-aware rank vector, and feeds that vector to
//! a TrueSkill or Weng-Lin rating engine.

pub mod config;
pub mod error;
pub mod events;
pub mod metrics;
pub mod outcome;
pub mod rating;
pub mod session;
pub mod teams;
pub mod types;
pub mod utils;

// Re-export commonly used types and traits
pub use error::{Result, ScrimError, ValidationError};
pub use types::*;

// Re-export key components
pub use events::EventPublisher;
pub use outcome::{resolve_ranks, OutcomeSelection, RankResolver};
pub use rating::{PlayerStore, RatingEngine};
pub use session::SessionManager;
pub use teams::{partition_team_sizes, TeamBalancer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
