//! Match sessions
//!
//! Each session owns one set of formed teams and the outcome selection being
//! edited for them, up to an explicit commit.

pub mod instance;
pub mod manager;

// Re-export commonly used types
pub use instance::{MatchSession, SessionPhase, SessionSnapshot};
pub use manager::{CommitOutcome, SessionManager};
