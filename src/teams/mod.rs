//! Team formation
//!
//! Sizing teams for a roster and filling those teams with players.

pub mod assignment;
pub mod balancer;

// Re-export commonly used types
pub use assignment::{
    balance_report, AssignmentConfig, AssignmentMode, BalanceQuality, BalanceReport, TeamAssigner,
};
pub use balancer::{partition_team_sizes, TeamBalancer, MAX_PLAYER_COUNT, PREFERRED_TEAM_SIZE};
