//! Rating engine trait
//!
//! The statistical update itself lives in the `skillratings` crate; this
//! trait is the seam the session layer calls through, so tests can swap in
//! a mock and the engine family can be chosen by configuration.

use crate::error::{Result, ScrimError};
use crate::types::{PlayerRating, RankVector, RatingGroup, TeamOutcome};

/// Trait for computing updated ratings after a match
#[cfg_attr(test, mockall::automock)]
pub trait RatingEngine: Send + Sync {
    /// Rate a match
    ///
    /// # Arguments
    /// * `groups` - One rating group per team, in team order
    /// * `ranks` - Placement of each team, index-aligned with `groups`; lower is better
    ///
    /// # Returns
    /// Updated rating groups, preserving team and player order
    fn rate(&self, groups: &[RatingGroup], ranks: &RankVector) -> Result<Vec<RatingGroup>>;

    /// Rate a single player against a baseline opponent
    ///
    /// Wins and losses are rated against a fresh player at the initial rating;
    /// a draw is rated against an identical copy of the player.
    fn rate_against_baseline(
        &self,
        rating: PlayerRating,
        outcome: TeamOutcome,
    ) -> Result<PlayerRating>;

    /// Get the initial rating for new players
    fn initial_rating(&self) -> PlayerRating;

    /// Short engine name for logs
    fn name(&self) -> &'static str;

    /// Get current configuration as JSON
    fn config(&self) -> serde_json::Value;
}

/// Shared shape checks run before handing data to an engine
pub(crate) fn validate_match(groups: &[RatingGroup], ranks: &RankVector) -> Result<()> {
    if groups.len() < 2 {
        return Err(ScrimError::RatingEngineFailed {
            reason: format!("At least two teams are required, got {}", groups.len()),
        }
        .into());
    }

    if groups.len() != ranks.len() {
        return Err(ScrimError::RatingEngineFailed {
            reason: format!(
                "Got {} rating groups but {} ranks",
                groups.len(),
                ranks.len()
            ),
        }
        .into());
    }

    if let Some(empty) = groups.iter().position(|g| g.is_empty()) {
        return Err(ScrimError::RatingEngineFailed {
            reason: format!("Team {} has no players", empty + 1),
        }
        .into());
    }

    groups.iter().flatten().try_for_each(validate_rating)
}

/// Reject ratings the engines cannot update
pub(crate) fn validate_rating(rating: &PlayerRating) -> Result<()> {
    if !rating.mu.is_finite() || !rating.sigma.is_finite() || rating.sigma <= 0.0 {
        return Err(ScrimError::RatingEngineFailed {
            reason: format!(
                "Ratings must be finite with positive uncertainty, got mu={} sigma={}",
                rating.mu, rating.sigma
            ),
        }
        .into());
    }

    Ok(())
}
