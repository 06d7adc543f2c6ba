//! Weng-Lin (OpenSkill) rating engine
//!
//! Alternative to TrueSkill backed by `skillratings::weng_lin`. Same rating
//! scale, so stored ratings stay comparable when switching engines.

use crate::error::{Result, ScrimError};
use crate::rating::engine::{validate_match, validate_rating, RatingEngine};
use crate::types::{PlayerRating, RankVector, RatingGroup, TeamOutcome};
use serde::{Deserialize, Serialize};
use skillratings::weng_lin::{weng_lin, weng_lin_multi_team, WengLinConfig, WengLinRating};
use skillratings::{MultiTeamOutcome, Outcomes};
use tracing::{debug, warn};

/// Weng-Lin parameters plus the rating handed to new players
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WengLinSettings {
    pub mu: f64,
    pub sigma: f64,
    pub beta: f64,
    /// Floor that keeps uncertainty from collapsing to zero
    pub uncertainty_tolerance: f64,
}

impl Default for WengLinSettings {
    fn default() -> Self {
        Self {
            mu: 25.0,
            sigma: 25.0 / 3.0,
            beta: 25.0 / 6.0,
            uncertainty_tolerance: 0.000_001,
        }
    }
}

impl WengLinSettings {
    /// Slower rating movement
    pub fn conservative() -> Self {
        Self {
            beta: 25.0 / 8.0,
            ..Self::default()
        }
    }

    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.beta <= 0.0 {
            return Err(ScrimError::ConfigurationError {
                message: "Beta must be positive".to_string(),
            }
            .into());
        }

        if self.uncertainty_tolerance < 0.0 {
            return Err(ScrimError::ConfigurationError {
                message: "Uncertainty tolerance must be non-negative".to_string(),
            }
            .into());
        }

        if self.sigma <= 0.0 {
            return Err(ScrimError::ConfigurationError {
                message: "Initial sigma must be positive".to_string(),
            }
            .into());
        }

        Ok(())
    }

    fn skill_config(&self) -> WengLinConfig {
        WengLinConfig {
            beta: self.beta,
            uncertainty_tolerance: self.uncertainty_tolerance,
        }
    }
}

/// Weng-Lin engine over grouped team ratings
#[derive(Debug)]
pub struct WengLinEngine {
    settings: WengLinSettings,
    config: WengLinConfig,
}

impl WengLinEngine {
    pub fn new(settings: WengLinSettings) -> Result<Self> {
        settings.validate()?;
        let config = settings.skill_config();
        Ok(Self { settings, config })
    }

    pub fn settings(&self) -> &WengLinSettings {
        &self.settings
    }
}

impl RatingEngine for WengLinEngine {
    fn rate(&self, groups: &[RatingGroup], ranks: &RankVector) -> Result<Vec<RatingGroup>> {
        validate_match(groups, ranks)?;

        let teams: Vec<Vec<WengLinRating>> = groups
            .iter()
            .map(|g| g.iter().map(|&r| r.into()).collect())
            .collect();

        let teams_and_ranks: Vec<(&[WengLinRating], MultiTeamOutcome)> = teams
            .iter()
            .zip(ranks.ranks())
            .map(|(team, &rank)| (team.as_slice(), MultiTeamOutcome::new(rank as usize + 1)))
            .collect();

        let rated = weng_lin_multi_team(&teams_and_ranks, &self.config);

        if rated.len() != groups.len() {
            warn!(
                "Weng-Lin returned {} teams for a {}-team match",
                rated.len(),
                groups.len()
            );
            return Err(ScrimError::RatingEngineFailed {
                reason: "Weng-Lin returned ratings that do not line up with the teams".to_string(),
            }
            .into());
        }

        debug!(
            "Weng-Lin rated {} teams with ranks {:?}",
            groups.len(),
            ranks.ranks()
        );

        Ok(rated
            .into_iter()
            .map(|team| team.into_iter().map(PlayerRating::from).collect())
            .collect())
    }

    fn rate_against_baseline(
        &self,
        rating: PlayerRating,
        outcome: TeamOutcome,
    ) -> Result<PlayerRating> {
        validate_rating(&rating)?;

        let (opponent, outcome) = match outcome {
            TeamOutcome::Win => (self.initial_rating(), Outcomes::WIN),
            TeamOutcome::Loss => (self.initial_rating(), Outcomes::LOSS),
            TeamOutcome::Draw => (rating, Outcomes::DRAW),
        };

        let (new_rating, _) = weng_lin(&rating.into(), &opponent.into(), &outcome, &self.config);
        Ok(new_rating.into())
    }

    fn initial_rating(&self) -> PlayerRating {
        PlayerRating::new(self.settings.mu, self.settings.sigma)
    }

    fn name(&self) -> &'static str {
        "weng_lin"
    }

    fn config(&self) -> serde_json::Value {
        serde_json::to_value(&self.settings).unwrap_or(serde_json::Value::Null)
    }
}
