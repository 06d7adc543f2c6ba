//! TrueSkill rating engine
//!
//! Wraps `skillratings::trueskill` so grouped team ratings and a rank vector
//! can be rated in one call, ties included.

use crate::error::{Result, ScrimError};
use crate::rating::engine::{validate_match, validate_rating, RatingEngine};
use crate::types::{PlayerRating, RankVector, RatingGroup, TeamOutcome};
use serde::{Deserialize, Serialize};
use skillratings::trueskill::{trueskill, trueskill_multi_team, TrueSkillConfig, TrueSkillRating};
use skillratings::{MultiTeamOutcome, Outcomes};
use tracing::debug;

/// TrueSkill environment parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrueSkillSettings {
    /// Initial skill mean for new players
    pub mu: f64,
    /// Initial uncertainty for new players
    pub sigma: f64,
    /// Skill distance that gives roughly a 76% win chance
    pub beta: f64,
    /// Dynamic factor added to uncertainty before each update
    pub tau: f64,
    /// Probability of a draw between equally skilled teams
    pub draw_probability: f64,
}

impl Default for TrueSkillSettings {
    fn default() -> Self {
        Self {
            mu: 25.0,
            sigma: 8.333,
            beta: 4.166,
            tau: 0.083,
            draw_probability: 0.10,
        }
    }
}

impl TrueSkillSettings {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.sigma <= 0.0 {
            return Err(ScrimError::ConfigurationError {
                message: "Initial sigma must be positive".to_string(),
            }
            .into());
        }

        if self.beta <= 0.0 {
            return Err(ScrimError::ConfigurationError {
                message: "Beta must be positive".to_string(),
            }
            .into());
        }

        if self.tau < 0.0 {
            return Err(ScrimError::ConfigurationError {
                message: "Tau must be non-negative".to_string(),
            }
            .into());
        }

        if !(0.0..1.0).contains(&self.draw_probability) {
            return Err(ScrimError::ConfigurationError {
                message: "Draw probability must be in [0, 1)".to_string(),
            }
            .into());
        }

        Ok(())
    }

    fn skill_config(&self) -> TrueSkillConfig {
        TrueSkillConfig {
            draw_probability: self.draw_probability,
            beta: self.beta,
            default_dynamics: self.tau,
        }
    }
}

/// TrueSkill engine over grouped team ratings
#[derive(Debug)]
pub struct TrueSkillEngine {
    settings: TrueSkillSettings,
    config: TrueSkillConfig,
}

impl TrueSkillEngine {
    pub fn new(settings: TrueSkillSettings) -> Result<Self> {
        settings.validate()?;
        let config = settings.skill_config();
        Ok(Self { settings, config })
    }

    pub fn settings(&self) -> &TrueSkillSettings {
        &self.settings
    }
}

impl RatingEngine for TrueSkillEngine {
    fn rate(&self, groups: &[RatingGroup], ranks: &RankVector) -> Result<Vec<RatingGroup>> {
        validate_match(groups, ranks)?;

        let teams: Vec<Vec<TrueSkillRating>> = groups
            .iter()
            .map(|g| g.iter().map(|&r| r.into()).collect())
            .collect();

        // skillratings ranks start at 1
        let teams_and_ranks: Vec<(&[TrueSkillRating], MultiTeamOutcome)> = teams
            .iter()
            .zip(ranks.ranks())
            .map(|(team, &rank)| (team.as_slice(), MultiTeamOutcome::new(rank as usize + 1)))
            .collect();

        let rated = trueskill_multi_team(&teams_and_ranks, &self.config);

        if rated.len() != groups.len()
            || rated.iter().zip(groups).any(|(new, old)| new.len() != old.len())
        {
            return Err(ScrimError::RatingEngineFailed {
                reason: "TrueSkill returned ratings that do not line up with the teams".to_string(),
            }
            .into());
        }

        debug!(
            "TrueSkill rated {} teams with ranks {:?}",
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

        let player: TrueSkillRating = rating.into();
        let (opponent, outcome) = match outcome {
            TeamOutcome::Win => (self.initial_rating(), Outcomes::WIN),
            TeamOutcome::Loss => (self.initial_rating(), Outcomes::LOSS),
            TeamOutcome::Draw => (rating, Outcomes::DRAW),
        };
        let opponent: TrueSkillRating = opponent.into();

        let (new_rating, _) = trueskill(&player, &opponent, &outcome, &self.config);
        Ok(new_rating.into())
    }

    fn initial_rating(&self) -> PlayerRating {
        PlayerRating::new(self.settings.mu, self.settings.sigma)
    }

    fn name(&self) -> &'static str {
        "trueskill"
    }

    fn config(&self) -> serde_json::Value {
        serde_json::to_value(&self.settings).unwrap_or(serde_json::Value::Null)
    }
}
