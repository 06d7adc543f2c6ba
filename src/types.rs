//! Common types used throughout team formation and outcome resolution

use crate::error::ScrimError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use skillratings::trueskill::TrueSkillRating;
use skillratings::weng_lin::WengLinRating;
use uuid::Uuid;

/// Unique identifier for players
pub type PlayerId = String;

/// Unique identifier for match-setup sessions
pub type SessionId = Uuid;

/// Unique identifier for recorded games
pub type GameId = Uuid;

/// Rating pair for a player: mean skill estimate and its uncertainty
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlayerRating {
    pub mu: f64,
    pub sigma: f64,
}

impl PlayerRating {
    pub fn new(mu: f64, sigma: f64) -> Self {
        Self { mu, sigma }
    }

    /// Conservative skill estimate (mu - 3 sigma), used for balancing and leaderboards
    pub fn conservative_skill(&self) -> f64 {
        self.mu - 3.0 * self.sigma
    }
}

impl Default for PlayerRating {
    fn default() -> Self {
        Self {
            mu: 25.0,
            sigma: 8.333,
        }
    }
}

impl std::fmt::Display for PlayerRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2} ± {:.2}", self.mu, self.sigma)
    }
}

impl From<TrueSkillRating> for PlayerRating {
    fn from(rating: TrueSkillRating) -> Self {
        Self {
            mu: rating.rating,
            sigma: rating.uncertainty,
        }
    }
}

impl From<PlayerRating> for TrueSkillRating {
    fn from(rating: PlayerRating) -> Self {
        Self {
            rating: rating.mu,
            uncertainty: rating.sigma,
        }
    }
}

impl From<WengLinRating> for PlayerRating {
    fn from(rating: WengLinRating) -> Self {
        Self {
            mu: rating.rating,
            sigma: rating.uncertainty,
        }
    }
}

impl From<PlayerRating> for WengLinRating {
    fn from(rating: PlayerRating) -> Self {
        Self {
            rating: rating.mu,
            uncertainty: rating.sigma,
        }
    }
}

/// Player information used for team formation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub username: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub rating: PlayerRating,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, username: impl Into<String>, rating: PlayerRating) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            region: None,
            rating,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Case-insensitive region match
    pub fn is_from_region(&self, region: &str) -> bool {
        self.region
            .as_deref()
            .map(|r| r.eq_ignore_ascii_case(region))
            .unwrap_or(false)
    }
}

/// A team with a stable 1-based index
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub index: usize,
    pub players: Vec<Player>,
}

impl Team {
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id.clone()).collect()
    }

    /// Average conservative skill of the team's players
    pub fn average_skill(&self) -> f64 {
        if self.players.is_empty() {
            return 0.0;
        }
        self.players
            .iter()
            .map(|p| p.rating.conservative_skill())
            .sum::<f64>()
            / self.players.len() as f64
    }
}

/// Ratings of one team's players, in roster order
pub type RatingGroup = Vec<PlayerRating>;

/// Sizes of the teams a roster is split into
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSizePartition(Vec<usize>);

impl TeamSizePartition {
    pub(crate) fn new(sizes: Vec<usize>) -> Self {
        Self(sizes)
    }

    pub fn sizes(&self) -> &[usize] {
        &self.0
    }

    pub fn team_count(&self) -> usize {
        self.0.len()
    }

    pub fn total_players(&self) -> usize {
        self.0.iter().sum()
    }

    /// Difference between the largest and smallest team
    pub fn spread(&self) -> usize {
        let max = self.0.iter().copied().max().unwrap_or(0);
        let min = self.0.iter().copied().min().unwrap_or(0);
        max - min
    }
}

/// Per-team placements; lower is better, equal values are ties
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RankVector(Vec<u32>);

impl RankVector {
    pub(crate) fn new(ranks: Vec<u32>) -> Self {
        Self(ranks)
    }

    /// Build a rank vector from placements the caller already knows,
    /// bypassing outcome resolution. Only the length is checked.
    pub fn from_placements(ranks: Vec<u32>, team_count: usize) -> Result<Self, ScrimError> {
        if ranks.len() != team_count {
            return Err(ScrimError::RankLengthMismatch {
                expected: team_count,
                actual: ranks.len(),
            });
        }
        Ok(Self(ranks))
    }

    pub fn ranks(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// True when every team shares the same placement
    pub fn is_all_tied(&self) -> bool {
        self.0.windows(2).all(|w| w[0] == w[1])
    }

    /// Label every team as a win, loss or draw.
    ///
    /// A team wins only if it alone holds the best placement and loses only
    /// if it alone holds the worst; everything else counts as a draw.
    pub fn team_outcomes(&self) -> Vec<TeamOutcome> {
        if self.0.is_empty() || self.is_all_tied() {
            return vec![TeamOutcome::Draw; self.0.len()];
        }

        let best = self.0.iter().copied().min().unwrap_or(0);
        let worst = self.0.iter().copied().max().unwrap_or(0);
        let best_count = self.0.iter().filter(|&&r| r == best).count();
        let worst_count = self.0.iter().filter(|&&r| r == worst).count();

        self.0
            .iter()
            .map(|&rank| {
                if rank == best && best_count == 1 {
                    TeamOutcome::Win
                } else if rank == worst && worst_count == 1 {
                    TeamOutcome::Loss
                } else {
                    TeamOutcome::Draw
                }
            })
            .collect()
    }
}

/// Result label for a team or a single player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamOutcome {
    Win,
    Loss,
    Draw,
}

impl std::fmt::Display for TeamOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TeamOutcome::Win => write!(f, "Win"),
            TeamOutcome::Loss => write!(f, "Loss"),
            TeamOutcome::Draw => write!(f, "Draw"),
        }
    }
}

impl std::str::FromStr for TeamOutcome {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "win" | "w" => Ok(TeamOutcome::Win),
            "loss" | "lose" | "l" => Ok(TeamOutcome::Loss),
            "draw" | "tie" | "d" => Ok(TeamOutcome::Draw),
            other => Err(format!("unknown outcome '{}'", other)),
        }
    }
}

/// Rating change for one player after a recorded match
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingChange {
    pub player_id: PlayerId,
    pub team_index: usize,
    pub outcome: TeamOutcome,
    pub old_rating: PlayerRating,
    pub new_rating: PlayerRating,
}

impl RatingChange {
    pub fn mu_delta(&self) -> f64 {
        self.new_rating.mu - self.old_rating.mu
    }
}

/// Event emitted when teams have been formed for a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamsFormed {
    pub session_id: SessionId,
    pub game_id: GameId,
    pub teams: Vec<Team>,
    pub timestamp: DateTime<Utc>,
}

/// Event emitted when a session's results have been recorded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultsRecorded {
    pub session_id: SessionId,
    pub game_id: GameId,
    pub ranks: RankVector,
    pub rating_changes: Vec<RatingChange>,
    pub timestamp: DateTime<Utc>,
}

/// Union type for all published events
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScrimEvent {
    TeamsFormed(TeamsFormed),
    ResultsRecorded(ResultsRecorded),
}
