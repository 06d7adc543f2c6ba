//! Error types for team formation and outcome resolution
//!
//! Validation failures from the pure core are reported as [`ValidationError`]
//! so callers can match on the exact rule that failed. Everything above the
//! core uses anyhow with [`ScrimError`] for the structured cases.

/// Result type alias for convenience
pub type Result<T> = anyhow::Result<T>;

/// Failures raised by team partitioning and rank resolution
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid player count: {count} (expected between 2 and 10000 players)")]
    InvalidPlayerCount { count: i64 },

    #[error("Invalid team count: {count} (at least 2 teams are required)")]
    InvalidTeamCount { count: usize },

    #[error("Only one team can win, but teams {teams:?} were marked as winners")]
    MultipleWinners { teams: Vec<usize> },

    #[error("Only one team can lose, but teams {teams:?} were marked as losers")]
    MultipleLosers { teams: Vec<usize> },

    #[error(
        "Every team must have exactly one result (unclassified: {unclassified:?}, \
         duplicated: {duplicated:?}, out of range: {out_of_range:?})"
    )]
    UnclassifiedOrDuplicateTeam {
        unclassified: Vec<usize>,
        duplicated: Vec<usize>,
        out_of_range: Vec<usize>,
    },

    #[error("A partial draw between teams {draws:?} needs exactly one winner and one loser")]
    AmbiguousPartialDraw { draws: Vec<usize> },

    #[error("Too many drawing teams: {draws:?} (at most {max} can share the middle rank)")]
    TooManyDrawingTeams { draws: Vec<usize>, max: usize },
}

impl ValidationError {
    /// Short stable label, used for metrics and logs
    pub fn kind(&self) -> &'static str {
        match self {
            ValidationError::InvalidPlayerCount { .. } => "invalid_player_count",
            ValidationError::InvalidTeamCount { .. } => "invalid_team_count",
            ValidationError::MultipleWinners { .. } => "multiple_winners",
            ValidationError::MultipleLosers { .. } => "multiple_losers",
            ValidationError::UnclassifiedOrDuplicateTeam { .. } => "unclassified_or_duplicate",
            ValidationError::AmbiguousPartialDraw { .. } => "ambiguous_partial_draw",
            ValidationError::TooManyDrawingTeams { .. } => "too_many_drawing_teams",
        }
    }
}

/// Service-level error types for sessions, storage and rating
#[derive(Debug, thiserror::Error)]
pub enum ScrimError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },

    #[error("A commit is already in progress for session {session_id}")]
    CommitInProgress { session_id: String },

    #[error("Results were already recorded for session {session_id}")]
    AlreadyCommitted { session_id: String },

    #[error("Player not found: {player_id}")]
    PlayerNotFound { player_id: String },

    #[error(
        "Not enough players from region '{region}': found {available}, need one per team ({required})"
    )]
    InsufficientRegionPlayers {
        region: String,
        available: usize,
        required: usize,
    },

    #[error("Rank vector has {actual} entries but the match has {expected} teams")]
    RankLengthMismatch { expected: usize, actual: usize },

    #[error("Rating calculation failed: {reason}")]
    RatingEngineFailed { reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Internal service error: {message}")]
    InternalError { message: String },
}
