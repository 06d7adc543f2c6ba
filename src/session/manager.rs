//! Session manager for match setup and result recording
//!
//! The manager forms teams for a roster, collects outcome edits for each
//! session, and turns an explicit commit into stored rating updates.

use crate::config::{AppConfig, TeamSettings};
use crate::error::{Result, ScrimError};
use crate::events::EventPublisher;
use crate::metrics::MetricsCollector;
use crate::outcome::resolve_ranks;
use crate::rating::{GameRecord, PlayerStore, RatingEngine, ResultUpdate};
use crate::session::instance::{CommitTicket, MatchSession, SessionSnapshot};
use crate::teams::{partition_team_sizes, AssignmentConfig, AssignmentMode, TeamAssigner};
use crate::types::{
    GameId, Player, PlayerRating, RankVector, RatingChange, RatingGroup, ResultsRecorded,
    SessionId, Team, TeamOutcome, TeamsFormed,
};
use crate::utils::{current_timestamp, generate_game_id, generate_session_id};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tracing::{debug, error, info, warn};

type SessionHandle = Arc<tokio::sync::Mutex<MatchSession>>;

/// Result of a successful commit
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    pub session_id: SessionId,
    pub game_id: GameId,
    pub ranks: RankVector,
    pub rating_changes: Vec<RatingChange>,
}

/// Rated but not yet persisted
struct Evaluation {
    ranks: RankVector,
    changes: Vec<RatingChange>,
    rating_duration: Duration,
}

/// The main session manager
#[derive(Clone)]
pub struct SessionManager {
    /// Map of active sessions by ID
    sessions: Arc<RwLock<HashMap<SessionId, SessionHandle>>>,
    store: Arc<dyn PlayerStore>,
    engine: Arc<dyn RatingEngine>,
    event_publisher: Arc<dyn EventPublisher>,
    metrics_collector: Arc<MetricsCollector>,
    assigner: TeamAssigner,
    team_settings: TeamSettings,
    rng: Arc<Mutex<StdRng>>,
    /// Serializes rating reads and writes across sessions sharing players
    commit_lock: Arc<tokio::sync::Mutex<()>>,
}

impl SessionManager {
    /// Create a new session manager with default team settings
    pub fn new(
        store: Arc<dyn PlayerStore>,
        engine: Arc<dyn RatingEngine>,
        event_publisher: Arc<dyn EventPublisher>,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            store,
            engine,
            event_publisher,
            metrics_collector,
            assigner: TeamAssigner::default(),
            team_settings: TeamSettings::default(),
            rng: Arc::new(Mutex::new(StdRng::from_entropy())),
            commit_lock: Arc::new(tokio::sync::Mutex::new(())),
        }
    }

    /// Create a session manager with the engine and limits from `config`
    pub fn from_config(
        config: &AppConfig,
        store: Arc<dyn PlayerStore>,
        event_publisher: Arc<dyn EventPublisher>,
        metrics_collector: Arc<MetricsCollector>,
    ) -> Result<Self> {
        let engine = config.rating.build_engine()?;
        Ok(Self::new(store, engine, event_publisher, metrics_collector)
            .with_team_settings(config.teams.clone())
            .with_assignment_config(config.balancing.clone()))
    }

    pub fn with_team_settings(mut self, settings: TeamSettings) -> Self {
        self.team_settings = settings;
        self
    }

    pub fn with_assignment_config(mut self, config: AssignmentConfig) -> Self {
        self.assigner = TeamAssigner::new(config);
        self
    }

    /// Make team assignment reproducible
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Arc::new(Mutex::new(StdRng::seed_from_u64(seed)));
        self
    }

    pub fn store(&self) -> Arc<dyn PlayerStore> {
        self.store.clone()
    }

    pub fn engine(&self) -> Arc<dyn RatingEngine> {
        self.engine.clone()
    }

    /// Form teams for `roster` and open a session for them
    pub async fn create_session(
        &self,
        roster: Vec<Player>,
        mode: Option<AssignmentMode>,
    ) -> Result<SessionSnapshot> {
        let timer = self.metrics_collector.start_timer();
        let mode = mode.unwrap_or_else(|| self.team_settings.default_mode.clone());
        let roster = self.prepare_roster(roster)?;

        let partition = partition_team_sizes(roster.len() as i64).map_err(|e| {
            self.metrics_collector.record_validation_failure(e.kind());
            ScrimError::from(e)
        })?;

        let teams = {
            let mut rng = self.rng.lock().map_err(|_| ScrimError::InternalError {
                message: "Failed to acquire rng lock".to_string(),
            })?;
            self.assigner
                .assign(roster, &partition, &mode, &mut *rng)?
        };

        let session_id = generate_session_id();
        let game_id = generate_game_id();
        self.store
            .record_game(GameRecord::new(game_id, teams.clone()))?;

        let session = MatchSession::new(session_id, game_id, mode.clone(), teams.clone());
        let snapshot = session.snapshot();
        {
            let mut sessions = self
                .sessions
                .write()
                .map_err(|_| ScrimError::InternalError {
                    message: "Failed to acquire sessions write lock".to_string(),
                })?;
            sessions.insert(session_id, Arc::new(tokio::sync::Mutex::new(session)));
        }

        self.metrics_collector.record_teams_formed(
            mode.label(),
            partition.total_players(),
            timer.stop(),
        );
        info!(
            "Created session {} for game {} with team sizes {:?} ({})",
            session_id,
            game_id,
            partition.sizes(),
            mode.label()
        );

        let event = TeamsFormed {
            session_id,
            game_id,
            teams,
            timestamp: current_timestamp(),
        };
        if let Err(e) = self.event_publisher.publish_teams_formed(event).await {
            warn!("Failed to publish TeamsFormed for session {}: {}", session_id, e);
        }

        Ok(snapshot)
    }

    /// Cap the roster, drop duplicate ids, and sync players with the store
    fn prepare_roster(&self, roster: Vec<Player>) -> Result<Vec<Player>> {
        let max_players = self.team_settings.max_players;
        let mut seen = HashSet::new();
        let mut players = Vec::with_capacity(roster.len().min(max_players));

        for player in roster {
            if !seen.insert(player.id.clone()) {
                warn!("Player '{}' listed twice, keeping the first entry", player.id);
                continue;
            }
            if players.len() == max_players {
                warn!(
                    "Roster exceeds {} players, dropping '{}'",
                    max_players, player.id
                );
                continue;
            }
            // Stored rating wins over whatever the caller sent
            let record = self.store.upsert_player(player)?;
            players.push(record.player);
        }

        Ok(players)
    }

    fn get_session(&self, session_id: SessionId) -> Result<SessionHandle> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| ScrimError::InternalError {
                message: "Failed to acquire sessions read lock".to_string(),
            })?;

        sessions.get(&session_id).cloned().ok_or_else(|| {
            ScrimError::SessionNotFound {
                session_id: session_id.to_string(),
            }
            .into()
        })
    }

    pub async fn snapshot(&self, session_id: SessionId) -> Result<SessionSnapshot> {
        let session = self.get_session(session_id)?;
        let guard = session.lock().await;
        Ok(guard.snapshot())
    }

    /// IDs of every session that has not been ended
    pub fn active_sessions(&self) -> Result<Vec<SessionId>> {
        let sessions = self
            .sessions
            .read()
            .map_err(|_| ScrimError::InternalError {
                message: "Failed to acquire sessions read lock".to_string(),
            })?;
        Ok(sessions.keys().copied().collect())
    }

    /// Replace the winner selection
    pub async fn select_winner(&self, session_id: SessionId, team: Option<usize>) -> Result<()> {
        let session = self.get_session(session_id)?;
        let mut guard = session.lock().await;
        guard.select_winner(team)?;
        debug!("Session {} winner set to {:?}", session_id, team);
        Ok(())
    }

    /// Replace the loser selection
    pub async fn select_loser(&self, session_id: SessionId, team: Option<usize>) -> Result<()> {
        let session = self.get_session(session_id)?;
        let mut guard = session.lock().await;
        guard.select_loser(team)?;
        debug!("Session {} loser set to {:?}", session_id, team);
        Ok(())
    }

    /// Replace the draw selection
    pub async fn select_draws(&self, session_id: SessionId, teams: Vec<usize>) -> Result<()> {
        let session = self.get_session(session_id)?;
        let mut guard = session.lock().await;
        debug!("Session {} draws set to {:?}", session_id, teams);
        guard.select_draws(teams)?;
        Ok(())
    }

    /// Replace the whole selection from one result per team
    pub async fn apply_team_results(
        &self,
        session_id: SessionId,
        results: Vec<TeamOutcome>,
    ) -> Result<()> {
        let session = self.get_session(session_id)?;
        let mut guard = session.lock().await;
        guard.apply_team_results(&results)?;
        Ok(())
    }

    /// Check the current selection without committing it
    pub async fn preview(&self, session_id: SessionId) -> Result<RankVector> {
        let session = self.get_session(session_id)?;
        let guard = session.lock().await;
        let ranks = resolve_ranks(guard.team_count(), guard.selection()).map_err(ScrimError::from)?;
        Ok(ranks)
    }

    /// Validate the current selection, rate the match and persist the result
    pub async fn commit(&self, session_id: SessionId) -> Result<CommitOutcome> {
        self.commit_with(session_id, None).await
    }

    /// Commit with caller-supplied placements instead of the selection
    pub async fn commit_placements(
        &self,
        session_id: SessionId,
        placements: Vec<u32>,
    ) -> Result<CommitOutcome> {
        self.commit_with(session_id, Some(placements)).await
    }

    async fn commit_with(
        &self,
        session_id: SessionId,
        placements: Option<Vec<u32>>,
    ) -> Result<CommitOutcome> {
        let timer = self.metrics_collector.start_timer();
        let session = self.get_session(session_id)?;

        let ticket = {
            let mut guard = session.lock().await;
            guard.begin_commit().map_err(|e| {
                if let Some(conflict) = e.downcast_ref::<ScrimError>() {
                    let reason = match conflict {
                        ScrimError::CommitInProgress { .. } => "in_progress",
                        _ => "already_committed",
                    };
                    self.metrics_collector.record_commit_conflict(reason);
                }
                e
            })?
        };

        info!("Committing session {} (game {})", session_id, ticket.game_id);

        // Held from reading current ratings until the update is stored
        let _commit_guard = self.commit_lock.lock().await;

        let evaluation = match self.evaluate(&ticket, placements) {
            Ok(evaluation) => evaluation,
            Err(e) => {
                session.lock().await.abort_commit(ticket.generation);
                warn!("Commit of session {} rejected: {}", session_id, e);
                return Err(e);
            }
        };

        {
            let mut guard = session.lock().await;
            if !guard.owns_commit(ticket.generation) {
                return Err(ScrimError::InternalError {
                    message: format!("Session {} was reset while committing", session_id),
                }
                .into());
            }

            if let Err(e) = self.persist(&ticket, &evaluation) {
                guard.abort_commit(ticket.generation);
                error!("Failed to persist results for session {}: {}", session_id, e);
                return Err(e);
            }

            guard.finish_commit(ticket.generation, evaluation.ranks.clone());
        }

        self.metrics_collector.record_results(
            self.engine.name(),
            evaluation.rating_duration,
            timer.stop(),
        );
        info!(
            "Recorded results for session {} with ranks {:?}",
            session_id,
            evaluation.ranks.ranks()
        );

        let event = ResultsRecorded {
            session_id,
            game_id: ticket.game_id,
            ranks: evaluation.ranks.clone(),
            rating_changes: evaluation.changes.clone(),
            timestamp: current_timestamp(),
        };
        if let Err(e) = self.event_publisher.publish_results_recorded(event).await {
            warn!(
                "Failed to publish ResultsRecorded for session {}: {}",
                session_id, e
            );
        }

        Ok(CommitOutcome {
            session_id,
            game_id: ticket.game_id,
            ranks: evaluation.ranks,
            rating_changes: evaluation.changes,
        })
    }

    /// Resolve ranks and rate the match; writes nothing
    fn evaluate(&self, ticket: &CommitTicket, placements: Option<Vec<u32>>) -> Result<Evaluation> {
        let team_count = ticket.teams.len();
        let ranks = match placements {
            Some(placements) => RankVector::from_placements(placements, team_count)?,
            None => resolve_ranks(team_count, &ticket.selection).map_err(|e| {
                self.metrics_collector.record_validation_failure(e.kind());
                ScrimError::from(e)
            })?,
        };

        let groups = self.current_groups(&ticket.teams)?;

        let rating_timer = self.metrics_collector.start_timer();
        let rated = self.engine.rate(&groups, &ranks)?;
        let rating_duration = rating_timer.stop();

        if rated.len() != groups.len() || rated.iter().zip(&groups).any(|(r, g)| r.len() != g.len())
        {
            return Err(ScrimError::RatingEngineFailed {
                reason: format!(
                    "{} engine returned ratings that do not match the teams",
                    self.engine.name()
                ),
            }
            .into());
        }

        let outcomes = ranks.team_outcomes();
        let mut changes = Vec::new();
        for (((team, old_group), new_group), outcome) in ticket
            .teams
            .iter()
            .zip(&groups)
            .zip(&rated)
            .zip(&outcomes)
        {
            for ((player, old), new) in team.players.iter().zip(old_group).zip(new_group) {
                changes.push(RatingChange {
                    player_id: player.id.clone(),
                    team_index: team.index,
                    outcome: *outcome,
                    old_rating: *old,
                    new_rating: *new,
                });
            }
        }

        Ok(Evaluation {
            ranks,
            changes,
            rating_duration,
        })
    }

    /// Current stored ratings, grouped by team
    fn current_groups(&self, teams: &[Team]) -> Result<Vec<RatingGroup>> {
        let ids: Vec<_> = teams.iter().flat_map(|t| t.player_ids()).collect();
        let records = self.store.get_players(&ids)?;

        teams
            .iter()
            .map(|team| {
                team.players
                    .iter()
                    .map(|p| {
                        records.get(&p.id).map(|r| r.rating()).ok_or_else(|| {
                            anyhow::Error::from(ScrimError::PlayerNotFound {
                                player_id: p.id.clone(),
                            })
                        })
                    })
                    .collect::<Result<Vec<PlayerRating>>>()
            })
            .collect()
    }

    fn persist(&self, ticket: &CommitTicket, evaluation: &Evaluation) -> Result<()> {
        let updates: Vec<ResultUpdate> = evaluation
            .changes
            .iter()
            .map(|c| ResultUpdate {
                player_id: c.player_id.clone(),
                new_rating: c.new_rating,
                outcome: c.outcome,
            })
            .collect();
        self.store.apply_results(&updates)?;

        let final_ratings = evaluation
            .changes
            .iter()
            .map(|c| (c.player_id.clone(), c.new_rating))
            .collect();
        if let Err(e) = self.store.update_game_ratings(ticket.game_id, final_ratings) {
            warn!("Ratings saved but game {} was not updated: {}", ticket.game_id, e);
        }

        Ok(())
    }

    /// Clear the selection and reopen the session
    pub async fn reset(&self, session_id: SessionId) -> Result<()> {
        let session = self.get_session(session_id)?;
        let mut guard = session.lock().await;
        guard.reset()?;
        info!("Reset session {}", session_id);
        Ok(())
    }

    /// Discard a session
    pub async fn end_session(&self, session_id: SessionId) -> Result<SessionSnapshot> {
        let removed = {
            let mut sessions = self
                .sessions
                .write()
                .map_err(|_| ScrimError::InternalError {
                    message: "Failed to acquire sessions write lock".to_string(),
                })?;
            sessions.remove(&session_id)
        };

        let session = removed.ok_or_else(|| ScrimError::SessionNotFound {
            session_id: session_id.to_string(),
        })?;

        self.metrics_collector.record_session_ended();
        let snapshot = session.lock().await.snapshot();
        info!("Ended session {} in phase {:?}", session_id, snapshot.phase);
        Ok(snapshot)
    }
}
