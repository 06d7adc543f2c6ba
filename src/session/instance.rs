//! Match session state and lifecycle
//!
//! A session holds the formed teams and the outcome selection being edited
//! for them. Commits move through `Open -> Committing -> Committed`; a
//! failed commit or a reset returns the session to `Open`.

use crate::error::{Result, ScrimError};
use crate::outcome::OutcomeSelection;
use crate::teams::AssignmentMode;
use crate::types::{GameId, RankVector, SessionId, Team, TeamOutcome};
use crate::utils::current_timestamp;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Possible states of a match session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionPhase {
    /// Selection can be edited and committed
    Open,
    /// A commit has snapshotted the selection and is being rated
    Committing,
    /// Results were recorded (terminal)
    Committed,
}

/// Read-only view of a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub game_id: GameId,
    pub mode: AssignmentMode,
    pub teams: Vec<Team>,
    pub selection: OutcomeSelection,
    pub phase: SessionPhase,
    pub ranks: Option<RankVector>,
    pub created_at: DateTime<Utc>,
}

/// What a commit works from once the session lock is released
#[derive(Debug, Clone)]
pub(crate) struct CommitTicket {
    pub generation: u64,
    pub selection: OutcomeSelection,
    pub teams: Vec<Team>,
    pub game_id: GameId,
}

#[derive(Debug, Clone)]
pub struct MatchSession {
    id: SessionId,
    game_id: GameId,
    mode: AssignmentMode,
    teams: Vec<Team>,
    selection: OutcomeSelection,
    phase: SessionPhase,
    /// Bumped on every reset so a stale commit can tell it lost the session
    generation: u64,
    ranks: Option<RankVector>,
    created_at: DateTime<Utc>,
    last_activity: DateTime<Utc>,
}

impl MatchSession {
    pub fn new(id: SessionId, game_id: GameId, mode: AssignmentMode, teams: Vec<Team>) -> Self {
        let now = current_timestamp();
        Self {
            id,
            game_id,
            mode,
            teams,
            selection: OutcomeSelection::default(),
            phase: SessionPhase::Open,
            generation: 0,
            ranks: None,
            created_at: now,
            last_activity: now,
        }
    }

    pub fn id(&self) -> SessionId {
        self.id
    }

    pub fn game_id(&self) -> GameId {
        self.game_id
    }

    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    pub fn selection(&self) -> &OutcomeSelection {
        &self.selection
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn last_activity(&self) -> DateTime<Utc> {
        self.last_activity
    }

    /// Edits are accepted until results are recorded. Edits made while a
    /// commit is in flight only affect the next commit.
    fn ensure_editable(&self) -> Result<()> {
        if self.phase == SessionPhase::Committed {
            return Err(ScrimError::AlreadyCommitted {
                session_id: self.id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn touch(&mut self) {
        self.last_activity = current_timestamp();
    }

    pub fn select_winner(&mut self, team: Option<usize>) -> Result<()> {
        self.ensure_editable()?;
        self.selection.set_winner(team);
        self.touch();
        Ok(())
    }

    pub fn select_loser(&mut self, team: Option<usize>) -> Result<()> {
        self.ensure_editable()?;
        self.selection.set_loser(team);
        self.touch();
        Ok(())
    }

    pub fn select_draws(&mut self, teams: impl IntoIterator<Item = usize>) -> Result<()> {
        self.ensure_editable()?;
        self.selection.set_draws(teams);
        self.touch();
        Ok(())
    }

    /// Replace the whole selection from one result per team
    pub fn apply_team_results(&mut self, results: &[TeamOutcome]) -> Result<()> {
        self.ensure_editable()?;
        self.selection = OutcomeSelection::from_team_results(results);
        self.touch();
        Ok(())
    }

    /// Lock the session for a commit and snapshot what it will evaluate
    pub(crate) fn begin_commit(&mut self) -> Result<CommitTicket> {
        match self.phase {
            SessionPhase::Committing => Err(ScrimError::CommitInProgress {
                session_id: self.id.to_string(),
            }
            .into()),
            SessionPhase::Committed => Err(ScrimError::AlreadyCommitted {
                session_id: self.id.to_string(),
            }
            .into()),
            SessionPhase::Open => {
                self.phase = SessionPhase::Committing;
                self.touch();
                Ok(CommitTicket {
                    generation: self.generation,
                    selection: self.selection.clone(),
                    teams: self.teams.clone(),
                    game_id: self.game_id,
                })
            }
        }
    }

    /// True when the commit holding `generation` still owns the session
    pub(crate) fn owns_commit(&self, generation: u64) -> bool {
        self.phase == SessionPhase::Committing && self.generation == generation
    }

    pub(crate) fn finish_commit(&mut self, generation: u64, ranks: RankVector) -> bool {
        if !self.owns_commit(generation) {
            return false;
        }
        self.phase = SessionPhase::Committed;
        self.ranks = Some(ranks);
        self.touch();
        true
    }

    pub(crate) fn abort_commit(&mut self, generation: u64) {
        if self.owns_commit(generation) {
            self.phase = SessionPhase::Open;
            self.touch();
        }
    }

    /// Clear the selection and reopen the session
    pub fn reset(&mut self) -> Result<()> {
        if self.phase == SessionPhase::Committed {
            return Err(ScrimError::AlreadyCommitted {
                session_id: self.id.to_string(),
            }
            .into());
        }
        self.selection = OutcomeSelection::default();
        self.phase = SessionPhase::Open;
        self.generation += 1;
        self.touch();
        Ok(())
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.id,
            game_id: self.game_id,
            mode: self.mode.clone(),
            teams: self.teams.clone(),
            selection: self.selection.clone(),
            phase: self.phase,
            ranks: self.ranks.clone(),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::{generate_game_id, generate_session_id};

    fn session() -> MatchSession {
        MatchSession::new(
            generate_session_id(),
            generate_game_id(),
            AssignmentMode::default(),
            vec![],
        )
    }

    fn error_of(result: Result<impl std::fmt::Debug>) -> ScrimError {
        result
            .unwrap_err()
            .downcast::<ScrimError>()
            .expect("expected a ScrimError")
    }

    #[test]
    fn test_edits_replace_per_category() {
        let mut session = session();
        session.select_winner(Some(1)).unwrap();
        session.select_winner(Some(3)).unwrap();
        session.select_draws([2, 4]).unwrap();
        session.select_draws([2]).unwrap();

        let selection = session.selection();
        assert_eq!(selection.winners.iter().copied().collect::<Vec<_>>(), vec![3]);
        assert_eq!(selection.draws.iter().copied().collect::<Vec<_>>(), vec![2]);
        assert!(selection.losers.is_empty());
    }

    #[test]
    fn test_commit_lifecycle() {
        let mut session = session();
        session.select_winner(Some(1)).unwrap();

        let ticket = session.begin_commit().unwrap();
        assert_eq!(session.phase(), SessionPhase::Committing);
        assert!(matches!(
            error_of(session.begin_commit()),
            ScrimError::CommitInProgress { .. }
        ));

        // Edits during a commit do not touch the snapshot
        session.select_winner(Some(2)).unwrap();
        assert_eq!(
            ticket.selection.winners.iter().copied().collect::<Vec<_>>(),
            vec![1]
        );

        let ranks = RankVector::from_placements(vec![0, 1], 2).unwrap();
        assert!(session.finish_commit(ticket.generation, ranks));
        assert_eq!(session.phase(), SessionPhase::Committed);
        assert!(matches!(
            error_of(session.begin_commit()),
            ScrimError::AlreadyCommitted { .. }
        ));
        assert!(session.select_loser(Some(2)).is_err());
    }

    #[test]
    fn test_abort_returns_to_open() {
        let mut session = session();
        let ticket = session.begin_commit().unwrap();
        session.abort_commit(ticket.generation);
        assert_eq!(session.phase(), SessionPhase::Open);
        assert!(session.begin_commit().is_ok());
    }

    #[test]
    fn test_reset_unlocks_and_invalidates_in_flight_commit() {
        let mut session = session();
        session.select_winner(Some(1)).unwrap();
        let ticket = session.begin_commit().unwrap();

        session.reset().unwrap();
        assert_eq!(session.phase(), SessionPhase::Open);
        assert!(session.selection().is_empty());

        let ranks = RankVector::from_placements(vec![0, 1], 2).unwrap();
        assert!(!session.finish_commit(ticket.generation, ranks));
        assert_eq!(session.phase(), SessionPhase::Open);
    }
}
