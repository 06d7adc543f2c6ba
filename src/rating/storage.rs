//! Player and game persistence
//!
//! This module defines the store the session layer reads ratings from and
//! writes rating updates to, with an in-memory implementation.

use crate::error::{Result, ScrimError};
use crate::types::{GameId, Player, PlayerId, PlayerRating, Team, TeamOutcome};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;

/// Stored player with rating and match counters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub player: Player,
    pub games_played: u64,
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl PlayerRecord {
    pub fn new(player: Player) -> Self {
        let now = Utc::now();
        Self {
            player,
            games_played: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            created_at: now,
            last_updated: now,
        }
    }

    pub fn rating(&self) -> PlayerRating {
        self.player.rating
    }

    /// Apply a rated result and bump the counters
    pub fn record_result(&mut self, new_rating: PlayerRating, outcome: TeamOutcome) {
        self.player.rating = new_rating;
        self.games_played += 1;
        match outcome {
            TeamOutcome::Win => self.wins += 1,
            TeamOutcome::Loss => self.losses += 1,
            TeamOutcome::Draw => self.draws += 1,
        }
        self.last_updated = Utc::now();
    }
}

/// One player's rating update from a committed match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultUpdate {
    pub player_id: PlayerId,
    pub new_rating: PlayerRating,
    pub outcome: TeamOutcome,
}

/// A formed game and, once committed, the ratings players left it with
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameRecord {
    pub game_id: GameId,
    pub teams: Vec<Team>,
    pub final_ratings: HashMap<PlayerId, PlayerRating>,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl GameRecord {
    pub fn new(game_id: GameId, teams: Vec<Team>) -> Self {
        Self {
            game_id,
            teams,
            final_ratings: HashMap::new(),
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

/// Trait for player and game storage operations
pub trait PlayerStore: Send + Sync {
    /// Get a stored player
    fn get_player(&self, player_id: &PlayerId) -> Result<Option<PlayerRecord>>;

    /// Insert a player, or refresh the name and region of an existing one.
    /// An existing player's rating and counters are kept.
    fn upsert_player(&self, player: Player) -> Result<PlayerRecord>;

    /// Get several players; unknown ids are skipped
    fn get_players(&self, player_ids: &[PlayerId]) -> Result<HashMap<PlayerId, PlayerRecord>>;

    fn all_players(&self) -> Result<Vec<PlayerRecord>>;

    /// Apply every update or none of them
    fn apply_results(&self, updates: &[ResultUpdate]) -> Result<()>;

    fn record_game(&self, game: GameRecord) -> Result<()>;

    /// Store final ratings on a game and mark it completed
    fn update_game_ratings(
        &self,
        game_id: GameId,
        ratings: HashMap<PlayerId, PlayerRating>,
    ) -> Result<()>;

    fn get_game(&self, game_id: GameId) -> Result<Option<GameRecord>>;

    /// Top players by conservative skill, best first
    fn leaderboard(&self, limit: usize) -> Result<Vec<PlayerRecord>>;
}

/// In-memory player store
#[derive(Debug, Default)]
pub struct InMemoryPlayerStore {
    players: RwLock<HashMap<PlayerId, PlayerRecord>>,
    games: RwLock<HashMap<GameId, GameRecord>>,
}

impl InMemoryPlayerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store with a roster
    pub fn with_players(players: impl IntoIterator<Item = Player>) -> Result<Self> {
        let store = Self::new();
        for player in players {
            store.upsert_player(player)?;
        }
        Ok(store)
    }

    fn read_players(
        &self,
    ) -> Result<std::sync::RwLockReadGuard<'_, HashMap<PlayerId, PlayerRecord>>> {
        self.players.read().map_err(|_| {
            ScrimError::InternalError {
                message: "Failed to acquire players read lock".to_string(),
            }
            .into()
        })
    }

    fn write_players(
        &self,
    ) -> Result<std::sync::RwLockWriteGuard<'_, HashMap<PlayerId, PlayerRecord>>> {
        self.players.write().map_err(|_| {
            ScrimError::InternalError {
                message: "Failed to acquire players write lock".to_string(),
            }
            .into()
        })
    }
}

impl PlayerStore for InMemoryPlayerStore {
    fn get_player(&self, player_id: &PlayerId) -> Result<Option<PlayerRecord>> {
        Ok(self.read_players()?.get(player_id).cloned())
    }

    fn upsert_player(&self, player: Player) -> Result<PlayerRecord> {
        let mut players = self.write_players()?;

        let record = players
            .entry(player.id.clone())
            .and_modify(|existing| {
                existing.player.username = player.username.clone();
                existing.player.region = player.region.clone();
            })
            .or_insert_with(|| PlayerRecord::new(player));

        Ok(record.clone())
    }

    fn get_players(&self, player_ids: &[PlayerId]) -> Result<HashMap<PlayerId, PlayerRecord>> {
        let players = self.read_players()?;

        Ok(player_ids
            .iter()
            .filter_map(|id| players.get(id).map(|r| (id.clone(), r.clone())))
            .collect())
    }

    fn all_players(&self) -> Result<Vec<PlayerRecord>> {
        Ok(self.read_players()?.values().cloned().collect())
    }

    fn apply_results(&self, updates: &[ResultUpdate]) -> Result<()> {
        let mut players = self.write_players()?;

        // Check everything before touching anything
        if let Some(missing) = updates.iter().find(|u| !players.contains_key(&u.player_id)) {
            return Err(ScrimError::PlayerNotFound {
                player_id: missing.player_id.clone(),
            }
            .into());
        }

        for update in updates {
            if let Some(record) = players.get_mut(&update.player_id) {
                record.record_result(update.new_rating, update.outcome);
            }
        }

        Ok(())
    }

    fn record_game(&self, game: GameRecord) -> Result<()> {
        let mut games = self
            .games
            .write()
            .map_err(|_| ScrimError::InternalError {
                message: "Failed to acquire games write lock".to_string(),
            })?;

        games.insert(game.game_id, game);
        Ok(())
    }

    fn update_game_ratings(
        &self,
        game_id: GameId,
        ratings: HashMap<PlayerId, PlayerRating>,
    ) -> Result<()> {
        let mut games = self
            .games
            .write()
            .map_err(|_| ScrimError::InternalError {
                message: "Failed to acquire games write lock".to_string(),
            })?;

        let game = games
            .get_mut(&game_id)
            .ok_or_else(|| ScrimError::InternalError {
                message: format!("Game {} was never recorded", game_id),
            })?;

        game.final_ratings = ratings;
        game.completed_at = Some(Utc::now());
        Ok(())
    }

    fn get_game(&self, game_id: GameId) -> Result<Option<GameRecord>> {
        let games = self
            .games
            .read()
            .map_err(|_| ScrimError::InternalError {
                message: "Failed to acquire games read lock".to_string(),
            })?;

        Ok(games.get(&game_id).cloned())
    }

    fn leaderboard(&self, limit: usize) -> Result<Vec<PlayerRecord>> {
        let mut records = self.all_players()?;

        records.sort_by(|a, b| {
            b.rating()
                .conservative_skill()
                .partial_cmp(&a.rating().conservative_skill())
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.player.id.cmp(&b.player.id))
        });
        records.truncate(limit);

        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn player(id: &str, mu: f64, sigma: f64) -> Player {
        Player::new(id, format!("user_{}", id), PlayerRating::new(mu, sigma))
    }

    #[test]
    fn test_upsert_keeps_rating_of_existing_player() {
        let store = InMemoryPlayerStore::new();
        store.upsert_player(player("a", 30.0, 5.0)).unwrap();

        let renamed = Player::new("a", "alice", PlayerRating::default()).with_region("EU");
        let record = store.upsert_player(renamed).unwrap();

        assert_eq!(record.player.username, "alice");
        assert_eq!(record.player.region.as_deref(), Some("EU"));
        assert_eq!(record.rating(), PlayerRating::new(30.0, 5.0));
    }

    #[test]
    fn test_apply_results_updates_counters() {
        let store =
            InMemoryPlayerStore::with_players([player("a", 25.0, 8.0), player("b", 25.0, 8.0)])
                .unwrap();

        store
            .apply_results(&[
                ResultUpdate {
                    player_id: "a".to_string(),
                    new_rating: PlayerRating::new(27.0, 7.5),
                    outcome: TeamOutcome::Win,
                },
                ResultUpdate {
                    player_id: "b".to_string(),
                    new_rating: PlayerRating::new(23.0, 7.5),
                    outcome: TeamOutcome::Loss,
                },
            ])
            .unwrap();

        let a = store.get_player(&"a".to_string()).unwrap().unwrap();
        assert_eq!(a.rating().mu, 27.0);
        assert_eq!((a.games_played, a.wins, a.losses, a.draws), (1, 1, 0, 0));

        let b = store.get_player(&"b".to_string()).unwrap().unwrap();
        assert_eq!(b.losses, 1);
    }

    #[test]
    fn test_apply_results_is_all_or_nothing() {
        let store = InMemoryPlayerStore::with_players([player("a", 25.0, 8.0)]).unwrap();

        let result = store.apply_results(&[
            ResultUpdate {
                player_id: "a".to_string(),
                new_rating: PlayerRating::new(40.0, 1.0),
                outcome: TeamOutcome::Win,
            },
            ResultUpdate {
                player_id: "ghost".to_string(),
                new_rating: PlayerRating::new(10.0, 1.0),
                outcome: TeamOutcome::Loss,
            },
        ]);

        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScrimError>(),
            Some(ScrimError::PlayerNotFound { .. })
        ));

        let a = store.get_player(&"a".to_string()).unwrap().unwrap();
        assert_eq!(a.rating(), PlayerRating::new(25.0, 8.0));
        assert_eq!(a.games_played, 0);
    }

    #[test]
    fn test_get_players_skips_unknown() {
        let store = InMemoryPlayerStore::with_players([player("a", 25.0, 8.0)]).unwrap();
        let found = store
            .get_players(&["a".to_string(), "zzz".to_string()])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains_key("a"));
    }

    #[test]
    fn test_game_records() {
        let store = InMemoryPlayerStore::new();
        let game_id = Uuid::new_v4();
        store.record_game(GameRecord::new(game_id, vec![])).unwrap();

        assert!(!store.get_game(game_id).unwrap().unwrap().is_completed());

        let mut ratings = HashMap::new();
        ratings.insert("a".to_string(), PlayerRating::new(26.0, 7.0));
        store.update_game_ratings(game_id, ratings).unwrap();

        let game = store.get_game(game_id).unwrap().unwrap();
        assert!(game.is_completed());
        assert_eq!(game.final_ratings.len(), 1);

        assert!(store
            .update_game_ratings(Uuid::new_v4(), HashMap::new())
            .is_err());
    }

    #[test]
    fn test_leaderboard_orders_by_conservative_skill() {
        let store = InMemoryPlayerStore::with_players([
            player("steady", 28.0, 1.0),
            player("unknown", 35.0, 8.0),
            player("solid", 30.0, 2.0),
        ])
        .unwrap();

        let top = store.leaderboard(2).unwrap();
        let ids: Vec<_> = top.iter().map(|r| r.player.id.as_str()).collect();
        assert_eq!(ids, vec!["steady", "solid"]);
        assert_eq!(store.all_players().unwrap().len(), 3);
    }
}
