//! Raw outcome selections collected from the people reporting a match

use crate::types::TeamOutcome;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Which teams were marked as winner, loser or drawing.
///
/// Indices are 1-based team numbers. Each category is replaced wholesale
/// on edit; nothing is merged across edits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeSelection {
    pub winners: BTreeSet<usize>,
    pub losers: BTreeSet<usize>,
    pub draws: BTreeSet<usize>,
}

impl OutcomeSelection {
    pub fn new(
        winners: impl IntoIterator<Item = usize>,
        losers: impl IntoIterator<Item = usize>,
        draws: impl IntoIterator<Item = usize>,
    ) -> Self {
        Self {
            winners: winners.into_iter().collect(),
            losers: losers.into_iter().collect(),
            draws: draws.into_iter().collect(),
        }
    }

    /// Every team tied
    pub fn all_draw(team_count: usize) -> Self {
        Self {
            draws: (1..=team_count).collect(),
            ..Self::default()
        }
    }

    /// Build a selection from one result per team, in team order
    pub fn from_team_results(results: &[TeamOutcome]) -> Self {
        let mut selection = Self::default();
        for (i, result) in results.iter().enumerate() {
            let team = i + 1;
            match result {
                TeamOutcome::Win => selection.winners.insert(team),
                TeamOutcome::Loss => selection.losers.insert(team),
                TeamOutcome::Draw => selection.draws.insert(team),
            };
        }
        selection
    }

    pub fn set_winner(&mut self, team: Option<usize>) {
        self.winners = team.into_iter().collect();
    }

    pub fn set_loser(&mut self, team: Option<usize>) {
        self.losers = team.into_iter().collect();
    }

    pub fn set_draws(&mut self, teams: impl IntoIterator<Item = usize>) {
        self.draws = teams.into_iter().collect();
    }

    pub fn is_empty(&self) -> bool {
        self.winners.is_empty() && self.losers.is_empty() && self.draws.is_empty()
    }
}
