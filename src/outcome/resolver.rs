//! Rank resolution
//!
//! Turns an [`OutcomeSelection`] into a [`RankVector`] the rating engine can
//! consume. The rules run in a fixed order and the first failure is reported:
//!
//! 1. at most one winner
//! 2. at most one loser
//! 3. every team classified exactly once, nothing out of range
//! 4. a partial draw needs both a winner and a loser
//! 5. at most `T - 2` teams in the draw group
//!
//! Only one tie tier exists: every drawing team shares rank 1.

use crate::error::ValidationError;
use crate::outcome::selection::OutcomeSelection;
use crate::types::RankVector;
use std::collections::BTreeSet;

/// Rank of the sole winner
pub const WINNER_RANK: u32 = 0;

/// Rank shared by every team in a partial draw
pub const DRAW_GROUP_RANK: u32 = 1;

/// Validate `selection` for a match with `team_count` teams and produce ranks
pub fn resolve_ranks(
    team_count: usize,
    selection: &OutcomeSelection,
) -> Result<RankVector, ValidationError> {
    if team_count < 2 {
        return Err(ValidationError::InvalidTeamCount { count: team_count });
    }

    let OutcomeSelection {
        winners,
        losers,
        draws,
    } = selection;

    if winners.len() > 1 {
        return Err(ValidationError::MultipleWinners {
            teams: winners.iter().copied().collect(),
        });
    }

    if losers.len() > 1 {
        return Err(ValidationError::MultipleLosers {
            teams: losers.iter().copied().collect(),
        });
    }

    check_classification(team_count, selection)?;

    let all_tied = draws.len() == team_count;
    let has_anchors = winners.len() == 1 && losers.len() == 1;

    if !draws.is_empty() && !all_tied && !has_anchors {
        return Err(ValidationError::AmbiguousPartialDraw {
            draws: draws.iter().copied().collect(),
        });
    }

    let max_draws = team_count - 2;
    if has_anchors && draws.len() > max_draws {
        return Err(ValidationError::TooManyDrawingTeams {
            draws: draws.iter().copied().collect(),
            max: max_draws,
        });
    }

    if all_tied {
        return Ok(RankVector::new(vec![WINNER_RANK; team_count]));
    }

    let loser_rank = (team_count - 1) as u32;
    let ranks = (1..=team_count)
        .map(|team| {
            if winners.contains(&team) {
                WINNER_RANK
            } else if losers.contains(&team) {
                loser_rank
            } else {
                DRAW_GROUP_RANK
            }
        })
        .collect();

    Ok(RankVector::new(ranks))
}

/// Every team index must appear in exactly one category
fn check_classification(
    team_count: usize,
    selection: &OutcomeSelection,
) -> Result<(), ValidationError> {
    let mut seen = BTreeSet::new();
    let mut duplicated = BTreeSet::new();
    let mut out_of_range = BTreeSet::new();

    let categories = [&selection.winners, &selection.losers, &selection.draws];
    for team in categories.into_iter().flatten().copied() {
        if team == 0 || team > team_count {
            out_of_range.insert(team);
        } else if !seen.insert(team) {
            duplicated.insert(team);
        }
    }

    let unclassified: Vec<usize> = (1..=team_count).filter(|t| !seen.contains(t)).collect();

    if unclassified.is_empty() && duplicated.is_empty() && out_of_range.is_empty() {
        return Ok(());
    }

    Err(ValidationError::UnclassifiedOrDuplicateTeam {
        unclassified,
        duplicated: duplicated.into_iter().collect(),
        out_of_range: out_of_range.into_iter().collect(),
    })
}

/// Stateless wrapper over [`resolve_ranks`]
#[derive(Debug, Clone, Copy, Default)]
pub struct RankResolver;

impl RankResolver {
    pub fn new() -> Self {
        Self
    }

    pub fn resolve(
        &self,
        team_count: usize,
        selection: &OutcomeSelection,
    ) -> Result<RankVector, ValidationError> {
        resolve_ranks(team_count, selection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(
        team_count: usize,
        winners: &[usize],
        losers: &[usize],
        draws: &[usize],
    ) -> Result<Vec<u32>, ValidationError> {
        let selection = OutcomeSelection::new(
            winners.iter().copied(),
            losers.iter().copied(),
            draws.iter().copied(),
        );
        resolve_ranks(team_count, &selection).map(|r| r.ranks().to_vec())
    }

    #[test]
    fn test_two_teams_win_loss() {
        assert_eq!(resolve(2, &[1], &[2], &[]).unwrap(), vec![0, 1]);
        assert_eq!(resolve(2, &[2], &[1], &[]).unwrap(), vec![1, 0]);
    }

    #[test]
    fn test_two_teams_all_draw() {
        assert_eq!(resolve(2, &[], &[], &[1, 2]).unwrap(), vec![0, 0]);
    }

    #[test]
    fn test_four_teams_partial_draw() {
        assert_eq!(resolve(4, &[1], &[4], &[2, 3]).unwrap(), vec![0, 1, 1, 3]);
    }

    #[test]
    fn test_five_teams_partial_draw_in_any_order() {
        assert_eq!(
            resolve(5, &[3], &[1], &[2, 4, 5]).unwrap(),
            vec![4, 1, 0, 1, 1]
        );
    }

    #[test]
    fn test_all_draw_for_many_teams() {
        assert_eq!(resolve(5, &[], &[], &[1, 2, 3, 4, 5]).unwrap(), vec![0; 5]);
    }

    #[test]
    fn test_multiple_winners() {
        assert_eq!(
            resolve(3, &[1, 2], &[3], &[]),
            Err(ValidationError::MultipleWinners { teams: vec![1, 2] })
        );
    }

    #[test]
    fn test_multiple_losers() {
        assert_eq!(
            resolve(3, &[1], &[2, 3], &[]),
            Err(ValidationError::MultipleLosers { teams: vec![2, 3] })
        );
    }

    #[test]
    fn test_multiple_winners_checked_before_losers() {
        assert!(matches!(
            resolve(4, &[1, 2], &[3, 4], &[]),
            Err(ValidationError::MultipleWinners { .. })
        ));
    }

    #[test]
    fn test_overlap_rejected_before_draw_count() {
        assert_eq!(
            resolve(4, &[1], &[4], &[2, 3, 4]),
            Err(ValidationError::UnclassifiedOrDuplicateTeam {
                unclassified: vec![],
                duplicated: vec![4],
                out_of_range: vec![],
            })
        );
    }

    #[test]
    fn test_unclassified_team() {
        assert_eq!(
            resolve(3, &[1], &[2], &[]),
            Err(ValidationError::UnclassifiedOrDuplicateTeam {
                unclassified: vec![3],
                duplicated: vec![],
                out_of_range: vec![],
            })
        );
    }

    #[test]
    fn test_out_of_range_team() {
        assert_eq!(
            resolve(2, &[1], &[3], &[]),
            Err(ValidationError::UnclassifiedOrDuplicateTeam {
                unclassified: vec![2],
                duplicated: vec![],
                out_of_range: vec![3],
            })
        );
        assert!(matches!(
            resolve(2, &[0], &[2], &[1]),
            Err(ValidationError::UnclassifiedOrDuplicateTeam { .. })
        ));
    }

    #[test]
    fn test_empty_selection_is_unclassified() {
        assert_eq!(
            resolve(2, &[], &[], &[]),
            Err(ValidationError::UnclassifiedOrDuplicateTeam {
                unclassified: vec![1, 2],
                duplicated: vec![],
                out_of_range: vec![],
            })
        );
    }

    #[test]
    fn test_partial_draw_needs_winner_and_loser() {
        assert_eq!(
            resolve(3, &[1], &[], &[2, 3]),
            Err(ValidationError::AmbiguousPartialDraw { draws: vec![2, 3] })
        );
        assert_eq!(
            resolve(3, &[], &[3], &[1, 2]),
            Err(ValidationError::AmbiguousPartialDraw { draws: vec![1, 2] })
        );
    }

    #[test]
    fn test_invalid_team_count() {
        assert_eq!(
            resolve(1, &[], &[], &[1]),
            Err(ValidationError::InvalidTeamCount { count: 1 })
        );
        assert_eq!(
            resolve(0, &[], &[], &[]),
            Err(ValidationError::InvalidTeamCount { count: 0 })
        );
    }

    #[test]
    fn test_resolution_is_idempotent() {
        let selection = OutcomeSelection::new([2], [1], [3, 4]);
        let resolver = RankResolver::new();
        let first = resolver.resolve(4, &selection).unwrap();
        let second = resolver.resolve(4, &selection).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.ranks(), &[3, 0, 1, 1]);
    }

    #[test]
    fn test_resolved_vector_has_single_winner_and_loser() {
        for team_count in 3..8 {
            let draws: Vec<usize> = (2..team_count).collect();
            let ranks = resolve(team_count, &[1], &[team_count], &draws).unwrap();
            assert_eq!(ranks.len(), team_count);
            assert_eq!(ranks.iter().filter(|&&r| r == 0).count(), 1);
            let worst = *ranks.iter().max().unwrap();
            assert_eq!(ranks.iter().filter(|&&r| r == worst).count(), 1);
            assert_eq!(worst as usize, team_count - 1);
        }
    }
}
