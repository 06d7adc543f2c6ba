//! Team size partitioning
//!
//! Splits a player count into as few teams as possible while keeping every
//! team as close to four players as the count allows.

use crate::error::ValidationError;
use crate::types::TeamSizePartition;

/// Preferred number of players per team
pub const PREFERRED_TEAM_SIZE: usize = 4;

/// Minimum number of teams in a match
pub const MIN_TEAMS: usize = 2;

/// Largest roster the balancer accepts
pub const MAX_PLAYER_COUNT: i64 = 10_000;

/// Partition `player_count` players into team sizes.
///
/// The team count is the smallest value (at least two) that keeps every team
/// at or below [`PREFERRED_TEAM_SIZE`]; the remainder is spread one player at
/// a time so no two teams differ by more than one. Sizes are sorted ascending.
pub fn partition_team_sizes(player_count: i64) -> Result<TeamSizePartition, ValidationError> {
    if !(MIN_TEAMS as i64..=MAX_PLAYER_COUNT).contains(&player_count) {
        return Err(ValidationError::InvalidPlayerCount {
            count: player_count,
        });
    }

    let players = player_count as usize;
    let team_count = players.div_ceil(PREFERRED_TEAM_SIZE).max(MIN_TEAMS);
    let base = players / team_count;
    let larger = players % team_count;

    let mut sizes = vec![base; team_count - larger];
    sizes.extend(std::iter::repeat(base + 1).take(larger));

    Ok(TeamSizePartition::new(sizes))
}

/// Stateless wrapper for callers that prefer a value to pass around
#[derive(Debug, Clone, Copy, Default)]
pub struct TeamBalancer;

impl TeamBalancer {
    pub fn new() -> Self {
        Self
    }

    pub fn partition(&self, player_count: i64) -> Result<TeamSizePartition, ValidationError> {
        partition_team_sizes(player_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_published_mapping() {
        let cases: [(i64, &[usize]); 7] = [
            (4, &[2, 2]),
            (6, &[3, 3]),
            (8, &[4, 4]),
            (10, &[3, 3, 4]),
            (12, &[4, 4, 4]),
            (16, &[4, 4, 4, 4]),
            (20, &[4, 4, 4, 4, 4]),
        ];

        for (count, expected) in cases {
            let partition = partition_team_sizes(count).unwrap();
            assert_eq!(partition.sizes(), expected, "player count {}", count);
        }
    }

    #[test]
    fn test_small_rosters() {
        assert_eq!(partition_team_sizes(2).unwrap().sizes(), &[1, 1]);
        assert_eq!(partition_team_sizes(3).unwrap().sizes(), &[1, 2]);
        assert_eq!(partition_team_sizes(5).unwrap().sizes(), &[2, 3]);
        assert_eq!(partition_team_sizes(7).unwrap().sizes(), &[3, 4]);
    }

    #[test]
    fn test_moves_to_more_teams_instead_of_oversized_ones() {
        assert_eq!(partition_team_sizes(9).unwrap().sizes(), &[3, 3, 3]);
        assert_eq!(partition_team_sizes(13).unwrap().sizes(), &[3, 3, 3, 4]);
        assert_eq!(partition_team_sizes(21).unwrap().sizes(), &[3, 3, 3, 4, 4, 4]);
    }

    #[test]
    fn test_largest_accepted_roster() {
        let partition = partition_team_sizes(MAX_PLAYER_COUNT).unwrap();
        assert_eq!(partition.team_count(), 2_500);
        assert!(partition.sizes().iter().all(|&size| size == 4));
    }

    #[test]
    fn test_invalid_player_counts() {
        for count in [0, 1, -5, i64::MIN, MAX_PLAYER_COUNT + 1, i64::MAX] {
            assert_eq!(
                partition_team_sizes(count),
                Err(ValidationError::InvalidPlayerCount { count })
            );
        }
    }

    #[test]
    fn test_balancer_is_deterministic() {
        let balancer = TeamBalancer::new();
        assert_eq!(balancer.partition(14).unwrap(), balancer.partition(14).unwrap());
    }

    proptest! {
        #[test]
        fn prop_partition_covers_roster_with_small_spread(count in 2i64..500) {
            let partition = partition_team_sizes(count).unwrap();
            prop_assert_eq!(partition.total_players() as i64, count);
            prop_assert!(partition.spread() <= 1);
            prop_assert!(partition.team_count() >= MIN_TEAMS);
            prop_assert!(partition.sizes().iter().all(|&s| s <= PREFERRED_TEAM_SIZE));
        }

        #[test]
        fn prop_no_team_below_two_when_avoidable(count in 4i64..500) {
            let partition = partition_team_sizes(count).unwrap();
            prop_assert!(partition.sizes().iter().all(|&s| s >= 2));
        }

        #[test]
        fn prop_uses_fewest_teams(count in 2i64..500) {
            let partition = partition_team_sizes(count).unwrap();
            let fewer = partition.team_count() - 1;
            // One team fewer would either drop below the minimum or overfill a team
            prop_assert!(
                fewer < MIN_TEAMS || (count as usize).div_ceil(fewer) > PREFERRED_TEAM_SIZE
            );
        }
    }
}
