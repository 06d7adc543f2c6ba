//! Player-to-slot assignment
//!
//! Team sizes come from the partitioner; this module decides which players
//! fill which slots. Skill-balanced assignment snake-drafts players by
//! conservative skill and then hill-climbs on the variance of team averages.

use crate::error::{Result, ScrimError};
use crate::types::{Player, Team, TeamSizePartition};
use crate::utils::variance;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How players are placed into the sized team slots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum AssignmentMode {
    /// Minimize the spread of team skill averages
    SkillBalanced { randomized: bool },
    /// Ignore ratings entirely
    Random,
    /// Every team gets at least one player from `region`
    RegionConstrained { region: String, randomized: bool },
}

impl Default for AssignmentMode {
    fn default() -> Self {
        AssignmentMode::SkillBalanced { randomized: false }
    }
}

impl AssignmentMode {
    /// Short stable label for metrics and logs
    pub fn label(&self) -> &'static str {
        match self {
            AssignmentMode::SkillBalanced { .. } => "skill_balanced",
            AssignmentMode::Random => "random",
            AssignmentMode::RegionConstrained { .. } => "region_constrained",
        }
    }
}

/// Search limits for skill-balanced assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignmentConfig {
    /// Upper bound on restarts from a shuffled draft
    pub max_attempts: usize,
    /// Upper bound on swap passes per attempt
    pub max_local_iterations: usize,
}

impl Default for AssignmentConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1000,
            max_local_iterations: 200,
        }
    }
}

/// Qualitative label for how even the teams are
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceQuality {
    Excellent,
    Good,
    Fair,
}

impl std::fmt::Display for BalanceQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BalanceQuality::Excellent => write!(f, "Excellent"),
            BalanceQuality::Good => write!(f, "Good"),
            BalanceQuality::Fair => write!(f, "Fair"),
        }
    }
}

/// Summary of team strength after assignment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceReport {
    pub averages: Vec<f64>,
    pub min_average: f64,
    pub max_average: f64,
    pub difference: f64,
    pub variance: f64,
    pub quality: BalanceQuality,
}

/// Summarize how balanced a set of teams is
pub fn balance_report(teams: &[Team]) -> BalanceReport {
    let averages: Vec<f64> = teams.iter().map(Team::average_skill).collect();
    let min_average = averages.iter().copied().fold(f64::INFINITY, f64::min);
    let max_average = averages.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let variance = variance(&averages);

    let quality = if variance < 0.5 {
        BalanceQuality::Excellent
    } else if variance < 2.0 {
        BalanceQuality::Good
    } else {
        BalanceQuality::Fair
    };

    BalanceReport {
        difference: max_average - min_average,
        averages,
        min_average,
        max_average,
        variance,
        quality,
    }
}

/// Assigns players into the slots of a [`TeamSizePartition`]
#[derive(Debug, Clone, Default)]
pub struct TeamAssigner {
    config: AssignmentConfig,
}

impl TeamAssigner {
    pub fn new(config: AssignmentConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AssignmentConfig {
        &self.config
    }

    /// Fill every slot of `partition` with exactly one player
    pub fn assign<R: Rng + ?Sized>(
        &self,
        players: Vec<Player>,
        partition: &TeamSizePartition,
        mode: &AssignmentMode,
        rng: &mut R,
    ) -> Result<Vec<Team>> {
        if players.len() != partition.total_players() {
            return Err(ScrimError::InternalError {
                message: format!(
                    "Roster has {} players but partition expects {}",
                    players.len(),
                    partition.total_players()
                ),
            }
            .into());
        }

        let groups = match mode {
            AssignmentMode::SkillBalanced { randomized } => {
                self.skill_balanced(players, partition.sizes(), *randomized, rng)
            }
            AssignmentMode::Random => random_groups(players, partition.sizes(), rng),
            AssignmentMode::RegionConstrained { region, randomized } => {
                self.region_constrained(players, partition.sizes(), region, *randomized, rng)?
            }
        };

        Ok(groups
            .into_iter()
            .enumerate()
            .map(|(i, players)| Team {
                index: i + 1,
                players,
            })
            .collect())
    }

    fn skill_balanced<R: Rng + ?Sized>(
        &self,
        mut players: Vec<Player>,
        sizes: &[usize],
        randomized: bool,
        rng: &mut R,
    ) -> Vec<Vec<Player>> {
        sort_by_skill_desc(&mut players);

        let total = players.len();
        let attempts = self
            .config
            .max_attempts
            .min(if total <= 12 { 1000 } else { 500 })
            .max(1);
        let local_iterations = self
            .config
            .max_local_iterations
            .min(if total <= 8 { 200 } else { 100 });

        let order = snake_slot_order(sizes);
        let mut best: Option<(f64, Vec<Vec<Player>>)> = None;

        for attempt in 0..attempts {
            let mut draft = players.clone();
            if attempt > 0 || randomized {
                shuffle_tiers(&mut draft, tier_size(total, randomized), rng);
            }

            let mut groups = deal(draft, sizes, &order);
            let score = hill_climb(&mut groups, 0, local_iterations);

            if best.as_ref().map_or(true, |(b, _)| score < *b) {
                best = Some((score, groups));
            }
            if score == 0.0 {
                debug!("Perfect balance found after {} attempts", attempt + 1);
                break;
            }
        }

        best.map(|(_, groups)| groups).unwrap_or_default()
    }

    fn region_constrained<R: Rng + ?Sized>(
        &self,
        players: Vec<Player>,
        sizes: &[usize],
        region: &str,
        randomized: bool,
        rng: &mut R,
    ) -> Result<Vec<Vec<Player>>> {
        let team_count = sizes.len();
        let (mut anchors, mut others): (Vec<Player>, Vec<Player>) =
            players.into_iter().partition(|p| p.is_from_region(region));

        if anchors.len() < team_count {
            return Err(ScrimError::InsufficientRegionPlayers {
                region: region.to_string(),
                available: anchors.len(),
                required: team_count,
            }
            .into());
        }

        sort_by_skill_desc(&mut anchors);
        sort_by_skill_desc(&mut others);

        let total = anchors.len() + others.len();
        let attempts = self
            .config
            .max_attempts
            .min(if total > 12 { 100 } else { 200 })
            .max(1);

        // Every team already holds its anchor, so only the remaining seats are drafted
        let remaining_sizes: Vec<usize> = sizes.iter().map(|s| s.saturating_sub(1)).collect();
        let remaining_count = total - team_count;
        let local_iterations = self
            .config
            .max_local_iterations
            .min(if remaining_count <= 8 { 150 } else { 75 });
        let order = snake_slot_order(&remaining_sizes);

        let mut best: Option<(f64, Vec<Vec<Player>>)> = None;

        for attempt in 0..attempts {
            let mut anchor_list = anchors.clone();
            if attempt > 0 || randomized {
                let tier = if randomized {
                    (anchor_list.len() / 2).max(2)
                } else {
                    (anchor_list.len() / 3).max(1)
                };
                shuffle_tiers(&mut anchor_list, tier, rng);
            }

            let mut rest = anchor_list.split_off(team_count);
            rest.extend(others.iter().cloned());
            if (attempt > 0 && !rest.is_empty()) || randomized {
                let tier = tier_size(rest.len(), randomized);
                shuffle_tiers(&mut rest, tier, rng);
            }

            let drafted = deal(rest, &remaining_sizes, &order);
            let mut groups: Vec<Vec<Player>> = anchor_list
                .into_iter()
                .zip(drafted)
                .map(|(anchor, mut team)| {
                    team.insert(0, anchor);
                    team
                })
                .collect();

            let score = hill_climb(&mut groups, 1, local_iterations);
            if best.as_ref().map_or(true, |(b, _)| score < *b) {
                best = Some((score, groups));
            }
            if score == 0.0 {
                break;
            }
        }

        Ok(best.map(|(_, groups)| groups).unwrap_or_default())
    }
}

fn sort_by_skill_desc(players: &mut [Player]) {
    players.sort_by(|a, b| {
        b.rating
            .conservative_skill()
            .partial_cmp(&a.rating.conservative_skill())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
}

fn tier_size(count: usize, randomized: bool) -> usize {
    if randomized {
        (count / 3).max(2)
    } else {
        (count / 4).max(1)
    }
}

fn shuffle_tiers<R: Rng + ?Sized>(players: &mut [Player], tier: usize, rng: &mut R) {
    for chunk in players.chunks_mut(tier.max(1)) {
        chunk.shuffle(rng);
    }
}

/// Team index for each draft pick, reversing direction every round and
/// skipping teams that are already full
fn snake_slot_order(sizes: &[usize]) -> Vec<usize> {
    let rounds = sizes.iter().copied().max().unwrap_or(0);
    let mut order = Vec::with_capacity(sizes.iter().sum());

    for round in 0..rounds {
        let open = (0..sizes.len()).filter(|&t| sizes[t] > round);
        if round % 2 == 0 {
            order.extend(open);
        } else {
            order.extend(open.rev());
        }
    }

    order
}

fn deal(players: Vec<Player>, sizes: &[usize], order: &[usize]) -> Vec<Vec<Player>> {
    let mut groups: Vec<Vec<Player>> = sizes.iter().map(|&s| Vec::with_capacity(s)).collect();
    for (player, &team) in players.into_iter().zip(order) {
        groups[team].push(player);
    }
    groups
}

fn random_groups<R: Rng + ?Sized>(
    mut players: Vec<Player>,
    sizes: &[usize],
    rng: &mut R,
) -> Vec<Vec<Player>> {
    players.shuffle(rng);

    let rounds = sizes.iter().copied().max().unwrap_or(0);
    let order: Vec<usize> = (0..rounds)
        .flat_map(|round| (0..sizes.len()).filter(move |&t| sizes[t] > round))
        .collect();

    deal(players, sizes, &order)
}

fn group_variance(groups: &[Vec<Player>]) -> f64 {
    let averages: Vec<f64> = groups
        .iter()
        .map(|g| {
            if g.is_empty() {
                0.0
            } else {
                g.iter().map(|p| p.rating.conservative_skill()).sum::<f64>() / g.len() as f64
            }
        })
        .collect();
    variance(&averages)
}

/// Swap players between team pairs while it lowers the variance of team
/// averages. Positions below `fixed` in every team are never moved.
fn hill_climb(groups: &mut [Vec<Player>], fixed: usize, max_iterations: usize) -> f64 {
    let mut current = group_variance(groups);
    let mut improved = true;
    let mut iterations = 0;

    while improved && iterations < max_iterations {
        improved = false;
        iterations += 1;

        for i in 0..groups.len() {
            for j in (i + 1)..groups.len() {
                for a in fixed..groups[i].len() {
                    for b in fixed..groups[j].len() {
                        swap_between(groups, i, a, j, b);
                        let candidate = group_variance(groups);
                        if candidate < current {
                            current = candidate;
                            improved = true;
                        } else {
                            swap_between(groups, i, a, j, b);
                        }
                    }
                }
            }
        }
    }

    current
}

fn swap_between(groups: &mut [Vec<Player>], i: usize, a: usize, j: usize, b: usize) {
    let (left, right) = groups.split_at_mut(j);
    std::mem::swap(&mut left[i][a], &mut right[0][b]);
}
