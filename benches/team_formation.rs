//! Performance benchmarks for team formation and result recording

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::rngs::StdRng;
use rand::SeedableRng;
use scrimmage::events::NoopEventPublisher;
use scrimmage::metrics::MetricsCollector;
use scrimmage::outcome::{resolve_ranks, OutcomeSelection};
use scrimmage::rating::{InMemoryPlayerStore, RatingEngine, TrueSkillEngine, TrueSkillSettings};
use scrimmage::session::SessionManager;
use scrimmage::teams::{partition_team_sizes, AssignmentConfig, AssignmentMode, TeamAssigner};
use scrimmage::types::{Player, PlayerRating, RankVector};
use std::sync::Arc;

fn create_roster(n: usize) -> Vec<Player> {
    (0..n)
        .map(|i| {
            Player::new(
                format!("player_{}", i),
                format!("Player {}", i),
                PlayerRating::new(15.0 + (i as f64 * 1.7) % 20.0, 3.0 + (i % 5) as f64),
            )
        })
        .collect()
}

fn bench_partition(c: &mut Criterion) {
    c.bench_function("partition_2_to_20", |b| {
        b.iter(|| {
            for players in 2..=20 {
                black_box(partition_team_sizes(black_box(players)).unwrap());
            }
        })
    });
}

fn bench_resolve(c: &mut Criterion) {
    let partial_draw = OutcomeSelection::new(Some(2), Some(3), [1, 4]);
    let all_draw = OutcomeSelection::all_draw(5);

    c.bench_function("resolve_partial_draw", |b| {
        b.iter(|| black_box(resolve_ranks(4, black_box(&partial_draw))))
    });
    c.bench_function("resolve_all_draw", |b| {
        b.iter(|| black_box(resolve_ranks(5, black_box(&all_draw))))
    });
}

fn bench_assignment(c: &mut Criterion) {
    let assigner = TeamAssigner::new(AssignmentConfig::default());
    let mut group = c.benchmark_group("assignment");

    for players in [8usize, 13, 20] {
        let roster = create_roster(players);
        let partition = partition_team_sizes(players as i64).unwrap();

        group.bench_with_input(
            BenchmarkId::new("skill_balanced", players),
            &roster,
            |b, roster| {
                let mut rng = StdRng::seed_from_u64(7);
                let mode = AssignmentMode::SkillBalanced { randomized: false };
                b.iter(|| {
                    black_box(
                        assigner
                            .assign(roster.clone(), &partition, &mode, &mut rng)
                            .unwrap(),
                    )
                })
            },
        );

        group.bench_with_input(BenchmarkId::new("random", players), &roster, |b, roster| {
            let mut rng = StdRng::seed_from_u64(7);
            b.iter(|| {
                black_box(
                    assigner
                        .assign(roster.clone(), &partition, &AssignmentMode::Random, &mut rng)
                        .unwrap(),
                )
            })
        });
    }

    group.finish();
}

fn bench_rating(c: &mut Criterion) {
    let engine = TrueSkillEngine::new(TrueSkillSettings::default()).unwrap();
    let groups: Vec<Vec<PlayerRating>> = create_roster(16)
        .chunks(4)
        .map(|team| team.iter().map(|p| p.rating).collect())
        .collect();
    let ranks = resolve_ranks(4, &OutcomeSelection::new(Some(2), Some(3), [1, 4])).unwrap();
    let ordered = RankVector::from_placements(vec![0, 1, 2, 3], 4).unwrap();

    c.bench_function("trueskill_4x4_partial_draw", |b| {
        b.iter(|| black_box(engine.rate(black_box(&groups), &ranks).unwrap()))
    });
    c.bench_function("trueskill_4x4_strict_order", |b| {
        b.iter(|| black_box(engine.rate(black_box(&groups), &ordered).unwrap()))
    });
}

fn bench_full_session(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let roster = create_roster(16);

    c.bench_function("session_form_and_commit_16", |b| {
        b.iter(|| {
            rt.block_on(async {
                let manager = SessionManager::new(
                    Arc::new(InMemoryPlayerStore::new()),
                    Arc::new(TrueSkillEngine::new(TrueSkillSettings::default()).unwrap()),
                    Arc::new(NoopEventPublisher),
                    Arc::new(MetricsCollector::new().unwrap()),
                )
                .with_seed(11);

                let id = manager
                    .create_session(roster.clone(), None)
                    .await
                    .unwrap()
                    .session_id;
                manager.select_winner(id, Some(2)).await.unwrap();
                manager.select_loser(id, Some(3)).await.unwrap();
                manager.select_draws(id, vec![1, 4]).await.unwrap();
                black_box(manager.commit(id).await.unwrap())
            })
        })
    });
}

criterion_group!(
    benches,
    bench_partition,
    bench_resolve,
    bench_assignment,
    bench_rating,
    bench_full_session
);
criterion_main!(benches);
