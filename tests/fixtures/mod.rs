//! Test fixtures and mock implementations for integration testing
#![allow(dead_code)]

use async_trait::async_trait;
use scrimmage::error::{Result, ScrimError};
use scrimmage::events::EventPublisher;
use scrimmage::metrics::MetricsCollector;
use scrimmage::rating::{InMemoryPlayerStore, RatingEngine, TrueSkillEngine, TrueSkillSettings};
use scrimmage::session::SessionManager;
use scrimmage::types::{
    Player, PlayerRating, RankVector, RatingGroup, ResultsRecorded, ScrimEvent, TeamOutcome,
    TeamsFormed,
};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, Mutex};

/// Mock event publisher that captures published events for testing
#[derive(Debug, Default)]
pub struct MockEventPublisher {
    published_events: Mutex<Vec<ScrimEvent>>,
}

impl MockEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all published events (for testing)
    pub fn get_published_events(&self) -> Vec<ScrimEvent> {
        self.published_events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn results_recorded(&self) -> Vec<ResultsRecorded> {
        self.get_published_events()
            .into_iter()
            .filter_map(|event| match event {
                ScrimEvent::ResultsRecorded(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    /// Count events of specific type
    pub fn count_events_of_type(&self, event_type: &str) -> usize {
        self.get_published_events()
            .iter()
            .filter(|event| match event {
                ScrimEvent::TeamsFormed(_) => event_type == "TeamsFormed",
                ScrimEvent::ResultsRecorded(_) => event_type == "ResultsRecorded",
            })
            .count()
    }
}

#[async_trait]
impl EventPublisher for MockEventPublisher {
    async fn publish_teams_formed(&self, event: TeamsFormed) -> Result<()> {
        if let Ok(mut events) = self.published_events.lock() {
            events.push(ScrimEvent::TeamsFormed(event));
        }
        Ok(())
    }

    async fn publish_results_recorded(&self, event: ResultsRecorded) -> Result<()> {
        if let Ok(mut events) = self.published_events.lock() {
            events.push(ScrimEvent::ResultsRecorded(event));
        }
        Ok(())
    }
}

/// Engine that always fails, counting how often it was asked
#[derive(Debug, Default)]
pub struct FailingEngine {
    calls: AtomicUsize,
}

impl FailingEngine {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RatingEngine for FailingEngine {
    fn rate(&self, _groups: &[RatingGroup], _ranks: &RankVector) -> Result<Vec<RatingGroup>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ScrimError::RatingEngineFailed {
            reason: "rating backend unavailable".to_string(),
        }
        .into())
    }

    fn rate_against_baseline(
        &self,
        rating: PlayerRating,
        _outcome: TeamOutcome,
    ) -> Result<PlayerRating> {
        Ok(rating)
    }

    fn initial_rating(&self) -> PlayerRating {
        PlayerRating::default()
    }

    fn name(&self) -> &'static str {
        "failing"
    }

    fn config(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

/// Rendezvous points for holding a commit inside the rating engine
#[derive(Debug)]
pub struct CommitGate {
    armed: AtomicBool,
    entered: Barrier,
    release: Barrier,
}

impl CommitGate {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            armed: AtomicBool::new(true),
            entered: Barrier::new(2),
            release: Barrier::new(2),
        })
    }

    /// Block until a commit is parked inside the engine
    pub fn wait_entered(&self) {
        self.entered.wait();
    }

    /// Let the parked commit continue
    pub fn release(&self) {
        self.release.wait();
    }
}

/// TrueSkill engine that parks its first call on a [`CommitGate`]
pub struct GatedEngine {
    inner: TrueSkillEngine,
    gate: Arc<CommitGate>,
}

impl GatedEngine {
    pub fn new(gate: Arc<CommitGate>) -> Self {
        Self {
            inner: TrueSkillEngine::new(TrueSkillSettings::default())
                .expect("default settings are valid"),
            gate,
        }
    }
}

impl RatingEngine for GatedEngine {
    fn rate(&self, groups: &[RatingGroup], ranks: &RankVector) -> Result<Vec<RatingGroup>> {
        if self.gate.armed.swap(false, Ordering::SeqCst) {
            self.gate.entered.wait();
            self.gate.release.wait();
        }
        self.inner.rate(groups, ranks)
    }

    fn rate_against_baseline(
        &self,
        rating: PlayerRating,
        outcome: TeamOutcome,
    ) -> Result<PlayerRating> {
        self.inner.rate_against_baseline(rating, outcome)
    }

    fn initial_rating(&self) -> PlayerRating {
        self.inner.initial_rating()
    }

    fn name(&self) -> &'static str {
        "gated"
    }

    fn config(&self) -> serde_json::Value {
        self.inner.config()
    }
}

/// Players with spread-out ratings: p0 is the strongest
pub fn create_roster(count: usize) -> Vec<Player> {
    (0..count)
        .map(|i| {
            Player::new(
                format!("p{}", i),
                format!("player_{}", i),
                PlayerRating::new(35.0 - i as f64, 4.0 + (i % 3) as f64),
            )
        })
        .collect()
}

/// Roster where every third player is tagged with `region`
pub fn create_regional_roster(count: usize, region: &str) -> Vec<Player> {
    create_roster(count)
        .into_iter()
        .enumerate()
        .map(|(i, p)| if i % 3 == 0 { p.with_region(region) } else { p.with_region("other") })
        .collect()
}

/// A complete system wired to an in-memory store and capturing publisher
pub struct TestSystem {
    pub manager: SessionManager,
    pub store: Arc<InMemoryPlayerStore>,
    pub publisher: Arc<MockEventPublisher>,
    pub metrics: Arc<MetricsCollector>,
}

pub fn create_test_system_with(engine: Arc<dyn RatingEngine>) -> TestSystem {
    let store = Arc::new(InMemoryPlayerStore::new());
    let publisher = Arc::new(MockEventPublisher::new());
    let metrics = Arc::new(MetricsCollector::new().expect("metrics registry"));
    let manager = SessionManager::new(store.clone(), engine, publisher.clone(), metrics.clone())
        .with_seed(42);

    TestSystem {
        manager,
        store,
        publisher,
        metrics,
    }
}

pub fn create_test_system() -> TestSystem {
    create_test_system_with(Arc::new(
        TrueSkillEngine::new(TrueSkillSettings::default()).expect("default settings are valid"),
    ))
}
