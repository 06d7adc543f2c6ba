//! Metrics collection using Prometheus
//!
//! Counters and histograms for team formation, outcome validation and
//! rating commits.

use anyhow::Result;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Main metrics collector
#[derive(Clone)]
pub struct MetricsCollector {
    /// Prometheus registry
    registry: Arc<Registry>,

    session_metrics: SessionMetrics,

    outcome_metrics: OutcomeMetrics,

    performance_metrics: PerformanceMetrics,
}

/// Session lifecycle metrics
#[derive(Clone)]
pub struct SessionMetrics {
    /// Sessions currently open
    pub active_sessions: IntGauge,

    /// Teams formed, by assignment mode
    pub teams_formed_total: IntCounterVec,

    /// Players placed onto teams
    pub players_assigned_total: IntCounter,

    /// Sessions ended
    pub sessions_ended_total: IntCounter,
}

/// Outcome and rating metrics
#[derive(Clone)]
pub struct OutcomeMetrics {
    /// Committed results, by rating engine
    pub results_recorded_total: IntCounterVec,

    /// Rejected selections, by validation rule
    pub validation_failures_total: IntCounterVec,

    /// Commits refused because of session state
    pub commit_conflicts_total: IntCounterVec,
}

/// Performance metrics
#[derive(Clone)]
pub struct PerformanceMetrics {
    /// End-to-end commit time
    pub commit_duration: Histogram,

    /// Time spent filling team slots
    pub assignment_duration: Histogram,

    /// Time spent inside the rating engine
    pub rating_calculation_duration: Histogram,
}

impl MetricsCollector {
    /// Create a new metrics collector with default registry
    pub fn new() -> Result<Self> {
        let registry = Arc::new(Registry::new());
        Self::with_registry(registry)
    }

    /// Create a new metrics collector with custom registry
    pub fn with_registry(registry: Arc<Registry>) -> Result<Self> {
        let session_metrics = SessionMetrics::new(&registry)?;
        let outcome_metrics = OutcomeMetrics::new(&registry)?;
        let performance_metrics = PerformanceMetrics::new(&registry)?;

        Ok(Self {
            registry,
            session_metrics,
            outcome_metrics,
            performance_metrics,
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn session(&self) -> &SessionMetrics {
        &self.session_metrics
    }

    pub fn outcome(&self) -> &OutcomeMetrics {
        &self.outcome_metrics
    }

    pub fn performance(&self) -> &PerformanceMetrics {
        &self.performance_metrics
    }

    /// Record a session whose teams were just formed
    pub fn record_teams_formed(&self, mode: &str, player_count: usize, duration: Duration) {
        self.session_metrics
            .teams_formed_total
            .with_label_values(&[mode])
            .inc();
        self.session_metrics
            .players_assigned_total
            .inc_by(player_count as u64);
        self.session_metrics.active_sessions.inc();
        self.performance_metrics
            .assignment_duration
            .observe(duration.as_secs_f64());
    }

    pub fn record_session_ended(&self) {
        self.session_metrics.active_sessions.dec();
        self.session_metrics.sessions_ended_total.inc();
    }

    pub fn record_validation_failure(&self, kind: &str) {
        self.outcome_metrics
            .validation_failures_total
            .with_label_values(&[kind])
            .inc();
    }

    pub fn record_commit_conflict(&self, reason: &str) {
        self.outcome_metrics
            .commit_conflicts_total
            .with_label_values(&[reason])
            .inc();
    }

    /// Record a successful commit
    pub fn record_results(&self, engine: &str, rating_duration: Duration, total: Duration) {
        self.outcome_metrics
            .results_recorded_total
            .with_label_values(&[engine])
            .inc();
        self.performance_metrics
            .rating_calculation_duration
            .observe(rating_duration.as_secs_f64());
        self.performance_metrics
            .commit_duration
            .observe(total.as_secs_f64());
    }

    /// Render every registered metric in the Prometheus text format
    pub fn encode_text(&self) -> Result<String> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }

    /// Create a timer for measuring operation duration
    pub fn start_timer(&self) -> MetricsTimer {
        MetricsTimer::new()
    }
}

/// Timer for measuring operation durations
pub struct MetricsTimer {
    start: Instant,
}

impl MetricsTimer {
    fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Get the elapsed duration
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Stop the timer and return the duration
    pub fn stop(self) -> Duration {
        self.elapsed()
    }
}

impl SessionMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let active_sessions = IntGauge::new("scrimmage_active_sessions", "Sessions currently open")?;
        registry.register(Box::new(active_sessions.clone()))?;

        let teams_formed_total = IntCounterVec::new(
            Opts::new("scrimmage_teams_formed_total", "Total team formations"),
            &["mode"],
        )?;
        registry.register(Box::new(teams_formed_total.clone()))?;

        let players_assigned_total = IntCounter::new(
            "scrimmage_players_assigned_total",
            "Total players placed onto teams",
        )?;
        registry.register(Box::new(players_assigned_total.clone()))?;

        let sessions_ended_total =
            IntCounter::new("scrimmage_sessions_ended_total", "Total sessions ended")?;
        registry.register(Box::new(sessions_ended_total.clone()))?;

        Ok(Self {
            active_sessions,
            teams_formed_total,
            players_assigned_total,
            sessions_ended_total,
        })
    }
}

impl OutcomeMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let results_recorded_total = IntCounterVec::new(
            Opts::new(
                "scrimmage_results_recorded_total",
                "Total committed match results",
            ),
            &["engine"],
        )?;
        registry.register(Box::new(results_recorded_total.clone()))?;

        let validation_failures_total = IntCounterVec::new(
            Opts::new(
                "scrimmage_validation_failures_total",
                "Rejected outcome selections",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(validation_failures_total.clone()))?;

        let commit_conflicts_total = IntCounterVec::new(
            Opts::new(
                "scrimmage_commit_conflicts_total",
                "Commits refused because of session state",
            ),
            &["reason"],
        )?;
        registry.register(Box::new(commit_conflicts_total.clone()))?;

        Ok(Self {
            results_recorded_total,
            validation_failures_total,
            commit_conflicts_total,
        })
    }
}

impl PerformanceMetrics {
    fn new(registry: &Registry) -> Result<Self> {
        let commit_duration = Histogram::with_opts(
            HistogramOpts::new(
                "scrimmage_commit_duration_seconds",
                "Time to validate, rate and persist a result",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(commit_duration.clone()))?;

        let assignment_duration = Histogram::with_opts(
            HistogramOpts::new(
                "scrimmage_assignment_duration_seconds",
                "Time to fill team slots",
            )
            .buckets(vec![0.0001, 0.001, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        )?;
        registry.register(Box::new(assignment_duration.clone()))?;

        let rating_calculation_duration = Histogram::with_opts(HistogramOpts::new(
            "scrimmage_rating_calculation_duration_seconds",
            "Rating engine time per commit",
        ))?;
        registry.register(Box::new(rating_calculation_duration.clone()))?;

        Ok(Self {
            commit_duration,
            assignment_duration,
            rating_calculation_duration,
        })
    }
}
