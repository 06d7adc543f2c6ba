//! Metrics for team formation and result recording

pub mod collector;

pub use collector::{
    MetricsCollector, MetricsTimer, OutcomeMetrics, PerformanceMetrics, SessionMetrics,
};
