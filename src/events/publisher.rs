//! Event publisher seam for session events

use crate::error::{Result, ScrimError};
use crate::types::{ResultsRecorded, ScrimEvent, TeamsFormed};
use async_trait::async_trait;
use tracing::{debug, info};

/// Trait for publishing session events
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a TeamsFormed event
    async fn publish_teams_formed(&self, event: TeamsFormed) -> Result<()>;

    /// Publish a ResultsRecorded event
    async fn publish_results_recorded(&self, event: ResultsRecorded) -> Result<()>;
}

/// Publisher that logs each event as a structured tracing record
#[derive(Debug, Default)]
pub struct TracingEventPublisher {
    /// Also emit the full JSON payload at debug level
    include_payload: bool,
}

impl TracingEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(mut self, include_payload: bool) -> Self {
        self.include_payload = include_payload;
        self
    }

    fn log_payload(&self, event: &ScrimEvent) -> Result<()> {
        if !self.include_payload {
            return Ok(());
        }

        let payload = serde_json::to_string(event).map_err(|e| ScrimError::InternalError {
            message: format!("Failed to serialize event: {}", e),
        })?;
        debug!("Event payload: {}", payload);
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish_teams_formed(&self, event: TeamsFormed) -> Result<()> {
        let sizes: Vec<usize> = event.teams.iter().map(|t| t.players.len()).collect();
        info!(
            session_id = %event.session_id,
            game_id = %event.game_id,
            "Teams formed with sizes {:?}",
            sizes
        );
        self.log_payload(&ScrimEvent::TeamsFormed(event))
    }

    async fn publish_results_recorded(&self, event: ResultsRecorded) -> Result<()> {
        info!(
            session_id = %event.session_id,
            game_id = %event.game_id,
            "Results recorded with ranks {:?} ({} rating changes)",
            event.ranks.ranks(),
            event.rating_changes.len()
        );
        self.log_payload(&ScrimEvent::ResultsRecorded(event))
    }
}

/// Publisher that drops every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEventPublisher;

#[async_trait]
impl EventPublisher for NoopEventPublisher {
    async fn publish_teams_formed(&self, _event: TeamsFormed) -> Result<()> {
        Ok(())
    }

    async fn publish_results_recorded(&self, _event: ResultsRecorded) -> Result<()> {
        Ok(())
    }
}
