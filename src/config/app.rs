//! Main application configuration
//!
//! Defaults, environment variable overrides, optional TOML file loading, and
//! validation for the scrimmage engine.

use crate::config::rating::RatingConfig;
use crate::teams::{AssignmentConfig, AssignmentMode};
use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub teams: TeamSettings,
    pub rating: RatingConfig,
    pub balancing: AssignmentConfig,
}

/// Service-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging and metrics
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

/// Team formation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TeamSettings {
    /// Roster cap; extra players are dropped when a session is created
    pub max_players: usize,
    /// Assignment mode used when the caller does not pick one
    pub default_mode: AssignmentMode,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "scrimmage".to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for TeamSettings {
    fn default() -> Self {
        Self {
            max_players: 20,
            default_mode: AssignmentMode::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load a TOML file, then apply environment overrides on top
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let mut config: AppConfig = toml::from_str(&raw)
            .with_context(|| format!("Invalid config file {}", path.display()))?;

        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Team settings
        if let Ok(max_players) = env::var("MAX_PLAYERS") {
            self.teams.max_players = max_players
                .parse()
                .map_err(|_| anyhow!("Invalid MAX_PLAYERS value: {}", max_players))?;
        }
        if let Ok(attempts) = env::var("BALANCE_MAX_ATTEMPTS") {
            self.balancing.max_attempts = attempts
                .parse()
                .map_err(|_| anyhow!("Invalid BALANCE_MAX_ATTEMPTS value: {}", attempts))?;
        }
        if let Ok(iterations) = env::var("BALANCE_MAX_LOCAL_ITERATIONS") {
            self.balancing.max_local_iterations = iterations.parse().map_err(|_| {
                anyhow!("Invalid BALANCE_MAX_LOCAL_ITERATIONS value: {}", iterations)
            })?;
        }

        // Rating settings
        if let Ok(engine) = env::var("RATING_ENGINE") {
            self.rating.engine = engine
                .parse()
                .map_err(|_| anyhow!("Invalid RATING_ENGINE value: {}", engine))?;
        }
        if let Ok(mu) = env::var("TRUESKILL_MU") {
            self.rating.trueskill.mu = mu
                .parse()
                .map_err(|_| anyhow!("Invalid TRUESKILL_MU value: {}", mu))?;
        }
        if let Ok(sigma) = env::var("TRUESKILL_SIGMA") {
            self.rating.trueskill.sigma = sigma
                .parse()
                .map_err(|_| anyhow!("Invalid TRUESKILL_SIGMA value: {}", sigma))?;
        }
        if let Ok(beta) = env::var("TRUESKILL_BETA") {
            self.rating.trueskill.beta = beta
                .parse()
                .map_err(|_| anyhow!("Invalid TRUESKILL_BETA value: {}", beta))?;
        }
        if let Ok(tau) = env::var("TRUESKILL_TAU") {
            self.rating.trueskill.tau = tau
                .parse()
                .map_err(|_| anyhow!("Invalid TRUESKILL_TAU value: {}", tau))?;
        }
        if let Ok(draw) = env::var("TRUESKILL_DRAW_PROBABILITY") {
            self.rating.trueskill.draw_probability = draw
                .parse()
                .map_err(|_| anyhow!("Invalid TRUESKILL_DRAW_PROBABILITY value: {}", draw))?;
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    // Validate log level
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => return Err(anyhow!("Invalid log level: {}", config.service.log_level)),
    }

    if config.service.name.is_empty() {
        return Err(anyhow!("Service name cannot be empty"));
    }

    // Validate team settings
    if config.teams.max_players < 2 {
        return Err(anyhow!(
            "Max players must be at least 2, got {}",
            config.teams.max_players
        ));
    }
    if config.balancing.max_attempts == 0 {
        return Err(anyhow!("Balancing max attempts must be greater than 0"));
    }

    // Validate rating settings
    config.rating.validate()?;

    Ok(())
}
