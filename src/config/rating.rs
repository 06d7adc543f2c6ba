//! Rating engine configuration

use crate::error::{Result, ScrimError};
use crate::rating::{RatingEngine, TrueSkillEngine, TrueSkillSettings, WengLinEngine, WengLinSettings};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Which rating engine family to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    #[default]
    #[serde(rename = "trueskill", alias = "true_skill")]
    TrueSkill,
    WengLin,
}

impl std::str::FromStr for EngineKind {
    type Err = ScrimError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "trueskill" | "true_skill" => Ok(EngineKind::TrueSkill),
            "weng_lin" | "wenglin" | "openskill" => Ok(EngineKind::WengLin),
            other => Err(ScrimError::ConfigurationError {
                message: format!("Unknown rating engine: {}", other),
            }),
        }
    }
}

/// Rating configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingConfig {
    pub engine: EngineKind,
    pub trueskill: TrueSkillSettings,
    pub weng_lin: WengLinSettings,
}

impl RatingConfig {
    pub fn validate(&self) -> Result<()> {
        match self.engine {
            EngineKind::TrueSkill => self.trueskill.validate(),
            EngineKind::WengLin => self.weng_lin.validate(),
        }
    }

    /// Build the configured engine
    pub fn build_engine(&self) -> Result<Arc<dyn RatingEngine>> {
        let engine: Arc<dyn RatingEngine> = match self.engine {
            EngineKind::TrueSkill => Arc::new(TrueSkillEngine::new(self.trueskill.clone())?),
            EngineKind::WengLin => Arc::new(WengLinEngine::new(self.weng_lin.clone())?),
        };
        Ok(engine)
    }
}
