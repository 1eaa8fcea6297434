//! Central configuration: scoring weights, tendency thresholds, cache TTLs.
//!
//! Invariants (weights sum to 1.0, thresholds partition [0,100] into three
//! bands) are checked here at load time, never discovered mid-scoring.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("score weights sum to {sum}, expected 1.0")]
    WeightSum { sum: f64 },

    #[error("tendency thresholds must satisfy 0 < dystopia < utopia < 100, got dystopia={dystopia} utopia={utopia}")]
    Thresholds { utopia: f64, dystopia: f64 },
}

/// Per-dimension weights for the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub consistency: f64,
    pub collaboration: f64,
    pub depth: f64,
    pub breadth: f64,
    pub momentum: f64,
    pub openness: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            consistency: 0.20,
            collaboration: 0.20,
            depth: 0.20,
            breadth: 0.15,
            momentum: 0.15,
            openness: 0.10,
        }
    }
}

impl ScoreWeights {
    pub fn sum(&self) -> f64 {
        self.consistency
            + self.collaboration
            + self.depth
            + self.breadth
            + self.momentum
            + self.openness
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let sum = self.sum();
        if (sum - 1.0).abs() > 1e-9 {
            return Err(ConfigError::WeightSum { sum });
        }
        Ok(())
    }
}

/// Composite-score cutoffs for the three tendency bands.
///
/// overall >= utopia is Utopia, overall <= dystopia is Dystopia, everything
/// between is Unexpected.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TendencyThresholds {
    pub utopia: f64,
    pub dystopia: f64,
}

impl Default for TendencyThresholds {
    fn default() -> Self {
        Self {
            utopia: 70.0,
            dystopia: 40.0,
        }
    }
}

impl TendencyThresholds {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.dystopia > 0.0 && self.dystopia < self.utopia && self.utopia < 100.0) {
            return Err(ConfigError::Thresholds {
                utopia: self.utopia,
                dystopia: self.dystopia,
            });
        }
        Ok(())
    }
}

/// Freshness windows for the two cache tiers.
#[derive(Debug, Clone, Copy)]
pub struct CacheTtls {
    /// In-memory tier, cleared on process exit anyway.
    pub memory: Duration,
    /// On-disk tier, survives restarts.
    pub disk: Duration,
}

impl Default for CacheTtls {
    fn default() -> Self {
        Self {
            memory: Duration::from_secs(3_600),
            disk: Duration::from_secs(86_400),
        }
    }
}

/// Everything the scorer needs. Validated once via [`ScoringConfig::validate`]
/// before any analysis runs.
#[derive(Debug, Clone, Default)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,
    pub thresholds: TendencyThresholds,
}

impl ScoringConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        self.thresholds.validate()?;
        Ok(())
    }
}
