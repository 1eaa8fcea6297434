//! End-to-end analysis pipeline: fetch, extract, score, narrate.
//!
//! One entry point, [`Analyzer::analyze`], wires the GitHub client, the
//! two-tier cache, the scorer, and the narrative engine. Cache failures are
//! absorbed (a broken cache degrades to refetching), narrative failures are
//! absorbed (fallback futures), and only username validation and GitHub
//! fetch failures surface as errors.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::{AnalysisCache, CacheKey};
use crate::config::{ConfigError, ScoringConfig};
use crate::github::{GitHubClient, GitHubError, RateLimitStatus, RawActivity};
use crate::metrics::{self, MetricsReport};
use crate::narrative::NarrativeEngine;
use crate::prompts::{fallback_futures, Futures};
use crate::scorer::{self, ScoreReport};

/// Cache endpoint tag for full analysis payloads. Bump the version to
/// invalidate entries when the cached shape changes.
pub const ANALYZE_ENDPOINT: &str = "analyze/v1";

const MAX_USERNAME_LEN: usize = 39;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error("invalid username: {0}")]
    InvalidUsername(String),

    #[error(transparent)]
    GitHub(#[from] GitHubError),
}

/// Complete result of analyzing one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub username: String,
    pub metrics: MetricsReport,
    pub score_report: ScoreReport,
    pub futures: Futures,
    /// Whether the futures came from the static fallback.
    pub is_fallback: bool,
    pub rate_limit: RateLimitStatus,
    /// Whether the raw activity was served from cache.
    #[serde(default)]
    pub from_cache: bool,
}

pub struct Analyzer<C: AnalysisCache> {
    github: GitHubClient,
    cache: C,
    narrative: Option<NarrativeEngine>,
    config: ScoringConfig,
}

impl<C: AnalysisCache> Analyzer<C> {
    pub fn new(
        github: GitHubClient,
        cache: C,
        narrative: Option<NarrativeEngine>,
        config: ScoringConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            github,
            cache,
            narrative,
            config,
        })
    }

    /// Run the full pipeline for one username.
    pub async fn analyze(&self, username: &str) -> Result<AnalysisResult, AnalyzeError> {
        let username = validate_username(username)?;
        let key = CacheKey::new(ANALYZE_ENDPOINT, &username, &[]);

        let (activity, from_cache) = match self.load_cached(&key).await {
            Some(activity) => (activity, true),
            None => {
                let activity = self.github.fetch_all(&username).await?;
                self.store_cached(&key, &activity).await;
                (activity, false)
            }
        };

        let metrics = metrics::extract(
            &activity.profile,
            &activity.repos,
            &activity.events,
            Utc::now(),
        );
        let score_report = scorer::score(&metrics, &self.config);

        let (futures, is_fallback) = match &self.narrative {
            Some(engine) => engine.generate(&score_report, &metrics).await,
            None => (fallback_futures(), true),
        };

        info!(
            username = %metrics.username,
            overall = score_report.overall,
            tendency = score_report.tendency.as_str(),
            from_cache,
            is_fallback,
            "analysis complete"
        );

        Ok(AnalysisResult {
            username: metrics.username.clone(),
            metrics,
            score_report,
            futures,
            is_fallback,
            rate_limit: activity.rate_limit,
            from_cache,
        })
    }

    async fn load_cached(&self, key: &CacheKey) -> Option<RawActivity> {
        let payload = match self.cache.get(key).await {
            Ok(hit) => hit?,
            Err(err) => {
                warn!(error = %err, "cache read failed, refetching");
                return None;
            }
        };
        match serde_json::from_value(payload) {
            Ok(activity) => Some(activity),
            Err(err) => {
                // Shape drift from an older build; treat as a miss.
                warn!(error = %err, "cached payload malformed, refetching");
                None
            }
        }
    }

    async fn store_cached(&self, key: &CacheKey, activity: &RawActivity) {
        let payload = match serde_json::to_value(activity) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "failed to serialize activity for cache");
                return;
            }
        };
        if let Err(err) = self.cache.put(key, &payload).await {
            warn!(error = %err, "cache write failed");
        }
    }
}

/// Validate and normalize a GitHub username.
///
/// Accepts 1-39 ASCII alphanumeric or hyphen characters, with no leading or
/// trailing hyphen. Surrounding whitespace is trimmed.
pub fn validate_username(raw: &str) -> Result<String, AnalyzeError> {
    let name = raw.trim();
    if name.is_empty() {
        return Err(AnalyzeError::InvalidUsername("empty username".to_string()));
    }
    if name.len() > MAX_USERNAME_LEN {
        return Err(AnalyzeError::InvalidUsername(format!(
            "username exceeds {MAX_USERNAME_LEN} characters"
        )));
    }
    if !name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-')
    {
        return Err(AnalyzeError::InvalidUsername(format!(
            "username contains invalid characters: {name:?}"
        )));
    }
    if name.starts_with('-') || name.ends_with('-') {
        return Err(AnalyzeError::InvalidUsername(
            "username cannot start or end with a hyphen".to_string(),
        ));
    }
    Ok(name.to_string())
}
