//! Deterministic scoring of behavioral metrics across six dimensions.
//!
//! Every formula is a transparent weighted blend of log-scaled counts, with
//! no hidden state. Each dimension clamps to [0,100] and is monotonic in
//! its intended direction (more stars never lowers Depth). The composite is
//! the weighted sum of the six dimensions and nothing else.
//!
//! The scale constants below are heuristic calibration points ("50 commits
//! in 90 days saturates commit frequency"), not derived from data.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::{ScoreWeights, ScoringConfig, TendencyThresholds};
use crate::metrics::MetricsReport;

// Count that maps to ~100 on the log scale, per signal.
const COMMITS_90D_SCALE: f64 = 50.0;
const STREAK_SCALE: f64 = 30.0;
const ACCOUNT_AGE_YEARS_SCALE: f64 = 5.0;
const PR_SCALE: f64 = 20.0;
const ISSUE_SCALE: f64 = 30.0;
const FORK_EVENT_SCALE: f64 = 10.0;
const FOLLOWER_SCALE: f64 = 100.0;
const STAR_SCALE: f64 = 200.0;
const FORKS_RECEIVED_SCALE: f64 = 50.0;
const REPO_AGE_MONTHS_SCALE: f64 = 24.0;
const ORIGINAL_REPO_SCALE: f64 = 30.0;
const LANGUAGE_SCALE: f64 = 10.0;
const EVENT_DIVERSITY_SCALE: f64 = 8.0;
const REPO_BREADTH_SCALE: f64 = 50.0;
const RECENT_EVENTS_SCALE: f64 = 60.0;

/// Classification of the composite score into one of three bands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tendency {
    Utopia,
    Dystopia,
    Unexpected,
}

impl Tendency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tendency::Utopia => "Utopia",
            Tendency::Dystopia => "Dystopia",
            Tendency::Unexpected => "Unexpected",
        }
    }
}

impl fmt::Display for Tendency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The six dimension scores, each in [0,100].
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DimensionScores {
    pub consistency: f64,
    pub collaboration: f64,
    pub depth: f64,
    pub breadth: f64,
    pub momentum: f64,
    pub openness: f64,
}

/// Full scoring output for one analysis run.
///
/// The weights ride along for display; `overall` is always their weighted
/// sum over `dimensions`, never independently settable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreReport {
    pub dimensions: DimensionScores,
    pub overall: f64,
    pub tendency: Tendency,
    pub weights: ScoreWeights,
}

/// Compute a score report from behavioral metrics. Pure and deterministic.
pub fn score(metrics: &MetricsReport, config: &ScoringConfig) -> ScoreReport {
    let dimensions = DimensionScores {
        consistency: score_consistency(metrics),
        collaboration: score_collaboration(metrics),
        depth: score_depth(metrics),
        breadth: score_breadth(metrics),
        momentum: score_momentum(metrics),
        openness: score_openness(metrics),
    };

    let overall = clamp(weighted_sum(&dimensions, &config.weights));
    let tendency = classify(overall, &config.thresholds);

    info!(overall, tendency = tendency.as_str(), "score report computed");

    ScoreReport {
        dimensions,
        overall,
        tendency,
        weights: config.weights,
    }
}

fn weighted_sum(d: &DimensionScores, w: &ScoreWeights) -> f64 {
    d.consistency * w.consistency
        + d.collaboration * w.collaboration
        + d.depth * w.depth
        + d.breadth * w.breadth
        + d.momentum * w.momentum
        + d.openness * w.openness
}

/// overall >= utopia is Utopia, overall <= dystopia is Dystopia, the open
/// interval between is Unexpected.
pub fn classify(overall: f64, thresholds: &TendencyThresholds) -> Tendency {
    if overall >= thresholds.utopia {
        Tendency::Utopia
    } else if overall <= thresholds.dystopia {
        Tendency::Dystopia
    } else {
        Tendency::Unexpected
    }
}

/// How regularly does this developer commit?
fn score_consistency(m: &MetricsReport) -> f64 {
    let active_ratio = clamp(m.active_days_90d as f64 / 90.0 * 100.0);
    let streak_score = log_scale(m.longest_streak_days as f64, STREAK_SCALE);
    let commit_score = log_scale(m.commit_count_90d as f64, COMMITS_90D_SCALE);
    // Small bonus for long-lived accounts that are still active.
    let longevity_bonus = clamp(
        log_scale(m.account_age_days / 365.0, ACCOUNT_AGE_YEARS_SCALE) * 0.2,
    );

    clamp(active_ratio * 0.35 + streak_score * 0.2 + commit_score * 0.35 + longevity_bonus * 0.1)
}

/// How much does this developer engage with others?
fn score_collaboration(m: &MetricsReport) -> f64 {
    let pr_score = log_scale(m.pr_events as f64, PR_SCALE);
    let issue_score = log_scale(m.issue_events as f64, ISSUE_SCALE);
    let fork_score = log_scale(m.fork_events as f64, FORK_EVENT_SCALE);
    let follower_score = log_scale(m.followers as f64, FOLLOWER_SCALE);

    clamp(pr_score * 0.40 + issue_score * 0.30 + fork_score * 0.15 + follower_score * 0.15)
}

/// How mature and impactful is this developer's work?
fn score_depth(m: &MetricsReport) -> f64 {
    let star_score = log_scale(m.total_stars as f64, STAR_SCALE);
    let fork_score = log_scale(m.total_forks_received as f64, FORKS_RECEIVED_SCALE);
    let age_score = log_scale(m.avg_repo_age_days / 30.0, REPO_AGE_MONTHS_SCALE);
    let repo_score = log_scale(m.original_repo_count as f64, ORIGINAL_REPO_SCALE);

    clamp(star_score * 0.35 + fork_score * 0.25 + age_score * 0.20 + repo_score * 0.20)
}

/// How diverse is this developer's technical range?
fn score_breadth(m: &MetricsReport) -> f64 {
    let lang_score = log_scale(m.language_count as f64, LANGUAGE_SCALE);
    let diversity_score = log_scale(m.event_type_diversity as f64, EVENT_DIVERSITY_SCALE);
    let repo_breadth = log_scale(m.total_repos as f64, REPO_BREADTH_SCALE);

    clamp(lang_score * 0.50 + diversity_score * 0.30 + repo_breadth * 0.20)
}

/// Is this developer accelerating or decelerating?
fn score_momentum(m: &MetricsReport) -> f64 {
    // ratio > 1 means accelerating; saturate at 3x.
    let ratio_score = clamp(m.momentum_ratio.min(3.0) / 3.0 * 100.0);
    let recent_activity = log_scale(m.events_last_30d as f64, RECENT_EVENTS_SCALE);

    clamp(ratio_score * 0.60 + recent_activity * 0.40)
}

/// How open and transparent is this developer's work?
fn score_openness(m: &MetricsReport) -> f64 {
    let license_score = m.has_license_ratio * 100.0;
    // Forking others' work is engagement with the community, worth up to 50.
    let fork_openness = m.forked_ratio * 50.0;
    let profile_score =
        if m.has_blog { 25.0 } else { 0.0 } + if m.has_bio { 25.0 } else { 0.0 };

    clamp(license_score * 0.40 + fork_openness * 0.30 + profile_score * 0.30)
}

pub(crate) fn clamp(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Map a raw count to [0,100] on a saturating log curve; `scale` is the
/// count that maps to ~100.
fn log_scale(value: f64, scale: f64) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }
    clamp((1.0 + value).ln() / (1.0 + scale).ln() * 100.0)
}
