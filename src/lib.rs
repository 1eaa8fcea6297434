#![forbid(unsafe_code)]

//! git-legacy: score a GitHub profile and project three 2040 futures.
//!
//! Pipeline: fetch public activity from the GitHub REST API (cached in a
//! two-tier memory + disk cache), extract behavioral metrics, score six
//! dimensions into a weighted legacy score, classify the tendency, then
//! generate utopia/dystopia/unexpected narratives via an LLM provider with
//! a static fallback.
//!
//! Entry point for most callers is [`pipeline::Analyzer`].

pub mod cache;
pub mod config;
pub mod gateway;
pub mod github;
pub mod metrics;
pub mod narrative;
pub mod pipeline;
pub mod prompts;
pub mod report;
pub mod scorer;

pub use cache::{AnalysisCache, CacheKey, TieredCache};
pub use config::{CacheTtls, ScoreWeights, ScoringConfig, TendencyThresholds};
pub use github::{GitHubClient, GitHubError, RawActivity};
pub use metrics::MetricsReport;
pub use narrative::NarrativeEngine;
pub use pipeline::{AnalysisResult, AnalyzeError, Analyzer};
pub use prompts::{FutureNarrative, Futures};
pub use scorer::{ScoreReport, Tendency};
