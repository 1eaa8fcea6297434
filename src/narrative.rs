//! Narrative engine: turns a score report into three 2040 futures.
//!
//! One JSON-mode chat call per score report, memoized in-process by a hash
//! of the report. A malformed response gets one retry; any provider failure
//! or second parse failure falls back to static narratives. Generation never
//! fails the analysis.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Mutex;

use tracing::{info, warn};

use crate::cache::hash_fields;
use crate::gateway::{ChatGateway, ChatRequest, NoopUsageSink, ProviderError, ProviderGateway};
use crate::metrics::MetricsReport;
use crate::prompts::{fallback_futures, render_narrative_prompt, Futures};
use crate::scorer::ScoreReport;

pub const DEFAULT_MODEL: &str = "gpt-4o-mini";
const MAX_TOKENS: u32 = 1200;
const TEMPERATURE: f32 = 0.85;
const CALLER: &str = "narrative";

pub struct NarrativeEngine {
    gateway: Arc<dyn ChatGateway>,
    model: String,
    memo: Mutex<HashMap<String, Futures>>,
}

impl NarrativeEngine {
    pub fn new(gateway: Arc<dyn ChatGateway>, model: impl Into<String>) -> Self {
        Self {
            gateway,
            model: model.into(),
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// Build from environment: `OPENAI_API_KEY` (required), `OPENAI_MODEL`.
    pub fn from_env() -> Result<Self, ProviderError> {
        let gateway = ProviderGateway::from_env(Arc::new(NoopUsageSink))?;
        let model = std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Ok(Self::new(Arc::new(gateway), model))
    }

    fn memo_key(score: &ScoreReport) -> String {
        let payload = serde_json::to_string(score).unwrap_or_default();
        hash_fields(&[&payload])
    }

    /// Generate the three futures for a scored profile.
    ///
    /// Returns the futures plus a flag marking whether the static fallback
    /// was used. This method does not return errors: provider failures are
    /// absorbed into the fallback.
    pub async fn generate(&self, score: &ScoreReport, metrics: &MetricsReport) -> (Futures, bool) {
        let key = Self::memo_key(score);
        if let Ok(memo) = self.memo.lock() {
            if let Some(hit) = memo.get(&key) {
                info!("narrative memo hit");
                return (hit.clone(), false);
            }
        }

        let prompt = render_narrative_prompt(score, metrics);

        for attempt in 0..2 {
            let request = ChatRequest::new(&self.model, prompt.to_messages(), CALLER)
                .temperature(TEMPERATURE)
                .max_tokens(MAX_TOKENS)
                .json();

            let response = match self.gateway.chat(request).await {
                Ok(resp) => resp,
                Err(err) => {
                    warn!(error = %err, "narrative provider call failed, using fallback");
                    return (fallback_futures(), true);
                }
            };

            match parse_futures(&response.content) {
                Ok(futures) => {
                    if let Ok(mut memo) = self.memo.lock() {
                        memo.insert(key, futures.clone());
                    }
                    return (futures, false);
                }
                Err(err) => {
                    warn!(attempt, error = %err, "narrative response parse failed");
                }
            }
        }

        warn!("narrative parse failed twice, using fallback");
        (fallback_futures(), true)
    }
}

fn parse_futures(content: &str) -> Result<Futures, String> {
    let futures: Futures =
        serde_json::from_str(content).map_err(|e| format!("invalid futures JSON: {e}"))?;
    if !futures.is_complete() {
        return Err("futures response has empty title or narrative".to_string());
    }
    Ok(futures)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_well_formed_futures() {
        let json = r#"{
            "utopia": {"title": "A", "narrative": "story a"},
            "dystopia": {"title": "B", "narrative": "story b"},
            "unexpected": {"title": "C", "narrative": "story c"}
        }"#;
        let futures = parse_futures(json).unwrap();
        assert_eq!(futures.utopia.title, "A");
    }

    #[test]
    fn parse_rejects_missing_key() {
        let json = r#"{"utopia": {"title": "A", "narrative": "story"}}"#;
        assert!(parse_futures(json).is_err());
    }

    #[test]
    fn parse_rejects_blank_narrative() {
        let json = r#"{
            "utopia": {"title": "A", "narrative": ""},
            "dystopia": {"title": "B", "narrative": "story b"},
            "unexpected": {"title": "C", "narrative": "story c"}
        }"#;
        assert!(parse_futures(json).is_err());
    }

    #[test]
    fn memo_key_is_deterministic() {
        let score = crate::scorer::score(
            &MetricsReport::default(),
            &crate::config::ScoringConfig::default(),
        );
        assert_eq!(
            NarrativeEngine::memo_key(&score),
            NarrativeEngine::memo_key(&score)
        );
    }
}
