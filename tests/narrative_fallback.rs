use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use git_legacy::config::ScoringConfig;
use git_legacy::gateway::openai::OpenAiAdapter;
use git_legacy::gateway::{GatewayConfig, NoopUsageSink, ProviderGateway};
use git_legacy::metrics::MetricsReport;
use git_legacy::narrative::{NarrativeEngine, DEFAULT_MODEL};
use git_legacy::scorer;

fn engine(server: &MockServer) -> NarrativeEngine {
    let adapter =
        OpenAiAdapter::with_config("sk-test", server.uri(), Duration::from_secs(5)).unwrap();
    let gateway = ProviderGateway::with_config(
        adapter,
        Arc::new(NoopUsageSink),
        GatewayConfig {
            max_retries: 0,
            retry_base_delay: Duration::ZERO,
        },
    );
    NarrativeEngine::new(Arc::new(gateway), DEFAULT_MODEL)
}

fn sample_inputs() -> (git_legacy::ScoreReport, MetricsReport) {
    let metrics = MetricsReport {
        username: "octocat".to_string(),
        account_age_years: 3.0,
        top_languages: "Rust".to_string(),
        most_active_period: "Last 30 days (currently active)".to_string(),
        commit_count_90d: 120,
        active_days_90d: 40,
        ..Default::default()
    };
    let score = scorer::score(&metrics, &ScoringConfig::default());
    (score, metrics)
}

fn futures_payload() -> serde_json::Value {
    json!({
        "utopia": {"title": "The Long Game", "narrative": "A story of compounding."},
        "dystopia": {"title": "The Quiet Fade", "narrative": "A cautionary tale."},
        "unexpected": {"title": "The Side Quest", "narrative": "A surprising turn."}
    })
}

fn chat_response(content: String) -> serde_json::Value {
    json!({
        "choices": [{
            "message": {"content": content},
            "finish_reason": "stop"
        }],
        "usage": {"prompt_tokens": 400, "completion_tokens": 500}
    })
}

#[tokio::test]
async fn valid_response_parses_into_futures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_response(futures_payload().to_string())),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (score, metrics) = sample_inputs();
    let (futures, is_fallback) = engine(&server).generate(&score, &metrics).await;

    assert!(!is_fallback);
    assert_eq!(futures.utopia.title, "The Long Game");
    assert_eq!(futures.unexpected.narrative, "A surprising turn.");
}

#[tokio::test]
async fn malformed_json_twice_falls_back_after_retry() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_response("not json at all".to_string())),
        )
        .expect(2)
        .mount(&server)
        .await;

    let (score, metrics) = sample_inputs();
    let (futures, is_fallback) = engine(&server).generate(&score, &metrics).await;

    assert!(is_fallback);
    assert!(futures.is_complete());
}

#[tokio::test]
async fn incomplete_futures_count_as_parse_failure() {
    let server = MockServer::start().await;
    let missing_key = json!({
        "utopia": {"title": "Only One", "narrative": "story"}
    });
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(chat_response(missing_key.to_string())),
        )
        .expect(2)
        .mount(&server)
        .await;

    let (score, metrics) = sample_inputs();
    let (futures, is_fallback) = engine(&server).generate(&score, &metrics).await;

    assert!(is_fallback);
    assert_eq!(futures.utopia.title, "The Signal in the Noise");
}

#[tokio::test]
async fn provider_failure_falls_back_without_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": {"message": "upstream exploded"}
        })))
        .mount(&server)
        .await;

    let (score, metrics) = sample_inputs();
    let (futures, is_fallback) = engine(&server).generate(&score, &metrics).await;

    assert!(is_fallback);
    assert!(futures.is_complete());
}

#[tokio::test]
async fn same_score_report_is_memoized() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(chat_response(futures_payload().to_string())),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (score, metrics) = sample_inputs();
    let engine = engine(&server);

    let (first, _) = engine.generate(&score, &metrics).await;
    let (second, is_fallback) = engine.generate(&score, &metrics).await;

    assert!(!is_fallback);
    assert_eq!(first, second);
}
