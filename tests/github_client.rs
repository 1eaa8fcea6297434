use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

use git_legacy::github::{GitHubClient, GitHubError};

fn client(server: &MockServer) -> GitHubClient {
    GitHubClient::with_config(None, server.uri(), Duration::from_secs(5))
        .unwrap()
        .retry_base_delay(Duration::ZERO)
}

fn profile_body() -> serde_json::Value {
    json!({
        "login": "octocat",
        "created_at": "2020-01-15T00:00:00Z",
        "public_repos": 8,
        "followers": 120,
        "following": 9,
        "blog": "https://octocat.dev",
        "bio": "I build things",
        "avatar_url": "https://example.com/a.png"
    })
}

#[tokio::test]
async fn profile_parses_success() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
        .mount(&server)
        .await;

    let profile = client(&server).fetch_profile("octocat").await.unwrap();
    assert_eq!(profile.login, "octocat");
    assert_eq!(profile.followers, 120);
    assert!(profile.has_blog());
}

#[tokio::test]
async fn missing_user_maps_to_user_not_found() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/ghost"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client(&server).fetch_profile("ghost").await.unwrap_err();
    assert!(matches!(err, GitHubError::UserNotFound { .. }));
}

#[tokio::test]
async fn forbidden_with_reset_header_maps_to_rate_limited() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(
            ResponseTemplate::new(403).insert_header("x-ratelimit-reset", "1767225600"),
        )
        .mount(&server)
        .await;

    let err = client(&server).fetch_profile("octocat").await.unwrap_err();
    match err {
        GitHubError::RateLimited { reset_epoch } => {
            assert_eq!(reset_epoch, Some(1_767_225_600));
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
    assert!(!err.is_retryable(), "rate limit should not be retried");
}

#[tokio::test]
async fn unauthorized_maps_to_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let err = client(&server).fetch_profile("octocat").await.unwrap_err();
    assert!(matches!(err, GitHubError::Auth));
}

#[derive(Clone)]
struct FlipResponder {
    calls: Arc<AtomicUsize>,
    first: ResponseTemplate,
    second: ResponseTemplate,
}

impl Respond for FlipResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n == 0 {
            self.first.clone()
        } else {
            self.second.clone()
        }
    }
}

#[tokio::test]
async fn transient_server_error_is_retried_once() {
    let server = MockServer::start().await;
    let calls = Arc::new(AtomicUsize::new(0));

    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(FlipResponder {
            calls: Arc::clone(&calls),
            first: ResponseTemplate::new(500),
            second: ResponseTemplate::new(200).set_body_json(profile_body()),
        })
        .mount(&server)
        .await;

    let profile = client(&server).fetch_profile("octocat").await.unwrap();
    assert_eq!(profile.login, "octocat");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn persistent_server_error_surfaces_after_retry() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(ResponseTemplate::new(502))
        .expect(2)
        .mount(&server)
        .await;

    let err = client(&server).fetch_profile("octocat").await.unwrap_err();
    assert!(matches!(err, GitHubError::Api { status: 502, .. }));
}

#[tokio::test]
async fn events_pagination_stops_at_empty_page() {
    let server = MockServer::start().await;
    let event = json!({
        "type": "PushEvent",
        "created_at": "2026-08-01T10:00:00Z",
        "payload": {"commits": [{"sha": "abc"}]}
    });

    // Page 1 has events. Page 2 is empty, so page 3 is never requested.
    let page1: Vec<_> = (0..100).map(|_| event.clone()).collect();
    Mock::given(method("GET"))
        .and(path("/users/octocat/events/public"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(page1)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/octocat/events/public"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/octocat/events/public"))
        .and(query_param("page", "3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([event])))
        .expect(0)
        .mount(&server)
        .await;

    let events = client(&server).fetch_events("octocat").await.unwrap();
    assert_eq!(events.len(), 100);
}

#[tokio::test]
async fn events_later_page_failure_degrades_to_partial() {
    let server = MockServer::start().await;
    let event = json!({"type": "WatchEvent", "created_at": "2026-08-01T10:00:00Z"});
    let page1: Vec<_> = (0..100).map(|_| event.clone()).collect();

    Mock::given(method("GET"))
        .and(path("/users/octocat/events/public"))
        .and(query_param("page", "1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(page1)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/octocat/events/public"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let events = client(&server).fetch_events("octocat").await.unwrap();
    assert_eq!(events.len(), 100);
}

#[tokio::test]
async fn rate_limit_probe_degrades_to_zeros_on_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rate_limit"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let status = client(&server).rate_limit_status().await;
    assert_eq!(status.limit, 0);
    assert_eq!(status.remaining, 0);
}

#[tokio::test]
async fn fetch_all_assembles_raw_activity() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/octocat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(profile_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/octocat/repos"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "demo", "stargazers_count": 7, "language": "Rust",
             "created_at": "2021-03-01T00:00:00Z",
             "license": {"key": "mit", "spdx_id": "MIT"}, "fork": false}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/octocat/events/public"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rate_limit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "resources": {"core": {"limit": 5000, "remaining": 4800, "reset": 1767225600}}
        })))
        .mount(&server)
        .await;

    let activity = client(&server).fetch_all("octocat").await.unwrap();
    assert_eq!(activity.profile.login, "octocat");
    assert_eq!(activity.repos.len(), 1);
    assert_eq!(activity.repos[0].language.as_deref(), Some("Rust"));
    assert!(activity.events.is_empty());
    assert_eq!(activity.rate_limit.remaining, 4800);
}
