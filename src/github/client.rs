//! Thin retrying wrapper around the GitHub REST API v3.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{info, warn};

use super::error::GitHubError;
use super::types::{Event, Profile, RateLimitStatus, Repo};

pub const DEFAULT_BASE_URL: &str = "https://api.github.com";

const API_VERSION: &str = "2022-11-28";
const USER_AGENT: &str = concat!("git-legacy/", env!("CARGO_PKG_VERSION"));

/// Events endpoint is paginated; 3 pages x 100 events covers the API's
/// 90-day window for all but the most hyperactive accounts.
const EVENTS_PAGES: u32 = 3;
const EVENTS_PER_PAGE: u32 = 100;
const REPOS_PER_PAGE: u32 = 100;

const MAX_RETRIES: u32 = 1;

/// Everything one analysis run needs from GitHub.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawActivity {
    pub profile: Profile,
    pub repos: Vec<Repo>,
    pub events: Vec<Event>,
    pub rate_limit: RateLimitStatus,
}

/// GitHub REST client with bounded timeout and retry-on-transient-failure.
#[derive(Debug, Clone)]
pub struct GitHubClient {
    client: reqwest::Client,
    base_url: String,
    retry_base_delay: Duration,
}

impl GitHubClient {
    /// Create with default base URL and a 10 s request timeout.
    pub fn new(token: Option<&str>) -> Result<Self, GitHubError> {
        Self::with_config(token, DEFAULT_BASE_URL, Duration::from_secs(10))
    }

    /// Create from environment: `GITHUB_TOKEN` (optional),
    /// `GITHUB_API_BASE`, `GITHUB_TIMEOUT_SECONDS`.
    pub fn from_env() -> Result<Self, GitHubError> {
        let token = std::env::var("GITHUB_TOKEN").ok();
        let base_url =
            std::env::var("GITHUB_API_BASE").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
        let timeout = std::env::var("GITHUB_TIMEOUT_SECONDS")
            .ok()
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(10));

        Self::with_config(token.as_deref(), base_url, timeout)
    }

    pub fn with_config(
        token: Option<&str>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, GitHubError> {
        let base_url = base_url.into();

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/vnd.github+json"));
        headers.insert("X-GitHub-Api-Version", HeaderValue::from_static(API_VERSION));

        if let Some(token) = token {
            let auth_value = HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| GitHubError::Config("invalid token format".into()))?;
            headers.insert(AUTHORIZATION, auth_value);
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| GitHubError::Config(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            retry_base_delay: Duration::from_millis(1_500),
        })
    }

    /// Override the retry backoff base (tests use zero).
    pub fn retry_base_delay(mut self, delay: Duration) -> Self {
        self.retry_base_delay = delay;
        self
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GitHubError> {
        let mut last_error: Option<GitHubError> = None;

        for attempt in 0..=MAX_RETRIES {
            match self.get_once(path, query).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !err.is_retryable() || attempt == MAX_RETRIES {
                        return Err(err);
                    }
                    let delay = self.retry_base_delay * 2u32.pow(attempt);
                    warn!(path, attempt, code = err.code(), "github request failed, retrying");
                    last_error = Some(err);
                    sleep(delay).await;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| GitHubError::Config("retry loop exhausted".into())))
    }

    async fn get_once<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GitHubError> {
        let url = format!("{}{path}", self.base_url);
        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status().as_u16();

        match status {
            200 => Ok(response.json::<T>().await?),
            404 => Err(GitHubError::UserNotFound {
                resource: path.to_string(),
            }),
            401 => Err(GitHubError::Auth),
            403 | 429 => {
                let reset_epoch = response
                    .headers()
                    .get("x-ratelimit-reset")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse().ok());
                Err(GitHubError::RateLimited { reset_epoch })
            }
            _ => Err(GitHubError::Api {
                status,
                url,
                retryable: status >= 500,
            }),
        }
    }

    pub async fn fetch_profile(&self, username: &str) -> Result<Profile, GitHubError> {
        info!(username, "fetching profile");
        self.get_json(&format!("/users/{username}"), &[]).await
    }

    /// Owned repositories, most recently updated first, one page of 100.
    pub async fn fetch_repos(&self, username: &str) -> Result<Vec<Repo>, GitHubError> {
        info!(username, "fetching repos");
        self.get_json(
            &format!("/users/{username}/repos"),
            &[
                ("per_page", REPOS_PER_PAGE.to_string()),
                ("sort", "updated".to_string()),
                ("type", "owner".to_string()),
            ],
        )
        .await
    }

    /// Up to 3 pages of public events. Pagination stops at the first empty
    /// page; a generic API failure on a later page degrades to the events
    /// gathered so far instead of failing the whole fetch.
    pub async fn fetch_events(&self, username: &str) -> Result<Vec<Event>, GitHubError> {
        info!(username, pages = EVENTS_PAGES, "fetching events");
        let path = format!("/users/{username}/events/public");
        let mut all_events: Vec<Event> = Vec::new();

        for page in 1..=EVENTS_PAGES {
            let query = [
                ("per_page", EVENTS_PER_PAGE.to_string()),
                ("page", page.to_string()),
            ];
            match self.get_json::<Vec<Event>>(&path, &query).await {
                Ok(page_events) if page_events.is_empty() => break,
                Ok(mut page_events) => all_events.append(&mut page_events),
                Err(err @ GitHubError::Api { .. }) => {
                    warn!(username, page, error = %err, "events page failed, stopping pagination");
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        Ok(all_events)
    }

    /// Current core-resource quota. Never fails; degrades to zeros so a
    /// quota probe can't sink an otherwise successful analysis.
    pub async fn rate_limit_status(&self) -> RateLimitStatus {
        #[derive(Deserialize, Default)]
        struct Core {
            #[serde(default)]
            limit: u32,
            #[serde(default)]
            remaining: u32,
            #[serde(default)]
            reset: i64,
        }
        #[derive(Deserialize, Default)]
        struct Resources {
            #[serde(default)]
            core: Core,
        }
        #[derive(Deserialize)]
        struct RateLimitBody {
            #[serde(default)]
            resources: Resources,
        }

        match self.get_json::<RateLimitBody>("/rate_limit", &[]).await {
            Ok(body) => RateLimitStatus {
                limit: body.resources.core.limit,
                remaining: body.resources.core.remaining,
                reset: body.resources.core.reset,
            },
            Err(err) => {
                warn!(code = err.code(), "rate limit probe failed");
                RateLimitStatus::default()
            }
        }
    }

    /// Fetch profile, repos, and events for one user.
    ///
    /// The profile comes first so a bad username fails fast; repos and
    /// events then fetch concurrently.
    pub async fn fetch_all(&self, username: &str) -> Result<RawActivity, GitHubError> {
        let profile = self.fetch_profile(username).await?;

        let (repos, events) =
            tokio::try_join!(self.fetch_repos(username), self.fetch_events(username))?;

        let rate_limit = self.rate_limit_status().await;

        info!(
            username,
            repos = repos.len(),
            events = events.len(),
            remaining = rate_limit.remaining,
            "github fetch complete"
        );

        Ok(RawActivity {
            profile,
            repos,
            events,
            rate_limit,
        })
    }
}
