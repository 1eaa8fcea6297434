//! Error taxonomy for the GitHub client.

use thiserror::Error;

/// Errors surfaced by the GitHub collaborator. The scoring core never raises
/// any of these; they propagate from the fetch stage to the caller.
#[derive(Debug, Error)]
pub enum GitHubError {
    /// 404 from the API: the username (or resource) does not exist.
    #[error("github resource not found: {resource}")]
    UserNotFound { resource: String },

    /// 403/429: API quota exhausted. `reset_epoch` is the advertised
    /// X-RateLimit-Reset timestamp, when present.
    #[error("github rate limit exceeded")]
    RateLimited { reset_epoch: Option<i64> },

    /// 401: the provided token was rejected.
    #[error("github token invalid or expired")]
    Auth,

    /// Any other unexpected status code.
    #[error("github api returned {status} for {url}")]
    Api {
        status: u16,
        url: String,
        retryable: bool,
    },

    /// Transport-level failure.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Client could not be constructed (bad header value, builder failure).
    #[error("configuration error: {0}")]
    Config(String),
}

impl GitHubError {
    /// Whether a retry could plausibly succeed. Rate limits are not retried
    /// here; the reset window is minutes to an hour, far beyond any sane
    /// in-request backoff.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::UserNotFound { .. } => false,
            Self::RateLimited { .. } => false,
            Self::Auth => false,
            Self::Api { retryable, .. } => *retryable,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Config(_) => false,
        }
    }

    /// Short code for logging.
    pub fn code(&self) -> &'static str {
        match self {
            Self::UserNotFound { .. } => "not_found",
            Self::RateLimited { .. } => "rate_limited",
            Self::Auth => "auth",
            Self::Api { .. } => "api_error",
            Self::Http(_) => "http_error",
            Self::Config(_) => "config_error",
        }
    }
}
