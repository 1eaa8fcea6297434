//! Serde models for the slices of GitHub payloads the extractor reads.
//!
//! Every field GitHub may omit or null is `Option` or defaulted, so a
//! sparse profile deserializes cleanly instead of failing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Public user profile (`GET /users/{username}`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub login: String,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub public_repos: u32,
    #[serde(default)]
    pub followers: u32,
    #[serde(default)]
    pub following: u32,
    pub blog: Option<String>,
    pub bio: Option<String>,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub hireable: Option<bool>,
}

impl Profile {
    pub fn has_blog(&self) -> bool {
        self.blog.as_deref().is_some_and(|b| !b.trim().is_empty())
    }

    pub fn has_bio(&self) -> bool {
        self.bio.as_deref().is_some_and(|b| !b.trim().is_empty())
    }

    pub fn has_email(&self) -> bool {
        self.email.as_deref().is_some_and(|e| !e.trim().is_empty())
    }

    pub fn has_avatar(&self) -> bool {
        self.avatar_url
            .as_deref()
            .is_some_and(|a| !a.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct License {
    #[serde(default)]
    pub key: String,
    pub spdx_id: Option<String>,
}

/// Owned repository (`GET /users/{username}/repos`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Repo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub forks_count: u32,
    #[serde(default)]
    pub watchers_count: u32,
    pub language: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub license: Option<License>,
    #[serde(default)]
    pub fork: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Commit {
    #[serde(default)]
    pub sha: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventPayload {
    #[serde(default)]
    pub commits: Vec<Commit>,
}

/// Public event (`GET /users/{username}/events/public`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Event {
    /// Event type string, e.g. "PushEvent", "PullRequestEvent".
    #[serde(rename = "type", default)]
    pub kind: String,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payload: EventPayload,
}

impl Event {
    /// Commits carried by a push event; empty for everything else.
    pub fn commit_count(&self) -> usize {
        self.payload.commits.len()
    }
}

/// Core-resource quota snapshot (`GET /rate_limit`).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub limit: u32,
    pub remaining: u32,
    pub reset: i64,
}
