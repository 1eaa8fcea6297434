//! GitHub REST collaborator: typed payload models, a typed error taxonomy,
//! and a thin retrying client.

pub mod client;
pub mod error;
pub mod types;

pub use client::{GitHubClient, RawActivity};
pub use error::GitHubError;
pub use types::{Event, License, Profile, RateLimitStatus, Repo};
