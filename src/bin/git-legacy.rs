#![forbid(unsafe_code)]

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use git_legacy::cache::{CacheKey, TieredCache};
use git_legacy::config::ScoringConfig;
use git_legacy::github::GitHubClient;
use git_legacy::narrative::NarrativeEngine;
use git_legacy::pipeline::{Analyzer, ANALYZE_ENDPOINT};
use git_legacy::report;

#[derive(Parser)]
#[command(name = "git-legacy", version, about = "Score a GitHub profile and project its 2040 futures")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a GitHub user and print the report
    Analyze {
        username: String,
        /// GitHub token (falls back to GITHUB_TOKEN)
        #[arg(long)]
        token: Option<String>,
        /// Emit the full result as JSON instead of the text report
        #[arg(long)]
        json: bool,
        /// Ignore cached activity and refetch
        #[arg(long)]
        refresh: bool,
        /// Cache directory (falls back to GIT_LEGACY_CACHE_DIR, then the platform cache dir)
        #[arg(long)]
        cache_dir: Option<PathBuf>,
        /// Skip LLM narrative generation and use the static futures
        #[arg(long)]
        no_narrative: bool,
    },
    /// Drop cached activity for one user
    CacheClear { username: String },
    /// Delete cached activity files older than the given age
    CachePrune {
        #[arg(long, default_value_t = 24)]
        max_age_hours: u64,
    },
    /// Show the current GitHub API rate limit
    RateLimit {
        #[arg(long)]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            username,
            token,
            json,
            refresh,
            cache_dir,
            no_narrative,
        } => {
            let github = match token.as_deref() {
                Some(token) => GitHubClient::new(Some(token))?,
                None => GitHubClient::from_env()?,
            };

            let dir = cache_dir.unwrap_or_else(TieredCache::default_dir);
            let cache = TieredCache::new(dir, Default::default());

            if refresh {
                let key = CacheKey::new(ANALYZE_ENDPOINT, &username, &[]);
                cache.clear(&key).await.ok();
            }

            let narrative = if no_narrative {
                None
            } else {
                match NarrativeEngine::from_env() {
                    Ok(engine) => Some(engine),
                    Err(err) => {
                        warn!(error = %err, "narrative engine unavailable, using fallback");
                        None
                    }
                }
            };

            let analyzer = Analyzer::new(github, cache, narrative, ScoringConfig::default())?;
            let result = analyzer.analyze(&username).await?;

            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                print!("{}", report::render_text(&result));
            }
        }
        Commands::CacheClear { username } => {
            let cache = TieredCache::new(TieredCache::default_dir(), Default::default());
            let key = CacheKey::new(ANALYZE_ENDPOINT, &username, &[]);
            let removed = cache.clear(&key).await?;
            println!(
                "{}",
                if removed {
                    "cache entry removed"
                } else {
                    "no cache entry found"
                }
            );
        }
        Commands::CachePrune { max_age_hours } => {
            let cache = TieredCache::new(TieredCache::default_dir(), Default::default());
            let deleted = cache
                .prune(Duration::from_secs(max_age_hours * 3600))
                .await?;
            println!("pruned {deleted} cache files");
        }
        Commands::RateLimit { token } => {
            let github = match token.as_deref() {
                Some(token) => GitHubClient::new(Some(token))?,
                None => GitHubClient::from_env()?,
            };
            let status = github.rate_limit_status().await;
            println!(
                "limit: {}  remaining: {}  resets at epoch {}",
                status.limit, status.remaining, status.reset
            );
        }
    }

    Ok(())
}
