//! Behavioral signal extraction from raw GitHub payloads.
//!
//! Pure transformation, no I/O. Raw counts and ratios only; scoring happens
//! in [`crate::scorer`]. Missing or null fields degrade to zero/neutral
//! defaults; extraction never fails on valid-shaped input.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::github::{Event, Profile, Repo};

const PUSH_EVENT: &str = "PushEvent";
const PR_EVENTS: [&str; 2] = ["PullRequestEvent", "PullRequestReviewEvent"];
const ISSUE_EVENTS: [&str; 2] = ["IssuesEvent", "IssueCommentEvent"];
const FORK_EVENT: &str = "ForkEvent";
const WATCH_EVENT: &str = "WatchEvent";

/// Flat record of behavioral signals for one analysis run.
///
/// Immutable after extraction; everything downstream (scorer, prompts,
/// report) reads from this.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    // Profile signals
    pub username: String,
    pub account_age_days: f64,
    pub account_age_years: f64,
    pub public_repos: u32,
    pub followers: u32,
    pub following: u32,
    pub has_blog: bool,
    pub has_bio: bool,
    pub hireable: bool,
    /// Fraction of {bio, avatar, public email} present.
    pub profile_completeness: f64,

    // Repository signals
    pub total_repos: usize,
    pub total_stars: u64,
    pub total_forks_received: u64,
    pub total_watchers: u64,
    pub avg_repo_age_days: f64,
    /// Languages by usage, most common first.
    pub languages: Vec<String>,
    /// Display string of the top 5 languages, "N/A" when none.
    pub top_languages: String,
    pub has_license_ratio: f64,
    pub forked_ratio: f64,
    pub original_repo_count: usize,
    pub language_count: usize,

    // Event signals
    pub total_events: usize,
    pub push_events: usize,
    pub pr_events: usize,
    pub issue_events: usize,
    pub fork_events: usize,
    pub watch_events: usize,
    pub commit_count_90d: u64,
    pub active_days_90d: usize,
    /// Longest run of consecutive push-active days in the 90d window.
    pub longest_streak_days: usize,
    pub events_last_30d: usize,
    pub events_30_90d: usize,
    pub most_active_period: String,
    pub event_type_diversity: usize,

    // Derived signals
    pub collaboration_raw: u64,
    pub momentum_ratio: f64,
}

/// Extract behavioral signals from one user's raw GitHub data.
///
/// `now` is passed explicitly so extraction stays deterministic under test.
pub fn extract(
    profile: &Profile,
    repos: &[Repo],
    events: &[Event],
    now: DateTime<Utc>,
) -> MetricsReport {
    let mut report = MetricsReport::default();
    profile_signals(&mut report, profile, now);
    repo_signals(&mut report, repos, now);
    event_signals(&mut report, events, now);
    derived_signals(&mut report);
    report
}

fn profile_signals(report: &mut MetricsReport, profile: &Profile, now: DateTime<Utc>) {
    report.username = if profile.login.is_empty() {
        "unknown".to_string()
    } else {
        profile.login.clone()
    };
    report.account_age_days = days_since(profile.created_at, now);
    report.account_age_years = report.account_age_days / 365.25;
    report.public_repos = profile.public_repos;
    report.followers = profile.followers;
    report.following = profile.following;
    report.has_blog = profile.has_blog();
    report.has_bio = profile.has_bio();
    report.hireable = profile.hireable.unwrap_or(false);

    let present = [profile.has_bio(), profile.has_avatar(), profile.has_email()]
        .iter()
        .filter(|&&p| p)
        .count();
    report.profile_completeness = present as f64 / 3.0;
}

fn repo_signals(report: &mut MetricsReport, repos: &[Repo], now: DateTime<Utc>) {
    report.top_languages = "N/A".to_string();
    if repos.is_empty() {
        return;
    }

    report.total_repos = repos.len();
    report.total_stars = repos.iter().map(|r| r.stargazers_count as u64).sum();
    report.total_forks_received = repos.iter().map(|r| r.forks_count as u64).sum();
    report.total_watchers = repos.iter().map(|r| r.watchers_count as u64).sum();

    // Language usage, most common first; ties break alphabetically so the
    // ordering is stable.
    let mut lang_counts: HashMap<&str, usize> = HashMap::new();
    for lang in repos.iter().filter_map(|r| r.language.as_deref()) {
        *lang_counts.entry(lang).or_insert(0) += 1;
    }
    let mut ranked: Vec<(&str, usize)> = lang_counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    report.language_count = ranked.len();
    report.languages = ranked.iter().map(|(lang, _)| lang.to_string()).collect();
    if !report.languages.is_empty() {
        report.top_languages = report.languages[..report.languages.len().min(5)].join(", ");
    }

    let ages: Vec<f64> = repos
        .iter()
        .filter(|r| r.created_at.is_some())
        .map(|r| days_since(r.created_at, now))
        .collect();
    if !ages.is_empty() {
        report.avg_repo_age_days = ages.iter().sum::<f64>() / ages.len() as f64;
    }

    let licensed = repos.iter().filter(|r| r.license.is_some()).count();
    report.has_license_ratio = safe_divide(licensed as f64, repos.len() as f64);

    let forked = repos.iter().filter(|r| r.fork).count();
    report.forked_ratio = safe_divide(forked as f64, repos.len() as f64);
    report.original_repo_count = repos.len() - forked;
}

fn event_signals(report: &mut MetricsReport, events: &[Event], now: DateTime<Utc>) {
    report.most_active_period = "N/A".to_string();
    if events.is_empty() {
        return;
    }

    report.total_events = events.len();
    report.push_events = events.iter().filter(|e| e.kind == PUSH_EVENT).count();
    report.pr_events = events
        .iter()
        .filter(|e| PR_EVENTS.contains(&e.kind.as_str()))
        .count();
    report.issue_events = events
        .iter()
        .filter(|e| ISSUE_EVENTS.contains(&e.kind.as_str()))
        .count();
    report.fork_events = events.iter().filter(|e| e.kind == FORK_EVENT).count();
    report.watch_events = events.iter().filter(|e| e.kind == WATCH_EVENT).count();

    let mut active_days: HashSet<NaiveDate> = HashSet::new();
    for event in events {
        let Some(created_at) = event.created_at else {
            continue;
        };
        let age_days = (now - created_at).num_seconds() as f64 / 86_400.0;

        if age_days <= 90.0 && event.kind == PUSH_EVENT {
            report.commit_count_90d += event.commit_count() as u64;
            active_days.insert(created_at.date_naive());
        }

        if age_days <= 30.0 {
            report.events_last_30d += 1;
        } else if age_days <= 90.0 {
            report.events_30_90d += 1;
        }
    }
    report.active_days_90d = active_days.len();
    report.longest_streak_days = longest_streak(&active_days);

    report.most_active_period = if report.events_last_30d > report.events_30_90d {
        "Last 30 days (currently active)".to_string()
    } else if report.events_30_90d > 0 {
        "30-90 days ago".to_string()
    } else {
        "More than 90 days ago".to_string()
    };

    let kinds: HashSet<&str> = events
        .iter()
        .filter(|e| !e.kind.is_empty())
        .map(|e| e.kind.as_str())
        .collect();
    report.event_type_diversity = kinds.len();
}

fn derived_signals(report: &mut MetricsReport) {
    // PRs signal the deepest engagement, then issues, then forks.
    report.collaboration_raw = report.pr_events as u64 * 3
        + report.issue_events as u64 * 2
        + report.fork_events as u64;

    // Recent rate vs the 30-90d window normalized to a per-30d rate.
    let recent_rate = report.events_last_30d as f64;
    let historic_rate = report.events_30_90d as f64 / 2.0;
    report.momentum_ratio = recent_rate / historic_rate.max(1.0);
}

/// Longest run of consecutive dates. Walks forward only from days whose
/// predecessor is absent, so each run is counted once.
fn longest_streak(days: &HashSet<NaiveDate>) -> usize {
    let mut longest = 0usize;
    for &day in days {
        if day.pred_opt().is_some_and(|prev| days.contains(&prev)) {
            continue;
        }
        let mut len = 1usize;
        let mut cursor = day;
        while let Some(next) = cursor.succ_opt() {
            if !days.contains(&next) {
                break;
            }
            len += 1;
            cursor = next;
        }
        longest = longest.max(len);
    }
    longest
}

fn days_since(timestamp: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match timestamp {
        Some(ts) => ((now - ts).num_seconds() as f64 / 86_400.0).max(0.0),
        None => 0.0,
    }
}

fn safe_divide(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        0.0
    } else {
        numerator / denominator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap()
    }

    fn days_ago(days: i64) -> DateTime<Utc> {
        fixed_now() - chrono::Duration::days(days)
    }

    fn push_event(age_days: i64, commits: usize) -> Event {
        Event {
            kind: PUSH_EVENT.to_string(),
            created_at: Some(days_ago(age_days)),
            payload: crate::github::types::EventPayload {
                commits: vec![Default::default(); commits],
            },
        }
    }

    fn typed_event(kind: &str, age_days: i64) -> Event {
        Event {
            kind: kind.to_string(),
            created_at: Some(days_ago(age_days)),
            ..Default::default()
        }
    }

    fn repo(lang: Option<&str>, stars: u32, fork: bool, licensed: bool) -> Repo {
        Repo {
            name: "r".into(),
            stargazers_count: stars,
            language: lang.map(String::from),
            created_at: Some(days_ago(400)),
            license: licensed.then(crate::github::License::default),
            fork,
            ..Default::default()
        }
    }

    #[test]
    fn empty_input_yields_neutral_defaults() {
        let report = extract(&Profile::default(), &[], &[], fixed_now());
        assert_eq!(report.username, "unknown");
        assert_eq!(report.total_repos, 0);
        assert_eq!(report.total_events, 0);
        assert_eq!(report.has_license_ratio, 0.0);
        assert_eq!(report.momentum_ratio, 0.0);
        assert_eq!(report.top_languages, "N/A");
        assert_eq!(report.most_active_period, "N/A");
    }

    #[test]
    fn repo_aggregates() {
        let repos = vec![
            repo(Some("Rust"), 10, false, true),
            repo(Some("Rust"), 5, false, false),
            repo(Some("Python"), 1, true, false),
            repo(None, 0, false, false),
        ];
        let report = extract(&Profile::default(), &repos, &[], fixed_now());

        assert_eq!(report.total_repos, 4);
        assert_eq!(report.total_stars, 16);
        assert_eq!(report.languages, vec!["Rust", "Python"]);
        assert_eq!(report.language_count, 2);
        assert_eq!(report.top_languages, "Rust, Python");
        assert!((report.has_license_ratio - 0.25).abs() < 1e-9);
        assert!((report.forked_ratio - 0.25).abs() < 1e-9);
        assert_eq!(report.original_repo_count, 3);
    }

    #[test]
    fn event_windows_and_streaks() {
        let events = vec![
            push_event(1, 3),
            push_event(2, 2),
            push_event(45, 1),
            push_event(120, 5), // outside the 90d window
            typed_event("PullRequestEvent", 10),
            typed_event("IssuesEvent", 40),
            typed_event("WatchEvent", 5),
        ];
        let report = extract(&Profile::default(), &[], &events, fixed_now());

        assert_eq!(report.total_events, 7);
        assert_eq!(report.push_events, 4);
        assert_eq!(report.commit_count_90d, 6);
        assert_eq!(report.active_days_90d, 3);
        // Days 1 and 2 are consecutive; day 45 stands alone.
        assert_eq!(report.longest_streak_days, 2);
        assert_eq!(report.events_last_30d, 4);
        assert_eq!(report.events_30_90d, 2);
        assert_eq!(report.pr_events, 1);
        assert_eq!(report.issue_events, 1);
        assert_eq!(report.watch_events, 1);
        assert_eq!(report.event_type_diversity, 4);
        assert_eq!(report.most_active_period, "Last 30 days (currently active)");
        // recent=4, historic=2/2=1 -> ratio 4
        assert!((report.momentum_ratio - 4.0).abs() < 1e-9);
    }

    #[test]
    fn longest_streak_spans_consecutive_push_days_only() {
        // Two runs: 5 consecutive days and 2 consecutive days, with a gap.
        let mut events: Vec<Event> = (10..15).map(|d| push_event(d, 1)).collect();
        events.push(push_event(20, 1));
        events.push(push_event(21, 1));
        // Non-push activity on a bridging day does not extend the streak.
        events.push(typed_event("IssuesEvent", 15));
        let report = extract(&Profile::default(), &[], &events, fixed_now());

        assert_eq!(report.active_days_90d, 7);
        assert_eq!(report.longest_streak_days, 5);
    }

    #[test]
    fn single_active_day_is_a_streak_of_one() {
        let report = extract(&Profile::default(), &[], &[push_event(3, 2)], fixed_now());
        assert_eq!(report.longest_streak_days, 1);
    }

    #[test]
    fn events_without_timestamps_are_skipped() {
        let events = vec![Event {
            kind: PUSH_EVENT.to_string(),
            created_at: None,
            ..Default::default()
        }];
        let report = extract(&Profile::default(), &[], &events, fixed_now());
        assert_eq!(report.total_events, 1);
        assert_eq!(report.commit_count_90d, 0);
        assert_eq!(report.events_last_30d, 0);
    }

    #[test]
    fn profile_completeness_counts_bio_avatar_email() {
        let profile = Profile {
            login: "dev".into(),
            bio: Some("hello".into()),
            avatar_url: Some("https://example.com/a.png".into()),
            email: None,
            ..Default::default()
        };
        let report = extract(&profile, &[], &[], fixed_now());
        assert!((report.profile_completeness - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn collaboration_raw_weighting() {
        let events = vec![
            typed_event("PullRequestEvent", 5),
            typed_event("IssuesEvent", 5),
            typed_event("IssueCommentEvent", 6),
            typed_event("ForkEvent", 7),
        ];
        let report = extract(&Profile::default(), &[], &events, fixed_now());
        // 1 PR * 3 + 2 issues * 2 + 1 fork = 8
        assert_eq!(report.collaboration_raw, 8);
    }

    #[test]
    fn extraction_is_deterministic() {
        let repos = vec![repo(Some("Go"), 3, false, true)];
        let events = vec![push_event(3, 1)];
        let a = extract(&Profile::default(), &repos, &events, fixed_now());
        let b = extract(&Profile::default(), &repos, &events, fixed_now());
        assert_eq!(a, b);
    }
}
