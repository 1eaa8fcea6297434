//! Plain-text report rendering for the CLI.

use std::fmt::Write;

use crate::pipeline::AnalysisResult;
use crate::scorer::DimensionScores;

const BAR_WIDTH: usize = 30;

/// Render a full analysis as a plain-text report.
pub fn render_text(result: &AnalysisResult) -> String {
    let mut out = String::new();
    let score = &result.score_report;
    let metrics = &result.metrics;

    let _ = writeln!(out, "Git-Legacy: The Butterfly Effect");
    let _ = writeln!(out, "================================");
    let _ = writeln!(out);
    let _ = writeln!(out, "Developer:     {}", result.username);
    let _ = writeln!(out, "Account age:   {:.1} years", metrics.account_age_years);
    let _ = writeln!(out, "Legacy score:  {:.0}/100", score.overall);
    let _ = writeln!(out, "Tendency:      {}", score.tendency);
    if result.from_cache {
        let _ = writeln!(out, "Source:        cached activity");
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Dimensions");
    let _ = writeln!(out, "----------");
    for (name, value) in dimension_rows(&score.dimensions) {
        let _ = writeln!(out, "{name:<14} {} {value:>5.1}", bar(value));
    }
    let _ = writeln!(out);

    let _ = writeln!(out, "Activity");
    let _ = writeln!(out, "--------");
    let _ = writeln!(out, "Top languages:       {}", metrics.top_languages);
    let _ = writeln!(out, "Most active period:  {}", metrics.most_active_period);
    let _ = writeln!(
        out,
        "Public repos:        {} ({} original)",
        metrics.total_repos, metrics.original_repo_count
    );
    let _ = writeln!(out, "Stars received:      {}", metrics.total_stars);
    let _ = writeln!(out, "Commits (90d):       {}", metrics.commit_count_90d);
    let _ = writeln!(out);

    for (heading, future) in [
        ("UTOPIA 2040", &result.futures.utopia),
        ("DYSTOPIA 2040", &result.futures.dystopia),
        ("UNEXPECTED 2040", &result.futures.unexpected),
    ] {
        let _ = writeln!(out, "{heading}: {}", future.title);
        let _ = writeln!(out, "{}", "-".repeat(heading.len() + 2 + future.title.len()));
        let _ = writeln!(out, "{}", future.narrative);
        let _ = writeln!(out);
    }

    if result.is_fallback {
        let _ = writeln!(
            out,
            "Note: narratives are static fallbacks; the story generator was unavailable."
        );
    }
    if result.rate_limit.remaining < 10 {
        let _ = writeln!(
            out,
            "Note: GitHub rate limit low ({} of {} remaining).",
            result.rate_limit.remaining, result.rate_limit.limit
        );
    }

    out
}

fn dimension_rows(dims: &DimensionScores) -> [(&'static str, f64); 6] {
    [
        ("Consistency", dims.consistency),
        ("Collaboration", dims.collaboration),
        ("Depth", dims.depth),
        ("Breadth", dims.breadth),
        ("Momentum", dims.momentum),
        ("Openness", dims.openness),
    ]
}

fn bar(value: f64) -> String {
    let filled = ((value / 100.0) * BAR_WIDTH as f64).round() as usize;
    let filled = filled.min(BAR_WIDTH);
    format!("[{}{}]", "#".repeat(filled), ".".repeat(BAR_WIDTH - filled))
}
