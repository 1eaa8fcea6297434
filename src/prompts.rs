//! Prompt templates for future narrative generation.
//!
//! Domain logic for rendering the narrative prompt. Provider-agnostic.

use serde::{Deserialize, Serialize};

use crate::gateway::Message;
use crate::metrics::MetricsReport;
use crate::scorer::ScoreReport;

// =============================================================================
// Narrative payload
// =============================================================================

/// One generated future: a short title plus the story text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FutureNarrative {
    pub title: String,
    pub narrative: String,
}

/// The three futures the narrative engine produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Futures {
    pub utopia: FutureNarrative,
    pub dystopia: FutureNarrative,
    pub unexpected: FutureNarrative,
}

impl Futures {
    /// All three futures have non-empty titles and narratives.
    pub fn is_complete(&self) -> bool {
        [&self.utopia, &self.dystopia, &self.unexpected]
            .iter()
            .all(|f| !f.title.trim().is_empty() && !f.narrative.trim().is_empty())
    }
}

// =============================================================================
// Prompt templates
// =============================================================================

/// Rendered prompt ready for the provider.
#[derive(Debug, Clone)]
pub struct PromptInstance {
    pub system: String,
    pub user: String,
}

impl PromptInstance {
    pub fn to_messages(&self) -> Vec<Message> {
        vec![Message::system(&self.system), Message::user(&self.user)]
    }
}

const NARRATIVE_SYSTEM: &str =
    "You are a futurist storyteller. Always respond with valid JSON only.";

const NARRATIVE_TEMPLATE: &str = r#"You are a futurist storyteller writing in 2040.
A developer's GitHub behavioral profile has been analyzed and scored.

Developer: {username}
Account age: {account_age_years} years
Overall legacy score: {overall_score}/100
Tendency: {tendency}

Behavioral Dimensions (0-100):
- Consistency (commit regularity):    {consistency}
- Collaboration (PRs, forks, issues): {collaboration}
- Depth (stars, repo maturity):       {depth}
- Breadth (language diversity):       {breadth}
- Momentum (recent vs historical):    {momentum}
- Openness (public work, licenses):   {openness}

Top languages: {top_languages}
Most active period: {most_active_period}

Generate exactly three 2040 futures for this developer.
Each future must be 150-180 words, vivid, specific, and grounded in the scores above.
The Utopia should feel earned. The Dystopia should feel like a cautionary tale.
The Unexpected should be genuinely surprising but logically connected to the data.

Respond ONLY with valid JSON in this exact structure:
{
  "utopia": {
    "title": "A short evocative title (max 8 words)",
    "narrative": "150-180 word story set in 2040..."
  },
  "dystopia": {
    "title": "A short evocative title (max 8 words)",
    "narrative": "150-180 word story set in 2040..."
  },
  "unexpected": {
    "title": "A short evocative title (max 8 words)",
    "narrative": "150-180 word story set in 2040..."
  }
}"#;

/// Fill the narrative template with score and metric values.
pub fn render_narrative_prompt(score: &ScoreReport, metrics: &MetricsReport) -> PromptInstance {
    let dims = &score.dimensions;
    let user = NARRATIVE_TEMPLATE
        .replace("{username}", &metrics.username)
        .replace(
            "{account_age_years}",
            &format!("{:.1}", metrics.account_age_years),
        )
        .replace("{overall_score}", &format!("{:.0}", score.overall))
        .replace("{tendency}", score.tendency.as_str())
        .replace("{consistency}", &format!("{:.0}", dims.consistency))
        .replace("{collaboration}", &format!("{:.0}", dims.collaboration))
        .replace("{depth}", &format!("{:.0}", dims.depth))
        .replace("{breadth}", &format!("{:.0}", dims.breadth))
        .replace("{momentum}", &format!("{:.0}", dims.momentum))
        .replace("{openness}", &format!("{:.0}", dims.openness))
        .replace("{top_languages}", &metrics.top_languages)
        .replace("{most_active_period}", &metrics.most_active_period);

    PromptInstance {
        system: NARRATIVE_SYSTEM.to_string(),
        user,
    }
}

// =============================================================================
// Fallback futures
// =============================================================================

/// Static futures shown when the provider is unavailable. Every analysis
/// must produce three narratives, so this is the floor the engine falls to.
pub fn fallback_futures() -> Futures {
    Futures {
        utopia: FutureNarrative {
            title: "The Signal in the Noise".to_string(),
            narrative: "By 2040, your consistent commits have compounded into something \
                remarkable. The habits you built, small and daily and deliberate, became \
                the foundation of systems used by millions. Your open-source work, once a \
                side project, is now infrastructure. You didn't chase fame; you chased \
                craft. And craft, it turns out, has a very long memory. Colleagues still \
                reference your early repositories as examples of clarity. You mentor the \
                next generation not with lectures but with pull requests, each one a \
                lesson in thinking carefully before committing. The butterfly effect of \
                your early habits rippled outward in ways you never predicted."
                .to_string(),
        },
        dystopia: FutureNarrative {
            title: "The Abandoned Repository".to_string(),
            narrative: "By 2040, the repositories sit untouched, their last commits \
                timestamped years ago. The burst of activity that once defined your \
                GitHub profile faded as quickly as it arrived. Projects were started \
                with enthusiasm and abandoned at the first sign of friction. The \
                collaborative opportunities you ignored, the PRs left unreviewed and \
                the issues left unanswered, slowly closed doors you didn't know were \
                open. In a world where your digital footprint is your resume, the gaps \
                speak louder than the code. You are technically capable, but the record \
                shows a pattern of incompletion that is hard to argue against."
                .to_string(),
        },
        unexpected: FutureNarrative {
            title: "The Accidental Archivist".to_string(),
            narrative: "Nobody predicted that your eclectic collection of repositories, \
                spanning twelve languages, three abandoned frameworks, and one \
                inexplicable Fortran experiment, would become historically significant. \
                By 2040, software archaeologists study your GitHub profile as a time \
                capsule of the 2020s developer experience. Your inconsistency, once a \
                liability, became a kind of documentation. The half-finished projects \
                tell the story of an era when developers were figuring it out in \
                public, unafraid to be wrong. You didn't build a legacy on purpose. \
                You built it by showing up, imperfectly, and leaving the receipts."
                .to_string(),
        },
    }
}
