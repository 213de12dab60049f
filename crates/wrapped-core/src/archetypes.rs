//! Archetype scoring.
//!
//! Every archetype is an [`ArchetypeRule`] with a score function mapping a
//! [`UsageProfile`] to `0.0..=100.0`. [`ArchetypeScorer::RULES`] is ordered by
//! priority: the highest score wins and exact ties go to the earlier rule.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::goals::GoalCategory;
use crate::models::{UsageProfile, DELEGATION_TOOL};

/// Hours counted as night time (22:00–03:59).
const NIGHT_HOURS: [u32; 6] = [22, 23, 0, 1, 2, 3];
/// Hours counted as early morning (05:00–08:59).
const MORNING_HOURS: [u32; 4] = [5, 6, 7, 8];

/// Tools that only look at code or the web.
pub const READ_TOOLS: [&str; 6] = ["Read", "Grep", "Glob", "LS", "WebFetch", "WebSearch"];
/// Tools that change files.
pub const EDIT_TOOLS: [&str; 4] = ["Edit", "MultiEdit", "Write", "NotebookEdit"];

const MAX_SCORE: f64 = 100.0;

/// The twelve usage archetypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Archetype {
    NightOwl,
    EarlyBird,
    Marathoner,
    StreakMaster,
    Delegator,
    Toolsmith,
    BugHunter,
    Builder,
    Refactorer,
    Researcher,
    ProjectHopper,
    Conversationalist,
}

impl Archetype {
    pub fn id(&self) -> &'static str {
        match self {
            Archetype::NightOwl => "night_owl",
            Archetype::EarlyBird => "early_bird",
            Archetype::Marathoner => "marathoner",
            Archetype::StreakMaster => "streak_master",
            Archetype::Delegator => "delegator",
            Archetype::Toolsmith => "toolsmith",
            Archetype::BugHunter => "bug_hunter",
            Archetype::Builder => "builder",
            Archetype::Refactorer => "refactorer",
            Archetype::Researcher => "researcher",
            Archetype::ProjectHopper => "project_hopper",
            Archetype::Conversationalist => "conversationalist",
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

// ── Ratios ────────────────────────────────────────────────────────────────────

/// `numerator / denominator`, or `0.0` when the denominator is zero.
fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        return 0.0;
    }
    numerator as f64 / denominator as f64
}

/// Linear score: 100 once `value >= threshold`, proportional below it.
fn scaled(value: f64, threshold: f64) -> f64 {
    if threshold <= 0.0 || !value.is_finite() || value <= 0.0 {
        return 0.0;
    }
    if value >= threshold {
        return MAX_SCORE;
    }
    value / threshold * MAX_SCORE
}

fn goal_share(profile: &UsageProfile, category: GoalCategory) -> f64 {
    ratio(profile.goal_count(category.key()), profile.total_goals())
}

// ── Score functions ───────────────────────────────────────────────────────────

fn score_night_owl(p: &UsageProfile) -> f64 {
    let share = ratio(
        p.time_patterns.events_in_hours(&NIGHT_HOURS),
        p.time_patterns.total_events(),
    );
    scaled(share, 0.4)
}

fn score_early_bird(p: &UsageProfile) -> f64 {
    let share = ratio(
        p.time_patterns.events_in_hours(&MORNING_HOURS),
        p.time_patterns.total_events(),
    );
    scaled(share, 0.3)
}

fn score_marathoner(p: &UsageProfile) -> f64 {
    let average = p.average_session_minutes();
    let longest = p.highlights.longest_session_minutes as f64;
    if average >= 45.0 && longest >= 120.0 {
        return MAX_SCORE;
    }
    let blended = 0.7 * scaled(average, 45.0) + 0.3 * scaled(longest, 120.0);
    blended.min(MAX_SCORE)
}

fn score_streak_master(p: &UsageProfile) -> f64 {
    scaled(p.highlights.longest_streak as f64, 14.0)
}

fn score_delegator(p: &UsageProfile) -> f64 {
    scaled(ratio(p.tool_count(DELEGATION_TOOL), p.stats.messages), 0.05)
}

fn score_toolsmith(p: &UsageProfile) -> f64 {
    scaled(p.tools.len() as f64, 15.0)
}

fn score_bug_hunter(p: &UsageProfile) -> f64 {
    scaled(goal_share(p, GoalCategory::BugFix), 0.4)
}

fn score_builder(p: &UsageProfile) -> f64 {
    scaled(goal_share(p, GoalCategory::Feature), 0.4)
}

fn score_refactorer(p: &UsageProfile) -> f64 {
    scaled(goal_share(p, GoalCategory::Refactor), 0.3)
}

fn score_researcher(p: &UsageProfile) -> f64 {
    let reads = p.tool_count_any(&READ_TOOLS);
    let edits = p.tool_count_any(&EDIT_TOOLS);
    let share = ratio(reads, reads + edits);
    let short_sessions = p.average_session_minutes() < 20.0;
    if share >= 0.7 && short_sessions {
        return MAX_SCORE;
    }
    let base = scaled(share, 0.7);
    if short_sessions {
        base
    } else {
        base / 2.0
    }
}

fn score_project_hopper(p: &UsageProfile) -> f64 {
    scaled(p.project_count as f64, 5.0)
}

fn score_conversationalist(p: &UsageProfile) -> f64 {
    scaled(ratio(p.stats.messages, p.stats.sessions), 50.0)
}

// ── ArchetypeScorer ───────────────────────────────────────────────────────────

/// One archetype with its score function.
#[derive(Clone, Copy)]
pub struct ArchetypeRule {
    pub archetype: Archetype,
    pub score_fn: fn(&UsageProfile) -> f64,
}

impl ArchetypeRule {
    const fn new(archetype: Archetype, score_fn: fn(&UsageProfile) -> f64) -> Self {
        Self {
            archetype,
            score_fn,
        }
    }

    /// Score clamped to `0.0..=100.0`.
    pub fn score(&self, profile: &UsageProfile) -> f64 {
        let raw = (self.score_fn)(profile);
        if raw.is_nan() {
            return 0.0;
        }
        raw.clamp(0.0, MAX_SCORE)
    }
}

impl fmt::Debug for ArchetypeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArchetypeRule")
            .field("archetype", &self.archetype)
            .finish_non_exhaustive()
    }
}

/// A single archetype's score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArchetypeScore {
    pub archetype: Archetype,
    pub score: f64,
}

/// Stateless scorer over the fixed rule table.
pub struct ArchetypeScorer;

impl ArchetypeScorer {
    /// Rules in tie-break priority order.
    pub const RULES: [ArchetypeRule; 12] = [
        ArchetypeRule::new(Archetype::NightOwl, score_night_owl),
        ArchetypeRule::new(Archetype::EarlyBird, score_early_bird),
        ArchetypeRule::new(Archetype::Marathoner, score_marathoner),
        ArchetypeRule::new(Archetype::StreakMaster, score_streak_master),
        ArchetypeRule::new(Archetype::Delegator, score_delegator),
        ArchetypeRule::new(Archetype::Toolsmith, score_toolsmith),
        ArchetypeRule::new(Archetype::BugHunter, score_bug_hunter),
        ArchetypeRule::new(Archetype::Builder, score_builder),
        ArchetypeRule::new(Archetype::Refactorer, score_refactorer),
        ArchetypeRule::new(Archetype::Researcher, score_researcher),
        ArchetypeRule::new(Archetype::ProjectHopper, score_project_hopper),
        ArchetypeRule::new(Archetype::Conversationalist, score_conversationalist),
    ];

    /// Score every archetype, in priority order.
    pub fn score_all(profile: &UsageProfile) -> Vec<ArchetypeScore> {
        Self::RULES
            .iter()
            .map(|rule| ArchetypeScore {
                archetype: rule.archetype,
                score: rule.score(profile),
            })
            .collect()
    }

    /// The best-fitting archetype for `profile`.
    pub fn classify(profile: &UsageProfile) -> Archetype {
        let scores = Self::score_all(profile);
        for s in &scores {
            debug!("archetype {:<18} score {:6.2}", s.archetype.id(), s.score);
        }
        Self::pick_winner(&scores).unwrap_or(Self::RULES[0].archetype)
    }

    /// Highest score; on exact ties the earliest entry wins.
    pub fn pick_winner(scores: &[ArchetypeScore]) -> Option<Archetype> {
        let mut winner: Option<&ArchetypeScore> = None;
        for candidate in scores {
            match winner {
                Some(best) if candidate.score <= best.score => {}
                _ => winner = Some(candidate),
            }
        }
        winner.map(|w| w.archetype)
    }
}
