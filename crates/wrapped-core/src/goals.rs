//! Keyword-based intent classification of prompt text.
//!
//! Each prompt maps to at most one [`GoalCategory`]. Categories are tried in
//! [`GoalCategory::PRIORITY`] order and the first one whose keyword pattern
//! matches wins, so "fix the new feature" is a bug fix rather than a feature.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Intent categories produced by the heuristic classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalCategory {
    BugFix,
    Feature,
    Refactor,
    Devops,
    Docs,
    Test,
    Explore,
}

impl GoalCategory {
    /// Evaluation order; the first matching category wins.
    pub const PRIORITY: [GoalCategory; 7] = [
        GoalCategory::BugFix,
        GoalCategory::Feature,
        GoalCategory::Refactor,
        GoalCategory::Devops,
        GoalCategory::Docs,
        GoalCategory::Test,
        GoalCategory::Explore,
    ];

    /// The key used for this category in the goals map.
    pub fn key(&self) -> &'static str {
        match self {
            GoalCategory::BugFix => "bug_fix",
            GoalCategory::Feature => "feature",
            GoalCategory::Refactor => "refactor",
            GoalCategory::Devops => "devops",
            GoalCategory::Docs => "docs",
            GoalCategory::Test => "test",
            GoalCategory::Explore => "explore",
        }
    }

    fn keywords(&self) -> &'static [&'static str] {
        match self {
            GoalCategory::BugFix => &[
                "fix", "fixes", "fixed", "fixing", "bug", "bugs", "error", "errors", "broken",
                "crash", "crashes", "crashing", "debug", "failing", "fails", "issue",
            ],
            GoalCategory::Feature => &[
                "add", "adding", "implement", "implementing", "create", "build", "new",
                "feature", "features", "support",
            ],
            GoalCategory::Refactor => &[
                "refactor", "refactoring", "cleanup", "clean up", "rename", "restructure",
                "simplify", "reorganize", "extract",
            ],
            GoalCategory::Devops => &[
                "deploy", "deployment", "docker", "dockerfile", "ci", "pipeline", "kubernetes",
                "k8s", "terraform", "release", "github actions",
            ],
            GoalCategory::Docs => &[
                "docs", "doc", "document", "documentation", "readme", "docstring", "docstrings",
                "changelog",
            ],
            GoalCategory::Test => &[
                "test", "tests", "testing", "unit test", "coverage", "spec", "specs", "e2e",
            ],
            GoalCategory::Explore => &[
                "explain", "how", "what", "why", "where", "understand", "explore", "show",
                "find",
            ],
        }
    }

    /// Case-insensitive whole-word pattern for this category.
    fn pattern(&self) -> &'static Regex {
        static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
        let patterns = PATTERNS.get_or_init(|| {
            GoalCategory::PRIORITY
                .iter()
                .map(|cat| build_pattern(cat.keywords()))
                .collect()
        });
        &patterns[*self as usize]
    }
}

impl fmt::Display for GoalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

fn build_pattern(keywords: &[&str]) -> Regex {
    let alternation = keywords
        .iter()
        .map(|k| regex::escape(k).replace(' ', r"\s+"))
        .collect::<Vec<_>>()
        .join("|");
    Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)).expect("keyword regex is valid")
}

/// Classify one prompt, `None` when no keyword set matches.
pub fn classify(text: &str) -> Option<GoalCategory> {
    GoalCategory::PRIORITY
        .into_iter()
        .find(|cat| cat.pattern().is_match(text))
}

// ── GoalTally ─────────────────────────────────────────────────────────────────

/// Running category → count map fed by the heuristic and by facets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GoalTally {
    counts: BTreeMap<String, u64>,
}

impl GoalTally {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `text` and count the result, if any.
    pub fn record_prompt(&mut self, text: &str) -> Option<GoalCategory> {
        let category = classify(text)?;
        self.add(category.key(), 1);
        Some(category)
    }

    /// Add externally supplied counts. Unknown category names are kept.
    pub fn add_counts<'a, I>(&mut self, counts: I)
    where
        I: IntoIterator<Item = (&'a String, &'a u64)>,
    {
        for (category, count) in counts {
            self.add(category, *count);
        }
    }

    pub fn add(&mut self, category: &str, count: u64) {
        if category.is_empty() {
            return;
        }
        let total = self.counts.entry(category.to_string()).or_insert(0);
        *total = total.saturating_add(count);
    }

    pub fn into_counts(self) -> BTreeMap<String, u64> {
        self.counts
    }
}
