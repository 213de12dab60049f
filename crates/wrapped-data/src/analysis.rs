//! Main analysis pipeline.
//!
//! Loads history, transcripts and facets from the configuration root,
//! merges them into a [`UsageProfile`], derives the streak and highlights,
//! scores the archetype and returns the finished [`Summary`].

use std::collections::BTreeMap;

use tracing::info;
use wrapped_core::archetypes::ArchetypeScorer;
use wrapped_core::calculations::{HighlightCalculator, StreakCalculator};
use wrapped_core::data_processors::decode_project_dir;
use wrapped_core::models::{HistoryEntry, Highlights, Stats, Summary, UsageProfile};
use wrapped_core::settings::AnalysisConfig;
use wrapped_core::time_utils::LocalClock;

use crate::facets::{facet_goal_counts, load_facets};
use crate::history::{aggregate_history, HistoryAggregate};
use crate::reader::{find_jsonl_files, read_jsonl};
use crate::transcripts::{aggregate_transcripts, TranscriptTotals};

// ── Public types ──────────────────────────────────────────────────────────────

/// Bookkeeping about one run. Never part of the summary, which must stay
/// identical across runs over the same logs.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AnalysisMetadata {
    pub history_entries: usize,
    pub transcript_files: usize,
    pub facet_files: usize,
    /// Wall-clock seconds spent reading and aggregating.
    pub load_time_seconds: f64,
}

/// The complete output of [`analyze`].
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub summary: Summary,
    pub metadata: AnalysisMetadata,
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full pipeline over the logs under `config.claude_dir`.
///
/// 1. Read and aggregate `history.jsonl`.
/// 2. Discover and aggregate transcripts under `projects/`.
/// 3. Load facet goal counts.
/// 4. Merge into a profile, derive highlights, score the archetype.
pub fn analyze(config: &AnalysisConfig) -> AnalysisResult {
    let clock = LocalClock::new(config.tz);
    let start = std::time::Instant::now();

    // ── Step 1: History ───────────────────────────────────────────────────────
    let history_entries: Vec<HistoryEntry> = read_jsonl(&config.history_path());
    let history = aggregate_history(&history_entries, &clock);

    // ── Step 2: Transcripts ───────────────────────────────────────────────────
    let projects_dir = config.projects_dir();
    let transcript_files = find_jsonl_files(&projects_dir);
    let transcripts = aggregate_transcripts(&projects_dir, &transcript_files);

    // ── Step 3: Facets ────────────────────────────────────────────────────────
    let facets = load_facets(&config.facets_dir());
    let facet_goals = facet_goal_counts(&facets);

    // ── Step 4: Summary ───────────────────────────────────────────────────────
    let profile = assemble_profile(history, transcripts, &facet_goals, &clock);
    let summary = finalize(profile);

    let metadata = AnalysisMetadata {
        history_entries: history_entries.len(),
        transcript_files: transcript_files.len(),
        facet_files: facets.len(),
        load_time_seconds: start.elapsed().as_secs_f64(),
    };

    info!(
        "Analysed {} history entries, {} transcripts, {} facets in {:.2}s -> {}",
        metadata.history_entries,
        metadata.transcript_files,
        metadata.facet_files,
        metadata.load_time_seconds,
        summary.archetype
    );

    AnalysisResult { summary, metadata }
}

/// Convenience wrapper returning only the summary.
pub fn build_summary(config: &AnalysisConfig) -> Summary {
    analyze(config).summary
}

/// Merge the three sources into a profile with highlights filled in.
pub fn assemble_profile(
    history: HistoryAggregate,
    transcripts: TranscriptTotals,
    facet_goals: &BTreeMap<String, u64>,
    clock: &LocalClock,
) -> UsageProfile {
    let stats = Stats {
        sessions: history.session_count(),
        messages: transcripts.messages,
        commits: transcripts.commits,
        hours: transcripts.total_hours(),
        days: history.active_span_days(clock) as f64,
    };

    let top_project = top_project(&transcripts.project_messages, &history.project_aliases);
    let first_session_date = history.first_session_date(clock);
    let project_count = history.project_count();

    let mut goals = history.goals;
    goals.add_counts(facet_goals);

    let time_patterns = history.time_patterns;
    let (busiest_day, busiest_day_count) = match HighlightCalculator::busiest(&time_patterns.daily)
    {
        Some((day, count)) => (Some(day), count),
        None => (None, 0),
    };

    let highlights = Highlights {
        busiest_day,
        busiest_day_count,
        longest_streak: StreakCalculator::longest_streak(&time_patterns.daily),
        longest_session_minutes: transcripts.longest_session_minutes(),
        first_session_date,
        top_project,
        least_used_tool: HighlightCalculator::least_used_tool(&transcripts.tools),
    };

    UsageProfile {
        stats,
        tools: transcripts.tools,
        time_patterns,
        project_count,
        goals: goals.into_counts(),
        highlights,
    }
}

/// Attach the archetype; the profile is not touched afterwards.
pub fn finalize(profile: UsageProfile) -> Summary {
    let archetype = ArchetypeScorer::classify(&profile);
    Summary { profile, archetype }
}

// ── Private helpers ───────────────────────────────────────────────────────────

/// Display name of the project with the most transcript messages.
///
/// Encoded directory names are translated through the history aliases when
/// possible so that only a final path segment is ever reported.
fn top_project(
    project_messages: &BTreeMap<String, u64>,
    aliases: &BTreeMap<String, String>,
) -> Option<String> {
    let mut by_name: BTreeMap<String, u64> = BTreeMap::new();
    for (encoded, &count) in project_messages {
        let name = match aliases.get(encoded) {
            Some(alias) => Some(alias.clone()),
            None => decode_project_dir(encoded),
        };
        if let Some(name) = name {
            *by_name.entry(name).or_insert(0) += count;
        }
    }
    HighlightCalculator::busiest(&by_name).map(|(name, _)| name)
}

// ── Tests ─────────────────────────────────────────────────────────────────────
