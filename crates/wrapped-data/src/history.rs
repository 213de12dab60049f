//! Session and time-pattern aggregation over `history.jsonl`.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use wrapped_core::data_processors::{encode_project_path, normalize_project_name, TimestampProcessor};
use wrapped_core::goals::GoalTally;
use wrapped_core::models::{HistoryEntry, TimePatterns};
use wrapped_core::time_utils::{format_date_key, inclusive_day_span, LocalClock};

/// Everything derived from the prompt history in one pass.
#[derive(Debug, Clone, Default)]
pub struct HistoryAggregate {
    /// Session id → timestamps of its prompts, in input order.
    pub session_timestamps: BTreeMap<String, Vec<DateTime<Utc>>>,
    /// Distinct normalised project names.
    pub projects: BTreeSet<String>,
    /// Encoded project directory name → normalised project name.
    pub project_aliases: BTreeMap<String, String>,
    pub time_patterns: TimePatterns,
    /// Heuristic goal counts from the prompt text.
    pub goals: GoalTally,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
    /// Entries read, including those without a timestamp.
    pub entries: usize,
}

impl HistoryAggregate {
    /// Fold one history record into the aggregate.
    pub fn add_entry(&mut self, entry: &HistoryEntry, clock: &LocalClock) {
        self.entries += 1;

        let timestamp = entry
            .timestamp
            .as_ref()
            .and_then(TimestampProcessor::parse_epoch_millis);

        if let Some(session_id) = entry.session_id.as_deref().filter(|s| !s.is_empty()) {
            let timestamps = self
                .session_timestamps
                .entry(session_id.to_string())
                .or_default();
            if let Some(ts) = timestamp {
                timestamps.push(ts);
            }
        }

        if let Some(path) = entry.project.as_deref() {
            if let Some(name) = normalize_project_name(path) {
                self.project_aliases
                    .entry(encode_project_path(path))
                    .or_insert_with(|| name.clone());
                self.projects.insert(name);
            }
        }

        self.goals.record_prompt(&entry.display);

        if let Some(ts) = timestamp {
            let buckets = clock.buckets(ts);
            bump(&mut self.time_patterns.hourly, buckets.hour_key());
            bump(&mut self.time_patterns.weekly, buckets.weekday_key());
            bump(&mut self.time_patterns.daily, buckets.date_key());

            self.first_timestamp = Some(self.first_timestamp.map_or(ts, |t| t.min(ts)));
            self.last_timestamp = Some(self.last_timestamp.map_or(ts, |t| t.max(ts)));
        }
    }

    /// Number of distinct sessions.
    pub fn session_count(&self) -> u64 {
        self.session_timestamps.len() as u64
    }

    /// Number of distinct projects.
    pub fn project_count(&self) -> u64 {
        self.projects.len() as u64
    }

    /// Local date of the earliest prompt.
    pub fn first_session_date(&self, clock: &LocalClock) -> Option<String> {
        self.first_timestamp
            .map(|ts| format_date_key(clock.local_date(ts)))
    }

    /// Calendar days covered by the history, both ends included.
    pub fn active_span_days(&self, clock: &LocalClock) -> u64 {
        match (self.first_timestamp, self.last_timestamp) {
            (Some(first), Some(last)) => {
                inclusive_day_span(clock.local_date(first), clock.local_date(last)) as u64
            }
            _ => 0,
        }
    }
}

fn bump(histogram: &mut BTreeMap<String, u64>, key: String) {
    *histogram.entry(key).or_insert(0) += 1;
}

/// Aggregate a full history in order.
pub fn aggregate_history(entries: &[HistoryEntry], clock: &LocalClock) -> HistoryAggregate {
    let mut aggregate = HistoryAggregate::default();
    for entry in entries {
        aggregate.add_entry(entry, clock);
    }
    aggregate
}
