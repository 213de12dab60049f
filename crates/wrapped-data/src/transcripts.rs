//! Per-session transcript aggregation.
//!
//! Each transcript file reduces to a [`TranscriptPartial`]; partials merge
//! associatively into [`TranscriptTotals`], so files can be processed in any
//! order or in parallel and folded at a single point.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::debug;
use wrapped_core::data_processors::TimestampProcessor;
use wrapped_core::models::TranscriptEntry;

use crate::reader::read_jsonl;

// ── TranscriptPartial ─────────────────────────────────────────────────────────

/// What a single transcript file contributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptPartial {
    /// Encoded project directory the file lives under, if any.
    pub project: Option<String>,
    /// User and assistant entries.
    pub messages: u64,
    pub tools: BTreeMap<String, u64>,
    pub commits: u64,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
}

impl TranscriptPartial {
    pub fn new(project: Option<String>) -> Self {
        Self {
            project,
            ..Self::default()
        }
    }

    pub fn add_entry(&mut self, entry: &TranscriptEntry) {
        if let Some(ts) = entry.timestamp.as_ref().and_then(TimestampProcessor::parse) {
            self.first_timestamp = Some(self.first_timestamp.map_or(ts, |t| t.min(ts)));
            self.last_timestamp = Some(self.last_timestamp.map_or(ts, |t| t.max(ts)));
        }

        if entry.is_message() {
            self.messages += 1;
        }

        if !entry.is_assistant() {
            return;
        }

        for block in entry.content_blocks() {
            let Some(name) = block.tool_name() else {
                continue;
            };
            *self.tools.entry(name.to_string()).or_insert(0) += 1;
            if block.is_commit() {
                self.commits += 1;
            }
        }
    }

    /// Wall-clock span between the first and last timestamp, in minutes.
    ///
    /// `None` when the file carried no parseable timestamp.
    pub fn span_minutes(&self) -> Option<f64> {
        let (first, last) = (self.first_timestamp?, self.last_timestamp?);
        Some((last - first).num_milliseconds() as f64 / 60_000.0)
    }
}

// ── TranscriptTotals ──────────────────────────────────────────────────────────

/// The fold of any number of [`TranscriptPartial`]s.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TranscriptTotals {
    pub files: u64,
    pub messages: u64,
    pub tools: BTreeMap<String, u64>,
    pub commits: u64,
    /// Encoded project directory → message count.
    pub project_messages: BTreeMap<String, u64>,
    /// Sum of all file spans.
    pub total_minutes: f64,
    /// Longest single file span; `None` until a timed file is merged.
    pub longest_minutes: Option<f64>,
}

impl TranscriptTotals {
    /// Fold one file's partial into the totals.
    pub fn absorb(&mut self, partial: TranscriptPartial) {
        self.files += 1;
        self.messages += partial.messages;
        self.commits += partial.commits;
        if let Some(span) = partial.span_minutes() {
            self.total_minutes += span;
            self.longest_minutes = Some(self.longest_minutes.map_or(span, |m| m.max(span)));
        }
        if let Some(project) = partial.project {
            *self.project_messages.entry(project).or_insert(0) += partial.messages;
        }
        merge_counts(&mut self.tools, partial.tools);
    }

    /// Associative merge of two totals.
    pub fn merge(mut self, other: TranscriptTotals) -> TranscriptTotals {
        self.files += other.files;
        self.messages += other.messages;
        self.commits += other.commits;
        self.total_minutes += other.total_minutes;
        self.longest_minutes = match (self.longest_minutes, other.longest_minutes) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        merge_counts(&mut self.tools, other.tools);
        merge_counts(&mut self.project_messages, other.project_messages);
        self
    }

    /// Longest span rounded to whole minutes, `0` when nothing was timed.
    pub fn longest_session_minutes(&self) -> u64 {
        self.longest_minutes
            .map(|m| m.max(0.0).round() as u64)
            .unwrap_or(0)
    }

    /// Total span in hours, rounded to one decimal.
    pub fn total_hours(&self) -> f64 {
        (self.total_minutes.max(0.0) / 60.0 * 10.0).round() / 10.0
    }
}

fn merge_counts(into: &mut BTreeMap<String, u64>, from: BTreeMap<String, u64>) {
    for (key, count) in from {
        let total = into.entry(key).or_insert(0);
        *total = total.saturating_add(count);
    }
}

// ── Public API ────────────────────────────────────────────────────────────────

/// The project a transcript belongs to: the first path component below
/// `projects_root`. Files directly in the root have none.
pub fn project_for_file(projects_root: &Path, file: &Path) -> Option<String> {
    let relative = file.strip_prefix(projects_root).ok()?;
    let mut components = relative.components();
    let first = components.next()?;
    // A bare file name is not a project directory.
    components.next()?;
    match first {
        Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
        _ => None,
    }
}

/// Reduce one transcript file to its partial aggregate.
pub fn aggregate_file(projects_root: &Path, file: &Path) -> TranscriptPartial {
    let entries: Vec<TranscriptEntry> = read_jsonl(file);
    let mut partial = TranscriptPartial::new(project_for_file(projects_root, file));
    for entry in &entries {
        partial.add_entry(entry);
    }
    debug!(
        "Transcript {}: {} entries, {} messages, {} tool calls",
        file.display(),
        entries.len(),
        partial.messages,
        partial.tools.values().sum::<u64>()
    );
    partial
}

/// Aggregate every transcript file into one [`TranscriptTotals`].
pub fn aggregate_transcripts(projects_root: &Path, files: &[PathBuf]) -> TranscriptTotals {
    files
        .iter()
        .map(|file| aggregate_file(projects_root, file))
        .fold(TranscriptTotals::default(), |mut totals, partial| {
            totals.absorb(partial);
            totals
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use std::io::Write;
    use tempfile::TempDir;

    fn write_jsonl(path: &Path, lines: &[Value]) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut file = std::fs::File::create(path).unwrap();
        for line in lines {
            writeln!(file, "{}", line).unwrap();
        }
    }

    fn user(ts: &str) -> Value {
        json!({"type": "user", "timestamp": ts, "sessionId": "s", "message": {"role": "user", "content": "do it"}})
    }

    fn assistant_tool(ts: &str, name: &str, command: Option<&str>) -> Value {
        let input = match command {
            Some(c) => json!({"command": c}),
            None => json!({}),
        };
        json!({
            "type": "assistant",
            "timestamp": ts,
            "message": {"role": "assistant", "content": [
                {"type": "text", "text": "ok"},
                {"type": "tool_use", "id": "t1", "name": name, "input": input}
            ]}
        })
    }

    #[test]
    fn test_project_for_file() {
        let root = Path::new("/c/projects");
        assert_eq!(
            project_for_file(root, Path::new("/c/projects/-home-dev-shop/abc.jsonl")).as_deref(),
            Some("-home-dev-shop")
        );
        assert_eq!(
            project_for_file(root, Path::new("/c/projects/-p/abc/subagents/x.jsonl")).as_deref(),
            Some("-p")
        );
        assert_eq!(project_for_file(root, Path::new("/c/projects/loose.jsonl")), None);
        assert_eq!(project_for_file(root, Path::new("/elsewhere/p/a.jsonl")), None);
    }

    #[test]
    fn test_aggregate_file_counts() {
        let dir = TempDir::new().unwrap();
        let file = dir.path().join("-home-dev-shop/s1.jsonl");
        write_jsonl(
            &file,
            &[
                user("2024-05-01T10:00:00Z"),
                assistant_tool("2024-05-01T10:05:00Z", "Bash", Some("git commit -m \"x\"")),
                assistant_tool("2024-05-01T10:10:00Z", "Bash", Some("cargo test")),
                assistant_tool("2024-05-01T10:20:00Z", "Read", None),
                json!({"type": "summary", "summary": "x"}),
            ],
        );

        let partial = aggregate_file(dir.path(), &file);
        assert_eq!(partial.project.as_deref(), Some("-home-dev-shop"));
        assert_eq!(partial.messages, 4);
        assert_eq!(partial.tools.get("Bash"), Some(&2));
        assert_eq!(partial.tools.get("Read"), Some(&1));
        assert_eq!(partial.commits, 1);
        assert_eq!(partial.span_minutes(), Some(20.0));
    }

    #[test]
    fn test_commit_substring_counts_lint_command() {
        let mut partial = TranscriptPartial::default();
        let entry: TranscriptEntry = serde_json::from_value(assistant_tool(
            "2024-05-01T10:00:00Z",
            "Bash",
            Some("git commit-msg-lint"),
        ))
        .unwrap();
        partial.add_entry(&entry);
        assert_eq!(partial.commits, 1);
    }

    #[test]
    fn test_string_encoded_message_is_parsed() {
        let inner = json!({"content": [{"type": "tool_use", "name": "Glob", "input": {}}]}).to_string();
        let entry: TranscriptEntry =
            serde_json::from_value(json!({"type": "assistant", "message": inner})).unwrap();
        let mut partial = TranscriptPartial::default();
        partial.add_entry(&entry);
        assert_eq!(partial.tools.get("Glob"), Some(&1));
    }

    #[test]
    fn test_tool_use_in_user_entry_not_counted() {
        let entry: TranscriptEntry = serde_json::from_value(json!({
            "type": "user",
            "message": {"content": [{"type": "tool_use", "name": "Bash", "input": {"command": "git commit"}}]}
        }))
        .unwrap();
        let mut partial = TranscriptPartial::default();
        partial.add_entry(&entry);
        assert!(partial.tools.is_empty());
        assert_eq!(partial.commits, 0);
        assert_eq!(partial.messages, 1);
    }

    #[test]
    fn test_file_without_timestamps_does_not_affect_longest() {
        let mut totals = TranscriptTotals::default();
        let mut untimed = TranscriptPartial::new(Some("p".to_string()));
        untimed.messages = 3;
        totals.absorb(untimed);
        assert_eq!(totals.longest_minutes, None);
        assert_eq!(totals.longest_session_minutes(), 0);
        assert_eq!(totals.messages, 3);
        assert_eq!(totals.project_messages.get("p"), Some(&3));
    }

    #[test]
    fn test_merge_counts_saturates() {
        let mut into = BTreeMap::from([("Read".to_string(), u64::MAX)]);
        merge_counts(&mut into, BTreeMap::from([("Read".to_string(), 3)]));
        assert_eq!(into.get("Read"), Some(&u64::MAX));
    }

    #[test]
    fn test_merge_is_associative() {
        let make = |messages: u64, minutes: i64, tool: &str| {
            let mut p = TranscriptPartial::new(Some("proj".to_string()));
            p.messages = messages;
            p.tools.insert(tool.to_string(), messages);
            let start = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc);
            p.first_timestamp = Some(start);
            p.last_timestamp = Some(start + chrono::Duration::minutes(minutes));
            let mut t = TranscriptTotals::default();
            t.absorb(p);
            t
        };

        let (a, b, c) = (make(1, 30, "Read"), make(2, 90, "Bash"), make(3, 45, "Read"));
        let left = a.clone().merge(b.clone()).merge(c.clone());
        let right = a.merge(b.merge(c));

        assert_eq!(left, right);
        assert_eq!(left.messages, 6);
        assert_eq!(left.files, 3);
        assert_eq!(left.longest_session_minutes(), 90);
        assert_eq!(left.tools.get("Read"), Some(&4));
        assert_eq!(left.project_messages.get("proj"), Some(&6));
        assert!((left.total_hours() - 2.8).abs() < 1e-9);
    }

    #[test]
    fn test_aggregate_transcripts_over_directory() {
        let dir = TempDir::new().unwrap();
        write_jsonl(
            &dir.path().join("-a-shop/1.jsonl"),
            &[user("2024-05-01T10:00:00Z"), user("2024-05-01T11:00:00Z")],
        );
        write_jsonl(
            &dir.path().join("-a-api/2.jsonl"),
            &[user("2024-05-02T10:00:00Z")],
        );
        std::fs::write(dir.path().join("-a-api/3.jsonl"), "{broken\n").unwrap();

        let files = crate::reader::find_jsonl_files(dir.path());
        let totals = aggregate_transcripts(dir.path(), &files);
        assert_eq!(totals.files, 3);
        assert_eq!(totals.messages, 3);
        assert_eq!(totals.longest_session_minutes(), 60);
        assert_eq!(totals.project_messages.get("-a-shop"), Some(&2));
        assert_eq!(totals.project_messages.get("-a-api"), Some(&1));
    }
}
