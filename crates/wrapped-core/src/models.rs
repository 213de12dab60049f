use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::archetypes::Archetype;

/// Tool name the assistant uses to run shell commands.
pub const SHELL_TOOL: &str = "Bash";

/// Tool name the assistant uses to hand work to a sub-agent.
pub const DELEGATION_TOOL: &str = "Task";

/// Command fragment that marks a shell invocation as a commit.
pub const COMMIT_MARKER: &str = "git commit";

/// Content-block type flagging a tool invocation.
const TOOL_USE_BLOCK: &str = "tool_use";

// ── Input records ─────────────────────────────────────────────────────────────

/// One user-submitted prompt from `history.jsonl`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Free-text prompt as typed by the user.
    #[serde(default, deserialize_with = "null_as_default")]
    pub display: String,
    /// Epoch milliseconds. Kept raw so that integer, float and string
    /// encodings are all accepted.
    #[serde(default)]
    pub timestamp: Option<Value>,
    /// Working directory the prompt was issued from.
    #[serde(default)]
    pub project: Option<String>,
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
}

/// One event inside a session transcript.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TranscriptEntry {
    /// `"user"`, `"assistant"`, or any other event kind.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    /// ISO-8601 timestamp string.
    #[serde(default)]
    pub timestamp: Option<Value>,
    #[serde(default, rename = "sessionId")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub message: Option<RawMessage>,
}

impl TranscriptEntry {
    /// Whether this entry is a user or assistant turn.
    pub fn is_message(&self) -> bool {
        matches!(self.kind.as_deref(), Some("user") | Some("assistant"))
    }

    pub fn is_assistant(&self) -> bool {
        self.kind.as_deref() == Some("assistant")
    }

    /// Normalised content blocks of the message, empty when absent.
    pub fn content_blocks(&self) -> Vec<ContentBlock> {
        self.message
            .clone()
            .map(RawMessage::into_blocks)
            .unwrap_or_default()
    }
}

/// The on-disk shapes a transcript `message` field is known to take.
///
/// Everything is funnelled through [`RawMessage::into_blocks`] so that
/// aggregation code only ever sees a flat list of [`ContentBlock`]s.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawMessage {
    /// A bare list of content blocks.
    Blocks(Vec<ContentBlock>),
    /// A message object carrying a `content` field.
    Envelope { content: MessageBody },
    /// The whole message serialised as a JSON string.
    Encoded(String),
    /// Any other shape; contributes nothing.
    Other(Value),
}

/// The `content` field of a message object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageBody {
    Blocks(Vec<ContentBlock>),
    Text(String),
    Other(Value),
}

impl RawMessage {
    /// Flatten any encoding into the list of content blocks it carries.
    pub fn into_blocks(self) -> Vec<ContentBlock> {
        self.into_blocks_at_depth(0)
    }

    fn into_blocks_at_depth(self, depth: u8) -> Vec<ContentBlock> {
        match self {
            RawMessage::Blocks(blocks) => blocks,
            RawMessage::Envelope {
                content: MessageBody::Blocks(blocks),
            } => blocks,
            RawMessage::Envelope { .. } | RawMessage::Other(_) => Vec::new(),
            // A string is only decoded once; doubly encoded payloads are dropped.
            RawMessage::Encoded(text) if depth == 0 => {
                match serde_json::from_str::<RawMessage>(&text) {
                    Ok(inner) => inner.into_blocks_at_depth(depth + 1),
                    Err(_) => Vec::new(),
                }
            }
            RawMessage::Encoded(_) => Vec::new(),
        }
    }
}

/// One content block of an assistant message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentBlock {
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub input: Option<Value>,
}

impl ContentBlock {
    /// Name of the invoked tool when this block is a named tool invocation.
    pub fn tool_name(&self) -> Option<&str> {
        if self.kind.as_deref() != Some(TOOL_USE_BLOCK) {
            return None;
        }
        self.name.as_deref().filter(|n| !n.is_empty())
    }

    /// The `command` argument of a tool invocation, if any.
    pub fn command(&self) -> Option<&str> {
        self.input
            .as_ref()
            .and_then(|i| i.get("command"))
            .and_then(|c| c.as_str())
    }

    /// Whether this block is a shell invocation that creates a commit.
    ///
    /// Plain substring match: `git commit-msg-lint` counts too.
    pub fn is_commit(&self) -> bool {
        self.tool_name() == Some(SHELL_TOOL)
            && self
                .command()
                .map(|c| c.contains(COMMIT_MARKER))
                .unwrap_or(false)
    }
}

/// One externally computed session facet (`usage-data/facets/*.json`).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FacetData {
    /// Goal category → count.
    #[serde(default, deserialize_with = "null_as_default")]
    pub goal_categories: BTreeMap<String, u64>,
    #[serde(default)]
    pub outcome: Option<String>,
    #[serde(default)]
    pub session_type: Option<String>,
    #[serde(default)]
    pub primary_success: Option<String>,
    #[serde(default)]
    pub claude_helpfulness: Option<String>,
}

// ── Derived summary ───────────────────────────────────────────────────────────

/// Headline counters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    /// Distinct session identifiers seen in the history.
    pub sessions: u64,
    /// User and assistant turns across all transcripts.
    pub messages: u64,
    /// Shell invocations that ran `git commit`.
    pub commits: u64,
    /// Total transcript wall-clock time, in hours.
    pub hours: f64,
    /// Calendar days between first and last recorded prompt, inclusive.
    pub days: f64,
}

/// Activity histograms keyed by local hour, weekday and date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimePatterns {
    /// `"0"`..`"23"` → prompts.
    pub hourly: BTreeMap<String, u64>,
    /// `"0"` (Sunday)..`"6"` (Saturday) → prompts.
    pub weekly: BTreeMap<String, u64>,
    /// `YYYY-MM-DD` → prompts.
    pub daily: BTreeMap<String, u64>,
}

impl TimePatterns {
    /// Sum of the hourly histogram, i.e. every timestamped prompt.
    pub fn total_events(&self) -> u64 {
        self.hourly.values().sum()
    }

    /// Events whose hour falls into `hours`.
    pub fn events_in_hours(&self, hours: &[u32]) -> u64 {
        hours
            .iter()
            .filter_map(|h| self.hourly.get(&h.to_string()))
            .sum()
    }
}

/// A tool name paired with its invocation count.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolUsage {
    pub name: String,
    pub count: u64,
}

/// Derived one-line facts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Highlights {
    pub busiest_day: Option<String>,
    pub busiest_day_count: u64,
    pub longest_streak: u64,
    pub longest_session_minutes: u64,
    pub first_session_date: Option<String>,
    /// Final path segment of the project with the most transcript messages.
    pub top_project: Option<String>,
    pub least_used_tool: Option<ToolUsage>,
}

/// Everything the summary carries except the archetype label.
///
/// This is what the archetype scorer reads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageProfile {
    pub stats: Stats,
    pub tools: BTreeMap<String, u64>,
    pub time_patterns: TimePatterns,
    pub project_count: u64,
    pub goals: BTreeMap<String, u64>,
    pub highlights: Highlights,
}

impl UsageProfile {
    /// Invocation count of a single tool, zero when never used.
    pub fn tool_count(&self, name: &str) -> u64 {
        self.tools.get(name).copied().unwrap_or(0)
    }

    /// Sum of invocation counts over a set of tool names.
    pub fn tool_count_any(&self, names: &[&str]) -> u64 {
        names.iter().map(|n| self.tool_count(n)).sum()
    }

    pub fn goal_count(&self, category: &str) -> u64 {
        self.goals.get(category).copied().unwrap_or(0)
    }

    pub fn total_goals(&self) -> u64 {
        self.goals.values().fold(0, |acc, n| acc.saturating_add(*n))
    }

    /// Mean transcript duration in minutes.
    pub fn average_session_minutes(&self) -> f64 {
        if self.stats.sessions == 0 {
            return 0.0;
        }
        self.stats.hours * 60.0 / self.stats.sessions as f64
    }
}

/// The sole output of a run: a self-contained, JSON-serialisable snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    #[serde(flatten)]
    pub profile: UsageProfile,
    pub archetype: Archetype,
}

/// Treat an explicit `null` like a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn assistant_entry(message: Value) -> TranscriptEntry {
        serde_json::from_value(json!({
            "type": "assistant",
            "timestamp": "2024-03-01T10:00:00Z",
            "message": message,
        }))
        .unwrap()
    }

    #[test]
    fn test_history_entry_camel_case_session_id() {
        let entry: HistoryEntry = serde_json::from_value(json!({
            "display": "fix the login bug",
            "timestamp": 1_709_280_000_000i64,
            "project": "/home/dev/shop",
            "sessionId": "abc",
        }))
        .unwrap();
        assert_eq!(entry.session_id.as_deref(), Some("abc"));
        assert_eq!(entry.project.as_deref(), Some("/home/dev/shop"));
    }

    #[test]
    fn test_history_entry_missing_fields_default() {
        let entry: HistoryEntry = serde_json::from_value(json!({})).unwrap();
        assert!(entry.display.is_empty());
        assert!(entry.timestamp.is_none());
        assert!(entry.session_id.is_none());
    }

    #[test]
    fn test_history_entry_null_display_keeps_record() {
        let entry: HistoryEntry = serde_json::from_str(
            r#"{"display":null,"timestamp":1709251200000,"sessionId":"s1"}"#,
        )
        .unwrap();
        assert!(entry.display.is_empty());
        assert_eq!(entry.session_id.as_deref(), Some("s1"));
        assert!(entry.timestamp.is_some());
    }

    #[test]
    fn test_facet_null_categories_is_empty() {
        let facet: FacetData = serde_json::from_str(r#"{"goal_categories":null}"#).unwrap();
        assert!(facet.goal_categories.is_empty());
    }

    #[test]
    fn test_total_goals_saturates() {
        let mut profile = UsageProfile::default();
        profile.goals.insert("bug_fix".to_string(), u64::MAX);
        profile.goals.insert("feature".to_string(), 2);
        assert_eq!(profile.total_goals(), u64::MAX);
    }

    #[test]
    fn test_message_envelope_blocks() {
        let entry = assistant_entry(json!({
            "role": "assistant",
            "content": [
                {"type": "text", "text": "Running it"},
                {"type": "tool_use", "name": "Bash", "input": {"command": "ls"}},
            ]
        }));
        let blocks = entry.content_blocks();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].tool_name(), None);
        assert_eq!(blocks[1].tool_name(), Some("Bash"));
        assert_eq!(blocks[1].command(), Some("ls"));
    }

    #[test]
    fn test_message_encoded_as_string() {
        let inner = json!({
            "content": [{"type": "tool_use", "name": "Read", "input": {"file_path": "x"}}]
        })
        .to_string();
        let entry = assistant_entry(Value::String(inner));
        let blocks = entry.content_blocks();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].tool_name(), Some("Read"));
    }

    #[test]
    fn test_message_bare_block_list() {
        let entry = assistant_entry(json!([
            {"type": "tool_use", "name": "Grep", "input": {}}
        ]));
        assert_eq!(entry.content_blocks()[0].tool_name(), Some("Grep"));
    }

    #[test]
    fn test_message_text_content_has_no_blocks() {
        let entry = assistant_entry(json!({"content": "plain answer"}));
        assert!(entry.content_blocks().is_empty());
    }

    #[test]
    fn test_message_garbage_string_has_no_blocks() {
        let entry = assistant_entry(Value::String("{not json".to_string()));
        assert!(entry.content_blocks().is_empty());
    }

    #[test]
    fn test_message_unexpected_shape_is_tolerated() {
        let entry = assistant_entry(json!(42));
        assert!(entry.content_blocks().is_empty());
    }

    #[test]
    fn test_tool_use_without_name_is_not_a_tool() {
        let block: ContentBlock = serde_json::from_value(json!({"type": "tool_use"})).unwrap();
        assert_eq!(block.tool_name(), None);
    }

    #[test]
    fn test_is_commit_substring_match() {
        let commit: ContentBlock = serde_json::from_value(json!({
            "type": "tool_use", "name": "Bash", "input": {"command": "git commit -m \"x\""}
        }))
        .unwrap();
        let lint: ContentBlock = serde_json::from_value(json!({
            "type": "tool_use", "name": "Bash", "input": {"command": "git commit-msg-lint"}
        }))
        .unwrap();
        let status: ContentBlock = serde_json::from_value(json!({
            "type": "tool_use", "name": "Bash", "input": {"command": "git status"}
        }))
        .unwrap();
        let not_shell: ContentBlock = serde_json::from_value(json!({
            "type": "tool_use", "name": "Write", "input": {"command": "git commit"}
        }))
        .unwrap();
        assert!(commit.is_commit());
        assert!(lint.is_commit());
        assert!(!status.is_commit());
        assert!(!not_shell.is_commit());
    }

    #[test]
    fn test_entry_kind_predicates() {
        let user: TranscriptEntry = serde_json::from_value(json!({"type": "user"})).unwrap();
        let summary: TranscriptEntry = serde_json::from_value(json!({"type": "summary"})).unwrap();
        assert!(user.is_message());
        assert!(!user.is_assistant());
        assert!(!summary.is_message());
    }

    #[test]
    fn test_facet_data_partial_document() {
        let facet: FacetData = serde_json::from_value(json!({
            "goal_categories": {"bug_fix": 2, "data_analysis": 1},
            "outcome": "fully_achieved",
        }))
        .unwrap();
        assert_eq!(facet.goal_categories.get("bug_fix"), Some(&2));
        assert_eq!(facet.goal_categories.len(), 2);
        assert!(facet.session_type.is_none());
    }

    #[test]
    fn test_time_patterns_totals() {
        let mut patterns = TimePatterns::default();
        patterns.hourly.insert("23".to_string(), 4);
        patterns.hourly.insert("1".to_string(), 2);
        patterns.hourly.insert("14".to_string(), 6);
        assert_eq!(patterns.total_events(), 12);
        assert_eq!(patterns.events_in_hours(&[22, 23, 0, 1]), 6);
    }

    #[test]
    fn test_average_session_minutes_zero_sessions() {
        let profile = UsageProfile::default();
        assert_eq!(profile.average_session_minutes(), 0.0);
    }

    #[test]
    fn test_summary_serialises_flat_camel_case() {
        let summary = Summary {
            profile: UsageProfile::default(),
            archetype: Archetype::NightOwl,
        };
        let value = serde_json::to_value(&summary).unwrap();
        assert!(value.get("stats").is_some());
        assert!(value.get("timePatterns").is_some());
        assert!(value.get("projectCount").is_some());
        assert!(value["highlights"].get("longestStreak").is_some());
        assert_eq!(value["archetype"], "night_owl");
        assert!(value["highlights"]["leastUsedTool"].is_null());
    }
}
