use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;
use tracing::debug;

/// Directory name that never counts as a project.
pub const EXCLUDED_PROJECT: &str = ".claude";

// ── TimestampProcessor ────────────────────────────────────────────────────────

/// Parses timestamps from the variety of formats found in the log files.
pub struct TimestampProcessor;

impl TimestampProcessor {
    /// Parse a transcript timestamp into a UTC [`DateTime`].
    ///
    /// Handles:
    /// * `null`       → `None`
    /// * JSON string  → ISO 8601 / RFC 3339 (including `Z`-suffix) or common
    ///   naive date-time patterns, read as UTC.
    /// * JSON number  → Unix timestamp in seconds.
    pub fn parse(value: &Value) -> Option<DateTime<Utc>> {
        match value {
            Value::Null => None,
            Value::String(s) => Self::parse_str(s.as_str()),
            Value::Number(n) => {
                if let Some(secs) = n.as_i64() {
                    DateTime::from_timestamp(secs, 0)
                } else if let Some(f) = n.as_f64() {
                    let secs = f.trunc() as i64;
                    let nanos = (f.fract() * 1_000_000_000.0).round() as u32;
                    DateTime::from_timestamp(secs, nanos)
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Parse a history timestamp given in epoch milliseconds.
    ///
    /// Integers, floats and numeric strings are accepted; negative values
    /// and anything else yield `None`.
    pub fn parse_epoch_millis(value: &Value) -> Option<DateTime<Utc>> {
        let millis = match value {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))?,
            Value::String(s) => s.trim().parse::<i64>().ok()?,
            _ => return None,
        };
        if millis < 0 {
            return None;
        }
        DateTime::from_timestamp_millis(millis)
    }

    fn parse_str(s: &str) -> Option<DateTime<Utc>> {
        if s.is_empty() {
            return None;
        }

        // Replace trailing 'Z' with '+00:00' for RFC 3339 compatibility.
        let normalised = if let Some(stripped) = s.strip_suffix('Z') {
            format!("{}+00:00", stripped)
        } else {
            s.to_string()
        };

        if let Ok(dt) = DateTime::parse_from_rfc3339(&normalised) {
            return Some(dt.with_timezone(&Utc));
        }

        const FORMATS: &[&str] = &[
            "%Y-%m-%dT%H:%M:%S%.f",
            "%Y-%m-%dT%H:%M:%S",
            "%Y-%m-%d %H:%M:%S%.f",
            "%Y-%m-%d %H:%M:%S",
        ];

        for fmt in FORMATS {
            if let Ok(naive) = chrono::NaiveDateTime::parse_from_str(s, fmt) {
                return Some(Utc.from_utc_datetime(&naive));
            }
        }

        debug!(
            "TimestampProcessor: could not parse timestamp string \"{}\"",
            s
        );
        None
    }
}

// ── Project names ─────────────────────────────────────────────────────────────

/// Reduce a project path to its final segment.
///
/// Both `/` and `\` separators are understood and trailing separators are
/// ignored. Returns `None` for empty results and for [`EXCLUDED_PROJECT`].
pub fn normalize_project_name(path: &str) -> Option<String> {
    let segment = path
        .split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .last()?;
    if segment == EXCLUDED_PROJECT {
        return None;
    }
    Some(segment.to_string())
}

/// Encode a project path the way transcript directories are named: every
/// character outside `[A-Za-z0-9]` becomes `-`.
pub fn encode_project_path(path: &str) -> String {
    path.trim_end_matches(['/', '\\'])
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect()
}

/// Best-effort display name for an encoded transcript directory when no
/// history path maps to it: the text after the last `-`.
pub fn decode_project_dir(encoded: &str) -> Option<String> {
    let tail = encoded.rsplit('-').find(|s| !s.is_empty())?;
    if tail == "claude" && encoded.ends_with("--claude") {
        return None;
    }
    Some(tail.to_string())
}
