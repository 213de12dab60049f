use chrono_tz::Tz;
use clap::Parser;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{Result, WrappedError};
use crate::time_utils::resolve_timezone;

/// File holding one JSON history record per prompt.
pub const HISTORY_FILE: &str = "history.jsonl";
/// Directory holding per-session transcripts, one subdirectory per project.
pub const PROJECTS_DIR: &str = "projects";
/// Directory holding optional facet files, relative to the config root.
pub const FACETS_DIR: &[&str] = &["usage-data", "facets"];

// ── Settings (CLI) ─────────────────────────────────────────────────────────────

/// Summarise local Claude usage logs into a year-in-review profile
#[derive(Parser, Debug, Clone)]
#[command(
    name = "claude-wrapped",
    about = "Summarise local Claude usage logs into a year-in-review profile",
    version
)]
pub struct Settings {
    /// Claude configuration directory (defaults to ~/.claude)
    #[arg(long, env = "CLAUDE_CONFIG_DIR")]
    pub claude_dir: Option<PathBuf>,

    /// Timezone used for hour, weekday and date buckets (auto-detected if not specified)
    #[arg(long, default_value = "auto")]
    pub timezone: String,

    /// Write the summary to this file instead of stdout
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Pretty-print the JSON summary
    #[arg(long)]
    pub pretty: bool,

    /// Logging level
    #[arg(long, default_value = "WARNING", value_parser = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL"])]
    pub log_level: String,

    /// Log file path
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long)]
    pub debug: bool,
}

impl Settings {
    /// Parse CLI arguments and apply the `--debug` override.
    pub fn load() -> Self {
        Self::load_from_args(std::env::args_os())
    }

    /// Same as [`Settings::load`] but accepts an explicit argument list.
    pub fn load_from_args<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let mut settings = Settings::parse_from(args);
        if settings.debug {
            settings.log_level = "DEBUG".to_string();
        }
        settings
    }

    /// Resolve the configuration root: `--claude-dir` when given, otherwise
    /// `~/.claude`.
    pub fn resolve_claude_dir(&self) -> PathBuf {
        if let Some(dir) = &self.claude_dir {
            return dir.clone();
        }
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(".claude")
    }

    /// Build the [`AnalysisConfig`] for this run.
    ///
    /// An unknown timezone is not fatal: it is logged and UTC is used.
    pub fn analysis_config(&self) -> AnalysisConfig {
        let tz = resolve_timezone(&self.timezone).unwrap_or_else(|e| {
            warn!("{}, falling back to UTC", e);
            Tz::UTC
        });
        AnalysisConfig::new(self.resolve_claude_dir(), tz)
    }

    /// Reject an `--output` that points at an existing directory.
    pub fn validate(&self) -> Result<()> {
        if let Some(out) = &self.output {
            if out.is_dir() {
                return Err(WrappedError::Config(format!(
                    "output path {} is a directory",
                    out.display()
                )));
            }
        }
        Ok(())
    }
}

// ── AnalysisConfig ─────────────────────────────────────────────────────────────

/// Everything the analysis pipeline needs to know about its inputs.
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Configuration root containing history, transcripts and facets.
    pub claude_dir: PathBuf,
    /// Timezone for local-time bucketing.
    pub tz: Tz,
}

impl AnalysisConfig {
    pub fn new(claude_dir: impl Into<PathBuf>, tz: Tz) -> Self {
        Self {
            claude_dir: claude_dir.into(),
            tz,
        }
    }

    pub fn history_path(&self) -> PathBuf {
        self.claude_dir.join(HISTORY_FILE)
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.claude_dir.join(PROJECTS_DIR)
    }

    pub fn facets_dir(&self) -> PathBuf {
        FACETS_DIR
            .iter()
            .fold(self.claude_dir.clone(), |acc, part| acc.join(part))
    }

    pub fn root(&self) -> &Path {
        &self.claude_dir
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────
