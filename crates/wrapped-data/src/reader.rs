//! File discovery and tolerant JSON loading.
//!
//! The logs read here are appended to by a live process, so a truncated last
//! line or a half-written file is normal. Every public loader degrades to
//! "nothing read" instead of failing.

use std::io::BufRead;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use wrapped_core::error::{Result, WrappedError};

/// Directory name never descended into while scanning.
pub const EXCLUDED_DIR: &str = "node_modules";

/// Suffix of line-delimited JSON files.
pub const JSONL_SUFFIX: &str = ".jsonl";

/// Suffix of single-document JSON files.
pub const JSON_SUFFIX: &str = ".json";

// ── Discovery ─────────────────────────────────────────────────────────────────

/// Find every file under `root` whose name ends with `suffix`, sorted by path.
///
/// [`EXCLUDED_DIR`] subtrees are skipped and unreadable directories
/// contribute nothing.
pub fn find_files_with_suffix(root: &Path, suffix: &str) -> Vec<PathBuf> {
    scan(root, suffix, None)
}

/// Find all `.jsonl` files recursively under `root`, sorted by path.
pub fn find_jsonl_files(root: &Path) -> Vec<PathBuf> {
    find_files_with_suffix(root, JSONL_SUFFIX)
}

/// Find `.json` files directly inside `dir` (no recursion), sorted by path.
pub fn list_json_files(dir: &Path) -> Vec<PathBuf> {
    scan(dir, JSON_SUFFIX, Some(1))
}

fn scan(root: &Path, suffix: &str, max_depth: Option<usize>) -> Vec<PathBuf> {
    if !root.is_dir() {
        debug!("Scan root does not exist: {}", root.display());
        return Vec::new();
    }

    let mut walker = walkdir::WalkDir::new(root).follow_links(true);
    if let Some(depth) = max_depth {
        walker = walker.max_depth(depth);
    }

    let mut files: Vec<PathBuf> = walker
        .into_iter()
        .filter_entry(|entry| !(entry.file_type().is_dir() && entry.file_name() == EXCLUDED_DIR))
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(e) => {
                debug!("Skipping unreadable path: {}", e);
                None
            }
        })
        .filter(|entry| {
            entry.file_type().is_file()
                && entry
                    .file_name()
                    .to_str()
                    .map(|name| name.ends_with(suffix))
                    .unwrap_or(false)
        })
        .map(|entry| entry.into_path())
        .collect();

    files.sort();
    files
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parse every line of a JSONL file into `T`, in file order.
///
/// Blank lines and lines that do not deserialise are dropped. Only failing
/// to open the file is an error.
pub fn read_jsonl_strict<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    let file = std::fs::File::open(path).map_err(|source| WrappedError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let reader = std::io::BufReader::new(file);
    let mut records = Vec::new();
    let mut dropped = 0usize;

    // A failed read repeats on every later call (EISDIR, EIO): stop at the first.
    for line_result in reader.split(b'\n') {
        let line = match line_result {
            Ok(l) => l,
            Err(e) => {
                warn!("Stopped reading {}: {}", path.display(), e);
                break;
            }
        };
        let Ok(text) = std::str::from_utf8(&line) else {
            dropped += 1;
            debug!("Dropping non-UTF-8 line in {}", path.display());
            continue;
        };
        let trimmed = text.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(trimmed) {
            Ok(record) => records.push(record),
            Err(e) => {
                dropped += 1;
                debug!("Dropping malformed line in {}: {}", path.display(), e);
            }
        }
    }

    debug!(
        "File {}: {} records, {} dropped",
        path.display(),
        records.len(),
        dropped
    );

    Ok(records)
}

/// Tolerant variant of [`read_jsonl_strict`]: a missing or unreadable file
/// yields an empty list.
pub fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    match read_jsonl_strict(path) {
        Ok(records) => records,
        Err(WrappedError::FileRead { source, .. })
            if source.kind() == std::io::ErrorKind::NotFound =>
        {
            debug!("{} not found, treating as empty", path.display());
            Vec::new()
        }
        Err(e) => {
            warn!("{}", e);
            Vec::new()
        }
    }
}

/// Read one whole-file JSON document, `None` when absent or malformed.
pub fn read_json_file<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            debug!("Failed to read {}: {}", path.display(), e);
            return None;
        }
    };
    match serde_json::from_str(&content) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Failed to parse {}: {}", path.display(), e);
            None
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
