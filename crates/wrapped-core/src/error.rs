use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the wrapped crates.
///
/// The analysis pipeline itself never fails; these variants surface from the
/// strict readers and from configuration resolution, and are downgraded to
/// "contributes nothing" by the tolerant callers.
#[derive(Error, Debug)]
pub enum WrappedError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A timezone name is not a recognised IANA identifier.
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenience alias used throughout the wrapped crates.
pub type Result<T> = std::result::Result<T, WrappedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_file_read() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = WrappedError::FileRead {
            path: PathBuf::from("/some/history.jsonl"),
            source: io_err,
        };
        let msg = err.to_string();
        assert!(msg.contains("Failed to read file"));
        assert!(msg.contains("/some/history.jsonl"));
        assert!(msg.contains("no such file"));
    }

    #[test]
    fn test_error_display_invalid_timezone() {
        let err = WrappedError::InvalidTimezone("Mars/Olympus".to_string());
        assert_eq!(err.to_string(), "Invalid timezone: Mars/Olympus");
    }

    #[test]
    fn test_error_display_config() {
        let err = WrappedError::Config("output path is a directory".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration error: output path is a directory"
        );
    }
}
