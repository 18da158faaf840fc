//! Error types for crashguard.
//!
//! The crash path itself never returns these: anything that goes wrong while
//! a report is being built is folded into the report as an inline marker.
//! They surface only from setup operations such as loading configuration or
//! compiling custom redaction patterns.

use thiserror::Error;

/// Errors raised while configuring or driving crashguard.
#[derive(Error, Debug)]
pub enum CrashguardError {
    /// Configuration could not be loaded or deserialized.
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// The configuration file does not exist.
    #[error("Configuration file not found: {0}")]
    ConfigNotFound(String),

    /// IO error while writing a report.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A custom sensitive-key pattern failed to compile.
    #[error("Invalid sensitive key pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}

/// Result type for crashguard operations.
pub type Result<T> = std::result::Result<T, CrashguardError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_display() {
        let err = CrashguardError::ConfigNotFound("crashguard.toml".to_string());
        assert_eq!(
            err.to_string(),
            "Configuration file not found: crashguard.toml"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err: CrashguardError = io.into();
        assert!(matches!(err, CrashguardError::Io(_)));
        assert!(err.to_string().contains("pipe closed"));
    }

    #[test]
    fn test_pattern_error_conversion() {
        let err: CrashguardError = regex::Regex::new("(unclosed").unwrap_err().into();
        assert!(matches!(err, CrashguardError::InvalidPattern(_)));
    }
}
