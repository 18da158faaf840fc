//! Configuration for the crash handler.
//!
//! Options can be set programmatically through the builder methods or loaded
//! from a TOML file, with `CRASHGUARD__`-prefixed environment variables
//! overriding file values (e.g. `CRASHGUARD__MAX_STRING_LENGTH=500`).

use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::{CrashguardError, Result};
use crate::report::Severity;

/// Default cap on rendered string length, in characters.
pub const DEFAULT_MAX_STRING_LENGTH: usize = 1000;

/// Default number of container entries rendered before eliding the rest.
pub const DEFAULT_MAX_ENTRIES: usize = 10;

/// Default nesting depth at which value formatting stops descending.
pub const DEFAULT_MAX_DEPTH: usize = 8;

/// Options recognised by [`Crashguard`](crate::Crashguard).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrashguardConfig {
    /// Let the HTML page follow the viewer's light/dark preference.
    pub auto_detect_theme: bool,
    /// Include formatted call arguments in stack frames.
    pub show_arguments: bool,
    /// Reserved. Local variable capture is never performed.
    pub show_variables: bool,
    /// Replace values under sensitive keys with a redaction marker.
    pub redact_sensitive: bool,
    /// Strings longer than this many characters are truncated.
    pub max_string_length: usize,
    /// Force terminal (`true`) or HTML (`false`) output. `None` auto-detects.
    pub cli_mode: Option<bool>,
    /// Entries rendered per array or object before the elision marker.
    pub max_entries: usize,
    /// Nesting depth limit for value formatting.
    pub max_depth: usize,
    /// Extra substrings treated as sensitive on top of the built-in list.
    pub extra_sensitive_keys: Vec<String>,
    /// Recoverable signals below this severity are declined.
    pub report_threshold: Severity,
}

impl Default for CrashguardConfig {
    fn default() -> Self {
        Self {
            auto_detect_theme: true,
            show_arguments: true,
            show_variables: false,
            redact_sensitive: true,
            max_string_length: DEFAULT_MAX_STRING_LENGTH,
            cli_mode: None,
            max_entries: DEFAULT_MAX_ENTRIES,
            max_depth: DEFAULT_MAX_DEPTH,
            extra_sensitive_keys: Vec::new(),
            report_threshold: Severity::Deprecated,
        }
    }
}

impl CrashguardConfig {
    /// Create a configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set whether the HTML page follows the viewer's color scheme.
    pub fn with_auto_detect_theme(mut self, enabled: bool) -> Self {
        self.auto_detect_theme = enabled;
        self
    }

    /// Set whether call arguments are captured.
    pub fn with_show_arguments(mut self, enabled: bool) -> Self {
        self.show_arguments = enabled;
        self
    }

    /// Set the reserved variable-capture toggle.
    pub fn with_show_variables(mut self, enabled: bool) -> Self {
        self.show_variables = enabled;
        self
    }

    /// Set whether sensitive values are redacted.
    pub fn with_redact_sensitive(mut self, enabled: bool) -> Self {
        self.redact_sensitive = enabled;
        self
    }

    /// Set the string truncation length.
    pub fn with_max_string_length(mut self, length: usize) -> Self {
        self.max_string_length = length;
        self
    }

    /// Force or auto-detect terminal rendering.
    pub fn with_cli_mode(mut self, mode: Option<bool>) -> Self {
        self.cli_mode = mode;
        self
    }

    /// Set the per-container entry cap.
    pub fn with_max_entries(mut self, entries: usize) -> Self {
        self.max_entries = entries;
        self
    }

    /// Set the nesting depth limit.
    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }

    /// Add an extra sensitive key substring.
    pub fn with_sensitive_key(mut self, key: impl Into<String>) -> Self {
        self.extra_sensitive_keys.push(key.into());
        self
    }

    /// Set the minimum severity of recoverable signals that get reported.
    pub fn with_report_threshold(mut self, threshold: Severity) -> Self {
        self.report_threshold = threshold;
        self
    }

    /// Load configuration from a TOML file, applying `CRASHGUARD__` environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file does not exist or cannot be parsed.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use crashguard::CrashguardConfig;
    ///
    /// let config = CrashguardConfig::load("crashguard.toml")?;
    /// # Ok::<(), crashguard::CrashguardError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let path_str = path.to_string_lossy().to_string();

        if !path.exists() {
            return Err(CrashguardError::ConfigNotFound(path_str));
        }

        let config = Config::builder()
            .add_source(File::new(&path_str, FileFormat::Toml))
            .add_source(env_overrides())
            .build()?;

        let loaded: CrashguardConfig = config.try_deserialize()?;
        tracing::debug!(path = %path_str, "Loaded crashguard configuration");
        Ok(loaded)
    }

    /// Defaults with `CRASHGUARD__` environment overrides applied.
    pub fn from_env() -> Result<Self> {
        let config = Config::builder().add_source(env_overrides()).build()?;
        Ok(config.try_deserialize()?)
    }

    /// Parse configuration from a TOML string. Missing keys keep their defaults.
    pub fn from_toml_str(toml: &str) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

fn env_overrides() -> Environment {
    Environment::with_prefix("CRASHGUARD")
        .separator("__")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CrashguardConfig::default();
        assert!(config.auto_detect_theme);
        assert!(config.show_arguments);
        assert!(!config.show_variables);
        assert!(config.redact_sensitive);
        assert_eq!(config.max_string_length, 1000);
        assert_eq!(config.cli_mode, None);
        assert_eq!(config.max_entries, 10);
        assert_eq!(config.report_threshold, Severity::Deprecated);
    }

    #[test]
    fn test_builder() {
        let config = CrashguardConfig::new()
            .with_max_string_length(500)
            .with_cli_mode(Some(true))
            .with_redact_sensitive(false)
            .with_sensitive_key("ssn")
            .with_report_threshold(Severity::Warning);

        assert_eq!(config.max_string_length, 500);
        assert_eq!(config.cli_mode, Some(true));
        assert!(!config.redact_sensitive);
        assert_eq!(config.extra_sensitive_keys, vec!["ssn".to_string()]);
        assert_eq!(config.report_threshold, Severity::Warning);
    }

    #[test]
    fn test_from_toml_str_partial() {
        let config = CrashguardConfig::from_toml_str(
            r#"
            max_string_length = 500
            show_arguments = false
            report_threshold = "warning"
            "#,
        )
        .unwrap();

        assert_eq!(config.max_string_length, 500);
        assert!(!config.show_arguments);
        assert_eq!(config.report_threshold, Severity::Warning);
        // Untouched keys keep defaults
        assert!(config.redact_sensitive);
        assert_eq!(config.max_entries, 10);
    }

    #[test]
    fn test_from_toml_str_invalid() {
        let result = CrashguardConfig::from_toml_str("max_string_length = \"lots\"");
        assert!(matches!(result, Err(CrashguardError::Config(_))));
    }

    #[test]
    fn test_load_missing_file() {
        let result = CrashguardConfig::load("/nonexistent/crashguard.toml");
        assert!(matches!(result, Err(CrashguardError::ConfigNotFound(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("crashguard.toml");
        std::fs::write(
            &path,
            "cli_mode = false\nextra_sensitive_keys = [\"ssn\", \"iban\"]\n",
        )
        .unwrap();

        let config = CrashguardConfig::load(&path).unwrap();
        assert_eq!(config.cli_mode, Some(false));
        assert_eq!(config.extra_sensitive_keys, vec!["ssn", "iban"]);
    }
}
