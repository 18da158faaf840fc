//! Severity levels of recoverable and fatal error signals.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Gravity of an error signal, ordered from least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Use of a feature scheduled for removal.
    Deprecated,
    /// Something unusual that is probably harmless.
    Notice,
    /// Something wrong that did not stop execution.
    Warning,
    /// A recoverable error raised by the application.
    Error,
    /// Failure while compiling code at run time.
    CompileError,
    /// Failure during runtime startup.
    CoreError,
    /// Input could not be parsed.
    Parse,
    /// Unrecoverable failure.
    Fatal,
}

impl Severity {
    /// Severities routed through the crash path when found at shutdown.
    pub const FATAL: [Severity; 4] = [
        Severity::Fatal,
        Severity::Parse,
        Severity::CoreError,
        Severity::CompileError,
    ];

    /// Returns true for the terminating kinds: fatal, parse, core and compile errors.
    pub fn is_fatal(self) -> bool {
        Self::FATAL.contains(&self)
    }

    /// Lowercase label, matching the configuration spelling.
    pub fn label(self) -> &'static str {
        match self {
            Severity::Deprecated => "deprecated",
            Severity::Notice => "notice",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::CompileError => "compile_error",
            Severity::CoreError => "core_error",
            Severity::Parse => "parse",
            Severity::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let severity = match s.to_lowercase().replace('-', "_").as_str() {
            "deprecated" => Severity::Deprecated,
            "notice" => Severity::Notice,
            "warning" => Severity::Warning,
            "error" => Severity::Error,
            "compile_error" => Severity::CompileError,
            "core_error" => Severity::CoreError,
            "parse" => Severity::Parse,
            "fatal" => Severity::Fatal,
            other => return Err(format!("unknown severity '{}'", other)),
        };
        Ok(severity)
    }
}
