//! Sensitive key detection.
//!
//! Matching is a heuristic: a key is sensitive when its lowercase form
//! contains any configured substring. This produces known false positives
//! (`monkey` contains `key`, `author` contains `auth`). Callers needing
//! something stricter can plug in their own [`SensitiveKeyMatcher`].

use std::fmt::Debug;
use std::sync::Arc;

use regex::{Regex, RegexBuilder};

use crate::error::Result;

/// Placeholder rendered in place of a sensitive value.
pub const REDACTED: &str = "[REDACTED]";

/// Substrings that mark a key as sensitive.
pub const DEFAULT_SENSITIVE_KEYS: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "key",
    "token",
    "auth",
    "api_key",
    "apikey",
    "private",
    "credential",
    "session",
];

/// Decides whether values stored under a key must be redacted.
pub trait SensitiveKeyMatcher: Send + Sync + Debug {
    /// Returns true if values stored under `key` must not be displayed.
    fn is_sensitive(&self, key: &str) -> bool;
}

/// Case-insensitive substring matcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubstringMatcher {
    patterns: Vec<String>,
}

impl Default for SubstringMatcher {
    fn default() -> Self {
        Self::new(DEFAULT_SENSITIVE_KEYS.iter().copied())
    }
}

impl SubstringMatcher {
    /// Create a matcher from an explicit list of substrings.
    pub fn new<I, S>(patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            patterns: patterns
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// The built-in list extended with `extra` substrings.
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut matcher = Self::default();
        for pattern in extra {
            let pattern = pattern.as_ref().to_lowercase();
            if !pattern.is_empty() && !matcher.patterns.contains(&pattern) {
                matcher.patterns.push(pattern);
            }
        }
        matcher
    }

    /// The substrings this matcher checks, lowercased.
    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }
}

impl SensitiveKeyMatcher for SubstringMatcher {
    fn is_sensitive(&self, key: &str) -> bool {
        let key = key.to_lowercase();
        self.patterns.iter().any(|p| key.contains(p.as_str()))
    }
}

/// Case-insensitive regular expression matcher.
#[derive(Debug, Clone)]
pub struct RegexMatcher {
    patterns: Vec<Regex>,
}

impl RegexMatcher {
    /// Compile `patterns`; a key is sensitive if any of them matches.
    ///
    /// # Errors
    ///
    /// Returns [`CrashguardError::InvalidPattern`](crate::CrashguardError::InvalidPattern)
    /// if a pattern fails to compile.
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let patterns = patterns
            .into_iter()
            .map(|p| RegexBuilder::new(p.as_ref()).case_insensitive(true).build())
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }
}

impl SensitiveKeyMatcher for RegexMatcher {
    fn is_sensitive(&self, key: &str) -> bool {
        self.patterns.iter().any(|re| re.is_match(key))
    }
}

/// Sensitive when any of the inner matchers says so.
#[derive(Debug, Clone, Default)]
pub struct CompositeMatcher {
    matchers: Vec<Arc<dyn SensitiveKeyMatcher>>,
}

impl CompositeMatcher {
    /// Create an empty composite (matches nothing).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a matcher.
    pub fn with(mut self, matcher: impl SensitiveKeyMatcher + 'static) -> Self {
        self.matchers.push(Arc::new(matcher));
        self
    }
}

impl SensitiveKeyMatcher for CompositeMatcher {
    fn is_sensitive(&self, key: &str) -> bool {
        self.matchers.iter().any(|m| m.is_sensitive(key))
    }
}

/// Check `key` against the built-in sensitive substrings.
pub fn is_sensitive_key(key: &str) -> bool {
    let key = key.to_lowercase();
    DEFAULT_SENSITIVE_KEYS.iter().any(|p| key.contains(p))
}
