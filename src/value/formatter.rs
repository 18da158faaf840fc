//! Bounded, redacted rendering of [`Value`] trees.

use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::{json, Map};

use super::redact::{SensitiveKeyMatcher, SubstringMatcher, REDACTED};
use super::{Key, Object, Value};
use crate::config::{
    CrashguardConfig, DEFAULT_MAX_DEPTH, DEFAULT_MAX_ENTRIES, DEFAULT_MAX_STRING_LENGTH,
};

/// Appended to strings cut at the configured length.
pub const TRUNCATION_MARKER: &str = "... (truncated)";

/// Key of the entry that stands in for elided container entries.
pub const ELISION_KEY: &str = "...";

/// Rendered in place of containers nested deeper than the depth limit.
pub const DEPTH_MARKER: &str = "[MAX DEPTH]";

/// One entry of a formatted array or object.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    /// A formatted child value.
    Value(FormattedValue),
    /// Value withheld because its key is sensitive.
    Redacted,
    /// Stand-in for the given number of entries past the display cap.
    Elided(usize),
    /// Reading the property failed with this message.
    Error(String),
    /// Nested container beyond the depth limit.
    DepthLimit,
}

impl Entry {
    /// Text of a marker entry, `None` for formatted values.
    pub fn marker(&self) -> Option<String> {
        match self {
            Entry::Value(_) => None,
            Entry::Redacted => Some(REDACTED.to_string()),
            Entry::Elided(remaining) => Some(format!("({} more items)", remaining)),
            Entry::Error(message) => Some(format!("[ERROR: {}]", message)),
            Entry::DepthLimit => Some(DEPTH_MARKER.to_string()),
        }
    }

    /// JSON shape of the entry: a typed object for values, a string for markers.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Entry::Value(value) => value.to_json(),
            other => serde_json::Value::String(other.marker().unwrap_or_default()),
        }
    }
}

/// Display-ready value with truncation, elision and redaction applied.
#[derive(Debug, Clone, PartialEq)]
pub enum FormattedValue {
    /// Possibly truncated text.
    String {
        /// Text as displayed, including the truncation marker when cut.
        value: String,
        /// Character count of the original text.
        length: usize,
    },
    /// Integer, passed through.
    Integer(i64),
    /// Float, passed through.
    Float(f64),
    /// Boolean, passed through.
    Boolean(bool),
    /// Null.
    Null,
    /// Container with its full entry count and the displayed entries.
    Array {
        /// Number of entries in the original container.
        count: usize,
        /// Displayed entries, in order.
        entries: Vec<(String, Entry)>,
    },
    /// Object with its type name and displayed properties.
    Object {
        /// Type name of the object.
        class: String,
        /// Displayed properties, in order.
        entries: Vec<(String, Entry)>,
    },
    /// Opaque handle.
    Resource {
        /// Descriptive kind label.
        kind: String,
        /// Best-effort textual representation.
        repr: String,
    },
}

impl FormattedValue {
    /// Type tag shown next to the value.
    pub fn type_name(&self) -> &'static str {
        match self {
            FormattedValue::String { .. } => "string",
            FormattedValue::Integer(_) => "integer",
            FormattedValue::Float(_) => "float",
            FormattedValue::Boolean(_) => "boolean",
            FormattedValue::Null => "null",
            FormattedValue::Array { .. } => "array",
            FormattedValue::Object { .. } => "object",
            FormattedValue::Resource { .. } => "resource",
        }
    }

    /// The displayed value without its type tag.
    pub fn value_json(&self) -> serde_json::Value {
        match self {
            FormattedValue::String { value, .. } => json!(value),
            FormattedValue::Integer(i) => json!(i),
            FormattedValue::Float(f) => json!(f),
            FormattedValue::Boolean(b) => json!(b),
            FormattedValue::Null => serde_json::Value::Null,
            FormattedValue::Array { entries, .. } | FormattedValue::Object { entries, .. } => {
                entries_to_json(entries)
            }
            FormattedValue::Resource { repr, .. } => json!(repr),
        }
    }

    /// Full JSON shape: `type`, `value` and per-type extras.
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = Map::new();
        object.insert("type".to_string(), json!(self.type_name()));
        match self {
            FormattedValue::String { length, .. } => {
                object.insert("length".to_string(), json!(length));
            }
            FormattedValue::Array { count, .. } => {
                object.insert("count".to_string(), json!(count));
            }
            FormattedValue::Object { class, .. } => {
                object.insert("class".to_string(), json!(class));
            }
            FormattedValue::Resource { kind, .. } => {
                object.insert("resource_type".to_string(), json!(kind));
            }
            _ => {}
        }
        object.insert("value".to_string(), self.value_json());
        serde_json::Value::Object(object)
    }

    /// Displayed text if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormattedValue::String { value, .. } => Some(value),
            _ => None,
        }
    }

    /// Displayed entries if this is an array or object.
    pub fn entries(&self) -> Option<&[(String, Entry)]> {
        match self {
            FormattedValue::Array { entries, .. } | FormattedValue::Object { entries, .. } => {
                Some(entries)
            }
            _ => None,
        }
    }
}

impl Serialize for FormattedValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

fn entries_to_json(entries: &[(String, Entry)]) -> serde_json::Value {
    let map: Map<String, serde_json::Value> = entries
        .iter()
        .map(|(key, entry)| (key.clone(), entry.to_json()))
        .collect();
    serde_json::Value::Object(map)
}

/// Formats values under string, entry and depth limits, redacting sensitive keys.
#[derive(Debug, Clone)]
pub struct ValueFormatter {
    max_string_length: usize,
    max_entries: usize,
    max_depth: usize,
    redact: bool,
    matcher: Arc<dyn SensitiveKeyMatcher>,
}

impl Default for ValueFormatter {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueFormatter {
    /// Create a formatter with default limits and the built-in sensitive keys.
    pub fn new() -> Self {
        Self {
            max_string_length: DEFAULT_MAX_STRING_LENGTH,
            max_entries: DEFAULT_MAX_ENTRIES,
            max_depth: DEFAULT_MAX_DEPTH,
            redact: true,
            matcher: Arc::new(SubstringMatcher::default()),
        }
    }

    /// Create a formatter from configuration and a key matcher.
    pub fn from_config(config: &CrashguardConfig, matcher: Arc<dyn SensitiveKeyMatcher>) -> Self {
        Self {
            max_string_length: config.max_string_length,
            max_entries: config.max_entries,
            max_depth: config.max_depth,
            redact: config.redact_sensitive,
            matcher,
        }
    }

    /// Set the string truncation length.
    pub fn with_max_string_length(mut self, length: usize) -> Self {
        self.max_string_length = length;
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

    /// Enable or disable redaction.
    pub fn with_redaction(mut self, enabled: bool) -> Self {
        self.redact = enabled;
        self
    }

    /// Use a different sensitive key matcher.
    pub fn with_matcher(mut self, matcher: Arc<dyn SensitiveKeyMatcher>) -> Self {
        self.matcher = matcher;
        self
    }

    /// Whether values under `key` would be redacted.
    pub fn is_sensitive_key(&self, key: &str) -> bool {
        self.redact && self.matcher.is_sensitive(key)
    }

    /// Format a value for display.
    pub fn format(&self, value: &Value) -> FormattedValue {
        self.format_at(value, 0)
    }

    /// Format each argument of a call.
    pub fn format_arguments(&self, args: &[Value]) -> Vec<FormattedValue> {
        args.iter().map(|arg| self.format(arg)).collect()
    }

    /// Cut `text` to the length limit, returning the displayed text and the original length.
    pub fn truncate(&self, text: &str) -> (String, usize) {
        let length = text.chars().count();
        if length <= self.max_string_length {
            return (text.to_string(), length);
        }
        let mut truncated: String = text.chars().take(self.max_string_length).collect();
        truncated.push_str(TRUNCATION_MARKER);
        (truncated, length)
    }

    fn format_at(&self, value: &Value, depth: usize) -> FormattedValue {
        match value {
            Value::String(text) => {
                let (value, length) = self.truncate(text);
                FormattedValue::String { value, length }
            }
            Value::Integer(i) => FormattedValue::Integer(*i),
            Value::Float(f) => FormattedValue::Float(*f),
            Value::Boolean(b) => FormattedValue::Boolean(*b),
            Value::Null => FormattedValue::Null,
            Value::Array(items) => FormattedValue::Array {
                count: items.len(),
                entries: self.format_array(items, depth),
            },
            Value::Object(object) => FormattedValue::Object {
                class: object.class.clone(),
                entries: self.format_object(object, depth),
            },
            Value::Resource { kind, repr } => FormattedValue::Resource {
                kind: kind.clone(),
                repr: repr.clone(),
            },
        }
    }

    fn format_array(&self, items: &[(Key, Value)], depth: usize) -> Vec<(String, Entry)> {
        let mut entries = Vec::with_capacity(items.len().min(self.max_entries) + 1);

        for (key, item) in items.iter().take(self.max_entries) {
            let name = key.to_string();
            let entry = match key {
                Key::Name(name) if self.is_sensitive_key(name) => Entry::Redacted,
                _ => self.format_child(item, depth),
            };
            entries.push((name, entry));
        }

        if items.len() > self.max_entries {
            entries.push((
                ELISION_KEY.to_string(),
                Entry::Elided(items.len() - self.max_entries),
            ));
        }

        entries
    }

    fn format_object(&self, object: &Object, depth: usize) -> Vec<(String, Entry)> {
        let properties = &object.properties;
        let mut entries = Vec::with_capacity(properties.len().min(self.max_entries) + 1);

        for property in properties.iter().take(self.max_entries) {
            let entry = if self.is_sensitive_key(&property.name) {
                Entry::Redacted
            } else {
                match &property.value {
                    Ok(value) => self.format_child(value, depth),
                    Err(message) => {
                        tracing::warn!(
                            class = %object.class,
                            property = %property.name,
                            error = %message,
                            "Property read failed while formatting value"
                        );
                        Entry::Error(message.clone())
                    }
                }
            };
            entries.push((property.name.clone(), entry));
        }

        if properties.len() > self.max_entries {
            entries.push((
                ELISION_KEY.to_string(),
                Entry::Elided(properties.len() - self.max_entries),
            ));
        }

        entries
    }

    fn format_child(&self, value: &Value, depth: usize) -> Entry {
        if value.is_container() && depth + 1 > self.max_depth {
            return Entry::DepthLimit;
        }
        Entry::Value(self.format_at(value, depth + 1))
    }
}
