//! Runtime values captured for crash reports.
//!
//! Rust has no reflection, so values that should appear in a report are
//! described explicitly: [`Value`] is the dynamic tree the formatter walks,
//! and the [`Describe`] trait converts application types into it. The
//! [`ValueFormatter`] then turns a `Value` into the bounded, redacted
//! [`FormattedValue`] stored in the report.

mod describe;
mod formatter;
mod redact;

use std::fmt;

pub use describe::Describe;
pub use formatter::{Entry, FormattedValue, ValueFormatter, ELISION_KEY, TRUNCATION_MARKER};
pub use redact::{
    is_sensitive_key, CompositeMatcher, RegexMatcher, SensitiveKeyMatcher, SubstringMatcher,
    DEFAULT_SENSITIVE_KEYS, REDACTED,
};

/// Key of a container entry: a positional index or a name.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Key {
    /// Position in an ordered sequence.
    Index(usize),
    /// Name in a keyed container.
    Name(String),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Index(index) => write!(f, "{}", index),
            Key::Name(name) => write!(f, "{}", name),
        }
    }
}

impl From<usize> for Key {
    fn from(index: usize) -> Self {
        Key::Index(index)
    }
}

impl From<&str> for Key {
    fn from(name: &str) -> Self {
        Key::Name(name.to_string())
    }
}

impl From<String> for Key {
    fn from(name: String) -> Self {
        Key::Name(name)
    }
}

/// A single named property of an [`Object`].
///
/// Reading a property may fail; the failure message is kept so the report
/// can show it inline instead of aborting.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    /// Property name.
    pub name: String,
    /// Property value, or the message of the failure that occurred reading it.
    pub value: Result<Value, String>,
}

/// A described object: a type name plus its properties in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct Object {
    /// Type name of the object.
    pub class: String,
    /// Properties, public or not.
    pub properties: Vec<Property>,
}

impl Object {
    /// Create an object description with no properties.
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            properties: Vec::new(),
        }
    }

    /// Add a property value.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.properties.push(Property {
            name: name.into(),
            value: Ok(value.into()),
        });
        self
    }

    /// Add a property whose read failed with `message`.
    pub fn with_error(mut self, name: impl Into<String>, message: impl Into<String>) -> Self {
        self.properties.push(Property {
            name: name.into(),
            value: Err(message.into()),
        });
        self
    }

    /// Add a property from the result of a fallible accessor.
    pub fn with_result<E: fmt::Display>(
        mut self,
        name: impl Into<String>,
        result: Result<Value, E>,
    ) -> Self {
        self.properties.push(Property {
            name: name.into(),
            value: result.map_err(|e| e.to_string()),
        });
        self
    }
}

/// Dynamically typed value captured from the running program.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Text.
    String(String),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean.
    Boolean(bool),
    /// Absence of a value.
    Null,
    /// Ordered or keyed container.
    Array(Vec<(Key, Value)>),
    /// Structured object with named properties.
    Object(Object),
    /// Opaque handle (file, socket, ...) that cannot be introspected.
    Resource {
        /// Descriptive kind label, e.g. `stream`.
        kind: String,
        /// Best-effort textual representation.
        repr: String,
    },
}

impl Value {
    /// Build an ordered sequence from values, keyed by position.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Value::Array(
            items
                .into_iter()
                .enumerate()
                .map(|(index, item)| (Key::Index(index), item.into()))
                .collect(),
        )
    }

    /// Build a keyed container from `(key, value)` pairs, preserving order.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<Key>,
        V: Into<Value>,
    {
        Value::Array(
            entries
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }

    /// Describe an opaque resource handle.
    pub fn resource(kind: impl Into<String>, repr: impl Into<String>) -> Self {
        Value::Resource {
            kind: kind.into(),
            repr: repr.into(),
        }
    }

    /// Whether this value holds child entries.
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Array(_) | Value::Object(_))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::Float(f64::from(value))
    }
}

macro_rules! impl_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::Integer(i64::from(value))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

// Values past `i64::MAX` become floats, like an overflowing integer would.
impl From<u64> for Value {
    fn from(value: u64) -> Self {
        match i64::try_from(value) {
            Ok(value) => Value::Integer(value),
            Err(_) => Value::Float(value as f64),
        }
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        Value::from(value as u64)
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_keys_by_position() {
        let value = Value::list(["a", "b"]);
        match value {
            Value::Array(entries) => {
                assert_eq!(entries[0].0, Key::Index(0));
                assert_eq!(entries[1], (Key::Index(1), Value::from("b")));
            }
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_map_preserves_order() {
        let value = Value::map([("zeta", 1), ("alpha", 2)]);
        let Value::Array(entries) = value else {
            panic!("expected array");
        };
        assert_eq!(entries[0].0, Key::Name("zeta".to_string()));
        assert_eq!(entries[1].0, Key::Name("alpha".to_string()));
    }

    #[test]
    fn test_option_conversion() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some(3)), Value::Integer(3));
    }

    #[test]
    fn test_large_unsigned_becomes_float() {
        assert_eq!(Value::from(i64::MAX as u64), Value::Integer(i64::MAX));
        assert_eq!(Value::from(u64::MAX), Value::Float(u64::MAX as f64));
        assert_eq!(Value::from(42usize), Value::Integer(42));
    }

    #[test]
    fn test_object_builder() {
        let object = Object::new("User")
            .with("name", "john")
            .with_error("orders", "lazy relation not loaded");

        assert_eq!(object.properties.len(), 2);
        assert!(object.properties[0].value.is_ok());
        assert_eq!(
            object.properties[1].value,
            Err("lazy relation not loaded".to_string())
        );
    }

    #[test]
    fn test_key_display() {
        assert_eq!(Key::Index(3).to_string(), "3");
        assert_eq!(Key::from("token").to_string(), "token");
    }
}
