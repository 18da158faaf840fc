//! Conversion of application types into [`Value`] trees.

use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::{Path, PathBuf};

use super::{Key, Value};

/// Types that can describe themselves for inclusion in a crash report.
///
/// Implement this for domain types passed as call arguments so that their
/// fields show up (and get redacted) in the report:
///
/// ```
/// use crashguard::{Describe, Object, Value};
///
/// struct Credentials {
///     user: String,
///     password: String,
/// }
///
/// impl Describe for Credentials {
///     fn describe(&self) -> Value {
///         Object::new("Credentials")
///             .with("user", self.user.as_str())
///             .with("password", self.password.as_str())
///             .into()
///     }
/// }
/// ```
pub trait Describe {
    /// Describe `self` as a dynamic value.
    fn describe(&self) -> Value;
}

impl<T: Describe + ?Sized> Describe for &T {
    fn describe(&self) -> Value {
        (**self).describe()
    }
}

impl<T: Describe + ?Sized> Describe for Box<T> {
    fn describe(&self) -> Value {
        (**self).describe()
    }
}

impl Describe for Value {
    fn describe(&self) -> Value {
        self.clone()
    }
}

impl Describe for str {
    fn describe(&self) -> Value {
        Value::String(self.to_string())
    }
}

impl Describe for String {
    fn describe(&self) -> Value {
        Value::String(self.clone())
    }
}

impl Describe for bool {
    fn describe(&self) -> Value {
        Value::Boolean(*self)
    }
}

macro_rules! impl_describe_via_from {
    ($($t:ty),*) => {
        $(
            impl Describe for $t {
                fn describe(&self) -> Value {
                    Value::from(*self)
                }
            }
        )*
    };
}

impl_describe_via_from!(i8, i16, i32, i64, u8, u16, u32, u64, usize, f32, f64);

impl Describe for () {
    fn describe(&self) -> Value {
        Value::Null
    }
}

impl<T: Describe> Describe for Option<T> {
    fn describe(&self) -> Value {
        self.as_ref().map_or(Value::Null, Describe::describe)
    }
}

impl<T: Describe> Describe for [T] {
    fn describe(&self) -> Value {
        Value::Array(
            self.iter()
                .enumerate()
                .map(|(index, item)| (Key::Index(index), item.describe()))
                .collect(),
        )
    }
}

impl<T: Describe, const N: usize> Describe for [T; N] {
    fn describe(&self) -> Value {
        self.as_slice().describe()
    }
}

impl<T: Describe> Describe for Vec<T> {
    fn describe(&self) -> Value {
        self.as_slice().describe()
    }
}

impl<K: AsRef<str>, V: Describe> Describe for BTreeMap<K, V> {
    fn describe(&self) -> Value {
        Value::Array(
            self.iter()
                .map(|(key, value)| (Key::Name(key.as_ref().to_string()), value.describe()))
                .collect(),
        )
    }
}

impl<K: AsRef<str>, V: Describe, S> Describe for HashMap<K, V, S> {
    /// Entries are sorted by key so repeated captures render identically.
    fn describe(&self) -> Value {
        let mut entries: Vec<(Key, Value)> = self
            .iter()
            .map(|(key, value)| (Key::Name(key.as_ref().to_string()), value.describe()))
            .collect();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        Value::Array(entries)
    }
}

impl Describe for serde_json::Value {
    fn describe(&self) -> Value {
        match self {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Boolean(*b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s.clone()),
            serde_json::Value::Array(items) => items.describe(),
            serde_json::Value::Object(map) => Value::Array(
                map.iter()
                    .map(|(key, value)| (Key::Name(key.clone()), value.describe()))
                    .collect(),
            ),
        }
    }
}

impl Describe for Path {
    fn describe(&self) -> Value {
        Value::String(self.display().to_string())
    }
}

impl Describe for PathBuf {
    fn describe(&self) -> Value {
        self.as_path().describe()
    }
}

impl Describe for File {
    fn describe(&self) -> Value {
        Value::resource("stream", format!("{:?}", self))
    }
}
