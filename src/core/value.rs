//! The tagged value type flowing through the merge and validation pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// A key-value mapping produced by one configuration source.
pub type RawMapping = BTreeMap<String, ConfigValue>;

/// A single configuration value.
///
/// Scalars are what environment variables and schemas deal in. Lists and maps
/// are preserved from the file as-is; merging never descends into them.
///
/// # Examples
///
/// ```rust
/// use strata_config::core::ConfigValue;
///
/// let port = ConfigValue::from(3000);
/// assert_eq!(port.as_i64(), Some(3000));
/// assert_eq!(port.to_string(), "3000");
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
    /// An explicit null (`null` in JSON, `~` or an empty value in YAML)
    Null,
    /// A boolean
    Bool(bool),
    /// An integral number
    Integer(i64),
    /// A floating point number
    Float(f64),
    /// A string
    String(String),
    /// A sequence
    List(Vec<ConfigValue>),
    /// A nested mapping
    Map(RawMapping),
}

impl ConfigValue {
    /// Name of this value's kind, as used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) | Self::Float(_) => "number",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
        }
    }

    /// Returns `true` for [`ConfigValue::Null`].
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The string contents, if this is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// The boolean value, if this is a boolean.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer value, if this is an integer or a float with no fractional part.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Integer(n) => Some(*n),
            Self::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            _ => None,
        }
    }

    /// The numeric value, if this is a number.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(n) => Some(*n as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Equality that treats `3` and `3.0` as the same number.
    pub fn same_value(&self, other: &ConfigValue) -> bool {
        match (self, other) {
            (Self::Integer(_) | Self::Float(_), Self::Integer(_) | Self::Float(_)) => {
                self.as_f64() == other.as_f64()
            }
            _ => self == other,
        }
    }
}

impl fmt::Display for ConfigValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(n) => write!(f, "{}", n),
            Self::Float(x) => write!(f, "{}", x),
            Self::String(s) => write!(f, "{:?}", s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Self::Map(map) => {
                f.write_str("{")?;
                for (i, (key, value)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", key, value)?;
                }
                f.write_str("}")
            }
        }
    }
}

impl From<bool> for ConfigValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for ConfigValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<i32> for ConfigValue {
    fn from(value: i32) -> Self {
        Self::Integer(value.into())
    }
}

impl From<u16> for ConfigValue {
    fn from(value: u16) -> Self {
        Self::Integer(value.into())
    }
}

impl From<f64> for ConfigValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ConfigValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl<T: Into<ConfigValue>> From<Vec<T>> for ConfigValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_untagged_deserialize_from_json() {
        let value: ConfigValue =
            serde_json::from_str(r#"{"a": 1, "b": 1.5, "c": "x", "d": true, "e": null, "f": [1]}"#)
                .unwrap();

        let ConfigValue::Map(map) = value else {
            panic!("expected a map");
        };
        assert_eq!(map["a"], ConfigValue::Integer(1));
        assert_eq!(map["b"], ConfigValue::Float(1.5));
        assert_eq!(map["c"], ConfigValue::from("x"));
        assert_eq!(map["d"], ConfigValue::Bool(true));
        assert_eq!(map["e"], ConfigValue::Null);
        assert_eq!(map["f"], ConfigValue::List(vec![ConfigValue::Integer(1)]));
    }

    #[test]
    fn test_same_value_compares_numbers_numerically() {
        assert!(ConfigValue::Integer(3).same_value(&ConfigValue::Float(3.0)));
        assert!(!ConfigValue::Integer(3).same_value(&ConfigValue::Float(3.5)));
        assert!(!ConfigValue::from("3").same_value(&ConfigValue::Integer(3)));
    }

    #[test]
    fn test_display() {
        assert_eq!(ConfigValue::from("dev").to_string(), "\"dev\"");
        assert_eq!(ConfigValue::from(vec![1, 2]).to_string(), "[1, 2]");
        assert_eq!(ConfigValue::Null.to_string(), "null");
    }

    #[test]
    fn test_as_i64_accepts_integral_floats() {
        assert_eq!(ConfigValue::Float(4000.0).as_i64(), Some(4000));
        assert_eq!(ConfigValue::Float(4000.5).as_i64(), None);
    }
}
