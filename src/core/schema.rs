//! Declarative schema describing the expected configuration keys.

use crate::core::ConfigValue;
use crate::error::{ConfigError, Result};
use crate::sources::Format;
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// The type a schema field is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueType {
    /// Any string
    String,
    /// An integer or floating point number
    Number,
    /// `true` or `false`
    Boolean,
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// Descriptor for a single schema field.
///
/// # Examples
///
/// ```rust
/// use strata_config::core::FieldSpec;
///
/// let node_env = FieldSpec::string()
///     .allowed(["development", "production"])
///     .default_value("development");
/// assert!(!node_env.is_required());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FieldSpec {
    /// The declared type
    #[serde(rename = "type")]
    pub value_type: ValueType,
    /// Whether a value must be present when there is no default
    #[serde(default)]
    pub required: bool,
    /// Value populated when no source supplies one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<ConfigValue>,
    /// Closed set of accepted values, compared after coercion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<Vec<ConfigValue>>,
}

impl FieldSpec {
    /// A field of the given type; optional, no default, no enumeration.
    pub fn new(value_type: ValueType) -> Self {
        Self {
            value_type,
            required: false,
            default: None,
            allowed_values: None,
        }
    }

    /// Shorthand for `FieldSpec::new(ValueType::String)`.
    pub fn string() -> Self {
        Self::new(ValueType::String)
    }

    /// Shorthand for `FieldSpec::new(ValueType::Number)`.
    pub fn number() -> Self {
        Self::new(ValueType::Number)
    }

    /// Shorthand for `FieldSpec::new(ValueType::Boolean)`.
    pub fn boolean() -> Self {
        Self::new(ValueType::Boolean)
    }

    /// Mark the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the default value.
    pub fn default_value(mut self, value: impl Into<ConfigValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Restrict the field to the given values.
    pub fn allowed<I, V>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<ConfigValue>,
    {
        self.allowed_values = Some(values.into_iter().map(Into::into).collect());
        self
    }

    /// Whether the field is required.
    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// An ordered set of field descriptors.
///
/// Field order is the order errors are reported in. Declaring the same key
/// twice replaces the earlier descriptor in place.
///
/// # Examples
///
/// ```rust
/// use strata_config::core::{FieldSpec, Schema};
///
/// let schema = Schema::new()
///     .field("NODE_ENV", FieldSpec::string().allowed(["development", "production"]).default_value("development"))
///     .field("PORT", FieldSpec::number().default_value(3000))
///     .field("DATABASE_URL", FieldSpec::string().required());
///
/// assert_eq!(schema.len(), 3);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Schema {
    fields: Vec<(String, FieldSpec)>,
}

impl Schema {
    /// An empty schema; every key passes through unchanged.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field.
    pub fn field(mut self, key: impl Into<String>, spec: FieldSpec) -> Self {
        self.insert(key, spec);
        self
    }

    /// Declare a field in place.
    pub fn insert(&mut self, key: impl Into<String>, spec: FieldSpec) {
        let key = key.into();
        match self.fields.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = spec,
            None => self.fields.push((key, spec)),
        }
    }

    /// Look up a field descriptor.
    pub fn get(&self, key: &str) -> Option<&FieldSpec> {
        self.fields
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, spec)| spec)
    }

    /// Iterate fields in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldSpec)> {
        self.fields.iter().map(|(key, spec)| (key.as_str(), spec))
    }

    /// Number of declared fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether no fields are declared.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Parse a schema declared as a JSON or YAML mapping of field descriptors.
    ///
    /// ```rust
    /// use strata_config::core::Schema;
    /// use strata_config::sources::Format;
    ///
    /// let schema = Schema::parse(
    ///     br#"{"PORT": {"type": "number", "default": 3000}}"#,
    ///     Format::Json,
    /// ).unwrap();
    /// assert!(schema.get("PORT").is_some());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `MalformedConfig` if the document is not a valid schema.
    pub fn parse(bytes: &[u8], format: Format) -> Result<Self> {
        let parsed = match format {
            Format::Json => serde_json::from_slice(bytes).map_err(|e| e.to_string()),
            Format::Yaml => serde_yaml::from_slice(bytes).map_err(|e| e.to_string()),
        };
        parsed.map_err(|message| ConfigError::MalformedConfig { format, message })
    }
}

impl<K: Into<String>> FromIterator<(K, FieldSpec)> for Schema {
    fn from_iter<I: IntoIterator<Item = (K, FieldSpec)>>(iter: I) -> Self {
        let mut schema = Schema::new();
        for (key, spec) in iter {
            schema.insert(key, spec);
        }
        schema
    }
}

impl<'de> Deserialize<'de> for Schema {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct SchemaVisitor;

        impl<'de> Visitor<'de> for SchemaVisitor {
            type Value = Schema;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a mapping of field names to field descriptors")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<Schema, A::Error> {
                let mut schema = Schema::new();
                while let Some((key, spec)) = map.next_entry::<String, FieldSpec>()? {
                    schema.insert(key, spec);
                }
                Ok(schema)
            }
        }

        deserializer.deserialize_map(SchemaVisitor)
    }
}
