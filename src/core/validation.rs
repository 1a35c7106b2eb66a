//! Schema validation and type coercion.

use crate::core::{ConfigValue, FieldSpec, RawMapping, Schema, ValueType};
use crate::error::{ConfigValidationError, ValidationError};
use std::sync::Arc;

/// A custom check run on the coerced mapping after the schema passes.
pub type CustomCheck = Arc<dyn Fn(&RawMapping) -> Result<(), ValidationError> + Send + Sync>;

/// Apply `schema` to `mapping`.
///
/// Every declared field is checked before failing, so the error carries the
/// complete list in schema order. Keys the schema does not declare are passed
/// through unchanged. A `null` value counts as absent: the default applies,
/// a required field is reported missing, and an optional field keeps it.
///
/// # Examples
///
/// ```rust
/// use strata_config::core::{validate, ConfigValue, FieldSpec, RawMapping, Schema};
///
/// let schema = Schema::new().field("PORT", FieldSpec::number().default_value(3000));
/// let mut mapping = RawMapping::new();
/// mapping.insert("PORT".to_string(), ConfigValue::from("8080"));
///
/// let validated = validate(mapping, &schema).unwrap();
/// assert_eq!(validated["PORT"], ConfigValue::Integer(8080));
/// ```
///
/// # Errors
///
/// Returns a `ConfigValidationError` aggregating every field error found.
pub fn validate(
    mapping: RawMapping,
    schema: &Schema,
) -> Result<RawMapping, ConfigValidationError> {
    let mut validated = mapping;
    let mut errors = Vec::new();

    for (key, spec) in schema.iter() {
        // Defaults go through the same coercion and enum check as input.
        let value = match (validated.remove(key), &spec.default) {
            (Some(value), _) if !value.is_null() => value,
            (_, Some(default)) => default.clone(),
            (incoming, None) => {
                if spec.required {
                    errors.push(ValidationError::MissingRequiredField {
                        key: key.to_string(),
                    });
                } else if let Some(null) = incoming {
                    validated.insert(key.to_string(), null);
                }
                continue;
            }
        };

        match check_field(key, spec, value) {
            Ok(coerced) => {
                validated.insert(key.to_string(), coerced);
            }
            Err(err) => errors.push(err),
        }
    }

    if errors.is_empty() {
        Ok(validated)
    } else {
        Err(ConfigValidationError::new(errors))
    }
}

/// Apply `schema`, then each custom check in order.
///
/// Custom checks only see a mapping that already satisfies the schema.
pub(crate) fn validate_with(
    mapping: RawMapping,
    schema: &Schema,
    checks: &[CustomCheck],
) -> Result<RawMapping, ConfigValidationError> {
    let validated = validate(mapping, schema)?;

    let errors: Vec<_> = checks
        .iter()
        .filter_map(|check| check(&validated).err())
        .collect();

    if errors.is_empty() {
        Ok(validated)
    } else {
        Err(ConfigValidationError::new(errors))
    }
}

fn check_field(key: &str, spec: &FieldSpec, value: ConfigValue) -> Result<ConfigValue, ValidationError> {
    let coerced = coerce(value, spec.value_type).map_err(|actual| ValidationError::TypeMismatch {
        key: key.to_string(),
        expected: spec.value_type,
        actual,
    })?;

    if let Some(allowed) = &spec.allowed_values {
        if !allowed.iter().any(|candidate| candidate.same_value(&coerced)) {
            return Err(ValidationError::InvalidEnumValue {
                key: key.to_string(),
                allowed: allowed.clone(),
                actual: coerced,
            });
        }
    }

    Ok(coerced)
}

/// Coerce a value to `target`, handing the value back untouched on failure.
///
/// Strings are parsed into numbers and booleans; nothing is ever converted
/// into a string.
pub fn coerce(value: ConfigValue, target: ValueType) -> Result<ConfigValue, ConfigValue> {
    match (target, value) {
        (ValueType::String, value @ ConfigValue::String(_)) => Ok(value),

        (ValueType::Number, value @ ConfigValue::Integer(_)) => Ok(value),
        (ValueType::Number, ConfigValue::Float(f)) if f.is_finite() => Ok(ConfigValue::Float(f)),
        (ValueType::Number, ConfigValue::String(s)) => parse_number(&s).ok_or(ConfigValue::String(s)),

        (ValueType::Boolean, value @ ConfigValue::Bool(_)) => Ok(value),
        (ValueType::Boolean, ConfigValue::String(s)) => parse_bool(&s).ok_or(ConfigValue::String(s)),

        (_, value) => Err(value),
    }
}

fn parse_number(raw: &str) -> Option<ConfigValue> {
    let trimmed = raw.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return Some(ConfigValue::Integer(n));
    }
    trimmed
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(ConfigValue::Float)
}

fn parse_bool(raw: &str) -> Option<ConfigValue> {
    let trimmed = raw.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Some(ConfigValue::Bool(true))
    } else if trimmed.eq_ignore_ascii_case("false") {
        Some(ConfigValue::Bool(false))
    } else {
        None
    }
}
