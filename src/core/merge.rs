//! Precedence merge of the default, file and environment layers.

use crate::core::{ConfigValue, RawMapping};

/// Merge the three layers into one mapping.
///
/// Precedence, highest first: `env`, `file`, `defaults`. The merge is a
/// shallow, key-by-key overwrite; nested maps are replaced, never combined.
/// A `null` in a higher layer counts as absent and never hides a value
/// from a lower one.
///
/// # Examples
///
/// ```rust
/// use strata_config::core::{merge, ConfigValue, RawMapping};
///
/// let defaults = RawMapping::from([("PORT".to_string(), ConfigValue::from(3000))]);
/// let file = RawMapping::from([("PORT".to_string(), ConfigValue::from(8080))]);
/// let env = RawMapping::new();
///
/// let merged = merge(&defaults, &file, &env);
/// assert_eq!(merged["PORT"], ConfigValue::from(8080));
/// ```
pub fn merge(defaults: &RawMapping, file: &RawMapping, env: &RawMapping) -> RawMapping {
    // Lowest precedence first, later layers overwrite.
    let mut merged = defaults.clone();
    for layer in [file, env] {
        for (key, value) in layer {
            if value.is_null() {
                merged.entry(key.clone()).or_insert(ConfigValue::Null);
            } else {
                merged.insert(key.clone(), value.clone());
            }
        }
    }
    merged
}
