//! Immutable view of one validated configuration.

use crate::core::{ConfigValue, RawMapping};
use crate::error::{ConfigError, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use std::ops::Index;
use std::path::{Path, PathBuf};

/// One complete, validated configuration.
///
/// Snapshots are never mutated. A reload installs a new snapshot; readers
/// holding an older `Arc<ConfigSnapshot>` keep seeing the values they loaded.
#[derive(Debug, Clone)]
pub struct ConfigSnapshot {
    values: RawMapping,
    version: u64,
    loaded_at: DateTime<Utc>,
    path: PathBuf,
}

impl ConfigSnapshot {
    pub(crate) fn new(values: RawMapping, version: u64, path: impl Into<PathBuf>) -> Self {
        Self {
            values,
            version,
            loaded_at: Utc::now(),
            path: path.into(),
        }
    }

    /// Look up a value.
    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.values.get(key)
    }

    /// Look up a string value.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(ConfigValue::as_str)
    }

    /// Look up an integral value.
    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(ConfigValue::as_i64)
    }

    /// Look up a numeric value.
    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(ConfigValue::as_f64)
    }

    /// Look up a boolean value.
    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(ConfigValue::as_bool)
    }

    /// Whether the key is present.
    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    /// Iterate over all entries in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the snapshot has no entries.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The full mapping.
    pub fn values(&self) -> &RawMapping {
        &self.values
    }

    /// Monotonic version, starting at 1 for the first snapshot of a store.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// When the snapshot was installed.
    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// The file the snapshot was loaded from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Deserialize the snapshot into a typed structure.
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// # use strata_config::prelude::*;
    /// use serde::Deserialize;
    ///
    /// #[derive(Deserialize)]
    /// struct AppConfig {
    ///     #[serde(rename = "PORT")]
    ///     port: u16,
    /// }
    ///
    /// # fn example(store: &ConfigStore) -> Result<()> {
    /// let config: AppConfig = store.get_config()?.try_deserialize()?;
    /// println!("Port: {}", config.port);
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `Deserialization` if the values do not fit `T`.
    pub fn try_deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::to_value(&self.values)
            .and_then(serde_json::from_value)
            .map_err(|e| ConfigError::Deserialization(e.to_string()))
    }
}

impl Index<&str> for ConfigSnapshot {
    type Output = ConfigValue;

    /// # Panics
    ///
    /// Panics if the key is not present.
    fn index(&self, key: &str) -> &ConfigValue {
        &self.values[key]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn snapshot() -> ConfigSnapshot {
        let values = RawMapping::from([
            ("PORT".to_string(), ConfigValue::Integer(3000)),
            ("NODE_ENV".to_string(), ConfigValue::from("development")),
            ("DEBUG".to_string(), ConfigValue::Bool(false)),
            ("RATIO".to_string(), ConfigValue::Float(0.5)),
        ]);
        ConfigSnapshot::new(values, 1, "app.json")
    }

    #[test]
    fn test_typed_getters() {
        let snapshot = snapshot();
        assert_eq!(snapshot.get_i64("PORT"), Some(3000));
        assert_eq!(snapshot.get_f64("PORT"), Some(3000.0));
        assert_eq!(snapshot.get_str("NODE_ENV"), Some("development"));
        assert_eq!(snapshot.get_bool("DEBUG"), Some(false));
        assert_eq!(snapshot.get_f64("RATIO"), Some(0.5));
        assert_eq!(snapshot.get_i64("NODE_ENV"), None);
        assert_eq!(snapshot["PORT"], ConfigValue::Integer(3000));
    }

    #[test]
    fn test_metadata() {
        let snapshot = snapshot();
        assert_eq!(snapshot.version(), 1);
        assert_eq!(snapshot.path(), Path::new("app.json"));
        assert_eq!(snapshot.len(), 4);
        assert!(snapshot.loaded_at() <= Utc::now());
    }

    #[test]
    fn test_try_deserialize() {
        #[derive(Debug, Deserialize, PartialEq)]
        struct AppConfig {
            #[serde(rename = "PORT")]
            port: u16,
            #[serde(rename = "NODE_ENV")]
            node_env: String,
            #[serde(rename = "DEBUG")]
            debug: bool,
        }

        let config: AppConfig = snapshot().try_deserialize().unwrap();
        assert_eq!(
            config,
            AppConfig {
                port: 3000,
                node_env: "development".to_string(),
                debug: false,
            }
        );
    }

    #[test]
    fn test_try_deserialize_type_error() {
        #[derive(Debug, Deserialize)]
        #[allow(dead_code)]
        struct Wrong {
            #[serde(rename = "NODE_ENV")]
            node_env: u16,
        }

        let result: Result<Wrong> = snapshot().try_deserialize();
        assert!(matches!(result, Err(ConfigError::Deserialization(_))));
    }
}
