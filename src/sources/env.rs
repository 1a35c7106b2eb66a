//! Environment variable configuration source.

use crate::core::{ConfigValue, RawMapping};
use std::sync::Arc;

/// Environment variable configuration source.
///
/// Keeps variables whose name starts with the prefix and strips the prefix
/// from each retained key. An empty prefix passes every variable through
/// unchanged. Values are always strings; the schema decides their type.
///
/// # Examples
///
/// ```rust
/// use strata_config::sources::EnvSource;
///
/// // APP_PORT=8080 -> PORT = "8080"
/// let source = EnvSource::fixed("APP_", [("APP_PORT", "8080"), ("HOME", "/root")]);
/// let vars = source.read();
/// assert_eq!(vars.len(), 1);
/// assert_eq!(vars["PORT"].as_str(), Some("8080"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct EnvSource {
    prefix: String,
    // None reads the process environment on every call.
    fixed: Option<Arc<Vec<(String, String)>>>,
}

impl EnvSource {
    /// Read from the process environment.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            fixed: None,
        }
    }

    /// Read from a fixed set of variables instead of the process environment.
    pub fn fixed<I, K, V>(prefix: impl Into<String>, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self {
            prefix: prefix.into(),
            fixed: Some(Arc::new(vars)),
        }
    }

    /// The configured prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Get a human-readable name for this source.
    pub fn name(&self) -> String {
        format!("env:{}*", self.prefix)
    }

    /// Snapshot the matching variables.
    pub fn read(&self) -> RawMapping {
        match &self.fixed {
            Some(vars) => filter_prefixed(
                vars.iter().map(|(key, value)| (key.clone(), value.clone())),
                &self.prefix,
            ),
            None => filter_prefixed(process_vars(), &self.prefix),
        }
    }
}

fn process_vars() -> impl Iterator<Item = (String, String)> {
    std::env::vars_os().filter_map(|(key, value)| match (key.into_string(), value.into_string()) {
        (Ok(key), Ok(value)) => Some((key, value)),
        (key, _) => {
            tracing::debug!(key = ?key, "Skipping non UTF-8 environment variable");
            None
        }
    })
}

fn filter_prefixed(vars: impl Iterator<Item = (String, String)>, prefix: &str) -> RawMapping {
    vars.filter_map(|(key, value)| {
        key.strip_prefix(prefix)
            .filter(|stripped| !stripped.is_empty())
            .map(|stripped| (stripped.to_string(), ConfigValue::String(value)))
    })
    .collect()
}
