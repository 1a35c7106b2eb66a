//! Parameters of a load, recorded for later reloads.

use crate::core::validation::CustomCheck;
use crate::core::{ConfigValue, RawMapping, Schema};
use crate::error::ValidationError;
use crate::sources::EnvSource;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything a load needs: the file, the schema, the defaults and the
/// environment source.
///
/// The store keeps the options of the last successful load and reuses them
/// on every reload.
///
/// # Examples
///
/// ```rust
/// use strata_config::core::{FieldSpec, LoadOptions, Schema};
///
/// let options = LoadOptions::new("config/app.yaml")
///     .with_schema(Schema::new().field("PORT", FieldSpec::number().default_value(3000)))
///     .with_default("LOG_LEVEL", "info")
///     .with_env_prefix("APP_");
///
/// assert_eq!(options.env().prefix(), "APP_");
/// ```
#[derive(Clone)]
pub struct LoadOptions {
    path: PathBuf,
    schema: Arc<Schema>,
    defaults: RawMapping,
    env: EnvSource,
    checks: Vec<CustomCheck>,
}

impl LoadOptions {
    /// Options for the given file with an empty schema, no defaults and
    /// every environment variable imported.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            schema: Arc::new(Schema::new()),
            defaults: RawMapping::new(),
            env: EnvSource::new(""),
            checks: Vec::new(),
        }
    }

    /// Set the schema.
    pub fn with_schema(mut self, schema: impl Into<Arc<Schema>>) -> Self {
        self.schema = schema.into();
        self
    }

    /// Replace the defaults layer.
    pub fn with_defaults(mut self, defaults: RawMapping) -> Self {
        self.defaults = defaults;
        self
    }

    /// Add one default value.
    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    /// Import environment variables starting with `prefix`, prefix stripped.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env = EnvSource::new(prefix);
        self
    }

    /// Use a custom environment source.
    pub fn with_env_source(mut self, env: EnvSource) -> Self {
        self.env = env;
        self
    }

    /// Add a check that must pass, after the schema, before a snapshot is installed.
    ///
    /// Checks run on every load and reload, in the order they were added.
    ///
    /// ```rust
    /// use strata_config::core::LoadOptions;
    /// use strata_config::error::ValidationError;
    ///
    /// let options = LoadOptions::new("app.json").with_validation(|config| {
    ///     match config.get("PORT").and_then(|port| port.as_i64()) {
    ///         Some(port) if port < 1024 => Err(ValidationError::custom("PORT must be >= 1024")),
    ///         _ => Ok(()),
    ///     }
    /// });
    /// ```
    pub fn with_validation<F>(mut self, check: F) -> Self
    where
        F: Fn(&RawMapping) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        self.checks.push(Arc::new(check));
        self
    }

    /// The configuration file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The defaults layer.
    pub fn defaults(&self) -> &RawMapping {
        &self.defaults
    }

    /// The environment source.
    pub fn env(&self) -> &EnvSource {
        &self.env
    }

    pub(crate) fn checks(&self) -> &[CustomCheck] {
        &self.checks
    }
}

impl fmt::Debug for LoadOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadOptions")
            .field("path", &self.path)
            .field("schema", &self.schema)
            .field("defaults", &self.defaults)
            .field("env", &self.env)
            .field("checks", &self.checks.len())
            .finish()
    }
}
