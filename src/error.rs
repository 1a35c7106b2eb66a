//! Error types for strata-config.

use crate::core::{ConfigValue, ValueType};
use crate::sources::Format;
use std::fmt;
use std::path::PathBuf;

/// Result type alias for strata-config operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur when working with configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file does not exist.
    #[error("Configuration file not found: {}", .path.display())]
    FileNotFound {
        /// Path that was looked up
        path: PathBuf,
    },

    /// The configuration file exists but could not be read.
    #[error("Failed to read configuration file {}: {source}", .path.display())]
    FileReadError {
        /// Path that was read
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file extension does not map to a supported format.
    #[error("Unsupported file format: '{extension}'. Supported: .json, .yaml, .yml")]
    UnsupportedFormat {
        /// The offending extension (empty when the path has none)
        extension: String,
    },

    /// The file contents could not be parsed.
    #[error("Malformed {format} configuration: {message}")]
    MalformedConfig {
        /// Format the bytes were parsed as
        format: Format,
        /// Message reported by the parser
        message: String,
    },

    /// The merged configuration did not satisfy the schema.
    #[error(transparent)]
    Validation(#[from] ConfigValidationError),

    /// A pipeline stage failed while loading or reloading.
    #[error(transparent)]
    Load(Box<ConfigLoadError>),

    /// The store has no snapshot yet.
    #[error("Configuration has not been loaded")]
    NotLoaded,

    /// File watching failed to initialize or was torn down.
    #[error("File watching error: {0}")]
    WatchError(String),

    /// Converting a snapshot into a typed structure failed.
    #[error("Failed to deserialize configuration: {0}")]
    Deserialization(String),
}

impl ConfigError {
    /// The pipeline stage that failed, if this is a load error.
    pub fn stage(&self) -> Option<LoadStage> {
        match self {
            Self::Load(err) => Some(err.stage()),
            _ => None,
        }
    }

    /// The field errors carried by this error, looking through a load wrapper.
    pub fn validation_errors(&self) -> Option<&[ValidationError]> {
        match self {
            Self::Validation(err) => Some(err.errors()),
            Self::Load(err) => err.cause().validation_errors(),
            _ => None,
        }
    }

    /// The innermost error, looking through a load wrapper.
    pub fn root_cause(&self) -> &ConfigError {
        match self {
            Self::Load(err) => err.cause().root_cause(),
            other => other,
        }
    }
}

/// Stage of the load pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadStage {
    /// Reading the configuration file from disk
    ReadFile,
    /// Resolving the format and parsing the file
    Decode,
    /// Applying the schema to the merged mapping
    Validate,
}

impl fmt::Display for LoadStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ReadFile => "read-file",
            Self::Decode => "decode",
            Self::Validate => "validate",
        };
        f.write_str(name)
    }
}

/// A failure of one pipeline stage, surfaced from `load` and `reload`.
#[derive(Debug, thiserror::Error)]
#[error("Failed to load configuration from {} ({stage} stage): {cause}", .path.display())]
pub struct ConfigLoadError {
    stage: LoadStage,
    path: PathBuf,
    #[source]
    cause: ConfigError,
}

impl ConfigLoadError {
    pub(crate) fn new(stage: LoadStage, path: impl Into<PathBuf>, cause: ConfigError) -> Self {
        Self {
            stage,
            path: path.into(),
            cause,
        }
    }

    /// The stage that failed.
    pub fn stage(&self) -> LoadStage {
        self.stage
    }

    /// The configuration file the pipeline was loading.
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// The error reported by the failing stage.
    pub fn cause(&self) -> &ConfigError {
        &self.cause
    }
}

impl From<ConfigLoadError> for ConfigError {
    fn from(err: ConfigLoadError) -> Self {
        ConfigError::Load(Box::new(err))
    }
}

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A required field has no value and no default.
    #[error("Field '{key}' is required")]
    MissingRequiredField {
        /// The field name
        key: String,
    },

    /// A value could not be coerced to the declared type.
    #[error("Field '{key}' must be a {expected}, got {actual}")]
    TypeMismatch {
        /// The field name
        key: String,
        /// The type declared by the schema
        expected: ValueType,
        /// The value that was supplied
        actual: ConfigValue,
    },

    /// A coerced value is not one of the allowed values.
    #[error("Field '{key}' must be one of [{}], got {actual}", list(.allowed))]
    InvalidEnumValue {
        /// The field name
        key: String,
        /// The allowed values declared by the schema
        allowed: Vec<ConfigValue>,
        /// The coerced value that was rejected
        actual: ConfigValue,
    },

    /// A failure reported by a custom check.
    #[error("{0}")]
    Custom(String),
}

impl ValidationError {
    /// Create a custom validation error.
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// The field this error refers to, if any.
    pub fn key(&self) -> Option<&str> {
        match self {
            Self::MissingRequiredField { key }
            | Self::TypeMismatch { key, .. }
            | Self::InvalidEnumValue { key, .. } => Some(key),
            Self::Custom(_) => None,
        }
    }
}

fn list(values: &[ConfigValue]) -> String {
    values
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Every field error found in one validation pass, in schema order.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigValidationError {
    errors: Vec<ValidationError>,
}

impl ConfigValidationError {
    pub(crate) fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    /// The collected field errors.
    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    /// Consume the error, returning the collected field errors.
    pub fn into_errors(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.as_slice() {
            [single] => write!(f, "Configuration validation failed: {}", single),
            errors => {
                writeln!(f, "Configuration validation failed with {} errors:", errors.len())?;
                for (i, err) in errors.iter().enumerate() {
                    writeln!(f, "  {}. {}", i + 1, err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigValidationError {}
