//! Decoding file contents into a flat key-value mapping.

use crate::core::RawMapping;
use crate::error::{ConfigError, Result};
use std::fmt;
use std::path::Path;

/// Serialization format of a configuration file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// Strict JSON; the top level must be an object
    Json,
    /// YAML; the top level must be a mapping
    Yaml,
}

impl Format {
    /// Resolve a format from a file extension, with or without a leading dot.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use strata_config::sources::Format;
    ///
    /// assert_eq!(Format::from_extension(".yml").unwrap(), Format::Yaml);
    /// assert!(Format::from_extension("ini").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` for anything but `json`, `yaml` or `yml`.
    pub fn from_extension(extension: &str) -> Result<Self> {
        let normalized = extension.trim_start_matches('.').to_ascii_lowercase();
        match normalized.as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(ConfigError::UnsupportedFormat {
                extension: extension.to_string(),
            }),
        }
    }

    /// Resolve a format from a path's extension.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` if the path has no extension or an unknown one.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let extension = path
            .as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or_default();
        Self::from_extension(extension)
    }

    /// Decode `bytes` in this format.
    ///
    /// # Errors
    ///
    /// Returns `MalformedConfig` with the parser's message if the bytes do not
    /// parse, or the top level is not a mapping.
    pub fn decode(self, bytes: &[u8]) -> Result<RawMapping> {
        let parsed = match self {
            Self::Json => serde_json::from_slice::<RawMapping>(bytes).map_err(|e| e.to_string()),
            // An empty YAML document is an empty mapping, not an error.
            Self::Yaml if is_blank(bytes) => Ok(RawMapping::new()),
            Self::Yaml => serde_yaml::from_slice::<RawMapping>(bytes).map_err(|e| e.to_string()),
        };

        parsed.map_err(|message| ConfigError::MalformedConfig {
            format: self,
            message,
        })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => f.write_str("JSON"),
            Self::Yaml => f.write_str("YAML"),
        }
    }
}

/// Decode `bytes` according to a file extension.
///
/// # Errors
///
/// Returns `UnsupportedFormat` for an unknown extension and `MalformedConfig`
/// for unparsable contents.
pub fn decode_extension(bytes: &[u8], extension: &str) -> Result<RawMapping> {
    Format::from_extension(extension)?.decode(bytes)
}

fn is_blank(bytes: &[u8]) -> bool {
    bytes.iter().all(u8::is_ascii_whitespace)
}
