//! File-based configuration source.

use super::Format;
use crate::error::{ConfigError, Result};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// File-based configuration source.
///
/// Reads the raw bytes of one configuration file. Decoding is left to
/// [`Format`], so this type never interprets the contents.
///
/// # Examples
///
/// ```rust,no_run
/// use strata_config::sources::FileSource;
///
/// # async fn example() -> strata_config::error::Result<()> {
/// let source = FileSource::new("config/app.yaml");
/// let bytes = source.read().await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a new file source.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The format implied by the file extension.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedFormat` for anything but `.json`, `.yaml` or `.yml`.
    pub fn format(&self) -> Result<Format> {
        Format::from_path(&self.path)
    }

    /// Get a human-readable name for this source.
    pub fn name(&self) -> String {
        format!("file:{}", self.path.display())
    }

    /// Read the whole file.
    ///
    /// # Errors
    ///
    /// Returns `FileNotFound` if the path does not exist and `FileReadError`
    /// for any other I/O failure.
    pub async fn read(&self) -> Result<Vec<u8>> {
        tokio::fs::read(&self.path).await.map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                ConfigError::FileNotFound {
                    path: self.path.clone(),
                }
            } else {
                ConfigError::FileReadError {
                    path: self.path.clone(),
                    source,
                }
            }
        })
    }
}
