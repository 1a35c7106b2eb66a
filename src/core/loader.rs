//! The load pipeline: environment, file, merge, validate.

use crate::core::validation::validate_with;
use crate::core::{LoadOptions, RawMapping, merge};
use crate::error::{ConfigError, ConfigLoadError, LoadStage, Result};
use crate::sources::FileSource;

/// Runs the load pipeline for one set of options.
///
/// Each stage that can fail is wrapped in a [`ConfigLoadError`] naming the
/// stage. The file format is resolved from the extension before the file is
/// read, so an unsupported extension fails without touching the disk.
#[derive(Debug, Clone)]
pub(crate) struct ConfigLoader {
    options: LoadOptions,
    file: FileSource,
}

impl ConfigLoader {
    pub fn new(options: LoadOptions) -> Self {
        let file = FileSource::new(options.path());
        Self { options, file }
    }

    pub fn options(&self) -> &LoadOptions {
        &self.options
    }

    /// Run every stage and return the validated mapping.
    pub async fn load(&self) -> Result<RawMapping> {
        let env = self.options.env().read();
        tracing::debug!(source = %self.options.env().name(), keys = env.len(), "Read environment");

        let format = self.file.format().map_err(|e| self.fail(LoadStage::Decode, e))?;
        let bytes = self
            .file
            .read()
            .await
            .map_err(|e| self.fail(LoadStage::ReadFile, e))?;
        let file = format
            .decode(&bytes)
            .map_err(|e| self.fail(LoadStage::Decode, e))?;
        tracing::debug!(source = %self.file.name(), %format, keys = file.len(), "Decoded file");

        let merged = merge(self.options.defaults(), &file, &env);

        validate_with(merged, self.options.schema(), self.options.checks())
            .map_err(|e| self.fail(LoadStage::Validate, e.into()))
    }

    fn fail(&self, stage: LoadStage, cause: ConfigError) -> ConfigError {
        ConfigLoadError::new(stage, self.options.path(), cause).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ConfigValue, FieldSpec, Schema};
    use crate::sources::EnvSource;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_pipeline_merges_all_layers() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("app.json");
        fs::write(&config_path, r#"{"NODE_ENV": "development", "PORT": 8080}"#).unwrap();

        let loader = ConfigLoader::new(
            LoadOptions::new(&config_path)
                .with_default("PORT", 3000)
                .with_default("LOG_LEVEL", "info")
                .with_env_source(EnvSource::fixed("T_", [("T_PORT", "9090")]))
                .with_schema(Schema::new().field("PORT", FieldSpec::number())),
        );

        let config = loader.load().await.unwrap();
        assert_eq!(config["PORT"], ConfigValue::Integer(9090));
        assert_eq!(config["NODE_ENV"], ConfigValue::from("development"));
        assert_eq!(config["LOG_LEVEL"], ConfigValue::from("info"));
    }

    #[tokio::test]
    async fn test_unsupported_format_fails_before_reading() {
        // The file does not exist; the extension check must come first.
        let loader = ConfigLoader::new(LoadOptions::new("/nonexistent/app.ini"));
        let err = loader.load().await.unwrap_err();

        assert_eq!(err.stage(), Some(LoadStage::Decode));
        assert!(matches!(err.root_cause(), ConfigError::UnsupportedFormat { .. }));
    }

    #[tokio::test]
    async fn test_missing_file_is_read_stage() {
        let loader = ConfigLoader::new(LoadOptions::new("/nonexistent/app.yaml"));
        let err = loader.load().await.unwrap_err();

        assert_eq!(err.stage(), Some(LoadStage::ReadFile));
        assert!(matches!(err.root_cause(), ConfigError::FileNotFound { .. }));
    }

    #[tokio::test]
    async fn test_malformed_file_is_decode_stage() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("app.yaml");
        fs::write(&config_path, "PORT: [unclosed\n").unwrap();

        let err = ConfigLoader::new(LoadOptions::new(&config_path))
            .load()
            .await
            .unwrap_err();
        assert_eq!(err.stage(), Some(LoadStage::Decode));
        assert!(matches!(err.root_cause(), ConfigError::MalformedConfig { .. }));
    }

    #[tokio::test]
    async fn test_validation_failure_is_validate_stage() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("app.yaml");
        fs::write(&config_path, "PORT: abc\n").unwrap();

        let err = ConfigLoader::new(
            LoadOptions::new(&config_path)
                .with_env_source(EnvSource::fixed("", Vec::<(String, String)>::new()))
                .with_schema(Schema::new().field("PORT", FieldSpec::number())),
        )
        .load()
        .await
        .unwrap_err();

        assert_eq!(err.stage(), Some(LoadStage::Validate));
        assert_eq!(err.validation_errors().unwrap().len(), 1);
    }
}
