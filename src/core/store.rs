//! The configuration store holding the current snapshot.

use crate::core::{ConfigLoader, ConfigSnapshot, LoadOptions, RawMapping, Schema};
use crate::error::{ConfigError, Result};
use crate::notify::{ReloadTarget, SubscriberRegistry, SubscriptionHandle};
use arc_swap::ArcSwapOption;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

#[cfg(feature = "metrics")]
use crate::metrics::{ConfigMetrics, Operation};

static GLOBAL: OnceLock<Arc<ConfigStore>> = OnceLock::new();

/// Holder of the current validated configuration.
///
/// Reads are lock-free: [`get_config`](Self::get_config) hands out an
/// `Arc<ConfigSnapshot>` that is replaced atomically on every successful
/// load or reload. A failed reload keeps the previous snapshot.
///
/// # Examples
///
/// ```rust,no_run
/// use strata_config::prelude::*;
///
/// # async fn example() -> Result<()> {
/// let schema = Schema::new()
///     .field("NODE_ENV", FieldSpec::string().allowed(["development", "production"]).default_value("development"))
///     .field("PORT", FieldSpec::number().default_value(3000))
///     .field("DATABASE_URL", FieldSpec::string().required());
///
/// let store = ConfigStore::new();
/// store
///     .load(LoadOptions::new("config/app.yaml").with_schema(schema).with_env_prefix("APP_"))
///     .await?;
///
/// let config = store.get_config()?;
/// println!("Port: {:?}", config.get_i64("PORT"));
/// # Ok(())
/// # }
/// ```
pub struct ConfigStore {
    /// The current snapshot; `None` until the first successful load
    current: ArcSwapOption<ConfigSnapshot>,
    /// Options of the last successful load, reused by reloads
    loader: ArcSwapOption<ConfigLoader>,
    /// Serializes pipeline runs so two never overlap
    pipeline: tokio::sync::Mutex<()>,
    next_version: AtomicU64,
    subscribers: SubscriberRegistry,
    #[cfg(feature = "metrics")]
    metrics: Option<ConfigMetrics>,
}

impl ConfigStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            current: ArcSwapOption::empty(),
            loader: ArcSwapOption::empty(),
            pipeline: tokio::sync::Mutex::new(()),
            next_version: AtomicU64::new(1),
            subscribers: SubscriberRegistry::new(),
            #[cfg(feature = "metrics")]
            metrics: None,
        }
    }

    /// Create an empty store that reports OpenTelemetry metrics.
    #[cfg(feature = "metrics")]
    pub fn with_metrics(meter: opentelemetry::metrics::Meter) -> Self {
        let metrics = ConfigMetrics::new(meter);
        let store = Self {
            metrics: Some(metrics.clone()),
            ..Self::new()
        };
        store
            .subscribers
            .on_count_change(move |count| metrics.update_subscriber_count(count));
        store
    }

    /// The process-wide default store.
    ///
    /// Convenience for applications that want a single ambient instance;
    /// it is an ordinary `ConfigStore`, created empty on first use.
    pub fn global() -> Arc<ConfigStore> {
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(ConfigStore::new())))
    }

    /// Run the full pipeline and install the result as the current snapshot.
    ///
    /// On success the options are recorded for later reloads. On failure
    /// nothing changes: a first load leaves the store empty, a later one
    /// leaves the previous snapshot and options in place.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Load` naming the failing stage: unsupported
    /// format or malformed contents (`Decode`), missing or unreadable file
    /// (`ReadFile`), or schema violations (`Validate`).
    pub async fn load(&self, options: LoadOptions) -> Result<Arc<ConfigSnapshot>> {
        let _guard = self.pipeline.lock().await;
        #[cfg(feature = "metrics")]
        let timer = self.metrics.as_ref().map(|m| m.start(Operation::Load));

        let loader = ConfigLoader::new(options);
        let result = loader.load().await;

        #[cfg(feature = "metrics")]
        if let (Some(metrics), Some(timer)) = (&self.metrics, timer) {
            match &result {
                Ok(_) => metrics.record_success(Operation::Load, timer),
                Err(e) => metrics.record_failure(Operation::Load, timer, e),
            }
        }

        let values = result?;
        let snapshot = self.install(values, loader.options().path());
        self.loader.store(Some(Arc::new(loader)));
        tracing::info!(
            path = %snapshot.path().display(),
            version = snapshot.version(),
            keys = snapshot.len(),
            "Configuration loaded"
        );
        Ok(snapshot)
    }

    /// Positional form of [`load`](Self::load).
    ///
    /// # Errors
    ///
    /// See [`load`](Self::load).
    pub async fn load_from(
        &self,
        path: impl Into<PathBuf>,
        schema: impl Into<Arc<Schema>>,
        defaults: RawMapping,
        env_prefix: &str,
    ) -> Result<Arc<ConfigSnapshot>> {
        let options = LoadOptions::new(path)
            .with_schema(schema)
            .with_defaults(defaults)
            .with_env_prefix(env_prefix);
        self.load(options).await
    }

    /// Re-run the pipeline with the options of the last successful load.
    ///
    /// A failure is logged and returned; the previous snapshot stays in place,
    /// so a bad edit to the file never takes down a running process.
    ///
    /// # Errors
    ///
    /// Returns `NotLoaded` before the first successful load, otherwise the
    /// same errors as [`load`](Self::load).
    pub async fn reload(&self) -> Result<Arc<ConfigSnapshot>> {
        let _guard = self.pipeline.lock().await;
        let loader = self.loader.load_full().ok_or(ConfigError::NotLoaded)?;
        #[cfg(feature = "metrics")]
        let timer = self.metrics.as_ref().map(|m| m.start(Operation::Reload));

        let result = loader.load().await;

        #[cfg(feature = "metrics")]
        if let (Some(metrics), Some(timer)) = (&self.metrics, timer) {
            match &result {
                Ok(_) => metrics.record_success(Operation::Reload, timer),
                Err(e) => metrics.record_failure(Operation::Reload, timer, e),
            }
        }

        match result {
            Ok(values) => {
                let snapshot = self.install(values, loader.options().path());
                tracing::info!(
                    path = %snapshot.path().display(),
                    version = snapshot.version(),
                    "Configuration reloaded"
                );
                Ok(snapshot)
            }
            Err(e) => {
                tracing::warn!(
                    path = %loader.options().path().display(),
                    error = %e,
                    "Configuration reload failed, keeping current configuration"
                );
                Err(e)
            }
        }
    }

    /// The current snapshot.
    ///
    /// # Errors
    ///
    /// Returns `NotLoaded` before the first successful load.
    pub fn get_config(&self) -> Result<Arc<ConfigSnapshot>> {
        self.current.load_full().ok_or(ConfigError::NotLoaded)
    }

    /// The current snapshot, if any.
    pub fn try_get(&self) -> Option<Arc<ConfigSnapshot>> {
        self.current.load_full()
    }

    /// Whether a snapshot has been installed.
    pub fn is_loaded(&self) -> bool {
        self.current.load().is_some()
    }

    /// The configuration file of the last successful load.
    pub fn path(&self) -> Option<PathBuf> {
        self.loader
            .load_full()
            .map(|loader| loader.options().path().to_path_buf())
    }

    /// Subscribe to new snapshots.
    ///
    /// The callback runs after every successful load or reload, with the
    /// snapshot just installed. Drop the handle to unsubscribe.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionHandle
    where
        F: Fn(&ConfigSnapshot) + Send + Sync + 'static,
    {
        self.subscribers.subscribe(callback)
    }

    fn install(&self, values: RawMapping, path: &Path) -> Arc<ConfigSnapshot> {
        let version = self.next_version.fetch_add(1, Ordering::SeqCst);
        let snapshot = Arc::new(ConfigSnapshot::new(values, version, path));
        self.current.store(Some(Arc::clone(&snapshot)));
        self.subscribers.notify_all(&snapshot);
        snapshot
    }
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReloadTarget for ConfigStore {
    fn watch_path(&self) -> Option<PathBuf> {
        self.path()
    }

    async fn reload(&self) -> Result<()> {
        ConfigStore::reload(self).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ConfigValue;
    use crate::error::LoadStage;
    use crate::sources::EnvSource;
    use std::fs;
    use std::sync::atomic::AtomicUsize;
    use tempfile::TempDir;

    fn no_env() -> EnvSource {
        EnvSource::fixed("", Vec::<(String, String)>::new())
    }

    #[test]
    fn test_empty_store() {
        let store = ConfigStore::new();
        assert!(matches!(store.get_config(), Err(ConfigError::NotLoaded)));
        assert!(store.try_get().is_none());
        assert!(store.path().is_none());
        assert!(!store.is_loaded());
    }

    #[tokio::test]
    async fn test_reload_before_load() {
        let store = ConfigStore::new();
        assert!(matches!(store.reload().await, Err(ConfigError::NotLoaded)));
    }

    #[tokio::test]
    async fn test_load_then_reload() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("app.yaml");
        fs::write(&config_path, "PORT: 3000\n").unwrap();

        let store = ConfigStore::new();
        let first = store
            .load(LoadOptions::new(&config_path).with_env_source(no_env()))
            .await
            .unwrap();
        assert_eq!(first.version(), 1);
        assert_eq!(store.path(), Some(config_path.clone()));

        fs::write(&config_path, "PORT: 4000\n").unwrap();
        let second = store.reload().await.unwrap();
        assert_eq!(second.version(), 2);
        assert_eq!(second.get_i64("PORT"), Some(4000));

        // The old snapshot is untouched
        assert_eq!(first.get_i64("PORT"), Some(3000));
    }

    #[tokio::test]
    async fn test_failed_first_load_leaves_store_empty() {
        let store = ConfigStore::new();
        let err = store.load(LoadOptions::new("/nonexistent/app.json")).await.unwrap_err();

        assert_eq!(err.stage(), Some(LoadStage::ReadFile));
        assert!(!store.is_loaded());
        assert!(store.path().is_none());
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("app.json");
        fs::write(&config_path, r#"{"PORT": 3000}"#).unwrap();

        let store = ConfigStore::new();
        store
            .load(LoadOptions::new(&config_path).with_env_source(no_env()))
            .await
            .unwrap();

        fs::write(&config_path, r#"{"PORT": "#).unwrap();
        let err = store.reload().await.unwrap_err();
        assert_eq!(err.stage(), Some(LoadStage::Decode));

        let config = store.get_config().unwrap();
        assert_eq!(config.version(), 1);
        assert_eq!(config["PORT"], ConfigValue::Integer(3000));
    }

    #[tokio::test]
    async fn test_subscribers_see_each_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("app.yaml");
        fs::write(&config_path, "PORT: 1\n").unwrap();

        let store = ConfigStore::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = Arc::clone(&calls);
        let _handle = store.subscribe(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        store
            .load(LoadOptions::new(&config_path).with_env_source(no_env()))
            .await
            .unwrap();
        store.reload().await.unwrap();

        fs::write(&config_path, "PORT: [\n").unwrap();
        let _ = store.reload().await;

        // Failed reloads do not notify
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_store_as_reload_target() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("app.yaml");
        fs::write(&config_path, "PORT: 1\n").unwrap();

        let store = Arc::new(ConfigStore::new());
        let target: Arc<dyn ReloadTarget> = store.clone();
        assert!(target.watch_path().is_none());

        store
            .load(LoadOptions::new(&config_path).with_env_source(no_env()))
            .await
            .unwrap();
        assert_eq!(target.watch_path(), Some(config_path));
        target.reload().await.unwrap();
        assert_eq!(store.get_config().unwrap().version(), 2);
    }

    #[cfg(feature = "metrics")]
    #[test]
    fn test_metrics_store_tracks_unsubscribe() {
        let store = ConfigStore::with_metrics(opentelemetry::global::meter("test"));
        let handle = store.subscribe(|_| {});
        assert_eq!(store.subscribers.subscriber_count(), 1);

        drop(handle);
        assert_eq!(store.subscribers.subscriber_count(), 0);
    }

    #[test]
    fn test_global_is_shared() {
        let a = ConfigStore::global();
        let b = ConfigStore::global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
