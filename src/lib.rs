//! # strata-config
//!
//! Layered configuration with schema validation and live reload.
//!
//! ## Overview
//!
//! `strata-config` loads configuration from three layers and keeps it current:
//! - Caller defaults, overridden by one JSON or YAML file, overridden by
//!   environment variables
//! - A declared schema that fills defaults, coerces types and reports every
//!   problem in one pass
//! - Lock-free snapshot reads using `arc-swap`
//! - File watching with serialized, coalesced reloads that never replace a
//!   good configuration with a bad one
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use strata_config::prelude::*;
//! use std::sync::Arc;
//!
//! # async fn example() -> strata_config::error::Result<()> {
//! let schema = Schema::new()
//!     .field("NODE_ENV", FieldSpec::string().allowed(["development", "production"]).default_value("development"))
//!     .field("PORT", FieldSpec::number().default_value(3000))
//!     .field("DATABASE_URL", FieldSpec::string().required());
//!
//! let store = Arc::new(ConfigStore::new());
//! store
//!     .load(LoadOptions::new(".config.yaml").with_schema(schema).with_env_prefix("APP_"))
//!     .await?;
//!
//! // Reload whenever the file changes
//! let controller = ReloadController::new(Arc::clone(&store));
//! controller.watch().await?;
//!
//! // Zero-cost reads (no locks!)
//! let config = store.get_config()?;
//! println!("Port: {:?}", config.get_i64("PORT"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Precedence
//!
//! Environment variables win over the file, the file wins over defaults.
//! The merge is shallow: a key's value comes whole from the highest layer
//! that defines it.
//!
//! ## Feature Flags
//!
//! - `file-watch` (default): [`notify::NotifySource`] and [`notify::ReloadController::new`]
//! - `metrics`: OpenTelemetry metrics via [`core::ConfigStore::with_metrics`]

#![warn(missing_docs, rust_2024_compatibility)]
#![deny(unsafe_code)]

pub mod core;
pub mod error;
pub mod notify;
pub mod sources;

#[cfg(feature = "metrics")]
pub mod metrics;

/// Convenient re-exports for common usage patterns.
pub mod prelude {
    pub use crate::core::{ConfigSnapshot, ConfigStore, ConfigValue, FieldSpec, LoadOptions, RawMapping, Schema, ValueType};
    pub use crate::error::{ConfigError, ConfigValidationError, LoadStage, Result, ValidationError};
    pub use crate::notify::{ChangeKind, ChannelSource, ReloadController, ReloadTarget, WatchState};
    pub use crate::sources::EnvSource;

    #[cfg(feature = "file-watch")]
    pub use crate::notify::NotifySource;
}
