//! Built-in metrics for configuration operations.
//!
//! Provides OpenTelemetry metrics tracking:
//! - Load and reload attempts/success/failures
//! - Pipeline duration
//! - Validation failures
//! - Active subscribers
//!
//! # Examples
//!
//! ```rust,no_run
//! use strata_config::prelude::*;
//! use opentelemetry::global;
//!
//! # async fn example() -> Result<()> {
//! let meter = global::meter("my-app");
//!
//! let store = ConfigStore::with_metrics(meter);
//! store.load(LoadOptions::new("config.yaml")).await?;
//! # Ok(())
//! # }
//! ```

mod config_metrics;

pub use config_metrics::{ConfigMetrics, Operation};
