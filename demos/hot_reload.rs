//! Example demonstrating file watching and automatic hot-reload.
//!
//! This example shows how to:
//! - Load layered configuration validated against a schema
//! - Reload automatically when the file changes
//! - Subscribe to new snapshots
//!
//! Run with: cargo run --example hot_reload
//!
//! While running, edit demos/config/hot_reload.yaml to see automatic reloads.
//! Invalid edits are logged and the previous configuration stays in place.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use strata_config::prelude::*;

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,strata_config=debug".into()),
        )
        .init();

    println!("=== Hot Reload Example ===\n");

    let config_path = "demos/config/hot_reload.yaml";
    if !std::path::Path::new(config_path).exists() {
        std::fs::create_dir_all("demos/config")?;
        std::fs::write(
            config_path,
            "NODE_ENV: development\nPORT: 8080\nDATABASE_URL: postgres://localhost/mydb\n",
        )?;
    }

    let schema = Schema::new()
        .field(
            "NODE_ENV",
            FieldSpec::string()
                .allowed(["development", "production"])
                .default_value("development"),
        )
        .field("PORT", FieldSpec::number().default_value(3000))
        .field("DEBUG", FieldSpec::boolean().default_value(false))
        .field("DATABASE_URL", FieldSpec::string().required());

    let store = Arc::new(ConfigStore::new());
    store
        .load(
            LoadOptions::new(config_path)
                .with_schema(schema)
                .with_env_prefix("DEMO_"),
        )
        .await?;

    let initial = store.get_config()?;
    println!("Initial configuration (version {}):", initial.version());
    for (key, value) in initial.iter() {
        println!("  {} = {}", key, value);
    }
    println!();

    let reload_count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&reload_count);
    let _subscription = store.subscribe(move |config| {
        let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
        println!(
            "Configuration reloaded (#{}): version {}, PORT={:?}, NODE_ENV={:?}",
            n,
            config.version(),
            config.get_i64("PORT"),
            config.get_str("NODE_ENV"),
        );
    });

    let controller = ReloadController::new(Arc::clone(&store));
    controller.watch().await?;

    println!("Watching {} for changes.", config_path);
    println!("Environment variables prefixed with DEMO_ override the file.");
    println!("Press Ctrl+C to exit.\n");

    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for Ctrl+C");
    }

    controller.unwatch().await;
    println!(
        "\nShutting down after {} reload(s).",
        reload_count.load(Ordering::SeqCst)
    );
    Ok(())
}
