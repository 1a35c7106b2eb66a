//! Performance benchmarks for strata-config.
//!
//! These benchmarks cover:
//! - Snapshot read latency
//! - Typed key lookup on a snapshot
//! - Scaling with concurrent readers
//! - Reads continuing while the store reloads
//! - Full pipeline cost of a reload

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;
use strata_config::prelude::*;
use tempfile::TempDir;

const CONFIG: &str = r#"
NODE_ENV: production
PORT: "8080"
DEBUG: "false"
DATABASE_URL: postgres://localhost/bench
"#;

fn bench_schema() -> Schema {
    Schema::new()
        .field(
            "NODE_ENV",
            FieldSpec::string()
                .allowed(["development", "production"])
                .default_value("development"),
        )
        .field("PORT", FieldSpec::number().default_value(3000))
        .field("DEBUG", FieldSpec::boolean().default_value(false))
        .field("DATABASE_URL", FieldSpec::string().required())
}

fn loaded_store(runtime: &tokio::runtime::Runtime, path: &Path) -> Arc<ConfigStore> {
    fs::write(path, CONFIG).unwrap();
    let store = Arc::new(ConfigStore::new());
    runtime
        .block_on(store.load(
            LoadOptions::new(path)
                .with_schema(bench_schema())
                .with_env_source(EnvSource::fixed("", Vec::<(String, String)>::new())),
        ))
        .unwrap();
    store
}

/// Benchmark single-threaded read latency
fn benchmark_read_latency(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let temp_dir = TempDir::new().unwrap();
    let store = loaded_store(&runtime, &temp_dir.path().join("app.yaml"));

    let mut group = c.benchmark_group("read_latency");
    group.bench_function("get_config", |b| {
        b.iter(|| {
            let cfg = store.get_config().unwrap();
            black_box(cfg.version());
        });
    });
    group.bench_function("get_config_and_lookup", |b| {
        b.iter(|| {
            let cfg = store.get_config().unwrap();
            black_box(cfg.get_i64("PORT"));
        });
    });
    group.finish();
}

/// Benchmark concurrent reads with varying thread counts
fn benchmark_concurrent_reads(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let temp_dir = TempDir::new().unwrap();
    let store = loaded_store(&runtime, &temp_dir.path().join("app.yaml"));

    let mut group = c.benchmark_group("concurrent_reads");

    for num_threads in [1, 2, 4, 8, 16] {
        group.throughput(Throughput::Elements(num_threads as u64 * 1000));

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}_threads", num_threads)),
            &num_threads,
            |b, &num_threads| {
                let barrier = Arc::new(Barrier::new(num_threads + 1));

                b.iter_custom(|iters| {
                    let mut handles = vec![];

                    for _ in 0..num_threads {
                        let store = Arc::clone(&store);
                        let b = Arc::clone(&barrier);

                        handles.push(thread::spawn(move || {
                            b.wait();

                            let start = std::time::Instant::now();
                            for _ in 0..iters {
                                let cfg = store.get_config().unwrap();
                                black_box(cfg.get_i64("PORT"));
                            }
                            start.elapsed()
                        }));
                    }

                    barrier.wait();

                    let total_duration: Duration =
                        handles.into_iter().map(|h| h.join().unwrap()).sum();

                    // Average duration across threads
                    total_duration / num_threads as u32
                });
            },
        );
    }

    group.finish();
}

/// Benchmark reload under load - readers never block or fail
fn benchmark_reload_under_load(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("app.yaml");

    let mut group = c.benchmark_group("reload_under_load");
    group.sample_size(10);
    group.measurement_time(Duration::from_secs(10));

    group.bench_function("reload_with_16_readers", |b| {
        b.iter_custom(|iters| {
            let store = loaded_store(&runtime, &path);
            runtime.block_on(async {
                let keep_running = Arc::new(AtomicBool::new(true));
                let reads_completed = Arc::new(AtomicUsize::new(0));

                let mut reader_handles = vec![];
                for _ in 0..16 {
                    let store = Arc::clone(&store);
                    let running = Arc::clone(&keep_running);
                    let counter = Arc::clone(&reads_completed);

                    reader_handles.push(tokio::spawn(async move {
                        while running.load(Ordering::Relaxed) {
                            let cfg = store.get_config().unwrap();
                            black_box(cfg.get_str("DATABASE_URL"));
                            counter.fetch_add(1, Ordering::Relaxed);
                            tokio::task::yield_now().await;
                        }
                    }));
                }

                let start = std::time::Instant::now();
                for i in 0..iters {
                    fs::write(&path, format!("PORT: {}\nDATABASE_URL: postgres://db{}\n", i, i))
                        .unwrap();
                    store.reload().await.unwrap();
                }
                let duration = start.elapsed();

                keep_running.store(false, Ordering::Relaxed);
                for handle in reader_handles {
                    handle.await.unwrap();
                }

                let total_reads = reads_completed.load(Ordering::Relaxed);
                println!("  Completed {} reads during {} reloads", total_reads, iters);

                duration
            })
        });
    });

    group.finish();
}

/// Benchmark comparison with lock-based snapshot holders
fn benchmark_mutex_comparison(c: &mut Criterion) {
    use std::sync::Mutex;

    let runtime = tokio::runtime::Runtime::new().unwrap();
    let temp_dir = TempDir::new().unwrap();
    let store = loaded_store(&runtime, &temp_dir.path().join("app.yaml"));
    let snapshot = store.get_config().unwrap();

    let mut group = c.benchmark_group("mutex_comparison");

    group.bench_function("store_read", |b| {
        b.iter(|| {
            let cfg = store.get_config().unwrap();
            black_box(cfg.get_i64("PORT"));
        });
    });

    let config_mutex = Mutex::new(Arc::clone(&snapshot));
    group.bench_function("mutex_arc_read", |b| {
        b.iter(|| {
            let cfg = config_mutex.lock().unwrap();
            black_box(cfg.get_i64("PORT"));
        });
    });

    let config_rwlock = std::sync::RwLock::new(snapshot);
    group.bench_function("rwlock_read", |b| {
        b.iter(|| {
            let cfg = config_rwlock.read().unwrap();
            black_box(cfg.get_i64("PORT"));
        });
    });

    group.finish();
}

/// Benchmark a full reload: read, decode, merge, validate, swap
fn benchmark_reload(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let temp_dir = TempDir::new().unwrap();
    let store = loaded_store(&runtime, &temp_dir.path().join("app.yaml"));

    let mut group = c.benchmark_group("reload");
    group.bench_function("reload_pipeline", |b| {
        b.iter(|| {
            runtime.block_on(async {
                black_box(store.reload().await.unwrap());
            });
        });
    });
    group.finish();
}

criterion_group!(
    benches,
    benchmark_read_latency,
    benchmark_concurrent_reads,
    benchmark_reload_under_load,
    benchmark_mutex_comparison,
    benchmark_reload,
);

criterion_main!(benches);
