//! Turns change notifications into serialized, coalesced reloads.

use super::source::{ChangeSource, ChangeStream};
use crate::error::{ConfigError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

/// Something a [`ReloadController`] can reload.
///
/// Implemented by [`ConfigStore`](crate::core::ConfigStore).
#[async_trait]
pub trait ReloadTarget: Send + Sync + 'static {
    /// The file to watch, or `None` if there is nothing to watch yet.
    fn watch_path(&self) -> Option<PathBuf>;

    /// Run one reload. Failures are expected to be reported by the target.
    async fn reload(&self) -> Result<()>;
}

/// Lifecycle state of a [`ReloadController`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    /// No subscription
    Idle,
    /// Subscribed, waiting for a change
    Watching,
    /// A reload triggered by a change is running
    Reloading,
}

struct Shared {
    state: Mutex<WatchState>,
    reloads: AtomicU64,
}

impl Shared {
    fn set(&self, state: WatchState) {
        *self.state.lock() = state;
    }
}

struct ActiveWatch {
    stop: oneshot::Sender<()>,
    task: JoinHandle<()>,
}

/// Watches the configuration file and reloads the store when it changes.
///
/// At most one reload runs at a time. Changes that arrive while a reload is
/// running are collapsed into a single follow-up reload, started as soon as
/// the current one finishes.
///
/// # Examples
///
/// ```rust,no_run
/// use strata_config::prelude::*;
/// use std::sync::Arc;
///
/// # async fn example() -> Result<()> {
/// let store = Arc::new(ConfigStore::new());
/// store.load(LoadOptions::new("config/app.yaml")).await?;
///
/// let controller = ReloadController::new(Arc::clone(&store));
/// controller.watch().await?;
///
/// // ... edits to config/app.yaml are now picked up ...
///
/// controller.unwatch().await;
/// # Ok(())
/// # }
/// ```
pub struct ReloadController {
    target: Arc<dyn ReloadTarget>,
    source: Arc<dyn ChangeSource>,
    shared: Arc<Shared>,
    active: tokio::sync::Mutex<Option<ActiveWatch>>,
}

impl ReloadController {
    /// Controller for `target` that watches the file with [`NotifySource`](super::NotifySource).
    #[cfg(feature = "file-watch")]
    pub fn new<T: ReloadTarget>(target: Arc<T>) -> Self {
        Self::with_source(target, super::NotifySource::new())
    }

    /// Controller for `target` fed by a custom change source.
    pub fn with_source<T, S>(target: Arc<T>, source: S) -> Self
    where
        T: ReloadTarget,
        S: ChangeSource + 'static,
    {
        Self {
            target,
            source: Arc::new(source),
            shared: Arc::new(Shared {
                state: Mutex::new(WatchState::Idle),
                reloads: AtomicU64::new(0),
            }),
            active: tokio::sync::Mutex::new(None),
        }
    }

    /// Subscribe to changes of the target's file and start reloading on them.
    ///
    /// Calling this while already watching does nothing.
    ///
    /// # Errors
    ///
    /// Returns `NotLoaded` if the target has no file yet, or `WatchError` if
    /// the subscription cannot be established.
    pub async fn watch(&self) -> Result<()> {
        let mut active = self.active.lock().await;
        if active.as_ref().is_some_and(|watch| !watch.task.is_finished()) {
            tracing::debug!("Already watching, ignoring watch()");
            return Ok(());
        }

        let path = self.target.watch_path().ok_or(ConfigError::NotLoaded)?;
        let stream = self.source.subscribe(&path)?;
        let (stop, stop_rx) = oneshot::channel();

        self.shared.set(WatchState::Watching);
        let task = tokio::spawn(run(
            stream,
            stop_rx,
            Arc::clone(&self.target),
            Arc::clone(&self.shared),
        ));
        *active = Some(ActiveWatch { stop, task });

        tracing::info!(path = %path.display(), "Watching configuration file");
        Ok(())
    }

    /// Release the subscription and return to [`WatchState::Idle`].
    ///
    /// A reload already in flight, and a follow-up already scheduled by an
    /// earlier change, are allowed to finish; this waits for them. Changes
    /// after this call are ignored.
    pub async fn unwatch(&self) {
        let Some(watch) = self.active.lock().await.take() else {
            return;
        };

        let _ = watch.stop.send(());
        if let Err(e) = watch.task.await {
            tracing::error!(error = %e, "Reload task failed");
        }
        self.shared.set(WatchState::Idle);
        tracing::info!("Stopped watching configuration file");
    }

    /// Current lifecycle state.
    pub fn state(&self) -> WatchState {
        *self.shared.state.lock()
    }

    /// Whether a subscription is active.
    pub fn is_watching(&self) -> bool {
        self.state() != WatchState::Idle
    }

    /// Number of reloads this controller has run.
    pub fn reload_count(&self) -> u64 {
        self.shared.reloads.load(Ordering::SeqCst)
    }
}

async fn run(
    mut stream: ChangeStream,
    mut stop: oneshot::Receiver<()>,
    target: Arc<dyn ReloadTarget>,
    shared: Arc<Shared>,
) {
    // Once the stop signal has been seen, `stop` must not be polled again.
    let mut stopping = false;
    let mut closed = false;

    while !stopping && !closed {
        let event = tokio::select! {
            biased;
            _ = &mut stop => break,
            event = stream.next() => event,
        };
        let Some(event) = event else {
            tracing::warn!("Change notifications ended, no longer watching");
            break;
        };
        tracing::debug!(path = %event.path.display(), kind = ?event.kind, "Configuration file changed");

        shared.set(WatchState::Reloading);
        let mut pending = true;
        while pending {
            pending = false;

            let reload = target.reload();
            tokio::pin!(reload);
            loop {
                tokio::select! {
                    biased;
                    result = &mut reload => {
                        shared.reloads.fetch_add(1, Ordering::SeqCst);
                        if let Err(e) = result {
                            tracing::debug!(error = %e, "Triggered reload failed");
                        }
                        break;
                    }
                    _ = &mut stop, if !stopping => stopping = true,
                    next = stream.next(), if !stopping && !closed => match next {
                        Some(_) => pending = true,
                        None => closed = true,
                    },
                }
            }

            // Changes that landed between the last poll and completion
            if !stopping {
                while stream.try_next().is_some() {
                    pending = true;
                }
            }
            if pending {
                tracing::debug!("Changes arrived during reload, reloading again");
            }
        }

        if !stopping && !closed {
            shared.set(WatchState::Watching);
        }
    }

    shared.set(WatchState::Idle);
}
