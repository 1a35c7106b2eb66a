//! File watching backed by the OS notification API.

use super::source::{ChangeEvent, ChangeKind, ChangeSource, ChangeStream};
use crate::error::{ConfigError, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher as NotifyWatcher};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

/// Default window within which a burst of raw events becomes one change.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Change source that uses the `notify` crate.
///
/// Watches the file's parent directory rather than the file itself, so
/// editors that save by writing a new file and renaming it over the old one
/// keep triggering events, and a deleted file that reappears is picked up.
/// A burst of raw events within the debounce window is delivered as one
/// [`ChangeEvent`] carrying the last kind seen.
///
/// # Examples
///
/// ```rust,no_run
/// use strata_config::notify::{ChangeSource, NotifySource};
/// use std::path::Path;
/// use std::time::Duration;
///
/// # async fn example() -> strata_config::error::Result<()> {
/// let source = NotifySource::new().with_debounce(Duration::from_millis(250));
/// let mut stream = source.subscribe(Path::new("/etc/app/config.yaml"))?;
///
/// while let Some(event) = stream.next().await {
///     println!("{:?} changed: {:?}", event.path, event.kind);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct NotifySource {
    debounce: Duration,
}

impl NotifySource {
    /// Create a source with the default debounce window.
    pub fn new() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    /// Set the debounce window. Zero forwards every raw event.
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Get the debounce duration for this source.
    pub fn debounce_duration(&self) -> Duration {
        self.debounce
    }
}

impl Default for NotifySource {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeSource for NotifySource {
    fn subscribe(&self, path: &Path) -> Result<ChangeStream> {
        let (dir, file_name) = split_watch_target(path)?;
        let watched = dir.join(&file_name);

        // Raw events from notify, already filtered to our file
        let (raw_tx, raw_rx) = mpsc::unbounded_channel::<ChangeKind>();

        let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
            Ok(event) => {
                let ours = event
                    .paths
                    .iter()
                    .any(|p| p.file_name() == Some(file_name.as_os_str()));
                if let (true, Some(kind)) = (ours, change_kind(&event.kind)) {
                    let _ = raw_tx.send(kind);
                }
            }
            Err(e) => tracing::error!(error = %e, "File watch error"),
        })
        .map_err(|e| ConfigError::WatchError(format!("Failed to create file watcher: {}", e)))?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| ConfigError::WatchError(format!("Failed to watch {}: {}", dir.display(), e)))?;

        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(debounce(raw_rx, tx, self.debounce, watched));

        // The watcher lives inside the stream; dropping the stream stops it.
        Ok(ChangeStream::new(rx, watcher))
    }
}

fn split_watch_target(path: &Path) -> Result<(PathBuf, OsString)> {
    let file_name = path
        .file_name()
        .ok_or_else(|| ConfigError::WatchError(format!("Not a file path: {}", path.display())))?
        .to_os_string();

    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let dir = parent.canonicalize().map_err(|e| {
        ConfigError::WatchError(format!("Failed to resolve {}: {}", parent.display(), e))
    })?;

    Ok((dir, file_name))
}

fn change_kind(kind: &EventKind) -> Option<ChangeKind> {
    match kind {
        EventKind::Create(_) => Some(ChangeKind::Created),
        EventKind::Modify(_) => Some(ChangeKind::Modified),
        EventKind::Remove(_) => Some(ChangeKind::Removed),
        _ => None,
    }
}

async fn debounce(
    mut raw: mpsc::UnboundedReceiver<ChangeKind>,
    tx: mpsc::UnboundedSender<ChangeEvent>,
    window: Duration,
    path: PathBuf,
) {
    while let Some(mut kind) = raw.recv().await {
        if !window.is_zero() {
            let deadline = sleep(window);
            tokio::pin!(deadline);
            loop {
                tokio::select! {
                    _ = &mut deadline => break,
                    next = raw.recv() => match next {
                        Some(next) => kind = next,
                        None => break,
                    },
                }
            }
        }

        let event = ChangeEvent {
            path: path.clone(),
            kind,
        };
        if tx.send(event).is_err() {
            // Stream dropped, exit
            break;
        }
    }
}
