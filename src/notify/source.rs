//! Change notification transport.
//!
//! A [`ChangeSource`] turns "watch this path" into a [`ChangeStream`] of
//! events. The reload policy lives in the controller; sources only deliver.

use crate::error::Result;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::mpsc;

/// What happened to the watched file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    /// The file was created (or replaced by a rename)
    Created,
    /// The file contents or metadata changed
    Modified,
    /// The file was deleted
    Removed,
}

/// A single change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    /// The watched path
    pub path: PathBuf,
    /// What happened
    pub kind: ChangeKind,
}

/// A subscription to change events for one path.
///
/// Dropping the stream releases the subscription, including any OS watch
/// handle held by the source.
pub struct ChangeStream {
    events: mpsc::UnboundedReceiver<ChangeEvent>,
    _guard: Box<dyn Any + Send>,
}

impl ChangeStream {
    /// Wrap a receiver, keeping `guard` alive for as long as the stream.
    pub fn new(events: mpsc::UnboundedReceiver<ChangeEvent>, guard: impl Any + Send) -> Self {
        Self {
            events,
            _guard: Box::new(guard),
        }
    }

    /// Wait for the next event; `None` once the source has gone away.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.events.recv().await
    }

    /// Take an already-delivered event without waiting.
    pub fn try_next(&mut self) -> Option<ChangeEvent> {
        self.events.try_recv().ok()
    }
}

impl fmt::Debug for ChangeStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeStream").finish_non_exhaustive()
    }
}

/// Produces change streams for paths.
pub trait ChangeSource: Send + Sync {
    /// Start delivering change events for `path`.
    ///
    /// # Errors
    ///
    /// Returns `WatchError` if the subscription cannot be established.
    fn subscribe(&self, path: &Path) -> Result<ChangeStream>;
}

/// A change source driven by hand.
///
/// Useful in tests, and for applications that learn about changes through
/// their own channels (a signal handler, an admin endpoint).
///
/// # Examples
///
/// ```rust
/// use strata_config::notify::{ChangeKind, ChangeSource, ChannelSource};
/// use std::path::Path;
///
/// let source = ChannelSource::new();
/// let mut stream = source.subscribe(Path::new("app.yaml")).unwrap();
///
/// assert_eq!(source.trigger(ChangeKind::Modified), 1);
/// assert_eq!(stream.try_next().unwrap().kind, ChangeKind::Modified);
/// ```
#[derive(Clone, Default)]
pub struct ChannelSource {
    subscribers: Arc<Mutex<Vec<(PathBuf, mpsc::UnboundedSender<ChangeEvent>)>>>,
}

impl ChannelSource {
    /// Create a source with no subscribers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Deliver an event to every live subscription; returns how many received it.
    pub fn trigger(&self, kind: ChangeKind) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|(_, tx)| !tx.is_closed());
        subscribers
            .iter()
            .filter(|(path, tx)| {
                tx.send(ChangeEvent {
                    path: path.clone(),
                    kind,
                })
                .is_ok()
            })
            .count()
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|(_, tx)| !tx.is_closed());
        subscribers.len()
    }
}

impl ChangeSource for ChannelSource {
    fn subscribe(&self, path: &Path) -> Result<ChangeStream> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers.lock().push((path.to_path_buf(), tx));
        Ok(ChangeStream::new(rx, ()))
    }
}
