//! Configuration change notification system.
//!
//! Provides change sources, the reload controller that reacts to them, and
//! subscriber-based notifications when a new snapshot is installed.

pub mod controller;
pub mod source;
pub mod subscriber;

#[cfg(feature = "file-watch")]
pub mod watcher;

pub use controller::{ReloadController, ReloadTarget, WatchState};
pub use source::{ChangeEvent, ChangeKind, ChangeSource, ChangeStream, ChannelSource};
pub use subscriber::{SubscriberRegistry, SubscriptionHandle};

#[cfg(feature = "file-watch")]
pub use watcher::NotifySource;
