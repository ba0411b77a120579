//! Event names, payloads and errors.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::watcher::{Change, ChangeKind, ChangeSet};

/// Error returned by a listener.
pub type HandlerError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by the event bus.
#[derive(thiserror::Error, Debug)]
pub enum EventError {
    /// Event name is not one of `change`, `reload`, `reloaded`.
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// Removing handlers for an event that has none.
    #[error("No handlers registered for event '{0}'")]
    NotRegistered(EventKind),

    /// A listener failed; later listeners were not invoked.
    #[error("Handler for '{event}' failed: {source}")]
    Handler {
        event: EventKind,
        source: HandlerError,
    },
}

/// Name of an event emitted by the reload loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Change,
    Reload,
    Reloaded,
}

impl EventKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Change => "change",
            Self::Reload => "reload",
            Self::Reloaded => "reloaded",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = EventError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "change" => Ok(Self::Change),
            "reload" => Ok(Self::Reload),
            "reloaded" => Ok(Self::Reloaded),
            other => Err(EventError::UnknownEvent(other.to_string())),
        }
    }
}

/// Payload published to listeners.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReloadEvent {
    /// A poll found changes.
    Change {
        /// Kind reported for the batch.
        kind: ChangeKind,
        /// Last change in the batch.
        change: Change,
        /// The full batch.
        changes: ChangeSet,
    },
    /// A restart is about to begin.
    Reload { path: PathBuf },
    /// A replacement process has been started.
    Reloaded { path: PathBuf },
}

impl ReloadEvent {
    /// Build a `Change` event from a batch. Returns `None` for an empty batch.
    #[must_use]
    pub fn from_changes(changes: ChangeSet) -> Option<Self> {
        let kind = changes.primary_kind()?;
        let change = changes.last()?;
        Some(Self::Change {
            kind,
            change,
            changes,
        })
    }

    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self {
            Self::Change { .. } => EventKind::Change,
            Self::Reload { .. } => EventKind::Reload,
            Self::Reloaded { .. } => EventKind::Reloaded,
        }
    }
}
