//! Polling file watcher.
//!
//! Detects added, removed and modified files by diffing modification-time
//! snapshots of a watch target.

mod change_watcher;
mod changes;
mod snapshot;
mod target;

pub use change_watcher::ChangeWatcher;
pub use changes::{Change, ChangeKind, ChangeSet};
pub use snapshot::{diff, diff_with, Snapshot};
pub use target::{Preset, WatchTarget};
