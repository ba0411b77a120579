//! Polling change watcher.

use super::changes::ChangeSet;
use super::snapshot::{diff, Snapshot};
use super::target::WatchTarget;

/// Holds the last snapshot of a target and reports what changed since.
///
/// `poll` takes `&mut self`, so one watcher is never advanced from two
/// places at once.
#[derive(Debug)]
pub struct ChangeWatcher {
    target: WatchTarget,
    before: Snapshot,
}

impl ChangeWatcher {
    /// Create a watcher, capturing the initial snapshot immediately.
    #[must_use]
    pub fn new(target: WatchTarget) -> Self {
        let before = Snapshot::capture(&target);
        tracing::debug!(
            root = %target.root().display(),
            files = before.len(),
            "Initial snapshot captured"
        );
        Self { target, before }
    }

    /// Take a new snapshot, diff it against the previous one and advance.
    pub fn poll(&mut self) -> ChangeSet {
        let after = Snapshot::capture(&self.target);
        let changes = diff(&self.before, &after);
        if !changes.is_empty() {
            tracing::debug!(
                added = changes.added.len(),
                removed = changes.removed.len(),
                modified = changes.modified.len(),
                "Changes detected"
            );
        }
        self.before = after;
        changes
    }

    #[must_use]
    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    /// The snapshot the next poll will diff against.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.before
    }
}
