//! Filesystem snapshots and snapshot diffing.
//!
//! A snapshot maps every watched file to its modification time. Changes are
//! detected purely by comparing two snapshots, so two writes landing in the
//! same timestamp tick are indistinguishable.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use walkdir::WalkDir;

use super::changes::ChangeSet;
use super::target::WatchTarget;

/// Point-in-time mapping of absolute file paths to modification times.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    files: BTreeMap<PathBuf, SystemTime>,
}

impl Snapshot {
    /// Capture the current state of a watch target.
    ///
    /// Enumeration is best-effort: unreadable entries, symlinks and files
    /// that disappear before their timestamp is read are left out.
    #[must_use]
    pub fn capture(target: &WatchTarget) -> Self {
        let root = target.root();
        let mut files = BTreeMap::new();

        let Ok(meta) = std::fs::metadata(root) else {
            tracing::debug!(root = %root.display(), "Watch root missing, empty snapshot");
            return Self { files };
        };

        if meta.is_file() {
            if let Ok(mtime) = meta.modified() {
                files.insert(root.to_path_buf(), mtime);
            }
            return Self { files };
        }

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                entry.depth() == 0
                    || !entry.file_type().is_dir()
                    || !entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| target.is_ignored_dir(name))
            });

        for entry in walker.filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            if !target.includes(path) {
                continue;
            }
            // The file may be gone by now.
            let Some(mtime) = entry.metadata().ok().and_then(|m| m.modified().ok()) else {
                continue;
            };
            files.insert(path.to_path_buf(), mtime);
        }

        Self { files }
    }

    /// Build a snapshot from explicit entries.
    pub fn from_entries<I, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (P, SystemTime)>,
        P: Into<PathBuf>,
    {
        Self {
            files: entries.into_iter().map(|(p, t)| (p.into(), t)).collect(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    #[must_use]
    pub fn contains(&self, path: &Path) -> bool {
        self.files.contains_key(path)
    }

    /// Recorded modification time for a path.
    #[must_use]
    pub fn modified(&self, path: &Path) -> Option<SystemTime> {
        self.files.get(path).copied()
    }

    /// Iterate recorded paths in sorted order.
    pub fn paths(&self) -> impl Iterator<Item = &Path> {
        self.files.keys().map(PathBuf::as_path)
    }
}

/// Diff two snapshots, checking the real filesystem for vanished files.
#[must_use]
pub fn diff(before: &Snapshot, after: &Snapshot) -> ChangeSet {
    diff_with(before, after, Path::exists)
}

/// Diff two snapshots with a caller-supplied existence probe.
///
/// A path lands in exactly one list. Removed wins over Modified when a file
/// is recorded in both snapshots but `exists` reports it gone.
pub fn diff_with<F>(before: &Snapshot, after: &Snapshot, exists: F) -> ChangeSet
where
    F: Fn(&Path) -> bool,
{
    let mut changes = ChangeSet::default();

    for path in after.files.keys() {
        if !before.files.contains_key(path) {
            changes.added.push(path.clone());
        }
    }

    for (path, old_mtime) in &before.files {
        match after.files.get(path) {
            None => changes.removed.push(path.clone()),
            Some(_) if !exists(path) => changes.removed.push(path.clone()),
            Some(new_mtime) if new_mtime != old_mtime => changes.modified.push(path.clone()),
            Some(_) => {}
        }
    }

    changes
}
