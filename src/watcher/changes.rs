//! Change classification types.

use std::fmt;
use std::path::PathBuf;

/// Kind of change detected for a single path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    Added,
    Modified,
    Removed,
}

impl ChangeKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One detected change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Change {
    pub kind: ChangeKind,
    pub path: PathBuf,
}

/// Classified difference between two snapshots.
///
/// Each path appears in at most one of the three lists.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub added: Vec<PathBuf>,
    pub removed: Vec<PathBuf>,
    pub modified: Vec<PathBuf>,
}

impl ChangeSet {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty() && self.modified.is_empty()
    }

    /// Total number of changed paths.
    #[must_use]
    pub fn len(&self) -> usize {
        self.added.len() + self.removed.len() + self.modified.len()
    }

    /// Kind reported for the whole batch: added, then removed, then modified.
    #[must_use]
    pub fn primary_kind(&self) -> Option<ChangeKind> {
        if !self.added.is_empty() {
            Some(ChangeKind::Added)
        } else if !self.removed.is_empty() {
            Some(ChangeKind::Removed)
        } else if !self.modified.is_empty() {
            Some(ChangeKind::Modified)
        } else {
            None
        }
    }

    /// Last change in classification order (added, removed, modified).
    #[must_use]
    pub fn last(&self) -> Option<Change> {
        let pick = |kind: ChangeKind, paths: &[PathBuf]| {
            paths.last().map(|path| Change {
                kind,
                path: path.clone(),
            })
        };
        pick(ChangeKind::Modified, &self.modified)
            .or_else(|| pick(ChangeKind::Removed, &self.removed))
            .or_else(|| pick(ChangeKind::Added, &self.added))
    }

    /// Iterate every change, added first, then removed, then modified.
    pub fn iter(&self) -> impl Iterator<Item = Change> + '_ {
        let tag = |kind: ChangeKind| {
            move |path: &PathBuf| Change {
                kind,
                path: path.clone(),
            }
        };
        self.added
            .iter()
            .map(tag(ChangeKind::Added))
            .chain(self.removed.iter().map(tag(ChangeKind::Removed)))
            .chain(self.modified.iter().map(tag(ChangeKind::Modified)))
    }
}
