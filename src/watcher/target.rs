//! Watch target definition and inclusion rules.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// Language preset that narrows what a watcher looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Preset {
    /// `*.py` files, `__pycache__` ignored.
    Python,
    /// `*.rs` and `*.toml` files, `target` ignored.
    Rust,
}

impl Preset {
    /// File extensions watched by this preset.
    #[must_use]
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Python => &["py"],
            Self::Rust => &["rs", "toml"],
        }
    }

    /// Cache directory this preset always ignores.
    #[must_use]
    pub fn cache_dir(self) -> &'static str {
        match self {
            Self::Python => "__pycache__",
            Self::Rust => "target",
        }
    }
}

/// A root path plus the rules deciding which files under it are watched.
///
/// Ignored directories are matched by basename, so `__pycache__` excludes
/// every directory with that exact name at any depth, and nothing else.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchTarget {
    root: PathBuf,
    ignored_dirs: BTreeSet<String>,
    extensions: Option<BTreeSet<String>>,
}

impl WatchTarget {
    /// Watch everything under `root`.
    ///
    /// Relative roots are made absolute against the current directory so
    /// snapshot keys are always absolute paths.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let root = std::path::absolute(&root).unwrap_or(root);
        Self {
            root,
            ignored_dirs: BTreeSet::new(),
            extensions: None,
        }
    }

    /// Add directory basenames to skip.
    #[must_use]
    pub fn ignore<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignored_dirs.extend(names.into_iter().map(Into::into));
        self
    }

    /// Restrict enumeration to the given extensions (without the dot).
    ///
    /// An empty list leaves the target unrestricted.
    #[must_use]
    pub fn extensions<I, S>(mut self, exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let exts: BTreeSet<String> = exts
            .into_iter()
            .map(Into::into)
            .map(|e| e.trim_start_matches('.').to_string())
            .filter(|e| !e.is_empty())
            .collect();
        if !exts.is_empty() {
            self.extensions.get_or_insert_with(BTreeSet::new).extend(exts);
        }
        self
    }

    /// Apply a language preset on top of the current rules.
    #[must_use]
    pub fn preset(self, preset: Preset) -> Self {
        self.ignore([preset.cache_dir()])
            .extensions(preset.extensions().iter().copied())
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn ignored_dirs(&self) -> &BTreeSet<String> {
        &self.ignored_dirs
    }

    /// Whether a directory with this basename is skipped.
    #[must_use]
    pub fn is_ignored_dir(&self, name: &str) -> bool {
        self.ignored_dirs.contains(name)
    }

    /// Inclusion predicate for a file found while walking a directory root.
    ///
    /// The file's immediate parent basename must not be ignored, and when an
    /// extension allowlist is set the file's extension must be on it. The
    /// root itself is never treated as ignored, so files directly under a
    /// root named e.g. `target` are kept like the rest of its tree.
    #[must_use]
    pub fn includes(&self, path: &Path) -> bool {
        let parent_ignored = path
            .parent()
            .filter(|parent| *parent != self.root)
            .and_then(Path::file_name)
            .and_then(|name| name.to_str())
            .is_some_and(|name| self.is_ignored_dir(name));
        if parent_ignored {
            return false;
        }

        match &self.extensions {
            None => true,
            Some(allowed) => path
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| allowed.contains(ext)),
        }
    }
}
