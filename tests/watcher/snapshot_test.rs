//! Tests for snapshot capture against real directory trees.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use rload::watcher::{diff, Preset, Snapshot, WatchTarget};
use tempfile::TempDir;

fn touch(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, "x").unwrap();
}

fn set_mtime(path: &Path, secs: u64) {
    let file = fs::File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::UNIX_EPOCH + Duration::from_secs(secs))
        .unwrap();
}

fn paths(snapshot: &Snapshot) -> Vec<PathBuf> {
    snapshot.paths().map(Path::to_path_buf).collect()
}

#[test]
fn capture_directory_records_every_file() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    touch(&root.join("a.py"));
    touch(&root.join("pkg/b.py"));
    touch(&root.join("pkg/deep/c.txt"));

    let snapshot = Snapshot::capture(&WatchTarget::new(root));

    assert_eq!(snapshot.len(), 3);
    assert!(snapshot.contains(&root.join("a.py")));
    assert!(snapshot.contains(&root.join("pkg/b.py")));
    assert!(snapshot.contains(&root.join("pkg/deep/c.txt")));
    assert!(paths(&snapshot).iter().all(|p| p.is_absolute()));
}

#[test]
fn capture_directories_themselves_are_not_recorded() {
    let dir = TempDir::new().unwrap();
    fs::create_dir_all(dir.path().join("empty/nested")).unwrap();

    let snapshot = Snapshot::capture(&WatchTarget::new(dir.path()));
    assert!(snapshot.is_empty());
}

#[test]
fn capture_single_file_root() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("main.py");
    touch(&file);
    touch(&dir.path().join("other.py"));
    set_mtime(&file, 100);

    let snapshot = Snapshot::capture(&WatchTarget::new(&file));

    assert_eq!(paths(&snapshot), vec![file.clone()]);
    assert_eq!(
        snapshot.modified(&file),
        Some(SystemTime::UNIX_EPOCH + Duration::from_secs(100))
    );
}

#[test]
fn capture_single_file_root_ignores_extension_filter() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("config.yaml");
    touch(&file);

    let target = WatchTarget::new(&file).preset(Preset::Python);
    assert_eq!(Snapshot::capture(&target).len(), 1);
}

#[test]
fn ignored_directory_excluded_at_any_depth() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    touch(&root.join("a/b/__pycache__/x.pyc"));
    touch(&root.join("__pycache__/top.pyc"));
    touch(&root.join("a/__pycache__/sub/y.py"));
    touch(&root.join("a/__pycache__b/x.py"));
    touch(&root.join("a/keep.py"));

    let target = WatchTarget::new(root).ignore(["__pycache__"]);
    let snapshot = Snapshot::capture(&target);

    assert_eq!(
        paths(&snapshot),
        vec![root.join("a/__pycache__b/x.py"), root.join("a/keep.py")]
    );
}

#[test]
fn ignored_names_match_basename_exactly() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    touch(&root.join("build/out.o"));
    touch(&root.join("rebuild/out.o"));
    touch(&root.join("build.rs"));

    let snapshot = Snapshot::capture(&WatchTarget::new(root).ignore(["build"]));

    assert!(!snapshot.contains(&root.join("build/out.o")));
    assert!(snapshot.contains(&root.join("rebuild/out.o")));
    assert!(snapshot.contains(&root.join("build.rs")));
}

#[test]
fn python_preset_limits_to_py_files() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    touch(&root.join("app.py"));
    touch(&root.join("README.md"));
    touch(&root.join("__pycache__/app.cpython-312.pyc"));

    let snapshot = Snapshot::capture(&WatchTarget::new(root).preset(Preset::Python));

    assert_eq!(paths(&snapshot), vec![root.join("app.py")]);
}

#[test]
fn rust_preset_ignores_target_dir() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    touch(&root.join("Cargo.toml"));
    touch(&root.join("src/main.rs"));
    touch(&root.join("target/debug/build/foo.rs"));

    let snapshot = Snapshot::capture(&WatchTarget::new(root).preset(Preset::Rust));

    assert_eq!(
        paths(&snapshot),
        vec![root.join("Cargo.toml"), root.join("src/main.rs")]
    );
}

#[cfg(unix)]
#[test]
fn symlinks_are_skipped() {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    touch(&root.join("real.py"));
    std::os::unix::fs::symlink(root.join("real.py"), root.join("link.py")).unwrap();

    let snapshot = Snapshot::capture(&WatchTarget::new(root));

    assert_eq!(paths(&snapshot), vec![root.join("real.py")]);
}

#[test]
fn diff_of_identical_capture_is_empty() {
    let dir = TempDir::new().unwrap();
    touch(&dir.path().join("a.py"));
    touch(&dir.path().join("b/c.py"));

    let snapshot = Snapshot::capture(&WatchTarget::new(dir.path()));
    assert!(diff(&snapshot, &snapshot).is_empty());
}

#[test]
fn diff_reports_file_deleted_after_capture_as_removed() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("a.py");
    touch(&file);
    set_mtime(&file, 100);

    let target = WatchTarget::new(dir.path());
    let before = Snapshot::capture(&target);
    set_mtime(&file, 200);
    let after = Snapshot::capture(&target);
    fs::remove_file(&file).unwrap();

    let changes = diff(&before, &after);
    assert_eq!(changes.removed, vec![file]);
    assert!(changes.modified.is_empty());
    assert!(changes.added.is_empty());
}

#[test]
fn root_named_like_ignored_dir_keeps_its_whole_tree() {
    let dir = TempDir::new().unwrap();
    let root = dir.path().join("target");
    touch(&root.join("top.rs"));
    touch(&root.join("sub/nested.rs"));
    touch(&root.join("sub/target/skipped.rs"));

    let snapshot = Snapshot::capture(&WatchTarget::new(&root).ignore(["target"]));

    assert_eq!(
        paths(&snapshot),
        vec![root.join("sub/nested.rs"), root.join("top.rs")]
    );
}
