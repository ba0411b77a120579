//! Watcher module tests.

mod snapshot_test;

/// Verify all public watcher types are exported from the library.
#[test]
fn test_all_watcher_types_exported() {
    use rload::watcher::{
        diff, diff_with, Change, ChangeKind, ChangeSet, ChangeWatcher, Preset, Snapshot,
        WatchTarget,
    };

    let target = WatchTarget::new("/definitely/not/here").preset(Preset::Python);
    let snapshot = Snapshot::capture(&target);
    assert!(diff(&snapshot, &snapshot).is_empty());
    assert!(diff_with(&snapshot, &snapshot, |_| true).is_empty());

    let _ = ChangeWatcher::new(target);
    let _ = ChangeSet::default();
    let _ = Change {
        kind: ChangeKind::Added,
        path: std::path::PathBuf::from("/x"),
    };
}
