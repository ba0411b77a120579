//! Integration tests for the reload loop.

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rload::events::{EventError, EventKind, ReloadEvent};
use rload::process::{ProcessSupervisor, Target};
use rload::supervisor::{LoopState, ReloadError, Reloader};
use rload::watcher::{ChangeKind, WatchTarget};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

type EventLog = Arc<Mutex<Vec<ReloadEvent>>>;

fn record_all(reloader: &mut Reloader) -> EventLog {
    let log: EventLog = Arc::new(Mutex::new(Vec::new()));
    for kind in [EventKind::Change, EventKind::Reload, EventKind::Reloaded] {
        let log = Arc::clone(&log);
        reloader.on(kind, move |event| {
            log.lock().unwrap().push(event.clone());
            Ok(())
        });
    }
    log
}

fn kinds(log: &EventLog) -> Vec<EventKind> {
    log.lock().unwrap().iter().map(ReloadEvent::kind).collect()
}

async fn wait_for_events(log: &EventLog, count: usize) {
    for _ in 0..500 {
        if log.lock().unwrap().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

fn sleeper() -> Target {
    Target::resolve("sleep").unwrap().args(["30"])
}

fn fast_reloader(root: &std::path::Path, cancel: &CancellationToken) -> Reloader {
    Reloader::new(WatchTarget::new(root))
        .with_delay(Duration::from_millis(20))
        .with_supervisor(ProcessSupervisor::new(
            Duration::from_secs(2),
            Duration::from_secs(1),
        ))
        .with_cancellation(cancel.clone())
}

#[tokio::test]
async fn run_restarts_process_after_change() {
    let dir = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    let mut reloader = fast_reloader(dir.path(), &cancel);
    let log = record_all(&mut reloader);
    let target = sleeper();
    let new_file = dir.path().join("app.py");

    let driver = {
        let log = Arc::clone(&log);
        let cancel = cancel.clone();
        let new_file = new_file.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            std::fs::write(&new_file, "print('v2')").unwrap();
            wait_for_events(&log, 3).await;
            cancel.cancel();
        }
    };

    let (result, ()) = tokio::join!(reloader.run(&target), driver);
    let stats = result.unwrap();

    assert_eq!(
        kinds(&log),
        vec![EventKind::Change, EventKind::Reload, EventKind::Reloaded]
    );
    assert_eq!(stats.restarts, 1);
    assert_eq!(stats.change_batches, 1);
    assert_eq!(stats.failed_restarts, 0);
    assert!(stats.polls >= 2);
    assert_eq!(reloader.state(), LoopState::Stopped);
    assert!(!reloader.is_triggered());

    let events = log.lock().unwrap();
    match &events[0] {
        ReloadEvent::Change { kind, change, .. } => {
            assert_eq!(*kind, ChangeKind::Added);
            assert_eq!(change.path, new_file);
        }
        other => panic!("expected change event, got {other:?}"),
    }
    assert_eq!(
        events[1],
        ReloadEvent::Reload {
            path: target.path().to_path_buf()
        }
    );
    assert_eq!(
        events[2],
        ReloadEvent::Reloaded {
            path: target.path().to_path_buf()
        }
    );
}

#[tokio::test]
async fn run_without_changes_never_restarts() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("stable.py"), "x").unwrap();
    let cancel = CancellationToken::new();
    let mut reloader = fast_reloader(dir.path(), &cancel);
    let log = record_all(&mut reloader);

    let driver = {
        let cancel = cancel.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(150)).await;
            cancel.cancel();
        }
    };

    let target = sleeper();
    let (result, ()) = tokio::join!(reloader.run(&target), driver);
    let stats = result.unwrap();

    assert!(log.lock().unwrap().is_empty());
    assert_eq!(stats.restarts, 0);
    assert!(stats.polls >= 1);
}

#[tokio::test]
async fn run_fails_when_first_start_fails() {
    let dir = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    let mut reloader = fast_reloader(dir.path(), &cancel);

    let target = Target::new(PathBuf::from("/nonexistent/rload-test-binary"));
    let err = reloader.run(&target).await.unwrap_err();

    assert!(matches!(err, ReloadError::Spawn(_)));
    assert_eq!(reloader.stats().polls, 0);
}

#[tokio::test]
async fn run_aborts_when_listener_fails() {
    let dir = TempDir::new().unwrap();
    let cancel = CancellationToken::new();
    let mut reloader = fast_reloader(dir.path(), &cancel);
    reloader.on(EventKind::Reload, |_| Err("refusing to reload".into()));
    let log = record_all(&mut reloader);

    let driver = {
        let root = dir.path().to_path_buf();
        async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            std::fs::write(root.join("main.py"), "x").unwrap();
        }
    };

    let run = async {
        tokio::time::timeout(Duration::from_secs(10), reloader.run(&sleeper()))
            .await
            .expect("reload loop did not abort")
    };
    let (result, ()) = tokio::join!(run, driver);

    let err = result.unwrap_err();
    assert!(matches!(
        err,
        ReloadError::Event(EventError::Handler {
            event: EventKind::Reload,
            ..
        })
    ));
    // The failing listener was registered first, so only `change` got through.
    assert_eq!(kinds(&log), vec![EventKind::Change]);
    assert_eq!(reloader.state(), LoopState::Stopped);
}

#[tokio::test]
async fn watch_publishes_changes_without_process() {
    let dir = TempDir::new().unwrap();
    let existing = dir.path().join("lib.py");
    std::fs::write(&existing, "x").unwrap();
    let cancel = CancellationToken::new();
    let mut reloader = fast_reloader(dir.path(), &cancel);
    let log = record_all(&mut reloader);

    let driver = {
        let log = Arc::clone(&log);
        let cancel = cancel.clone();
        let existing = existing.clone();
        async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            std::fs::remove_file(&existing).unwrap();
            wait_for_events(&log, 1).await;
            cancel.cancel();
        }
    };

    let (result, ()) = tokio::join!(reloader.watch(), driver);
    let stats = result.unwrap();

    assert_eq!(kinds(&log), vec![EventKind::Change]);
    assert_eq!(stats.restarts, 0);
    match &log.lock().unwrap()[0] {
        ReloadEvent::Change { kind, changes, .. } => {
            assert_eq!(*kind, ChangeKind::Removed);
            assert_eq!(changes.removed, vec![existing]);
        }
        other => panic!("expected change event, got {other:?}"),
    }
    // Watch mode has no restart phase, so nothing is left pending.
    assert!(!reloader.is_triggered());
}

#[cfg(unix)]
fn write_script(path: &std::path::Path, body: &str) {
    use std::os::unix::fs::PermissionsExt;

    std::fs::write(path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755)).unwrap();
}

#[cfg(unix)]
#[tokio::test]
async fn run_survives_failed_restart_and_retries_on_next_change() {
    let dir = TempDir::new().unwrap();
    let stash = TempDir::new().unwrap();
    let script = dir.path().join("serve.sh");
    let stashed = stash.path().join("serve.sh");
    // Exits at once, so stopping it never waits and the restart that
    // follows a removal runs to completion before the driver resumes.
    write_script(&script, "exit 0");

    let cancel = CancellationToken::new();
    let mut reloader = fast_reloader(dir.path(), &cancel);
    let log = record_all(&mut reloader);
    let target = Target::new(&script);

    let driver = {
        let log = Arc::clone(&log);
        let cancel = cancel.clone();
        let (script, stashed) = (script.clone(), stashed.clone());
        async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            std::fs::rename(&script, &stashed).unwrap();
            wait_for_events(&log, 2).await;
            std::fs::rename(&stashed, &script).unwrap();
            wait_for_events(&log, 5).await;
            cancel.cancel();
        }
    };

    let (result, ()) = tokio::join!(reloader.run(&target), driver);
    let stats = result.unwrap();

    assert_eq!(
        kinds(&log),
        vec![
            EventKind::Change,
            EventKind::Reload,
            EventKind::Change,
            EventKind::Reload,
            EventKind::Reloaded,
        ]
    );
    assert_eq!(stats.change_batches, 2);
    assert_eq!(stats.failed_restarts, 1);
    assert_eq!(stats.restarts, 1);

    let events = log.lock().unwrap();
    match (&events[0], &events[2]) {
        (
            ReloadEvent::Change { kind: first, .. },
            ReloadEvent::Change { kind: second, .. },
        ) => {
            assert_eq!(*first, ChangeKind::Removed);
            assert_eq!(*second, ChangeKind::Added);
        }
        other => panic!("expected two change events, got {other:?}"),
    }
}
