//! Supervisor module tests.

mod runner_test;

/// Verify all public supervisor types are exported from the library.
#[test]
fn test_all_supervisor_types_exported() {
    use rload::supervisor::{
        LoopState, LoopStateMachine, LoopStats, ReloadError, Reloader,
    };
    use rload::watcher::WatchTarget;

    let _ = LoopStateMachine::new();
    let _ = Reloader::new(WatchTarget::new("/definitely/not/here"));

    // Verify error types exist
    let _: fn(rload::process::SpawnError) -> ReloadError = ReloadError::Spawn;

    // Verify enum variants
    let _ = LoopState::Idle;
    let _ = LoopStats::default();
}
