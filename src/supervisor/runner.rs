//! Reload loop.
//!
//! Each iteration runs two phases in sequence: a poll phase that asks the
//! watcher for changes and publishes `change`, then a restart phase that,
//! if a change was seen, publishes `reload`, replaces the process and
//! publishes `reloaded`. The loop then sleeps for the configured delay. The
//! sleep is the only point where cancellation is observed, so a restart is
//! never left half done.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::ReloadConfig;
use crate::events::{EventBus, EventError, EventKind, HandlerError, ListenerId, ReloadEvent};
use crate::process::{ProcessSupervisor, SpawnError, SupervisedProcess, Target};
use crate::supervisor::{shutdown_signal, LoopState, LoopStateMachine, LoopStats};
use crate::watcher::{ChangeWatcher, WatchTarget};

/// Error type for reload loop operations.
#[derive(thiserror::Error, Debug)]
pub enum ReloadError {
    /// The initial process could not be started.
    #[error("Failed to start process: {0}")]
    Spawn(#[from] SpawnError),
    /// A listener failed while handling an event.
    #[error(transparent)]
    Event(#[from] EventError),
}

/// Watches a target and restarts a process whenever it changes.
#[derive(Debug)]
pub struct Reloader {
    watcher: ChangeWatcher,
    supervisor: ProcessSupervisor,
    events: EventBus,
    delay: Duration,
    triggered: bool,
    state: LoopStateMachine,
    cancel: Option<CancellationToken>,
}

impl Reloader {
    /// Create a reloader for a watch target, capturing the first snapshot.
    ///
    /// Uses no delay between iterations and the default stop timeouts.
    #[must_use]
    pub fn new(target: WatchTarget) -> Self {
        Self {
            watcher: ChangeWatcher::new(target),
            supervisor: ProcessSupervisor::default(),
            events: EventBus::new(),
            delay: Duration::ZERO,
            triggered: false,
            state: LoopStateMachine::new(),
            cancel: None,
        }
    }

    /// Create a reloader from loaded configuration.
    #[must_use]
    pub fn from_config(config: &ReloadConfig) -> Self {
        Self::new(config.watch_target())
            .with_delay(config.delay())
            .with_supervisor(config.supervisor())
    }

    /// Set the sleep between iterations.
    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Set the supervisor used to start and stop the process.
    #[must_use]
    pub fn with_supervisor(mut self, supervisor: ProcessSupervisor) -> Self {
        self.supervisor = supervisor;
        self
    }

    /// Use an external cancellation token instead of OS signals.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Register a listener. Shorthand for `events_mut().on(..)`.
    pub fn on<F>(&mut self, kind: EventKind, handler: F) -> ListenerId
    where
        F: FnMut(&ReloadEvent) -> Result<(), HandlerError> + Send + 'static,
    {
        self.events.on(kind, handler)
    }

    pub fn events_mut(&mut self) -> &mut EventBus {
        &mut self.events
    }

    #[must_use]
    pub fn watcher(&self) -> &ChangeWatcher {
        &self.watcher
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Whether a change is waiting for the next restart phase.
    #[must_use]
    pub fn is_triggered(&self) -> bool {
        self.triggered
    }

    #[must_use]
    pub fn state(&self) -> LoopState {
        self.state.state()
    }

    #[must_use]
    pub fn stats(&self) -> LoopStats {
        self.state.stats()
    }

    /// Poll for changes and publish them, without managing a process.
    ///
    /// Runs until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ReloadError::Event` if a listener fails.
    pub async fn watch(&mut self) -> Result<LoopStats, ReloadError> {
        let (cancel, listener) = self.cancellation();
        let mut process = None;
        let result = self.drive(&cancel, None, &mut process).await;
        Self::finish_listener(listener);
        self.state.transition(LoopState::Stopped);
        result.map(|()| self.stats())
    }

    /// Start the target and restart it on every detected change.
    ///
    /// Runs until cancelled, then stops the current process.
    ///
    /// # Errors
    ///
    /// Returns `ReloadError::Spawn` if the first start fails and
    /// `ReloadError::Event` if a listener fails. Spawn failures during a
    /// restart are logged and retried on the next change.
    pub async fn run(&mut self, target: &Target) -> Result<LoopStats, ReloadError> {
        let mut process = Some(self.supervisor.start(target)?);
        let (cancel, listener) = self.cancellation();

        let result = self.drive(&cancel, Some(target), &mut process).await;

        if let Some(mut current) = process.take() {
            let outcome = self.supervisor.stop(&mut current).await;
            tracing::debug!(?outcome, "Final process stopped");
        }
        Self::finish_listener(listener);
        self.state.transition(LoopState::Stopped);
        result.map(|()| self.stats())
    }

    async fn drive(
        &mut self,
        cancel: &CancellationToken,
        target: Option<&Target>,
        process: &mut Option<SupervisedProcess>,
    ) -> Result<(), ReloadError> {
        loop {
            self.poll_phase(target.is_some())?;
            if let Some(target) = target {
                self.restart_phase(target, process).await?;
            }

            self.state.transition(LoopState::Sleeping);
            tokio::select! {
                biased;

                () = cancel.cancelled() => {
                    tracing::info!("Reload loop cancelled");
                    return Ok(());
                }
                () = tokio::time::sleep(self.delay) => {}
            }
        }
    }

    /// Poll once and publish `change`. `arm_restart` is false in watch mode,
    /// where no restart phase will ever consume the trigger.
    fn poll_phase(&mut self, arm_restart: bool) -> Result<(), EventError> {
        self.state.transition(LoopState::Polling);
        self.state.record_poll();

        let changes = self.watcher.poll();
        let Some(event) = ReloadEvent::from_changes(changes) else {
            self.state.transition(LoopState::NoChanges);
            return Ok(());
        };

        self.state.transition(LoopState::ChangesDetected);
        self.state.record_changes();
        self.triggered |= arm_restart;
        self.events.publish(&event)
    }

    async fn restart_phase(
        &mut self,
        target: &Target,
        process: &mut Option<SupervisedProcess>,
    ) -> Result<(), EventError> {
        if !self.triggered {
            return Ok(());
        }

        self.state.transition(LoopState::Restarting);
        let path = target.path().to_path_buf();
        tracing::info!(target = %target.name(), "Reloading");
        self.events.publish(&ReloadEvent::Reload { path: path.clone() })?;

        if let Some(mut old) = process.take() {
            let outcome = self.supervisor.stop(&mut old).await;
            tracing::debug!(?outcome, "Previous process stopped");
        }

        let started = match self.supervisor.start(target) {
            Ok(new) => {
                *process = Some(new);
                self.state.record_restart();
                true
            }
            Err(e) => {
                tracing::error!(target = %target.name(), error = %e, "Restart failed");
                self.state.record_failed_restart();
                false
            }
        };
        self.triggered = false;

        if started {
            self.events.publish(&ReloadEvent::Reloaded { path })?;
        }
        Ok(())
    }

    /// Token for this run plus, when no token was supplied, the task that
    /// cancels it on SIGINT/SIGTERM.
    fn cancellation(&self) -> (CancellationToken, Option<JoinHandle<()>>) {
        if let Some(cancel) = &self.cancel {
            return (cancel.clone(), None);
        }
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        let listener = tokio::spawn(async move {
            shutdown_signal().await;
            trigger.cancel();
        });
        (cancel, Some(listener))
    }

    fn finish_listener(listener: Option<JoinHandle<()>>) {
        if let Some(listener) = listener {
            listener.abort();
        }
    }
}
