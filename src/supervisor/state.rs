//! Reload loop state machine.

/// Current phase of the reload loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoopState {
    #[default]
    Idle,
    Polling,
    ChangesDetected,
    NoChanges,
    Restarting,
    Sleeping,
    Stopped,
}

/// State machine for tracking loop progress.
#[derive(Debug, Clone)]
pub struct LoopStateMachine {
    state: LoopState,
    polls: usize,
    change_batches: usize,
    restarts: usize,
    failed_restarts: usize,
}

impl Default for LoopStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl LoopStateMachine {
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: LoopState::Idle,
            polls: 0,
            change_batches: 0,
            restarts: 0,
            failed_restarts: 0,
        }
    }

    #[must_use]
    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn transition(&mut self, new_state: LoopState) {
        tracing::trace!(from = ?self.state, to = ?new_state, "State transition");
        self.state = new_state;
    }

    pub fn record_poll(&mut self) {
        self.polls = self.polls.saturating_add(1);
    }

    pub fn record_changes(&mut self) {
        self.change_batches = self.change_batches.saturating_add(1);
    }

    pub fn record_restart(&mut self) {
        self.restarts = self.restarts.saturating_add(1);
    }

    pub fn record_failed_restart(&mut self) {
        self.failed_restarts = self.failed_restarts.saturating_add(1);
    }

    #[must_use]
    pub fn stats(&self) -> LoopStats {
        LoopStats {
            polls: self.polls,
            change_batches: self.change_batches,
            restarts: self.restarts,
            failed_restarts: self.failed_restarts,
        }
    }
}

/// Loop statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub polls: usize,
    pub change_batches: usize,
    pub restarts: usize,
    pub failed_restarts: usize,
}
