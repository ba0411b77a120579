//! Process spawning and graceful-then-forced termination.

use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::{Child, Command};

use super::target::Target;

/// Default wait after the graceful signal before escalating.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Default wait after the forceful signal.
pub const DEFAULT_KILL_TIMEOUT: Duration = Duration::from_secs(1);

/// Error type for process spawning operations.
#[derive(thiserror::Error, Debug)]
pub enum SpawnError {
    /// The program was not found.
    #[error("Program not found: {0}")]
    NotFound(String),
    /// Permission denied when spawning.
    #[error("Permission denied: {0}")]
    PermissionDenied(String),
    /// Other I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SpawnError {
    /// Create a `SpawnError` from an I/O error, classifying common cases.
    fn from_io(err: std::io::Error, target: &Target) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(target.path().display().to_string()),
            std::io::ErrorKind::PermissionDenied => {
                Self::PermissionDenied(target.path().display().to_string())
            }
            _ => Self::Io(err),
        }
    }
}

/// Liveness of a supervised process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessState {
    Running,
    Stopping,
    /// Exited on its own or after the graceful signal.
    Exited(Option<i32>),
    /// Terminated by the forceful signal.
    Killed,
}

impl ProcessState {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Exited(_) | Self::Killed)
    }
}

/// How a call to [`ProcessSupervisor::stop`] ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The process was not running; nothing was sent.
    AlreadyExited,
    /// The process exited within the grace period.
    Graceful,
    /// The process was killed after ignoring the graceful signal.
    Forced,
    /// The process survived the kill timeout as well.
    Unresponsive,
}

/// A running child started by the supervisor.
#[derive(Debug)]
pub struct SupervisedProcess {
    child: Child,
    target: Target,
    pid: Option<u32>,
    state: ProcessState,
}

impl SupervisedProcess {
    /// OS process id, captured at spawn time.
    #[must_use]
    pub fn id(&self) -> Option<u32> {
        self.pid
    }

    #[must_use]
    pub fn target(&self) -> &Target {
        &self.target
    }

    #[must_use]
    pub fn state(&self) -> ProcessState {
        self.state
    }

    /// Check, without blocking, whether the process is still alive.
    ///
    /// A process whose status cannot be queried is treated as gone.
    pub fn is_alive(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        match self.child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                self.record_exit(status);
                false
            }
            Err(e) => {
                tracing::warn!(pid = ?self.pid, error = %e, "Failed to query process status");
                self.state = ProcessState::Exited(None);
                false
            }
        }
    }

    /// Exit code, once the process has exited normally.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self.state {
            ProcessState::Exited(code) => code,
            _ => None,
        }
    }

    /// Wait for the process to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if waiting fails.
    pub async fn wait(&mut self) -> std::io::Result<ExitStatus> {
        let status = self.child.wait().await?;
        self.record_exit(status);
        Ok(status)
    }

    fn record_exit(&mut self, status: ExitStatus) {
        if !self.state.is_terminal() {
            self.state = ProcessState::Exited(status.code());
        }
    }

    /// Wait up to `timeout` for exit. Returns `true` once the process is gone.
    async fn wait_timeout(&mut self, timeout: Duration) -> bool {
        match tokio::time::timeout(timeout, self.child.wait()).await {
            Ok(Ok(status)) => {
                self.record_exit(status);
                true
            }
            Ok(Err(e)) => {
                tracing::warn!(pid = ?self.pid, error = %e, "Failed waiting for process");
                self.state = ProcessState::Exited(None);
                true
            }
            Err(_) => false,
        }
    }
}

/// Starts target processes and stops them with signal escalation.
#[derive(Debug, Clone, Copy)]
pub struct ProcessSupervisor {
    grace_period: Duration,
    kill_timeout: Duration,
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self::new(DEFAULT_GRACE_PERIOD, DEFAULT_KILL_TIMEOUT)
    }
}

impl ProcessSupervisor {
    #[must_use]
    pub fn new(grace_period: Duration, kill_timeout: Duration) -> Self {
        Self {
            grace_period,
            kill_timeout,
        }
    }

    #[must_use]
    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    #[must_use]
    pub fn kill_timeout(&self) -> Duration {
        self.kill_timeout
    }

    /// Spawn the target. Returns as soon as the process has been created.
    ///
    /// # Errors
    ///
    /// Returns `SpawnError` if the process fails to spawn.
    pub fn start(&self, target: &Target) -> Result<SupervisedProcess, SpawnError> {
        let mut cmd = Command::new(target.path());
        cmd.args(target.get_args())
            .envs(target.get_env().iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        if let Some(dir) = target.get_working_dir() {
            cmd.current_dir(dir);
        }

        let child = cmd.spawn().map_err(|e| SpawnError::from_io(e, target))?;
        let pid = child.id();
        tracing::info!(target = %target.name(), pid = ?pid, "Process started");

        Ok(SupervisedProcess {
            child,
            target: target.clone(),
            pid,
            state: ProcessState::Running,
        })
    }

    /// Stop a process: graceful signal, grace period, then one forced kill.
    ///
    /// Never fails. Delivery errors for a process that is already dead count
    /// as already stopped. Any other delivery failure is logged and the stop
    /// goes straight to the forced kill.
    pub async fn stop(&self, process: &mut SupervisedProcess) -> StopOutcome {
        if !process.is_alive() {
            tracing::debug!(pid = ?process.pid, "Process already exited");
            return StopOutcome::AlreadyExited;
        }

        process.state = ProcessState::Stopping;

        #[cfg(unix)]
        {
            use nix::sys::signal::Signal;

            match send_signal(process, Signal::SIGINT) {
                Delivery::Sent => {
                    if process.wait_timeout(self.grace_period).await {
                        tracing::debug!(pid = ?process.pid, "Process exited after interrupt");
                        return StopOutcome::Graceful;
                    }
                    tracing::warn!(
                        pid = ?process.pid,
                        grace_period = ?self.grace_period,
                        "Process ignored interrupt, killing"
                    );
                }
                Delivery::Gone => {
                    process.state = ProcessState::Exited(None);
                    return StopOutcome::AlreadyExited;
                }
                Delivery::Failed => {}
            }
        }

        self.force_kill(process).await
    }

    async fn force_kill(&self, process: &mut SupervisedProcess) -> StopOutcome {
        if let Err(e) = process.child.start_kill() {
            // InvalidInput means the child was already reaped.
            if e.kind() == std::io::ErrorKind::InvalidInput {
                process.state = ProcessState::Exited(None);
                return StopOutcome::AlreadyExited;
            }
            tracing::warn!(pid = ?process.pid, error = %e, "Failed to kill process");
        }

        if process.wait_timeout(self.kill_timeout).await {
            process.state = ProcessState::Killed;
            StopOutcome::Forced
        } else {
            tracing::error!(
                pid = ?process.pid,
                kill_timeout = ?self.kill_timeout,
                "Process still running after kill"
            );
            StopOutcome::Unresponsive
        }
    }
}

/// Result of delivering a signal to a supervised process.
#[cfg(unix)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delivery {
    Sent,
    /// The process no longer exists.
    Gone,
    /// The signal could not be sent; the caller falls back to a kill.
    Failed,
}

/// Deliver a signal to the process.
#[cfg(unix)]
fn send_signal(process: &SupervisedProcess, signal: nix::sys::signal::Signal) -> Delivery {
    use nix::errno::Errno;
    use nix::sys::signal::kill;

    let Some(pid) = process.pid else {
        return Delivery::Gone;
    };
    let Some(nix_pid) = signal_pid(pid) else {
        tracing::warn!(pid, signal = ?signal, "Process id out of range, not signalling");
        return Delivery::Failed;
    };
    match kill(nix_pid, signal) {
        Ok(()) => Delivery::Sent,
        Err(Errno::ESRCH) => Delivery::Gone,
        Err(e) => {
            tracing::warn!(pid, signal = ?signal, error = %e, "Failed to deliver signal");
            Delivery::Failed
        }
    }
}

/// Convert a child id to a signal target. Zero and negative values address
/// process groups, so they are rejected along with overflowing ids.
#[cfg(unix)]
fn signal_pid(pid: u32) -> Option<nix::unistd::Pid> {
    i32::try_from(pid)
        .ok()
        .filter(|raw| *raw > 0)
        .map(nix::unistd::Pid::from_raw)
}
