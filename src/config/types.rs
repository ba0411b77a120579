//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::process::{ProcessSupervisor, DEFAULT_GRACE_PERIOD, DEFAULT_KILL_TIMEOUT};
use crate::watcher::{Preset, WatchTarget};

use super::ConfigError;

/// Configuration for the reload loop.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ReloadConfig {
    /// Root to watch. Defaults to the current directory.
    pub watch: Option<PathBuf>,
    /// Seconds to sleep between iterations.
    pub delay: f64,
    /// Directory basenames to skip.
    pub ignored_paths: Vec<String>,
    /// Extension allowlist; empty means every file.
    pub extensions: Vec<String>,
    /// Language preset applied on top of the lists above.
    pub preset: Option<Preset>,
    /// Seconds to wait after SIGINT before killing.
    pub grace_period: f64,
    /// Seconds to wait after the kill.
    pub kill_timeout: f64,
}

fn default_ignored_paths() -> Vec<String> {
    [".git", "target", "__pycache__"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl Default for ReloadConfig {
    fn default() -> Self {
        Self {
            watch: None,
            delay: 0.5,
            ignored_paths: default_ignored_paths(),
            extensions: Vec::new(),
            preset: None,
            grace_period: DEFAULT_GRACE_PERIOD.as_secs_f64(),
            kill_timeout: DEFAULT_KILL_TIMEOUT.as_secs_f64(),
        }
    }
}

/// Values given on the command line, layered over the config file.
///
/// Scalars replace the file's value; lists extend it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigOverrides {
    pub watch: Option<PathBuf>,
    pub delay: Option<f64>,
    pub grace_period: Option<f64>,
    pub ignored_paths: Vec<String>,
    pub extensions: Vec<String>,
    pub preset: Option<Preset>,
}

impl ReloadConfig {
    /// Layer command-line overrides on top of this config.
    pub fn apply(&mut self, overrides: ConfigOverrides) {
        if overrides.watch.is_some() {
            self.watch = overrides.watch;
        }
        if let Some(delay) = overrides.delay {
            self.delay = delay;
        }
        if let Some(grace) = overrides.grace_period {
            self.grace_period = grace;
        }
        self.ignored_paths.extend(overrides.ignored_paths);
        self.extensions.extend(overrides.extensions);
        if overrides.preset.is_some() {
            self.preset = overrides.preset;
        }
    }

    /// Reject negative or non-finite durations.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the offending field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [
            ("delay", self.delay),
            ("grace_period", self.grace_period),
            ("kill_timeout", self.kill_timeout),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a non-negative number of seconds, got {value}"),
                });
            }
        }
        Ok(())
    }

    #[must_use]
    pub fn delay(&self) -> Duration {
        secs(self.delay)
    }

    #[must_use]
    pub fn grace_period(&self) -> Duration {
        secs(self.grace_period)
    }

    #[must_use]
    pub fn kill_timeout(&self) -> Duration {
        secs(self.kill_timeout)
    }

    /// Build the watch target described by this config.
    #[must_use]
    pub fn watch_target(&self) -> WatchTarget {
        let root = self.watch.clone().unwrap_or_else(|| PathBuf::from("."));
        let target = WatchTarget::new(root)
            .ignore(self.ignored_paths.iter().cloned())
            .extensions(self.extensions.iter().cloned());
        match self.preset {
            Some(preset) => target.preset(preset),
            None => target,
        }
    }

    #[must_use]
    pub fn supervisor(&self) -> ProcessSupervisor {
        ProcessSupervisor::new(self.grace_period(), self.kill_timeout())
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}
