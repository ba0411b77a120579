//! Locating and reading the reload configuration.
//!
//! An explicit `--config` file must exist. Without one, `.rload.toml` in the
//! working directory wins over `<config_dir>/rload/config.toml`, and with
//! neither present the built-in defaults are used. Command-line overrides
//! are layered on last, and validation runs on the merged result so a flag
//! can correct a bad file value.

use std::path::{Path, PathBuf};

use super::{ConfigOverrides, ReloadConfig};

/// Project-local config file name.
pub const PROJECT_CONFIG_FILE: &str = ".rload.toml";

/// A merged configuration and the file it was read from, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedConfig {
    pub config: ReloadConfig,
    pub source: Option<PathBuf>,
}

#[derive(Debug)]
enum Location {
    Explicit(PathBuf),
    Search(Vec<PathBuf>),
}

/// Resolves which config file applies and merges it with overrides.
#[derive(Debug)]
pub struct ConfigLoader {
    location: Location,
}

impl ConfigLoader {
    /// Search the project directory, then the user config directory.
    #[must_use]
    pub fn new() -> Self {
        let mut candidates = vec![PathBuf::from(PROJECT_CONFIG_FILE)];
        if let Some(config_dir) = dirs::config_dir() {
            candidates.push(config_dir.join("rload").join("config.toml"));
        }
        Self::search(candidates)
    }

    /// Search the given candidates in order.
    #[must_use]
    pub fn search(candidates: Vec<PathBuf>) -> Self {
        Self {
            location: Location::Search(candidates),
        }
    }

    /// Use exactly this file.
    #[must_use]
    pub fn with_path(path: PathBuf) -> Self {
        Self {
            location: Location::Explicit(path),
        }
    }

    /// Read the applicable file, apply `overrides` and validate.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Missing` for an explicit path that does not
    /// exist, `ReadError`/`ParseError` for an unreadable file, and `Invalid`
    /// when the merged values fail validation.
    pub fn load(&self, overrides: ConfigOverrides) -> Result<LoadedConfig, ConfigError> {
        let source = self.locate()?;
        let mut config = match &source {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Loading config file");
                read_config(path)?
            }
            None => {
                tracing::debug!("No config file found, using defaults");
                ReloadConfig::default()
            }
        };

        config.apply(overrides);
        config.validate()?;
        Ok(LoadedConfig { config, source })
    }

    fn locate(&self) -> Result<Option<PathBuf>, ConfigError> {
        match &self.location {
            Location::Explicit(path) if path.is_file() => Ok(Some(path.clone())),
            Location::Explicit(path) => Err(ConfigError::Missing(path.clone())),
            Location::Search(candidates) => Ok(candidates.iter().find(|p| p.is_file()).cloned()),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn read_config(path: &Path) -> Result<ReloadConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&content).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Errors that can occur during configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("Failed to read config file {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Invalid config value for '{field}': {reason}")]
    Invalid { field: &'static str, reason: String },
}
