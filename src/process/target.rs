//! Resolved entry point for the supervised program.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Error type for resolving the program to run.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ResolveError {
    /// Nothing with this name exists on disk or on `PATH`.
    #[error("Program not found: {0}")]
    NotFound(String),
    /// The path exists but cannot be executed.
    #[error("Not an executable file: {}", .0.display())]
    NotExecutable(PathBuf),
}

/// A program ready to be started by the supervisor.
///
/// Carries the executable path, arguments and extra environment, plus a
/// short display name used in log and console output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    name: String,
    program: PathBuf,
    args: Vec<String>,
    env: Vec<(String, String)>,
    working_dir: Option<PathBuf>,
}

impl Target {
    /// Build a target from an already-resolved executable path.
    #[must_use]
    pub fn new(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        let name = program
            .file_name()
            .map_or_else(|| program.display().to_string(), |n| n.to_string_lossy().into_owned());
        Self {
            name,
            program,
            args: Vec::new(),
            env: Vec::new(),
            working_dir: None,
        }
    }

    /// Resolve a program name the way a shell would.
    ///
    /// Names containing a path separator are checked directly; bare names
    /// are looked up on `PATH`.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError` if no executable file can be found.
    pub fn resolve(program: &str) -> Result<Self, ResolveError> {
        let path = Path::new(program);
        if path.components().count() > 1 || path.is_absolute() {
            let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
            if !absolute.is_file() {
                return Err(ResolveError::NotFound(program.to_string()));
            }
            if !is_executable(&absolute) {
                return Err(ResolveError::NotExecutable(absolute));
            }
            return Ok(Self::new(absolute));
        }

        let search = std::env::var_os("PATH").unwrap_or_default();
        search_path(program, &search)
            .map(Self::new)
            .ok_or_else(|| ResolveError::NotFound(program.to_string()))
    }

    /// Set the program arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Add an environment variable for the child.
    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Set the working directory for the child.
    #[must_use]
    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    /// Override the display name.
    #[must_use]
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resolved executable path, reported with `reload` events.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.program
    }

    #[must_use]
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    #[must_use]
    pub fn get_env(&self) -> &[(String, String)] {
        &self.env
    }

    #[must_use]
    pub fn get_working_dir(&self) -> Option<&PathBuf> {
        self.working_dir.as_ref()
    }
}

fn search_path(program: &str, search: &OsStr) -> Option<PathBuf> {
    std::env::split_paths(search)
        .map(|dir| dir.join(program))
        .find(|candidate| candidate.is_file() && is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    std::fs::metadata(path).is_ok_and(|m| m.permissions().mode() & 0o111 != 0)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
