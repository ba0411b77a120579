//! Colored CLI display utilities for reload output.
//!
//! This module provides functions for printing colored, formatted output
//! to the terminal while the reload loop runs.

use std::io::{self, Write};
use std::path::Path;

use chrono::Utc;
use owo_colors::OwoColorize;

use crate::events::ReloadEvent;
use crate::watcher::{Change, ChangeKind};

/// Get current timestamp in the same format as tracing.
fn timestamp() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

const BANNER: &str = r"
        .__                    .___
_______ |  |   _________     __| _/
\_  __ \|  |  /  _ \__  \   / __ |
 |  | \/|  |_(  <_> ) __ \_/ /_/ |
 |__|   |____/\____(____  /\____ |
                        \/      \/";

/// Print the startup banner.
pub fn print_banner() {
    println!("{}", BANNER.magenta());
    println!(" {}\n", "Restart your program whenever its files change".cyan());
    let _ = io::stdout().flush();
}

/// Label printed in front of a change line.
#[must_use]
pub fn change_label(kind: ChangeKind) -> &'static str {
    match kind {
        ChangeKind::Added => "[ADDED]",
        ChangeKind::Removed => "[REMOVED]",
        ChangeKind::Modified => "[MODIFIED]",
    }
}

/// Print a single detected change.
pub fn print_change(change: &Change) {
    let label = change_label(change.kind);
    let label = match change.kind {
        ChangeKind::Added => label.green().bold().to_string(),
        ChangeKind::Removed => label.red().bold().to_string(),
        ChangeKind::Modified => label.cyan().bold().to_string(),
    };
    println!(
        "{} {} {}",
        timestamp().dimmed(),
        label,
        change.path.display().green()
    );
    let _ = io::stdout().flush();
}

/// Print that a restart is starting.
pub fn print_reload(path: &Path) {
    println!(
        "{} {} {}",
        timestamp().dimmed(),
        "[RELOADING]".yellow().bold(),
        path.display().green()
    );
    let _ = io::stdout().flush();
}

/// Print that a restart finished.
pub fn print_reloaded(path: &Path) {
    println!(
        "{} {} {}",
        timestamp().dimmed(),
        "[DONE RELOADING]".yellow().bold(),
        path.display().green()
    );
    let _ = io::stdout().flush();
}

/// Print any reload event. Change events print every path in the batch.
pub fn print_event(event: &ReloadEvent) {
    match event {
        ReloadEvent::Change { changes, .. } => {
            for change in changes.iter() {
                print_change(&change);
            }
        }
        ReloadEvent::Reload { path } => print_reload(path),
        ReloadEvent::Reloaded { path } => print_reloaded(path),
    }
}

/// Print a fatal error.
pub fn print_error(message: &str) {
    eprintln!(
        "{} {} {}",
        timestamp().dimmed(),
        "[ERROR]".red().bold(),
        message.red()
    );
}

/// Print version information.
pub fn print_version() {
    println!("{}", BANNER.magenta());
    println!(
        "{} {}",
        "rload version:".cyan(),
        env!("CARGO_PKG_VERSION").yellow()
    );
    println!(
        "{} {}-{}",
        "platform:".cyan(),
        std::env::consts::OS.yellow(),
        std::env::consts::ARCH.yellow()
    );
}
