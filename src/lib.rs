//! rload - restart a program whenever the files it is built from change.
//!
//! Changes are found by polling modification times, not by OS file events.

pub mod config;
pub mod display;
pub mod events;
pub mod process;
pub mod supervisor;
pub mod watcher;
