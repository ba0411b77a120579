//! Reload loop orchestration and its state machine.

mod runner;
mod signal;
mod state;

pub use runner::*;
pub use signal::*;
pub use state::*;
