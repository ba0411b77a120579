//! Target process resolution, spawning and termination.

mod supervisor;
mod target;

pub use supervisor::*;
pub use target::*;
