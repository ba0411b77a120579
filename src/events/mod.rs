//! Reload events and the listener registry that publishes them.

mod bus;
mod types;

pub use bus::{EventBus, ListenerId};
pub use types::{EventError, EventKind, HandlerError, ReloadEvent};
