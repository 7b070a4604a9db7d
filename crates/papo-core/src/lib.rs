//! Presence and messaging core.
//!
//! [`Session`] is the entry point for request handlers. The sweeper in
//! [`sweeper`] runs beside it and evicts participants that stopped sending
//! heartbeats.

pub mod clock;
pub mod error;
pub mod messages;
pub mod presence;
pub mod session;
pub mod sweeper;

#[cfg(test)]
mod testing;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ChatError, ChatResult};
pub use messages::{MessageFilter, MessageStore};
pub use presence::{PresenceRegistry, SweepReport};
pub use session::Session;
pub use sweeper::{SweepConfig, run_sweep_loop, sweep_once};
