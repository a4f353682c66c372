//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Register SIGHUP (main, before config) → Bind endpoint → Reactor (Running)
//!
//! Signals (signals.rs):
//!     SIGHUP or Shutdown::trigger → level-triggered flag → reactor checkpoint
//!
//! Shutdown (reactor):
//!     Flag taken → Close listener → Close client → Exit 0
//! ```
//!
//! # Design Decisions
//! - Ordered startup: signal registration first, then the listener
//! - No drain phase: the single client is closed immediately

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::Shutdown;
pub use signals::{SignalBridge, SignalError};
pub use startup::{start_with, StartupError};
