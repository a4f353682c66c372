//! Reactor subsystem.
//!
//! # Data Flow
//! ```text
//! loop {
//!     checkpoint: SignalBridge::take() → shut down if set
//!     readiness.rs: {listener, client?, notification} → wait
//!     dispatch:
//!         listener ready → net::acceptor
//!         client ready   → receiver.rs → PayloadSink
//!         notification   → back to checkpoint
//! }
//! ```
//!
//! # Design Decisions
//! - One thread, no spawned tasks; the wait is the only blocking point
//! - The notification source sits in the same wait as the sockets, so a
//!   signal can never slip in between the checkpoint and the wait
//! - Accept and read happen only after readiness, so neither can stall

pub mod event_loop;
pub mod readiness;
pub mod receiver;

pub use event_loop::{Reactor, ReactorError, ReactorState, ReactorStats, ShutdownReport, Turn};
pub use readiness::ReadinessSet;
pub use receiver::{LogSink, PayloadSink, ReceiveOutcome, Receiver};
