//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (bound endpoint, backlog)
//!     → acceptor.rs (admit or reject)
//!     → slot.rs (holds at most one ActiveConnection)
//!     → Hand off to reactor::receiver
//!
//! Slot States:
//!     Empty → Occupied (admit) → Empty (peer close, read error, shutdown)
//! ```
//!
//! # Design Decisions
//! - Extra connections are accepted and closed at once rather than left in
//!   the backlog, so clients learn immediately that they were refused
//! - Every descriptor is owned by exactly one value and closed on drop

pub mod acceptor;
pub mod backoff;
pub mod connection;
pub mod listener;
pub mod slot;

pub use acceptor::AcceptOutcome;
pub use backoff::AcceptBackoff;
pub use connection::{ActiveConnection, ConnectionId};
pub use listener::{ListenerError, ListeningEndpoint};
pub use slot::{AdmitOutcome, ConnectionSlot};
