//! Single-slot TCP server library.
//!
//! A one-thread reactor that listens on a TCP endpoint, admits at most one
//! client at a time, hands received bytes to a [`reactor::PayloadSink`] and
//! shuts down gracefully on SIGHUP without ever missing the signal.

pub mod config;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod reactor;

pub use config::ServerConfig;
pub use lifecycle::{Shutdown, SignalBridge};
pub use reactor::{Reactor, ShutdownReport};
