//! Accepted connection handle and identity.
//!
//! # Responsibilities
//! - Generate unique connection IDs for tracing
//! - Own the accepted stream for as long as it sits in the slot
//! - Close the descriptor exactly once, when the handle is dropped

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::net::TcpStream;

/// Global atomic counter for connection IDs.
/// Using relaxed ordering is sufficient since we only need uniqueness, not synchronization.
static CONNECTION_ID_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Unique identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Generate a new unique connection ID.
    pub fn new() -> Self {
        Self(CONNECTION_ID_COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// The single client connection admitted into the slot.
#[derive(Debug)]
pub struct ActiveConnection {
    id: ConnectionId,
    peer: SocketAddr,
    stream: TcpStream,
    admitted_at: Instant,
}

impl ActiveConnection {
    pub(crate) fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self {
            id: ConnectionId::new(),
            peer,
            stream,
            admitted_at: Instant::now(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    pub fn stream(&self) -> &TcpStream {
        &self.stream
    }

    /// How long the connection has held the slot.
    pub fn age(&self) -> Duration {
        self.admitted_at.elapsed()
    }
}

impl Drop for ActiveConnection {
    fn drop(&mut self) {
        tracing::trace!(
            connection_id = %self.id,
            peer_addr = %self.peer,
            "Client descriptor released"
        );
    }
}
