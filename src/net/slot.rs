//! Single-connection slot.
//!
//! # Invariants
//! - At most one accepted stream is held at any instant
//! - Occupied implies the stream came from a successful accept
//! - Empty implies no descriptor is held

use std::io;
use std::net::SocketAddr;
use tokio::net::TcpStream;

use crate::net::connection::{ActiveConnection, ConnectionId};
use crate::observability::metrics;

/// Result of offering a freshly accepted stream to the slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmitOutcome {
    /// The slot was empty and now holds the connection.
    Admitted(ConnectionId),
    /// The slot was occupied; the offered stream has been closed.
    Rejected { occupant: ConnectionId },
}

/// Holds zero or one active client connection.
#[derive(Debug, Default)]
pub struct ConnectionSlot {
    active: Option<ActiveConnection>,
}

impl ConnectionSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_occupied(&self) -> bool {
        self.active.is_some()
    }

    /// The admitted connection, if any.
    pub fn get(&self) -> Option<&ActiveConnection> {
        self.active.as_ref()
    }

    /// ID of the admitted connection, if any.
    pub fn id(&self) -> Option<ConnectionId> {
        self.active.as_ref().map(ActiveConnection::id)
    }

    /// Install `stream` if the slot is empty, otherwise close it immediately.
    pub fn admit(&mut self, stream: TcpStream, peer: SocketAddr) -> AdmitOutcome {
        if let Some(occupant) = &self.active {
            let occupant = occupant.id();
            drop(stream);
            tracing::info!(
                peer_addr = %peer,
                occupant = %occupant,
                "Closed extra connection, slot occupied"
            );
            return AdmitOutcome::Rejected { occupant };
        }

        let connection = ActiveConnection::new(stream, peer);
        let id = connection.id();
        self.active = Some(connection);
        metrics::set_slot_occupied(true);

        tracing::info!(connection_id = %id, peer_addr = %peer, "Connection admitted");
        AdmitOutcome::Admitted(id)
    }

    /// Close and empty the slot. A no-op on an empty slot.
    ///
    /// Returns the ID of the connection that was closed.
    pub fn clear(&mut self) -> Option<ConnectionId> {
        let connection = self.active.take()?;
        let id = connection.id();
        tracing::debug!(
            connection_id = %id,
            held_for = ?connection.age(),
            "Slot cleared"
        );
        drop(connection);
        metrics::set_slot_occupied(false);
        Some(id)
    }

    /// Wait until the admitted stream is readable.
    ///
    /// Never resolves while the slot is empty. Cancel safe.
    pub async fn readable(&self) -> io::Result<()> {
        match &self.active {
            Some(connection) => connection.stream().readable().await,
            None => std::future::pending().await,
        }
    }
}
