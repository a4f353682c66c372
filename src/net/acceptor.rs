//! Admission of accepted connections.
//!
//! Accept failures are operational events: they are logged and counted but
//! never end the loop. Failures tied to one connection (aborted, reset) are
//! transient. Anything else, typically descriptor or memory exhaustion, leaves
//! the connection queued and the listener ready, so the reactor backs off.

use std::io;
use std::net::SocketAddr;
use tokio::net::TcpStream;

use crate::net::connection::ConnectionId;
use crate::net::slot::{AdmitOutcome, ConnectionSlot};
use crate::observability::metrics;

/// What the acceptor did with one readiness event on the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptOutcome {
    Admitted(ConnectionId),
    /// Accepted at the transport level, then closed because the slot is taken.
    Rejected,
    /// `accept(2)` itself failed.
    Failed { transient: bool },
}

/// Errors that concern a single pending connection rather than the process.
fn is_transient(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::ConnectionAborted
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::Interrupted
            | io::ErrorKind::WouldBlock
            | io::ErrorKind::TimedOut
    )
}

/// Process the result of an accept on the listening endpoint.
pub fn accept(result: io::Result<(TcpStream, SocketAddr)>, slot: &mut ConnectionSlot) -> AcceptOutcome {
    let (stream, peer) = match result {
        Ok(accepted) => accepted,
        Err(e) => {
            let transient = is_transient(&e);
            tracing::warn!(error = %e, transient, "Failed to accept connection");
            metrics::record_accept_error();
            return AcceptOutcome::Failed { transient };
        }
    };

    tracing::debug!(peer_addr = %peer, "Accepted new connection");

    match slot.admit(stream, peer) {
        AdmitOutcome::Admitted(id) => {
            metrics::record_admitted();
            AcceptOutcome::Admitted(id)
        }
        AdmitOutcome::Rejected { .. } => {
            metrics::record_rejected();
            AcceptOutcome::Rejected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn transport_error_is_not_fatal() {
        let mut slot = ConnectionSlot::new();
        let outcome = accept(
            Err(io::Error::new(io::ErrorKind::ConnectionAborted, "aborted")),
            &mut slot,
        );
        assert_eq!(outcome, AcceptOutcome::Failed { transient: true });
        assert!(!slot.is_occupied());
    }

    #[tokio::test]
    async fn resource_exhaustion_is_not_transient() {
        let mut slot = ConnectionSlot::new();
        let outcome = accept(Err(io::Error::other("too many open files")), &mut slot);
        assert_eq!(outcome, AcceptOutcome::Failed { transient: false });
        assert!(!slot.is_occupied());
    }

    #[tokio::test]
    async fn admits_then_rejects() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mut slot = ConnectionSlot::new();

        let _c1 = TcpStream::connect(addr).await.unwrap();
        let first = accept(listener.accept().await, &mut slot);
        let _c2 = TcpStream::connect(addr).await.unwrap();
        let second = accept(listener.accept().await, &mut slot);

        assert!(matches!(first, AcceptOutcome::Admitted(_)));
        assert_eq!(second, AcceptOutcome::Rejected);
        assert_eq!(slot.id().map(AcceptOutcome::Admitted), Some(first));
    }
}
