//! Reading from the admitted client.
//!
//! # Responsibilities
//! - Read at most one buffer per readiness event
//! - Hand payloads to a [`PayloadSink`] without framing or echo
//! - Detect orderly close (zero-length read) and empty the slot

use std::io;

use crate::config::ReceiverConfig;
use crate::net::{ConnectionId, ConnectionSlot};
use crate::observability::metrics;

/// Consumer of raw client bytes.
pub trait PayloadSink {
    /// Called once per successful read with exactly the bytes read.
    fn deliver(&mut self, id: ConnectionId, payload: &[u8]);

    /// Called when the connection leaves the slot because of the peer.
    fn closed(&mut self, _id: ConnectionId) {}
}

/// Default sink: logs length and content as text.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl PayloadSink for LogSink {
    fn deliver(&mut self, id: ConnectionId, payload: &[u8]) {
        tracing::info!(
            connection_id = %id,
            bytes = payload.len(),
            payload = %String::from_utf8_lossy(payload),
            "Received data"
        );
    }
}

/// Result of one read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReceiveOutcome {
    /// `n > 0` bytes were delivered to the sink.
    Data(usize),
    /// The peer closed its side; the slot is now empty.
    PeerClosed,
    /// Would-block or interrupted; nothing changed.
    Transient,
    /// Non-transient read error. `closed` tells whether the slot was emptied.
    Failed { closed: bool },
    /// The slot was empty.
    Idle,
}

/// Reads from the connection held in the slot.
#[derive(Debug)]
pub struct Receiver<S> {
    buffer: Vec<u8>,
    close_on_read_error: bool,
    sink: S,
}

impl<S: PayloadSink> Receiver<S> {
    pub fn new(config: &ReceiverConfig, sink: S) -> Self {
        Self {
            buffer: vec![0; config.buffer_size.max(1)],
            close_on_read_error: config.close_on_read_error,
            sink,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// Perform one non-blocking read on the admitted connection.
    pub fn receive_once(&mut self, slot: &mut ConnectionSlot) -> ReceiveOutcome {
        let Some(connection) = slot.get() else {
            return ReceiveOutcome::Idle;
        };
        let result = connection.stream().try_read(&mut self.buffer);
        self.handle_read(result, slot)
    }

    fn handle_read(&mut self, result: io::Result<usize>, slot: &mut ConnectionSlot) -> ReceiveOutcome {
        let Some(id) = slot.id() else {
            return ReceiveOutcome::Idle;
        };

        match result {
            Ok(0) => {
                tracing::info!(connection_id = %id, "Client closed connection");
                metrics::record_peer_close();
                self.sink.closed(id);
                slot.clear();
                ReceiveOutcome::PeerClosed
            }
            Ok(n) => {
                metrics::record_bytes_received(n);
                self.sink.deliver(id, &self.buffer[..n]);
                ReceiveOutcome::Data(n)
            }
            Err(e) if is_transient(&e) => {
                tracing::trace!(connection_id = %id, error = %e, "Spurious readiness");
                ReceiveOutcome::Transient
            }
            Err(e) => {
                metrics::record_read_error();
                if self.close_on_read_error {
                    tracing::warn!(connection_id = %id, error = %e, "Read failed, closing client");
                    self.sink.closed(id);
                    slot.clear();
                    ReceiveOutcome::Failed { closed: true }
                } else {
                    tracing::warn!(connection_id = %id, error = %e, "Read failed, keeping client open");
                    ReceiveOutcome::Failed { closed: false }
                }
            }
        }
    }
}

fn is_transient(e: &io::Error) -> bool {
    matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted)
}
