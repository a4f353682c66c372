//! The readiness set and the single blocking wait.

use std::io;
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio::time::Instant;

use crate::lifecycle::SignalBridge;
use crate::net::{ConnectionId, ConnectionSlot, ListeningEndpoint};

/// What the next wait watches, rebuilt from slot occupancy every iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessSet {
    /// The listening endpoint address.
    pub listener: SocketAddr,
    /// False while accepts are paused after a resource failure.
    pub accepting: bool,
    /// The admitted client, if the slot is occupied.
    pub client: Option<ConnectionId>,
}

impl ReadinessSet {
    pub fn build(endpoint: &ListeningEndpoint, slot: &ConnectionSlot, accepting: bool) -> Self {
        Self {
            listener: endpoint.local_addr(),
            accepting,
            client: slot.id(),
        }
    }

    pub fn watches_client(&self) -> bool {
        self.client.is_some()
    }
}

/// The first event the wait observed.
#[derive(Debug)]
pub(crate) enum Ready {
    /// A shutdown notification arrived before or during the wait.
    Interrupted,
    /// The listening endpoint produced an accept result.
    Incoming(io::Result<(TcpStream, SocketAddr)>),
    /// The accept pause ran out.
    AcceptResumed,
    /// The admitted client has bytes or EOF pending.
    ClientReadable,
    /// Waiting on the client registration itself failed.
    WaitFailed(io::Error),
}

/// Block until a notification or socket readiness.
///
/// The notification branch is polled first so a signal that raced the
/// checkpoint wins over pending I/O. While `accept_paused_until` is set the
/// listener is left out and the pause deadline is the only timer; otherwise
/// there is no timeout. Every branch is cancel safe.
pub(crate) async fn wait(
    endpoint: &ListeningEndpoint,
    slot: &ConnectionSlot,
    bridge: &mut SignalBridge,
    accept_paused_until: Option<Instant>,
) -> Ready {
    let resume_at = accept_paused_until.unwrap_or_else(Instant::now);
    tokio::select! {
        biased;
        () = bridge.notified() => Ready::Interrupted,
        accepted = endpoint.accept(), if accept_paused_until.is_none() => Ready::Incoming(accepted),
        () = tokio::time::sleep_until(resume_at), if accept_paused_until.is_some() => Ready::AcceptResumed,
        readable = slot.readable(), if slot.is_occupied() => match readable {
            Ok(()) => Ready::ClientReadable,
            Err(e) => Ready::WaitFailed(e),
        },
    }
}
