//! The reactor loop.
//!
//! # State Transitions
//! ```text
//! Running → Running:      interrupted wait, accept, receive, accept resumed
//! Running → ShuttingDown: shutdown flag taken at the checkpoint
//! Running → ShuttingDown: readiness wait failed (fatal)
//! ```
//!
//! `ShuttingDown` is terminal: both descriptors have been closed and every
//! further call to [`Reactor::turn`] fails with [`ReactorError::Stopped`].

use std::io;
use std::net::SocketAddr;

use crate::lifecycle::SignalBridge;
use crate::net::acceptor::{self, AcceptOutcome};
use crate::net::{AcceptBackoff, ConnectionId, ConnectionSlot, ListeningEndpoint};
use crate::reactor::readiness::{self, ReadinessSet, Ready};
use crate::reactor::receiver::{LogSink, PayloadSink, ReceiveOutcome, Receiver};

/// Reactor lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReactorState {
    Running,
    ShuttingDown,
}

/// Counters accumulated over the reactor's lifetime.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactorStats {
    pub admitted: u64,
    pub rejected: u64,
    pub accept_errors: u64,
    pub bytes_received: u64,
    pub peer_closes: u64,
    pub read_errors: u64,
    pub interruptions: u64,
}

/// Summary of a graceful shutdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShutdownReport {
    pub stats: ReactorStats,
    /// The client that was still in the slot when shutdown began.
    pub closed_client: Option<ConnectionId>,
}

/// Error type for the reactor loop.
#[derive(Debug, thiserror::Error)]
pub enum ReactorError {
    /// The readiness wait failed for a reason other than a notification.
    #[error("readiness wait failed: {source}")]
    Wait {
        #[source]
        source: io::Error,
        stats: ReactorStats,
    },
    /// The reactor has already shut down.
    #[error("reactor already shut down")]
    Stopped,
}

/// What a single loop iteration did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Turn {
    /// The listening endpoint was ready.
    Accepted(AcceptOutcome),
    /// The pause after a resource failure ended; the listener is watched again.
    AcceptResumed,
    /// The client was ready.
    Received(ReceiveOutcome),
    /// A notification cut the wait short; the next checkpoint acts on it.
    Interrupted,
    /// The checkpoint found the shutdown flag; everything is closed.
    Shutdown(ShutdownReport),
}

/// Single-threaded, single-client reactor.
#[derive(Debug)]
pub struct Reactor<S = LogSink> {
    endpoint: Option<ListeningEndpoint>,
    local_addr: SocketAddr,
    slot: ConnectionSlot,
    bridge: SignalBridge,
    receiver: Receiver<S>,
    accept_backoff: AcceptBackoff,
    state: ReactorState,
    stats: ReactorStats,
    #[cfg(test)]
    injected: Option<Ready>,
}

impl<S: PayloadSink> Reactor<S> {
    /// Build a reactor around an endpoint that is already listening.
    pub fn new(endpoint: ListeningEndpoint, bridge: SignalBridge, receiver: Receiver<S>) -> Self {
        Self {
            local_addr: endpoint.local_addr(),
            endpoint: Some(endpoint),
            slot: ConnectionSlot::new(),
            bridge,
            receiver,
            accept_backoff: AcceptBackoff::default(),
            state: ReactorState::Running,
            stats: ReactorStats::default(),
            #[cfg(test)]
            injected: None,
        }
    }

    /// Replace the pause policy used after resource failures on accept.
    pub fn with_accept_backoff(mut self, backoff: AcceptBackoff) -> Self {
        self.accept_backoff = backoff;
        self
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn state(&self) -> ReactorState {
        self.state
    }

    pub fn stats(&self) -> ReactorStats {
        self.stats
    }

    pub fn slot(&self) -> &ConnectionSlot {
        &self.slot
    }

    pub fn receiver(&self) -> &Receiver<S> {
        &self.receiver
    }

    /// The set the next wait would watch; `None` once shut down.
    pub fn readiness_set(&self) -> Option<ReadinessSet> {
        self.endpoint
            .as_ref()
            .map(|endpoint| ReadinessSet::build(endpoint, &self.slot, !self.accept_backoff.is_paused()))
    }

    /// Drive the loop until shutdown or a fatal wait error.
    pub async fn run(mut self) -> Result<ShutdownReport, ReactorError> {
        tracing::info!(address = %self.local_addr, "Server running, waiting for connections");
        loop {
            if let Turn::Shutdown(report) = self.turn().await? {
                return Ok(report);
            }
        }
    }

    /// Run one iteration: checkpoint, build the readiness set, wait, dispatch.
    pub async fn turn(&mut self) -> Result<Turn, ReactorError> {
        if self.state == ReactorState::ShuttingDown {
            return Err(ReactorError::Stopped);
        }

        if self.bridge.take() {
            tracing::info!("Shutdown requested, stopping server");
            return Ok(Turn::Shutdown(self.shut_down()));
        }

        let ready = match self.injected() {
            Some(ready) => ready,
            None => self.wait().await?,
        };
        self.dispatch(ready)
    }

    async fn wait(&mut self) -> Result<Ready, ReactorError> {
        let Some(endpoint) = self.endpoint.as_ref() else {
            return Err(ReactorError::Stopped);
        };
        let paused_until = self.accept_backoff.paused_until();
        let set = ReadinessSet::build(endpoint, &self.slot, paused_until.is_none());
        tracing::trace!(
            listener = %set.listener,
            accepting = set.accepting,
            client = ?set.client,
            "Waiting for readiness"
        );

        Ok(readiness::wait(endpoint, &self.slot, &mut self.bridge, paused_until).await)
    }

    fn dispatch(&mut self, ready: Ready) -> Result<Turn, ReactorError> {
        match ready {
            Ready::Interrupted => {
                tracing::debug!("Readiness wait interrupted by signal");
                self.stats.interruptions += 1;
                Ok(Turn::Interrupted)
            }
            Ready::Incoming(result) => {
                let outcome = acceptor::accept(result, &mut self.slot);
                match outcome {
                    AcceptOutcome::Admitted(_) => {
                        self.stats.admitted += 1;
                        self.accept_backoff.reset();
                    }
                    AcceptOutcome::Rejected => {
                        self.stats.rejected += 1;
                        self.accept_backoff.reset();
                    }
                    AcceptOutcome::Failed { transient } => {
                        self.stats.accept_errors += 1;
                        if !transient {
                            let delay = self.accept_backoff.record_failure();
                            tracing::warn!(
                                delay_ms = delay.as_millis() as u64,
                                failures = self.accept_backoff.failures(),
                                "Pausing accepts"
                            );
                        }
                    }
                }
                Ok(Turn::Accepted(outcome))
            }
            Ready::AcceptResumed => {
                tracing::debug!("Accepting connections again");
                self.accept_backoff.resume();
                Ok(Turn::AcceptResumed)
            }
            Ready::ClientReadable => {
                let outcome = self.receiver.receive_once(&mut self.slot);
                match outcome {
                    ReceiveOutcome::Data(n) => self.stats.bytes_received += n as u64,
                    ReceiveOutcome::PeerClosed => self.stats.peer_closes += 1,
                    ReceiveOutcome::Failed { .. } => self.stats.read_errors += 1,
                    ReceiveOutcome::Transient | ReceiveOutcome::Idle => {}
                }
                Ok(Turn::Received(outcome))
            }
            Ready::WaitFailed(source) => {
                tracing::error!(error = %source, "Readiness wait failed");
                self.shut_down();
                Err(ReactorError::Wait {
                    source,
                    stats: self.stats,
                })
            }
        }
    }

    #[cfg(test)]
    fn injected(&mut self) -> Option<Ready> {
        self.injected.take()
    }

    #[cfg(not(test))]
    fn injected(&mut self) -> Option<Ready> {
        None
    }

    /// Close the listening endpoint, then the client. Runs at most once.
    fn shut_down(&mut self) -> ShutdownReport {
        self.state = ReactorState::ShuttingDown;
        drop(self.endpoint.take());
        let closed_client = self.slot.clear();
        if let Some(id) = closed_client {
            tracing::info!(connection_id = %id, "Client socket closed");
        }
        ShutdownReport {
            stats: self.stats,
            closed_client,
        }
    }
}
