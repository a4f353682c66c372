//! Startup orchestration.
//!
//! # Responsibilities
//! - Bind the listening endpoint
//! - Assemble the reactor in its initial Running state
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The caller installs the [`SignalBridge`] first, before config loading,
//!   so a SIGHUP arriving at any point after process start is never lost
//! - Must run inside a Tokio runtime (socket registration)

use crate::config::ServerConfig;
use crate::lifecycle::signals::SignalBridge;
use crate::net::{AcceptBackoff, ListenerError, ListeningEndpoint};
use crate::reactor::{PayloadSink, Reactor, Receiver};

/// Error type for startup.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Listener(#[from] ListenerError),
}

/// Build a reactor around an already installed notification bridge and sink.
pub fn start_with<S: PayloadSink>(
    config: &ServerConfig,
    bridge: SignalBridge,
    sink: S,
) -> Result<Reactor<S>, StartupError> {
    let endpoint = ListeningEndpoint::bind(&config.listener)?;
    let receiver = Receiver::new(&config.receiver, sink);

    tracing::debug!(
        buffer_size = receiver.buffer_size(),
        close_on_read_error = config.receiver.close_on_read_error,
        "Receiver configured"
    );

    Ok(Reactor::new(endpoint, bridge, receiver)
        .with_accept_backoff(AcceptBackoff::from_config(&config.listener)))
}
