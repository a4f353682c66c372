//! OS signal handling.
//!
//! # Responsibilities
//! - Register interest in SIGHUP before the listener binds
//! - Turn each notification into a level-triggered flag
//! - Let the reactor check the flag at its checkpoint and wait on it
//!   alongside socket readiness
//!
//! # Design Decisions
//! - Uses Tokio's signal handling: the OS handler only writes to a
//!   self-pipe owned by the runtime, so no user code runs in signal context
//! - The self-pipe lives in the same readiness set as the sockets, so a
//!   signal raised between the checkpoint and the wait still wakes the wait
//! - Only `take()` clears the flag; `notified()` merely sets it

use futures_util::FutureExt;
use tokio::signal::unix::{signal, Signal, SignalKind};
use tokio::sync::broadcast::{self, error::RecvError};

/// Error type for signal registration.
#[derive(Debug, thiserror::Error)]
pub enum SignalError {
    #[error("failed to register SIGHUP handler: {0}")]
    Register(#[source] std::io::Error),
}

/// Level-triggered bridge between shutdown notifications and the reactor.
///
/// Sources are the OS hangup signal and, optionally, a programmatic trigger
/// from [`crate::lifecycle::Shutdown`].
#[derive(Debug)]
pub struct SignalBridge {
    hangup: Option<Signal>,
    trigger: Option<broadcast::Receiver<()>>,
    pending: bool,
}

impl SignalBridge {
    /// Register for SIGHUP. Must be called from within a Tokio runtime.
    pub fn install() -> Result<Self, SignalError> {
        let hangup = signal(SignalKind::hangup()).map_err(SignalError::Register)?;
        tracing::debug!("SIGHUP handler registered");
        Ok(Self {
            hangup: Some(hangup),
            trigger: None,
            pending: false,
        })
    }

    /// A bridge driven only by a programmatic trigger.
    pub fn from_trigger(trigger: broadcast::Receiver<()>) -> Self {
        Self {
            hangup: None,
            trigger: Some(trigger),
            pending: false,
        }
    }

    /// Also listen to a programmatic trigger.
    pub fn with_trigger(mut self, trigger: broadcast::Receiver<()>) -> Self {
        self.trigger = Some(trigger);
        self
    }

    /// Whether a notification has been observed but not yet taken.
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Wait for the next notification and raise the flag.
    ///
    /// Returns immediately if the flag is already raised. Cancel safe.
    pub async fn notified(&mut self) {
        if self.pending {
            return;
        }
        tokio::select! {
            () = hangup(&mut self.hangup) => {
                tracing::info!("SIGHUP received");
            }
            () = triggered(&mut self.trigger) => {
                tracing::info!("Shutdown trigger received");
            }
        }
        self.pending = true;
    }

    /// Checkpoint: read and clear the flag without blocking.
    ///
    /// Also drains a notification that is already queued but has not yet
    /// been observed by a wait.
    pub fn take(&mut self) -> bool {
        if !self.pending {
            let _ = self.notified().now_or_never();
        }
        std::mem::take(&mut self.pending)
    }
}

/// Resolves on the next SIGHUP; never resolves without a registration.
async fn hangup(signal: &mut Option<Signal>) {
    if let Some(stream) = signal.as_mut() {
        if stream.recv().await.is_some() {
            return;
        }
        tracing::warn!("SIGHUP stream closed, no further signals will be observed");
        *signal = None;
    }
    std::future::pending::<()>().await
}

/// Resolves on the next trigger; a closed trigger is detached for good.
async fn triggered(trigger: &mut Option<broadcast::Receiver<()>>) {
    if let Some(rx) = trigger.as_mut() {
        match rx.recv().await {
            Ok(()) | Err(RecvError::Lagged(_)) => return,
            Err(RecvError::Closed) => {
                tracing::debug!("Shutdown trigger dropped, detaching");
                *trigger = None;
            }
        }
    }
    std::future::pending::<()>().await
}
