//! Accept backoff with jitter.
//!
//! When `accept(2)` fails for lack of resources (EMFILE, ENFILE, ENOMEM,
//! ENOBUFS) the pending connection stays queued and the listener stays
//! ready. The reactor stops watching the listener until the pause expires.

use std::time::Duration;
use rand::Rng;
use tokio::time::Instant;

use crate::config::ListenerConfig;

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Pause state for the listening endpoint.
#[derive(Debug, Clone)]
pub struct AcceptBackoff {
    base_ms: u64,
    max_ms: u64,
    failures: u32,
    paused_until: Option<Instant>,
}

impl AcceptBackoff {
    pub fn new(base_ms: u64, max_ms: u64) -> Self {
        Self {
            base_ms,
            max_ms,
            failures: 0,
            paused_until: None,
        }
    }

    pub fn from_config(config: &ListenerConfig) -> Self {
        Self::new(config.accept_backoff_base_ms, config.accept_backoff_max_ms)
    }

    /// When the listener may be watched again, if it is paused.
    pub fn paused_until(&self) -> Option<Instant> {
        self.paused_until
    }

    pub fn is_paused(&self) -> bool {
        self.paused_until.is_some()
    }

    /// Consecutive resource failures since the last successful accept.
    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Record a resource failure and pause the listener. Returns the pause.
    pub fn record_failure(&mut self) -> Duration {
        self.failures = self.failures.saturating_add(1);
        let delay = calculate_backoff(self.failures, self.base_ms, self.max_ms);
        self.paused_until = Some(Instant::now() + delay);
        delay
    }

    /// The pause expired; watch the listener again.
    pub fn resume(&mut self) {
        self.paused_until = None;
    }

    /// A connection was accepted; start over from the base delay.
    pub fn reset(&mut self) {
        self.failures = 0;
        self.paused_until = None;
    }
}

impl Default for AcceptBackoff {
    fn default() -> Self {
        Self::from_config(&ListenerConfig::default())
    }
}
