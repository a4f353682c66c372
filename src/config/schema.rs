//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the single-slot server.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServerConfig {
    /// Listening endpoint (bind address, backlog).
    pub listener: ListenerConfig,

    /// Client read settings.
    pub receiver: ReceiverConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listening endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:65000").
    pub bind_address: String,

    /// Pending-connection queue length passed to `listen(2)`.
    pub backlog: u32,

    /// First pause after `accept(2)` fails for lack of resources, in milliseconds.
    pub accept_backoff_base_ms: u64,

    /// Longest pause between accept attempts, in milliseconds.
    pub accept_backoff_max_ms: u64,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:65000".to_string(),
            backlog: 1,
            accept_backoff_base_ms: 10,
            accept_backoff_max_ms: 1000,
        }
    }
}

/// Receiver configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ReceiverConfig {
    /// Maximum bytes consumed by a single read.
    pub buffer_size: usize,

    /// Close the client when a read fails with a non-transient error.
    ///
    /// Setting this to `false` leaves the connection open and relies on a
    /// later zero-length read to clear the slot.
    pub close_on_read_error: bool,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            buffer_size: 1024,
            close_on_read_error: true,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format ("text" or "json").
    pub log_format: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: "text".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9465".to_string(),
        }
    }
}
