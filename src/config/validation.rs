//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (backlog > 0, buffer bounds)
//! - Check that addresses parse before anything binds
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use crate::config::schema::ServerConfig;

/// Largest accepted receive buffer.
pub const MAX_BUFFER_SIZE: usize = 64 * 1024;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];
const LOG_FORMATS: &[&str] = &["text", "json"];

/// A single semantic problem in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// Human readable description.
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Err(e) = config.listener.bind_address.parse::<SocketAddr>() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address: {}", config.listener.bind_address, e),
        ));
    }

    if config.listener.backlog == 0 {
        errors.push(ValidationError::new("listener.backlog", "must be at least 1"));
    }

    let listener = &config.listener;
    if listener.accept_backoff_base_ms == 0 {
        errors.push(ValidationError::new(
            "listener.accept_backoff_base_ms",
            "must be at least 1",
        ));
    }
    if listener.accept_backoff_max_ms < listener.accept_backoff_base_ms {
        errors.push(ValidationError::new(
            "listener.accept_backoff_max_ms",
            format!(
                "must not be below accept_backoff_base_ms ({})",
                listener.accept_backoff_base_ms
            ),
        ));
    }

    let size = config.receiver.buffer_size;
    if size == 0 || size > MAX_BUFFER_SIZE {
        errors.push(ValidationError::new(
            "receiver.buffer_size",
            format!("must be between 1 and {}, got {}", MAX_BUFFER_SIZE, size),
        ));
    }

    let observability = &config.observability;
    if !LOG_LEVELS.contains(&observability.log_level.to_ascii_lowercase().as_str()) {
        errors.push(ValidationError::new(
            "observability.log_level",
            format!("unknown level '{}'", observability.log_level),
        ));
    }

    if !LOG_FORMATS.contains(&observability.log_format.as_str()) {
        errors.push(ValidationError::new(
            "observability.log_format",
            format!("expected 'text' or 'json', got '{}'", observability.log_format),
        ));
    }

    if observability.metrics_enabled && observability.metrics_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
