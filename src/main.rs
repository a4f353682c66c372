//! slot-server
//!
//! Accepts one TCP client at a time, logs what it sends, and exits cleanly
//! on SIGHUP.
//!
//! # Architecture Overview
//!
//! ```text
//!                    ┌──────────────────────────────────────────────┐
//!                    │                 SLOT SERVER                  │
//!                    │                                              │
//!   SIGHUP ──────────┼─▶ SignalBridge ──┐                           │
//!                    │                  ▼                           │
//!   TCP connect ─────┼─▶ Listening ──▶ Reactor ──▶ Acceptor ──┐     │
//!                    │   Endpoint      (wait)                 ▼     │
//!   TCP bytes ───────┼───────────────────┴──▶ Receiver ◀── Slot     │
//!                    │                            │                 │
//!                    │                            ▼                 │
//!                    │                       PayloadSink (log)      │
//!                    └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use slot_server::config::loader::{load_config, ConfigError};
use slot_server::config::validation::validate_config;
use slot_server::config::{ObservabilityConfig, ServerConfig};
use slot_server::lifecycle::{self, SignalBridge};
use slot_server::reactor::LogSink;
use slot_server::observability::{logging, metrics};

#[derive(Debug, Parser)]
#[command(name = "slot-server", version)]
#[command(about = "Single-client TCP listener with SIGHUP shutdown", long_about = None)]
struct Cli {
    /// Path to a TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bind address, e.g. 0.0.0.0:65000 (overrides the file).
    #[arg(short, long)]
    bind: Option<String>,

    /// Listen backlog (overrides the file).
    #[arg(long)]
    backlog: Option<u32>,

    /// Log level (overrides the file; RUST_LOG wins over both).
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn into_config(self) -> Result<ServerConfig, ConfigError> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ServerConfig::default(),
        };

        if let Some(bind) = self.bind {
            config.listener.bind_address = bind;
        }
        if let Some(backlog) = self.backlog {
            config.listener.backlog = backlog;
        }
        if let Some(level) = self.log_level {
            config.observability.log_level = level;
        }

        validate_config(&config).map_err(ConfigError::Validation)?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Registered before anything else so a SIGHUP during config loading is
    // queued for the first checkpoint instead of killing the process.
    let bridge = match SignalBridge::install() {
        Ok(bridge) => bridge,
        Err(e) => {
            let _ = logging::init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Failed to register signal handler");
            return ExitCode::FAILURE;
        }
    };

    let config = match Cli::parse().into_config() {
        Ok(config) => config,
        Err(e) => {
            let _ = logging::init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = logging::init_logging(&config.observability) {
        eprintln!("slot-server: failed to initialize logging: {e}");
    }

    tracing::info!("slot-server v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        backlog = config.listener.backlog,
        buffer_size = config.receiver.buffer_size,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let reactor = match lifecycle::start_with(&config, bridge, LogSink) {
        Ok(reactor) => reactor,
        Err(e) => {
            tracing::error!(error = %e, "Startup failed");
            return ExitCode::FAILURE;
        }
    };

    match reactor.run().await {
        Ok(report) => {
            tracing::info!(
                admitted = report.stats.admitted,
                rejected = report.stats.rejected,
                bytes_received = report.stats.bytes_received,
                "Shutdown complete"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Server stopped on fatal error");
            ExitCode::FAILURE
        }
    }
}
