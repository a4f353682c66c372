//! Listening endpoint.
//!
//! # Responsibilities
//! - Bind to the configured address with the configured backlog
//! - Hand accepted streams to the acceptor
//! - Log the close of the server descriptor exactly once

use std::io;
use std::net::SocketAddr;
use tokio::net::{TcpListener, TcpSocket, TcpStream};

use crate::config::ListenerConfig;

/// Error type for listener setup.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    /// The configured address does not parse.
    #[error("invalid bind address '{address}': {source}")]
    Address {
        address: String,
        source: std::net::AddrParseError,
    },
    /// Failed to create the socket.
    #[error("failed to create socket: {0}")]
    Socket(#[source] io::Error),
    /// Failed to bind to address.
    #[error("failed to bind {address}: {source}")]
    Bind { address: SocketAddr, source: io::Error },
    /// Failed to enter listening mode.
    #[error("failed to listen on {address}: {source}")]
    Listen { address: SocketAddr, source: io::Error },
}

/// The bound, listening server socket.
///
/// Dropping the endpoint closes the descriptor.
#[derive(Debug)]
pub struct ListeningEndpoint {
    inner: TcpListener,
    local_addr: SocketAddr,
}

impl ListeningEndpoint {
    /// Bind to the configured address and start listening.
    pub fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let address: SocketAddr =
            config
                .bind_address
                .parse()
                .map_err(|source| ListenerError::Address {
                    address: config.bind_address.clone(),
                    source,
                })?;

        let socket = if address.is_ipv4() {
            TcpSocket::new_v4()
        } else {
            TcpSocket::new_v6()
        }
        .map_err(ListenerError::Socket)?;

        socket
            .set_reuseaddr(true)
            .map_err(ListenerError::Socket)?;
        socket
            .bind(address)
            .map_err(|source| ListenerError::Bind { address, source })?;

        let inner = socket
            .listen(config.backlog)
            .map_err(|source| ListenerError::Listen { address, source })?;
        let local_addr = inner
            .local_addr()
            .map_err(|source| ListenerError::Listen { address, source })?;

        tracing::info!(
            address = %local_addr,
            backlog = config.backlog,
            "Listener bound"
        );

        Ok(Self { inner, local_addr })
    }

    /// Accept the next pending connection.
    ///
    /// Cancel safe: dropping the future before it completes loses nothing.
    pub async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        self.inner.accept().await
    }

    /// Get the local address this endpoint is bound to.
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }
}

impl Drop for ListeningEndpoint {
    fn drop(&mut self) {
        tracing::info!(address = %self.local_addr, "Server socket closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn loopback() -> ListenerConfig {
        ListenerConfig {
            bind_address: "127.0.0.1:0".into(),
            ..ListenerConfig::default()
        }
    }

    #[tokio::test]
    async fn binds_ephemeral_port() {
        let endpoint = ListeningEndpoint::bind(&loopback()).unwrap();
        assert_ne!(endpoint.local_addr().port(), 0);
    }

    #[tokio::test]
    async fn accepts_connection() {
        let endpoint = ListeningEndpoint::bind(&loopback()).unwrap();
        let addr = endpoint.local_addr();

        let client = tokio::spawn(async move { TcpStream::connect(addr).await });
        let (_stream, peer) = endpoint.accept().await.unwrap();
        let client = client.await.unwrap().unwrap();

        assert_eq!(peer, client.local_addr().unwrap());
    }

    #[tokio::test]
    async fn rejects_unparseable_address() {
        let config = ListenerConfig {
            bind_address: "not-an-address".into(),
            ..ListenerConfig::default()
        };
        let err = ListeningEndpoint::bind(&config).unwrap_err();
        assert!(matches!(err, ListenerError::Address { .. }));
    }

    #[tokio::test]
    async fn address_in_use_is_bind_error() {
        let first = ListeningEndpoint::bind(&loopback()).unwrap();
        let taken = ListenerConfig {
            bind_address: first.local_addr().to_string(),
            ..ListenerConfig::default()
        };
        // SO_REUSEADDR does not allow two live listeners on one port.
        let err = ListeningEndpoint::bind(&taken).unwrap_err();
        assert!(matches!(
            err,
            ListenerError::Bind { .. } | ListenerError::Listen { .. }
        ));
    }
}
