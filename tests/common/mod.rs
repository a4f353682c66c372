//! Shared utilities for integration testing.

use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::sync::mpsc;

use slot_server::lifecycle::{self, Shutdown, SignalBridge};
use slot_server::net::ConnectionId;
use slot_server::reactor::{PayloadSink, Reactor};
use slot_server::ServerConfig;

pub const WAIT: Duration = Duration::from_secs(5);

/// What the reactor handed to its sink.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Data(ConnectionId, Vec<u8>),
    Closed(ConnectionId),
}

/// Sink that forwards every event to a channel.
#[derive(Debug)]
pub struct ChannelSink(mpsc::UnboundedSender<SinkEvent>);

impl PayloadSink for ChannelSink {
    fn deliver(&mut self, id: ConnectionId, payload: &[u8]) {
        let _ = self.0.send(SinkEvent::Data(id, payload.to_vec()));
    }

    fn closed(&mut self, id: ConnectionId) {
        let _ = self.0.send(SinkEvent::Closed(id));
    }
}

/// Reactor on an ephemeral loopback port, stopped through `shutdown`.
pub fn start_reactor(shutdown: &Shutdown) -> (Reactor<ChannelSink>, mpsc::UnboundedReceiver<SinkEvent>) {
    let mut config = ServerConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();

    let (tx, rx) = mpsc::unbounded_channel();
    let bridge = SignalBridge::from_trigger(shutdown.subscribe());
    let reactor = lifecycle::start_with(&config, bridge, ChannelSink(tx)).unwrap();
    (reactor, rx)
}

/// Next sink event, failing the test if none arrives in time.
pub async fn next_event(rx: &mut mpsc::UnboundedReceiver<SinkEvent>) -> SinkEvent {
    tokio::time::timeout(WAIT, rx.recv())
        .await
        .expect("timed out waiting for sink event")
        .expect("sink channel closed")
}

/// Assert the server closed `stream`: EOF or a reset.
pub async fn assert_closed_by_server(stream: &mut TcpStream) {
    let mut buf = [0u8; 16];
    let read = tokio::time::timeout(WAIT, stream.read(&mut buf))
        .await
        .expect("server never closed the connection");
    assert!(matches!(read, Ok(0) | Err(_)), "unexpected read result: {read:?}");
}
