//! Admission, delivery and peer-close behavior of the single slot.

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use slot_server::lifecycle::Shutdown;
use slot_server::net::AcceptOutcome;
use slot_server::reactor::{ReceiveOutcome, Turn};

mod common;
use common::SinkEvent;

#[tokio::test]
async fn test_ping_then_peer_close() {
    let shutdown = Shutdown::new();
    let (reactor, mut events) = common::start_reactor(&shutdown);
    let addr = reactor.local_addr();
    let server = tokio::spawn(reactor.run());

    let mut client = TcpStream::connect(addr).await.unwrap();
    client.write_all(b"ping").await.unwrap();

    let SinkEvent::Data(id, payload) = common::next_event(&mut events).await else {
        panic!("expected data first");
    };
    assert_eq!(payload, b"ping".to_vec());

    // Nothing is echoed back.
    let mut buf = [0u8; 8];
    let echoed = tokio::time::timeout(Duration::from_millis(100), client.read(&mut buf)).await;
    assert!(echoed.is_err(), "server must not respond");

    drop(client);
    assert_eq!(common::next_event(&mut events).await, SinkEvent::Closed(id));

    shutdown.trigger();
    let report = server.await.unwrap().unwrap();
    assert_eq!(report.stats.admitted, 1);
    assert_eq!(report.stats.bytes_received, 4);
    assert_eq!(report.stats.peer_closes, 1);
    assert_eq!(report.closed_client, None);
}

#[tokio::test]
async fn test_second_client_closed_first_unaffected() {
    let shutdown = Shutdown::new();
    let (reactor, mut events) = common::start_reactor(&shutdown);
    let addr = reactor.local_addr();
    let server = tokio::spawn(reactor.run());

    let mut first = TcpStream::connect(addr).await.unwrap();
    first.write_all(b"one").await.unwrap();
    let SinkEvent::Data(first_id, _) = common::next_event(&mut events).await else {
        panic!("first client should be admitted");
    };

    let mut second = TcpStream::connect(addr).await.unwrap();
    common::assert_closed_by_server(&mut second).await;

    first.write_all(b"two").await.unwrap();
    assert_eq!(
        common::next_event(&mut events).await,
        SinkEvent::Data(first_id, b"two".to_vec())
    );

    shutdown.trigger();
    let report = server.await.unwrap().unwrap();
    assert_eq!(report.stats.admitted, 1);
    assert_eq!(report.stats.rejected, 1);
    assert_eq!(report.closed_client, Some(first_id));
    common::assert_closed_by_server(&mut first).await;
}

#[tokio::test]
async fn test_at_most_one_admitted_across_attempts() {
    let shutdown = Shutdown::new();
    let (mut reactor, _events) = common::start_reactor(&shutdown);
    let addr = reactor.local_addr();

    let holder = TcpStream::connect(addr).await.unwrap();
    let Turn::Accepted(AcceptOutcome::Admitted(holder_id)) = reactor.turn().await.unwrap() else {
        panic!("first attempt must be admitted");
    };

    for _ in 0..3 {
        let mut extra = TcpStream::connect(addr).await.unwrap();
        assert_eq!(
            reactor.turn().await.unwrap(),
            Turn::Accepted(AcceptOutcome::Rejected)
        );
        assert_eq!(reactor.slot().id(), Some(holder_id));
        common::assert_closed_by_server(&mut extra).await;
    }
    assert_eq!(reactor.stats().rejected, 3);

    drop(holder);
    loop {
        match reactor.turn().await.unwrap() {
            Turn::Received(ReceiveOutcome::PeerClosed) => break,
            Turn::Received(ReceiveOutcome::Transient) => continue,
            other => panic!("unexpected turn: {other:?}"),
        }
    }

    let _next = TcpStream::connect(addr).await.unwrap();
    let Turn::Accepted(AcceptOutcome::Admitted(next_id)) = reactor.turn().await.unwrap() else {
        panic!("slot should accept again after peer close");
    };
    assert_ne!(next_id, holder_id);
    assert_eq!(reactor.stats().admitted, 2);
}

#[tokio::test]
async fn test_peer_close_drops_client_from_readiness_set() {
    let shutdown = Shutdown::new();
    let (mut reactor, mut events) = common::start_reactor(&shutdown);
    let addr = reactor.local_addr();

    assert_eq!(reactor.readiness_set().unwrap().client, None);

    let mut client = TcpStream::connect(addr).await.unwrap();
    let Turn::Accepted(AcceptOutcome::Admitted(id)) = reactor.turn().await.unwrap() else {
        panic!("expected admission");
    };
    let set = reactor.readiness_set().unwrap();
    assert_eq!(set.client, Some(id));
    assert_eq!(set.listener, addr);

    client.write_all(b"ping").await.unwrap();
    loop {
        match reactor.turn().await.unwrap() {
            Turn::Received(ReceiveOutcome::Data(4)) => break,
            Turn::Received(ReceiveOutcome::Transient) => continue,
            other => panic!("unexpected turn: {other:?}"),
        }
    }
    assert_eq!(
        common::next_event(&mut events).await,
        SinkEvent::Data(id, b"ping".to_vec())
    );

    drop(client);
    loop {
        match reactor.turn().await.unwrap() {
            Turn::Received(ReceiveOutcome::PeerClosed) => break,
            Turn::Received(ReceiveOutcome::Transient) => continue,
            other => panic!("unexpected turn: {other:?}"),
        }
    }

    assert!(!reactor.slot().is_occupied());
    assert!(!reactor.readiness_set().unwrap().watches_client());
    assert_eq!(common::next_event(&mut events).await, SinkEvent::Closed(id));
}
