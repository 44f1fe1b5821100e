//! End-to-end lifecycle tests for the data protocol extension.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use data_protocol_server::database::EmbeddedDatabase;
use data_protocol_server::lifecycle::ComponentState;
use data_protocol_server::net::HostnamePort;
use data_protocol_server::session::{Sessions, StandardSessions};
use data_protocol_server::transport::{SocketTransport, TransportSettings};
use data_protocol_server::{build, ConfigSnapshot, Lifecycle, LifecycleContainer, LifecycleError};
use tokio::io::AsyncWriteExt;

mod common;

use common::{Journal, Dummy, Recorder};

#[tokio::test]
async fn disabled_extension_is_inert() {
    let port = common::free_port().await;
    let config = ConfigSnapshot::new().with("dbms.ndp.address", format!("127.0.0.1:{}", port));

    let handle = build(&config, &common::dependencies()).unwrap();
    assert!(!handle.is_enabled());

    handle.start().await.unwrap();
    let addr: SocketAddr = format!("127.0.0.1:{}", port).parse().unwrap();
    assert!(common::try_connect(addr).await.is_err());

    handle.stop().await.unwrap();
}

#[tokio::test]
async fn never_started_handles_stop_twice() {
    let inert = build(&ConfigSnapshot::new(), &common::dependencies()).unwrap();
    inert.stop().await.unwrap();
    inert.stop().await.unwrap();

    let port = common::free_port().await;
    let live = build(
        &common::enabled_config(&format!("127.0.0.1:{}", port)),
        &common::dependencies(),
    )
    .unwrap();
    live.stop().await.unwrap();
    live.stop().await.unwrap();
}

#[tokio::test]
async fn sessions_start_before_and_stop_after_transport() {
    let journal = Journal::default();
    let sessions = Arc::new(StandardSessions::new(Arc::new(EmbeddedDatabase::new("p2"))));
    let transport = Arc::new(SocketTransport::new(
        HostnamePort::new("127.0.0.1", 0),
        TransportSettings::default(),
        sessions.clone() as Arc<dyn Sessions>,
    ));

    let mut life = LifecycleContainer::new("ordering");
    life.register("sessions", Recorder::new("sessions", sessions, &journal)).unwrap();
    life.register("socket-transport", Recorder::new("socket-transport", transport, &journal))
        .unwrap();

    life.start().await.unwrap();
    assert!(journal.position_of("start:sessions") < journal.position_of("start:socket-transport"));

    life.stop().await.unwrap();
    assert!(journal.position_of("stop:socket-transport") < journal.position_of("stop:sessions"));
    assert_eq!(
        journal.events(),
        vec![
            "start:sessions",
            "start:socket-transport",
            "stop:socket-transport",
            "stop:sessions",
        ]
    );
}

#[tokio::test]
async fn bind_failure_unwinds_sessions_once() {
    let held = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = held.local_addr().unwrap().port();

    let journal = Journal::default();
    let sessions_dummy = Dummy::ok("sessions", &journal);
    let sessions = Arc::new(StandardSessions::new(Arc::new(EmbeddedDatabase::new("p3"))));
    let transport = Arc::new(SocketTransport::new(
        HostnamePort::new("127.0.0.1", port),
        TransportSettings::default(),
        sessions,
    ));

    let mut life = LifecycleContainer::new("unwind");
    life.register("sessions", sessions_dummy.clone()).unwrap();
    life.register("socket-transport", transport).unwrap();

    let err = life.start().await.unwrap_err();
    assert!(matches!(err, LifecycleError::Bind { .. }), "got {}", err);
    assert_eq!(sessions_dummy.stop_count(), 1);
    assert_eq!(life.state(), ComponentState::Failed);

    // Terminal: the host cannot retry on the same container.
    assert!(matches!(life.start().await, Err(LifecycleError::InvalidState { .. })));
    assert_eq!(sessions_dummy.stop_count(), 1);
}

#[tokio::test]
async fn bind_failure_through_extension_propagates_bind_error() {
    let held = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = held.local_addr().unwrap().to_string();

    let handle = build(&common::enabled_config(&address), &common::dependencies()).unwrap();
    let err = handle.start().await.unwrap_err();
    assert!(matches!(err, LifecycleError::Bind { .. }), "got {}", err);

    let states = handle.container().unwrap().component_states();
    assert_eq!(
        states,
        vec![
            ("sessions", ComponentState::Stopped),
            ("socket-transport", ComponentState::Failed),
        ]
    );

    // Still held by the test listener.
    drop(held);
}

#[tokio::test]
async fn every_stop_is_attempted_when_both_fail() {
    let journal = Journal::default();
    let sessions = Dummy::failing_stop("sessions", &journal);
    let transport = Dummy::failing_stop("socket-transport", &journal);

    let mut life = LifecycleContainer::new("aggregate");
    life.register("sessions", sessions.clone()).unwrap();
    life.register("socket-transport", transport.clone()).unwrap();
    life.start().await.unwrap();

    let err = life.stop().await.unwrap_err();
    assert_eq!(sessions.stop_count(), 1);
    assert_eq!(transport.stop_count(), 1);
    assert_eq!(err.failed_components(), vec!["socket-transport", "sessions"]);

    let message = err.to_string();
    assert!(message.contains("socket-transport"));
    assert!(message.contains("sessions"));
}

#[tokio::test]
async fn failure_at_any_position_unwinds_symmetrically() {
    let journal = Journal::default();
    let mut life = LifecycleContainer::new("first-fails");
    life.register("sessions", Dummy::failing_start("sessions", &journal)).unwrap();
    life.register("socket-transport", Dummy::ok("socket-transport", &journal)).unwrap();

    assert!(matches!(life.start().await, Err(LifecycleError::Startup { .. })));
    assert_eq!(journal.events(), vec!["start:sessions"]);
    assert_eq!(journal.count("start:socket-transport"), 0);
}

#[tokio::test]
async fn host_container_nests_extension() {
    let port = common::free_port().await;
    let address = format!("127.0.0.1:{}", port);
    let extension = build(&common::enabled_config(&address), &common::dependencies()).unwrap();

    let journal = Journal::default();
    let mut host = LifecycleContainer::new("host");
    let before = host.register("before", Dummy::ok("before", &journal)).unwrap();
    host.register("data-protocol-server", Arc::new(extension)).unwrap();
    host.register("after", Dummy::ok("after", &journal)).unwrap();

    host.start().await.unwrap();
    let addr: SocketAddr = address.parse().unwrap();
    assert!(common::try_connect(addr).await.is_ok());

    host.stop().await.unwrap();
    assert!(common::try_connect(addr).await.is_err());
    assert_eq!(
        journal.events(),
        vec!["start:before", "start:after", "stop:after", "stop:before"]
    );
    assert_eq!(before.stop_count(), 1);
}

#[tokio::test]
async fn enabled_server_accepts_then_refuses_after_stop() {
    let config = common::enabled_config("127.0.0.1:9999");
    let handle = build(&config, &common::dependencies()).unwrap();
    let addr: SocketAddr = "127.0.0.1:9999".parse().unwrap();

    handle.start().await.unwrap();

    let mut client = common::try_connect(addr).await.expect("server should accept");
    client.write_all(b"hello").await.unwrap();

    handle.stop().await.unwrap();

    let err = common::try_connect(addr).await.unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::ConnectionRefused);
}

#[tokio::test]
async fn stop_waits_for_connections_to_close() {
    let sessions = Arc::new(StandardSessions::new(Arc::new(EmbeddedDatabase::new("drain"))));
    let transport = Arc::new(SocketTransport::new(
        HostnamePort::new("127.0.0.1", 0),
        TransportSettings {
            max_connections: 4,
            shutdown_timeout: Duration::from_secs(1),
        },
        sessions.clone() as Arc<dyn Sessions>,
    ));

    let mut life = LifecycleContainer::new("drain");
    life.register("sessions", sessions.clone()).unwrap();
    let transport = life.register("socket-transport", transport).unwrap();
    life.start().await.unwrap();

    let addr = transport.local_addr().await.unwrap();
    let _a = common::try_connect(addr).await.unwrap();
    let _b = common::try_connect(addr).await.unwrap();

    for _ in 0..100 {
        if sessions.active_sessions() == 2 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(sessions.active_sessions(), 2);
    assert_eq!(transport.active_connections().await, 2);

    life.stop().await.unwrap();
    assert_eq!(sessions.active_sessions(), 0);
    assert!(!sessions.is_running());
}
