#[path = "../common/mod.rs"]
mod common;
use common::{controller_for, ServerBehavior, TestDomains, TestResolver};
use dnsstress_application::{LifecycleController, LifecycleState, NoopMetricsSink};
use dnsstress_domain::{DispatchConfig, SendCap, TransportKind};
use dnsstress_infrastructure::dns::TransportBuilder;
use std::net::SocketAddr;
use std::sync::Arc;

async fn closed_tcp_port() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

// ============================================================================
// Failure isolation
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_unreachable_tcp_resolver_fails_every_query() {
    let ctl = controller_for(
        TransportKind::Tcp,
        closed_tcp_port().await,
        &TestDomains::pair(),
        2,
        SendCap::Limited(50),
        500,
    )
    .await;

    ctl.start().await.unwrap();
    ctl.wait().await;

    let snap = ctl.snapshot();
    assert_eq!(ctl.state(), LifecycleState::Stopped);
    assert_eq!(snap.claimed, 50);
    assert_eq!(snap.succeeded, 0);
    assert_eq!(snap.failed, 50);
    assert_eq!(snap.connection_errors, 50);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_silent_resolver_times_out() {
    let resolver = TestResolver::start_udp(ServerBehavior::Silent).await.unwrap();
    let ctl = controller_for(
        TransportKind::Udp,
        resolver.addr(),
        &TestDomains::pair(),
        4,
        SendCap::Limited(8),
        50,
    )
    .await;

    ctl.start().await.unwrap();
    ctl.wait().await;

    let snap = ctl.snapshot();
    assert_eq!(snap.timeouts, 8);
    assert_eq!(snap.succeeded, 0);
    assert_eq!(resolver.total(), 8);
}

#[tokio::test]
async fn test_unresolvable_resolver_fails_before_start() {
    let config = DispatchConfig::new(
        TransportKind::Udp,
        "no-such-host.invalid:53",
        ["a.example"],
    )
    .unwrap()
    .with_concurrency(2);

    let err = TransportBuilder::from_config(&config).await.err().unwrap();
    assert!(err.is_initialization());
}

#[tokio::test]
async fn test_stop_before_start_never_touches_the_network() {
    let resolver = TestResolver::start_udp(ServerBehavior::Answer).await.unwrap();
    let config = DispatchConfig::new(
        TransportKind::Udp,
        &resolver.addr().to_string(),
        ["a.example"],
    )
    .unwrap()
    .with_concurrency(2)
    .with_send_cap(SendCap::Unbounded);
    let factory = TransportBuilder::from_config(&config).await.unwrap();
    let ctl = LifecycleController::new(config, Arc::new(factory), Arc::new(NoopMetricsSink));

    ctl.stop().await;
    assert_eq!(ctl.state(), LifecycleState::Stopped);
    assert!(ctl.start().await.is_err());
    assert_eq!(resolver.total(), 0);
}
