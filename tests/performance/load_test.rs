#[path = "../common/mod.rs"]
mod common;
use common::{ServerBehavior, TestDomains, TestResolver};
use dnsstress_application::{LifecycleController, NoopMetricsSink};
use dnsstress_domain::{DispatchConfig, SendCap, TransportKind};
use dnsstress_infrastructure::dns::TransportBuilder;
use std::sync::Arc;
use std::time::{Duration, Instant};

// ============================================================================
// Load Tests
// ============================================================================

async fn run_at_rate(target_qps: u32, duration: Duration) -> (u64, f64) {
    let resolver = TestResolver::start_udp(ServerBehavior::Answer).await.unwrap();
    let config = DispatchConfig::new(
        TransportKind::Udp,
        &resolver.addr().to_string(),
        TestDomains::pair(),
    )
    .unwrap()
    .with_concurrency(8)
    .with_send_cap(SendCap::Unbounded)
    .with_target_rate(target_qps);

    let factory = TransportBuilder::from_config(&config).await.unwrap();
    let ctl = LifecycleController::new(config, Arc::new(factory), Arc::new(NoopMetricsSink));

    let start = Instant::now();
    ctl.start().await.unwrap();
    tokio::time::sleep(duration).await;
    ctl.stop().await;

    let sent = ctl.snapshot().claimed;
    (sent, sent as f64 / start.elapsed().as_secs_f64())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore] // Heavy test - run explicitly
async fn test_sustained_load_1000_qps() {
    let (sent, actual_qps) = run_at_rate(1000, Duration::from_secs(5)).await;
    println!("Target: 1000 QPS, Achieved: {:.2} QPS ({} sent)", actual_qps, sent);

    assert!(actual_qps >= 900.0, "Should reach 90% of target QPS");
    assert!(actual_qps <= 1100.0, "Should not exceed target QPS by more than 10%");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ignore]
async fn test_sustained_load_5000_qps() {
    let (sent, actual_qps) = run_at_rate(5000, Duration::from_secs(5)).await;
    println!("Target: 5000 QPS, Achieved: {:.2} QPS ({} sent)", actual_qps, sent);

    assert!(actual_qps <= 5500.0);
}
