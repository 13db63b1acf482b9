use dnsstress_application::{LifecycleController, NoopMetricsSink};
use dnsstress_domain::{DispatchConfig, SendCap, TransportKind};
use dnsstress_infrastructure::dns::TransportBuilder;
use std::net::SocketAddr;
use std::sync::Arc;

pub struct TestDomains;

impl TestDomains {
    pub fn pair() -> [&'static str; 2] {
        ["a.example", "b.example"]
    }

    pub fn triple() -> [&'static str; 3] {
        ["a.example", "b.example", "c.example"]
    }
}

/// Controller wired to the real transports, no metrics export.
pub async fn controller_for(
    kind: TransportKind,
    addr: SocketAddr,
    domains: &[&str],
    concurrency: usize,
    send_cap: SendCap,
    timeout_ms: u64,
) -> LifecycleController {
    let config = DispatchConfig::new(kind, &addr.to_string(), domains)
        .expect("valid config")
        .with_concurrency(concurrency)
        .with_send_cap(send_cap)
        .with_query_timeout_ms(timeout_ms);

    let factory = TransportBuilder::from_config(&config)
        .await
        .expect("endpoint resolves");

    LifecycleController::new(config, Arc::new(factory), Arc::new(NoopMetricsSink))
}
