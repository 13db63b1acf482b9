use dnsstress_application::services::format_rate;
use dnsstress_application::{RunSnapshot, RunState};
use dnsstress_domain::DispatchConfig;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub fn print_banner(config: &DispatchConfig) {
    info!("dnsstress {}", env!("CARGO_PKG_VERSION"));
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!("Target domains:");
    for domain in &config.domains {
        info!("  - {}", domain);
    }
    info!(
        "Resolver: {} over {}, {} workers, cap {}",
        config.endpoint, config.transport, config.concurrency, config.send_cap
    );
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
}

/// Logs a progress line every `every` until `done` fires.
pub async fn report_progress(run: Arc<RunState>, every: Duration, done: CancellationToken) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    let mut previous = run.snapshot();
    loop {
        tokio::select! {
            _ = done.cancelled() => break,
            _ = ticker.tick() => {}
        }

        let current = run.snapshot();
        info!(
            sent = current.claimed,
            succeeded = current.succeeded,
            failed = current.failed,
            rate = %format_rate(current.rate_since(&previous)),
            "Progress"
        );
        previous = current;
    }
}

pub fn log_summary(snapshot: &RunSnapshot) {
    info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
    info!(
        "Sent {} queries: {} succeeded, {} failed ({} timeouts, {} connection errors, {} protocol errors)",
        snapshot.claimed,
        snapshot.succeeded,
        snapshot.failed,
        snapshot.timeouts,
        snapshot.connection_errors,
        snapshot.protocol_errors
    );
    info!(
        "Elapsed {:.2}s, {}, success rate {:.1}%, mean latency {:.3}ms",
        snapshot.elapsed.as_secs_f64(),
        format_rate(snapshot.rate()),
        snapshot.success_rate() * 100.0,
        snapshot.avg_latency_ms()
    );
}
