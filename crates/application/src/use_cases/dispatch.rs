use dnsstress_domain::{DispatchConfig, DomainError, QueryOutcome};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};

use super::lifecycle::LifecycleSignal;
use crate::ports::{metric_names, MetricsSink, QueryTransport, TransportFactory};
use crate::services::{DomainSource, RateLimiter, RunState};

/// Owns the sender loops of one run.
///
/// `prepare` builds every worker's transport up front so that a failure
/// aborts the run before anything is sent; `launch` then spawns one task per
/// transport.
pub struct WorkerPool {
    config: Arc<DispatchConfig>,
    factory: Arc<dyn TransportFactory>,
    sink: Arc<dyn MetricsSink>,
}

impl WorkerPool {
    pub fn new(
        config: Arc<DispatchConfig>,
        factory: Arc<dyn TransportFactory>,
        sink: Arc<dyn MetricsSink>,
    ) -> Self {
        Self {
            config,
            factory,
            sink,
        }
    }

    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    /// Creates one transport per worker. All or nothing.
    #[instrument(skip(self), fields(concurrency = self.config.concurrency, transport = %self.config.transport))]
    pub async fn prepare(&self) -> Result<Vec<Box<dyn QueryTransport>>, DomainError> {
        self.config.validate()?;

        let mut transports = Vec::with_capacity(self.config.concurrency);
        for worker_id in 0..self.config.concurrency {
            let transport = self.factory.create(worker_id).await?;
            transports.push(transport);
        }

        debug!(workers = transports.len(), "Transports prepared");
        Ok(transports)
    }

    pub(crate) fn launch(
        &self,
        transports: Vec<Box<dyn QueryTransport>>,
        state: Arc<RunState>,
        signal: Arc<LifecycleSignal>,
    ) -> Vec<JoinHandle<()>> {
        let ctx = Arc::new(DispatchContext {
            state,
            limiter: RateLimiter::new(self.config.target_rate),
            domains: DomainSource::new(self.config.domains.clone()),
            sink: Arc::clone(&self.sink),
            signal,
        });

        info!(
            workers = transports.len(),
            endpoint = %self.config.endpoint,
            transport = %self.config.transport,
            send_cap = %self.config.send_cap,
            target_rate = self.config.target_rate,
            domains = ctx.domains.len(),
            "Starting workers"
        );

        transports
            .into_iter()
            .enumerate()
            .map(|(id, transport)| {
                let worker = Worker {
                    id,
                    transport,
                    ctx: Arc::clone(&ctx),
                };
                tokio::spawn(worker.run())
            })
            .collect()
    }
}

struct DispatchContext {
    state: Arc<RunState>,
    limiter: RateLimiter,
    domains: DomainSource,
    sink: Arc<dyn MetricsSink>,
    signal: Arc<LifecycleSignal>,
}

struct Worker {
    id: usize,
    transport: Box<dyn QueryTransport>,
    ctx: Arc<DispatchContext>,
}

/// Reports the worker's exit to the lifecycle, even if the loop panics.
struct ExitGuard(Arc<LifecycleSignal>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.0.worker_exited();
    }
}

impl Worker {
    async fn run(mut self) {
        let _guard = ExitGuard(Arc::clone(&self.ctx.signal));
        let token = self.ctx.state.cancellation_token().clone();
        let started = Instant::now();
        let mut sent: u64 = 0;

        loop {
            if token.is_cancelled() {
                debug!(worker = self.id, "Stop requested");
                break;
            }

            if !self.ctx.state.try_claim() {
                debug!(worker = self.id, "Send cap reached");
                self.ctx.signal.begin_stopping();
                break;
            }

            if !self.ctx.limiter.is_unlimited() {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => {
                        self.ctx.state.release_claim();
                        break;
                    }
                    _ = self.ctx.limiter.acquire() => {}
                }
            }

            let domain = self.ctx.domains.next();
            self.ctx.sink.increment(metric_names::SENT);

            let outcome = self.send_guarded(&domain).await;
            self.ctx.state.record(&outcome);
            report(self.ctx.sink.as_ref(), &outcome);
            sent += 1;
        }

        debug!(
            worker = self.id,
            protocol = self.transport.protocol_name(),
            sent,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Worker exited"
        );
    }

    /// A panicking transport counts as a protocol error, the worker lives on.
    async fn send_guarded(&mut self, domain: &str) -> QueryOutcome {
        match AssertUnwindSafe(self.transport.send(domain))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(_) => {
                warn!(worker = self.id, domain = %domain, "Transport panicked while sending");
                QueryOutcome::ProtocolError
            }
        }
    }
}

fn report(sink: &dyn MetricsSink, outcome: &QueryOutcome) {
    match outcome {
        QueryOutcome::Success { latency } => {
            sink.increment(metric_names::SUCCESS);
            sink.timing(metric_names::LATENCY, *latency);
        }
        QueryOutcome::Timeout => {
            sink.increment(metric_names::FAILURE);
            sink.increment(metric_names::TIMEOUT);
        }
        QueryOutcome::ConnectionError => {
            sink.increment(metric_names::FAILURE);
            sink.increment(metric_names::CONNECTION_ERROR);
        }
        QueryOutcome::ProtocolError => {
            sink.increment(metric_names::FAILURE);
            sink.increment(metric_names::PROTOCOL_ERROR);
        }
    }
}
