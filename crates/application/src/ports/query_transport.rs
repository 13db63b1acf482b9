use async_trait::async_trait;
use dnsstress_domain::{DomainError, QueryOutcome};

/// Sends one query for `domain` to the configured resolver and classifies
/// the result.
///
/// Every worker owns its own transport, so `send` takes `&mut self` and
/// implementations are free to keep a socket or connection between calls.
/// Failures are reported through the returned [`QueryOutcome`]; `send` never
/// errors and never retries.
#[async_trait]
pub trait QueryTransport: Send {
    async fn send(&mut self, domain: &str) -> QueryOutcome;

    fn protocol_name(&self) -> &'static str;
}

/// Produces one transport per worker.
///
/// All transports are created before any worker starts; an error here is
/// fatal for the whole run.
#[async_trait]
pub trait TransportFactory: Send + Sync {
    async fn create(&self, worker_id: usize) -> Result<Box<dyn QueryTransport>, DomainError>;
}
