use std::time::Duration;

/// Metric names reported by the dispatcher, relative to the sink's prefix.
pub mod metric_names {
    pub const SENT: &str = "query.sent";
    pub const SUCCESS: &str = "query.success";
    pub const FAILURE: &str = "query.failure";
    pub const TIMEOUT: &str = "query.timeout";
    pub const CONNECTION_ERROR: &str = "query.connection_error";
    pub const PROTOCOL_ERROR: &str = "query.protocol_error";
    pub const LATENCY: &str = "query.latency";
}

/// Fire-and-forget counter/timing reporting.
///
/// Called from the hot path of every worker: implementations must not block
/// and must swallow their own delivery errors.
pub trait MetricsSink: Send + Sync {
    fn increment(&self, name: &str);

    fn timing(&self, name: &str, value: Duration);
}

/// Sink that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn increment(&self, _name: &str) {}

    fn timing(&self, _name: &str, _value: Duration) {}
}
