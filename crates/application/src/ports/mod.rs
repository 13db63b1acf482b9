pub mod metrics_sink;
pub mod query_transport;

pub use metrics_sink::{metric_names, MetricsSink, NoopMetricsSink};
pub use query_transport::{QueryTransport, TransportFactory};
