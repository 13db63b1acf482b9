use crate::Cli;
use dnsstress_application::ports::{MetricsSink, NoopMetricsSink};
use dnsstress_domain::DomainError;
use dnsstress_infrastructure::metrics::StatsdSink;
use std::sync::Arc;
use tracing::info;

/// An empty `--statsd` disables metrics export.
pub fn init_metrics(cli: &Cli) -> Result<Arc<dyn MetricsSink>, DomainError> {
    if cli.statsd.trim().is_empty() {
        info!("Metrics export disabled");
        return Ok(Arc::new(NoopMetricsSink));
    }

    let sink = StatsdSink::connect(cli.statsd.trim(), &cli.metrics_prefix)?;
    Ok(Arc::new(sink))
}
