use std::fmt;
use std::time::Duration;

/// Classified result of a single query.
///
/// Produced once per send and consumed by the counters and the metrics sink.
/// Failed queries are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryOutcome {
    Success { latency: Duration },
    Timeout,
    ConnectionError,
    ProtocolError,
}

impl QueryOutcome {
    pub fn success(latency: Duration) -> Self {
        Self::Success { latency }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn latency(&self) -> Option<Duration> {
        match self {
            Self::Success { latency } => Some(*latency),
            _ => None,
        }
    }

    /// Metric-friendly name of the outcome kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Success { .. } => "success",
            Self::Timeout => "timeout",
            Self::ConnectionError => "connection_error",
            Self::ProtocolError => "protocol_error",
        }
    }
}

impl fmt::Display for QueryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { latency } => {
                write!(f, "success ({:.3}ms)", latency.as_secs_f64() * 1000.0)
            }
            other => f.write_str(other.as_str()),
        }
    }
}
