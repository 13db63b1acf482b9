use dnsstress_domain::{QueryOutcome, SendCap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

/// Shared counters and stop flag for one dispatcher run.
///
/// `claimed` is the only counter that gates behaviour: a worker must win
/// [`RunState::try_claim`] before it sends, which keeps
/// `succeeded + failed <= claimed <= cap` at all times.
pub struct RunState {
    send_cap: SendCap,
    claimed: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    timeouts: AtomicU64,
    connection_errors: AtomicU64,
    protocol_errors: AtomicU64,
    /// Sum of successful round-trip times in microseconds
    total_latency_us: AtomicU64,
    started_at: Instant,
    cancel: CancellationToken,
}

impl RunState {
    pub fn new(send_cap: SendCap) -> Self {
        Self {
            send_cap,
            claimed: AtomicU64::new(0),
            succeeded: AtomicU64::new(0),
            failed: AtomicU64::new(0),
            timeouts: AtomicU64::new(0),
            connection_errors: AtomicU64::new(0),
            protocol_errors: AtomicU64::new(0),
            total_latency_us: AtomicU64::new(0),
            started_at: Instant::now(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn send_cap(&self) -> SendCap {
        self.send_cap
    }

    /// Claims one send slot. Returns `false` once a finite cap is exhausted.
    ///
    /// Compare-and-increment: the claimed count never passes the cap, even
    /// transiently.
    pub fn try_claim(&self) -> bool {
        match self.send_cap {
            SendCap::Unbounded => {
                self.claimed.fetch_add(1, Ordering::AcqRel);
                true
            }
            SendCap::Limited(cap) => self
                .claimed
                .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                    (current < cap).then_some(current + 1)
                })
                .is_ok(),
        }
    }

    /// Gives back a slot that was claimed but never sent.
    pub fn release_claim(&self) {
        self.claimed.fetch_sub(1, Ordering::AcqRel);
    }

    pub fn record(&self, outcome: &QueryOutcome) {
        match outcome {
            QueryOutcome::Success { latency } => {
                self.succeeded.fetch_add(1, Ordering::Relaxed);
                self.total_latency_us
                    .fetch_add(latency.as_micros() as u64, Ordering::Relaxed);
            }
            QueryOutcome::Timeout => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                self.timeouts.fetch_add(1, Ordering::Relaxed);
            }
            QueryOutcome::ConnectionError => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                self.connection_errors.fetch_add(1, Ordering::Relaxed);
            }
            QueryOutcome::ProtocolError => {
                self.failed.fetch_add(1, Ordering::Relaxed);
                self.protocol_errors.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn claimed(&self) -> u64 {
        self.claimed.load(Ordering::Acquire)
    }

    pub fn succeeded(&self) -> u64 {
        self.succeeded.load(Ordering::Relaxed)
    }

    pub fn failed(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn snapshot(&self) -> RunSnapshot {
        RunSnapshot {
            claimed: self.claimed(),
            succeeded: self.succeeded(),
            failed: self.failed(),
            timeouts: self.timeouts.load(Ordering::Relaxed),
            connection_errors: self.connection_errors.load(Ordering::Relaxed),
            protocol_errors: self.protocol_errors.load(Ordering::Relaxed),
            total_latency_us: self.total_latency_us.load(Ordering::Relaxed),
            elapsed: self.started_at.elapsed(),
        }
    }
}

/// Point-in-time copy of the run counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RunSnapshot {
    pub claimed: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub timeouts: u64,
    pub connection_errors: u64,
    pub protocol_errors: u64,
    pub total_latency_us: u64,
    pub elapsed: Duration,
}

impl RunSnapshot {
    pub fn completed(&self) -> u64 {
        self.succeeded + self.failed
    }

    /// Completed queries per second since the run started.
    pub fn rate(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.completed() as f64 / secs
    }

    /// Queries per second between `earlier` and `self`.
    pub fn rate_since(&self, earlier: &RunSnapshot) -> f64 {
        let secs = self.elapsed.saturating_sub(earlier.elapsed).as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.completed().saturating_sub(earlier.completed()) as f64 / secs
    }

    pub fn avg_latency_ms(&self) -> f64 {
        if self.succeeded == 0 {
            return 0.0;
        }
        (self.total_latency_us as f64 / self.succeeded as f64) / 1000.0
    }

    pub fn success_rate(&self) -> f64 {
        let total = self.completed();
        if total == 0 {
            return 0.0;
        }
        self.succeeded as f64 / total as f64
    }
}

pub fn format_rate(rate: f64) -> String {
    if rate >= 1_000_000.0 {
        format!("{:.1}M q/s", rate / 1_000_000.0)
    } else if rate >= 1_000.0 {
        format!("{:.1}k q/s", rate / 1_000.0)
    } else {
        format!("{:.0} q/s", rate)
    }
}
