use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter as GovernorLimiter};
use std::num::NonZeroU32;
use std::time::Duration;

/// Type alias for the single-key limiter shared by all workers
type AggregateLimiter = GovernorLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// One token per `1 / queries_per_second`, no burst. `None` for 0.
pub(crate) fn quota_for(queries_per_second: u32) -> Option<Quota> {
    NonZeroU32::new(queries_per_second)
        .map(|qps| Quota::per_second(qps).allow_burst(NonZeroU32::MIN))
}

/// Paces the aggregate send rate of all workers.
///
/// GCRA with a burst of one: a token is released every `1 / rate` seconds
/// and the bucket never stores more than one, so an idle period is not
/// followed by a burst.
pub struct RateLimiter {
    limiter: Option<AggregateLimiter>,
    interval: Option<Duration>,
}

impl RateLimiter {
    /// `queries_per_second == 0` means unlimited.
    pub fn new(queries_per_second: u32) -> Self {
        let quota = quota_for(queries_per_second);
        Self {
            limiter: quota.map(GovernorLimiter::direct),
            interval: quota.map(|q| q.replenish_interval()),
        }
    }

    pub fn unlimited() -> Self {
        Self::new(0)
    }

    pub fn is_unlimited(&self) -> bool {
        self.limiter.is_none()
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    /// Waits until the caller may send one query. Dropping the future
    /// before it resolves consumes nothing.
    pub async fn acquire(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    /// Takes a token if one is available right now.
    pub fn try_acquire(&self) -> bool {
        match &self.limiter {
            Some(limiter) => limiter.check().is_ok(),
            None => true,
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::unlimited()
    }
}
