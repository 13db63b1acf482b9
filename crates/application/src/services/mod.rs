pub mod domain_source;
pub mod rate_limiter;
pub mod run_state;

pub use domain_source::DomainSource;
pub use rate_limiter::RateLimiter;
pub use run_state::{format_rate, RunSnapshot, RunState};
