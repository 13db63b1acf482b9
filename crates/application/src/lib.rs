//! dnsstress Application Layer
//!
//! The query dispatch engine: ports to the outside world, the shared
//! services the workers coordinate through, and the worker pool with its
//! lifecycle controller.

pub mod ports;
pub mod services;
pub mod use_cases;

pub use ports::{MetricsSink, NoopMetricsSink, QueryTransport, TransportFactory};
pub use services::{DomainSource, RateLimiter, RunSnapshot, RunState};
pub use use_cases::{LifecycleController, LifecycleState, WorkerPool};
