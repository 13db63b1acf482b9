//! dnsstress Infrastructure Layer
//!
//! Wire-level pieces behind the application ports: hickory-based query
//! encoding, the UDP/TCP/DoH transports and the statsd metrics sink.

pub mod dns;
pub mod metrics;
