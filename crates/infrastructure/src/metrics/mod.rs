pub mod statsd;

pub use statsd::StatsdSink;
