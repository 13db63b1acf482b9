pub mod config;
pub mod logging;
pub mod metrics;
pub mod signals;

pub use config::build_dispatch_config;
pub use logging::init_logging;
pub use metrics::init_metrics;
pub use signals::stop_on_signal;
