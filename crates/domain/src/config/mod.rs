//! Configuration module for dnsstress
//!
//! - `dispatch`: what to send, where, how fast and how many
//! - `logging`: logging settings
//! - `errors`: configuration errors

pub mod dispatch;
pub mod errors;
pub mod logging;

pub use dispatch::{DispatchConfig, SendCap, TransportKind};
pub use errors::ConfigError;
pub use logging::LoggingConfig;
