//! dnsstress Domain Layer
pub mod config;
pub mod errors;
pub mod outcome;
pub mod validators;

pub use config::{ConfigError, DispatchConfig, LoggingConfig, SendCap, TransportKind};
pub use errors::DomainError;
pub use outcome::QueryOutcome;
