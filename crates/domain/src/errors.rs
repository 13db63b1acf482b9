use crate::config::ConfigError;
use thiserror::Error;

/// Fatal errors. Anything in here aborts a run before a single worker starts.
///
/// Per-query failures are not errors; see [`crate::QueryOutcome`].
#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid configuration: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Failed to resolve endpoint {endpoint}: {reason}")]
    EndpointResolution { endpoint: String, reason: String },

    #[error("Transport initialization failed: {0}")]
    Initialization(String),

    #[error("Dispatcher already started")]
    AlreadyStarted,
}

impl DomainError {
    /// True for errors raised while preparing transports, as opposed to
    /// rejecting the configuration itself.
    pub fn is_initialization(&self) -> bool {
        matches!(
            self,
            DomainError::EndpointResolution { .. } | DomainError::Initialization(_)
        )
    }
}
