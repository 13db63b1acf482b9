use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Concurrency must be at least 1")]
    InvalidConcurrency,

    #[error("At least one target domain is required")]
    NoTargetDomains,

    #[error("Invalid target domain '{0}'")]
    InvalidDomain(String),

    #[error("Invalid protocol {0}, expected 'dns' or 'doh'")]
    InvalidProtocol(String),

    #[error("Unknown protocol {0}, expected 'udp' or 'tcp'")]
    InvalidSubProtocol(String),

    #[error("Invalid resolver endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("Query timeout must be greater than zero")]
    InvalidTimeout,
}
