use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::errors::ConfigError;
use crate::validators::{normalize_domain, normalize_resolver, validate_doh_url};

/// Default per-query timeout in milliseconds.
pub const DEFAULT_QUERY_TIMEOUT_MS: u64 = 2000;

/// Default send cap when running bounded.
pub const DEFAULT_SEND_CAP: u64 = 100_000;

/// Upper bound on the number of queries a run may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendCap {
    Limited(u64),
    Unbounded,
}

impl SendCap {
    pub fn from_options(max_messages: u64, run_forever: bool) -> Self {
        if run_forever {
            Self::Unbounded
        } else {
            Self::Limited(max_messages)
        }
    }

    pub fn limit(&self) -> Option<u64> {
        match self {
            Self::Limited(n) => Some(*n),
            Self::Unbounded => None,
        }
    }

    pub fn is_unbounded(&self) -> bool {
        matches!(self, Self::Unbounded)
    }
}

impl Default for SendCap {
    fn default() -> Self {
        Self::Limited(DEFAULT_SEND_CAP)
    }
}

impl fmt::Display for SendCap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Limited(n) => write!(f, "{}", n),
            Self::Unbounded => f.write_str("unbounded"),
        }
    }
}

/// Wire transport used to reach the resolver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportKind {
    Udp,
    Tcp,
    Https,
}

impl TransportKind {
    /// Maps the `dns`/`doh` protocol selector plus the `udp`/`tcp`
    /// sub-protocol onto a transport.
    ///
    /// The sub-protocol is case-insensitive and ignored for `doh`.
    pub fn from_protocols(dns_protocol: &str, sub_protocol: &str) -> Result<Self, ConfigError> {
        match dns_protocol {
            "dns" => match sub_protocol.to_ascii_lowercase().as_str() {
                "udp" => Ok(Self::Udp),
                "tcp" => Ok(Self::Tcp),
                other => Err(ConfigError::InvalidSubProtocol(other.to_string())),
            },
            "doh" => Ok(Self::Https),
            other => Err(ConfigError::InvalidProtocol(other.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Udp => "UDP",
            Self::Tcp => "TCP",
            Self::Https => "HTTPS",
        }
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Everything a dispatcher run needs. Immutable once the run starts.
#[derive(Debug, Clone)]
pub struct DispatchConfig {
    /// Number of concurrent senders
    pub concurrency: usize,

    pub send_cap: SendCap,

    /// Aggregate queries per second, 0 = unbounded
    pub target_rate: u32,

    pub transport: TransportKind,

    /// `host:port` for UDP/TCP, a URL for DoH
    pub endpoint: String,

    /// Fully-qualified target domains, each ending in `.`
    pub domains: Vec<Arc<str>>,

    /// Per-query timeout in milliseconds
    pub query_timeout_ms: u64,
}

impl DispatchConfig {
    /// Builds a config with normalized endpoint and domains.
    ///
    /// UDP/TCP endpoints get `:53` appended when no port is given; DoH
    /// endpoints must be `http(s)://` URLs. Domains get a trailing `.`.
    pub fn new<I, S>(transport: TransportKind, endpoint: &str, domains: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let endpoint = match transport {
            TransportKind::Udp | TransportKind::Tcp => normalize_resolver(endpoint)?,
            TransportKind::Https => {
                validate_doh_url(endpoint)?;
                endpoint.to_string()
            }
        };

        let domains = domains
            .into_iter()
            .map(|d| normalize_domain(d.as_ref()).map(Arc::from))
            .collect::<Result<Vec<Arc<str>>, _>>()?;

        let config = Self {
            concurrency: default_concurrency(),
            send_cap: SendCap::default(),
            target_rate: 0,
            transport,
            endpoint,
            domains,
            query_timeout_ms: DEFAULT_QUERY_TIMEOUT_MS,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_send_cap(mut self, send_cap: SendCap) -> Self {
        self.send_cap = send_cap;
        self
    }

    pub fn with_target_rate(mut self, target_rate: u32) -> Self {
        self.target_rate = target_rate;
        self
    }

    pub fn with_query_timeout_ms(mut self, query_timeout_ms: u64) -> Self {
        self.query_timeout_ms = query_timeout_ms;
        self
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_millis(self.query_timeout_ms)
    }

    pub fn is_rate_limited(&self) -> bool {
        self.target_rate > 0
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency);
        }
        if self.domains.is_empty() {
            return Err(ConfigError::NoTargetDomains);
        }
        if let Some(bad) = self.domains.iter().find(|d| !d.ends_with('.')) {
            return Err(ConfigError::InvalidDomain(bad.to_string()));
        }
        if self.query_timeout_ms == 0 {
            return Err(ConfigError::InvalidTimeout);
        }
        if self.endpoint.is_empty() {
            return Err(ConfigError::InvalidEndpoint(self.endpoint.clone()));
        }
        Ok(())
    }
}

/// Number of available processors, 1 if that cannot be determined.
pub fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}
