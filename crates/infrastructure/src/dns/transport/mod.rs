#[cfg(feature = "dns-over-https")]
pub mod https;
pub mod tcp;
pub mod udp;

use async_trait::async_trait;
use dnsstress_application::ports::{QueryTransport, TransportFactory};
use dnsstress_domain::{DispatchConfig, DomainError, QueryOutcome, TransportKind};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, info};

/// Enum-dispatched transport. One instance per worker, never shared.
pub enum Transport {
    Udp(udp::UdpTransport),
    Tcp(tcp::TcpTransport),
    #[cfg(feature = "dns-over-https")]
    Https(https::HttpsTransport),
}

impl Transport {
    pub async fn query(&mut self, domain: &str) -> QueryOutcome {
        match self {
            Self::Udp(t) => t.query(domain).await,
            Self::Tcp(t) => t.query(domain).await,
            #[cfg(feature = "dns-over-https")]
            Self::Https(t) => t.query(domain).await,
        }
    }

    /// Protocol name for logging and metrics.
    pub fn protocol_name(&self) -> &'static str {
        match self {
            Self::Udp(_) => "UDP",
            Self::Tcp(_) => "TCP",
            #[cfg(feature = "dns-over-https")]
            Self::Https(_) => "HTTPS",
        }
    }
}

#[async_trait]
impl QueryTransport for Transport {
    async fn send(&mut self, domain: &str) -> QueryOutcome {
        self.query(domain).await
    }

    fn protocol_name(&self) -> &'static str {
        Transport::protocol_name(self)
    }
}

/// Where queries go, resolved once before any worker starts.
#[derive(Clone)]
enum Target {
    Socket(SocketAddr),
    #[cfg(feature = "dns-over-https")]
    Url {
        url: String,
        client: reqwest::Client,
    },
}

/// [`TransportFactory`] for the wire transports.
///
/// Endpoint resolution and the DoH client are set up in [`TransportBuilder::from_config`];
/// afterwards each [`TransportFactory::create`] call only binds a socket or
/// clones a client handle.
#[derive(Clone)]
pub struct TransportBuilder {
    kind: TransportKind,
    target: Target,
    query_timeout: Duration,
}

impl TransportBuilder {
    pub async fn from_config(config: &DispatchConfig) -> Result<Self, DomainError> {
        let query_timeout = config.query_timeout();

        let target = match config.transport {
            TransportKind::Udp | TransportKind::Tcp => {
                Target::Socket(resolve_endpoint(&config.endpoint).await?)
            }
            #[cfg(feature = "dns-over-https")]
            TransportKind::Https => Target::Url {
                url: config.endpoint.clone(),
                client: https::build_client(query_timeout, config.concurrency)?,
            },
            #[cfg(not(feature = "dns-over-https"))]
            TransportKind::Https => {
                return Err(DomainError::Initialization(format!(
                    "HTTPS feature not enabled. Enable 'dns-over-https' feature to use: {}",
                    config.endpoint
                )))
            }
        };

        info!(
            transport = %config.transport,
            endpoint = %config.endpoint,
            timeout_ms = query_timeout.as_millis() as u64,
            "Transport target ready"
        );

        Ok(Self {
            kind: config.transport,
            target,
            query_timeout,
        })
    }

    pub fn kind(&self) -> TransportKind {
        self.kind
    }

    /// Resolved socket address, `None` for DoH.
    pub fn server_addr(&self) -> Option<SocketAddr> {
        match &self.target {
            Target::Socket(addr) => Some(*addr),
            #[cfg(feature = "dns-over-https")]
            Target::Url { .. } => None,
        }
    }

    /// Create the transport for one worker.
    pub async fn build(&self) -> Result<Transport, DomainError> {
        match (&self.target, self.kind) {
            (Target::Socket(addr), TransportKind::Udp) => Ok(Transport::Udp(
                udp::UdpTransport::connect(*addr, self.query_timeout).await?,
            )),
            (Target::Socket(addr), TransportKind::Tcp) => Ok(Transport::Tcp(
                tcp::TcpTransport::new(*addr, self.query_timeout),
            )),
            #[cfg(feature = "dns-over-https")]
            (Target::Url { url, client }, TransportKind::Https) => Ok(Transport::Https(
                https::HttpsTransport::new(url.clone(), client.clone(), self.query_timeout),
            )),
            _ => Err(DomainError::Initialization(format!(
                "transport {} does not match its target",
                self.kind
            ))),
        }
    }
}

#[async_trait]
impl TransportFactory for TransportBuilder {
    async fn create(&self, worker_id: usize) -> Result<Box<dyn QueryTransport>, DomainError> {
        let transport = self.build().await?;
        debug!(worker = worker_id, protocol = transport.protocol_name(), "Transport created");
        Ok(Box::new(transport))
    }
}

/// Resolves `host:port` to the first address the system resolver returns.
pub async fn resolve_endpoint(endpoint: &str) -> Result<SocketAddr, DomainError> {
    if let Ok(addr) = endpoint.parse::<SocketAddr>() {
        return Ok(addr);
    }

    let mut addrs = tokio::net::lookup_host(endpoint)
        .await
        .map_err(|e| DomainError::EndpointResolution {
            endpoint: endpoint.to_string(),
            reason: e.to_string(),
        })?;

    addrs.next().ok_or_else(|| DomainError::EndpointResolution {
        endpoint: endpoint.to_string(),
        reason: "no addresses returned".to_string(),
    })
}
