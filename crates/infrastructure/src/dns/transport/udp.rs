use crate::dns::forwarding::{MessageBuilder, ResponseParser};
use dnsstress_domain::{DomainError, QueryOutcome};
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Maximum UDP DNS response size with EDNS(0)
const MAX_UDP_RESPONSE_SIZE: usize = 4096;

/// DNS over UDP transport.
///
/// Each worker owns one socket, connected to the resolver so the kernel
/// drops datagrams from anyone else. Replies whose ID does not match the
/// outstanding query are discarded and the wait continues until the
/// deadline.
pub struct UdpTransport {
    server_addr: SocketAddr,
    socket: UdpSocket,
    timeout: Duration,
    recv_buf: Vec<u8>,
}

impl UdpTransport {
    /// Binds an ephemeral port of the resolver's address family and
    /// connects it.
    pub async fn connect(server_addr: SocketAddr, timeout: Duration) -> Result<Self, DomainError> {
        let bind_addr: SocketAddr = if server_addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(bind_addr).await.map_err(|e| {
            DomainError::Initialization(format!("Failed to bind UDP socket: {}", e))
        })?;
        socket.connect(server_addr).await.map_err(|e| {
            DomainError::Initialization(format!(
                "Failed to connect UDP socket to {}: {}",
                server_addr, e
            ))
        })?;

        Ok(Self {
            server_addr,
            socket,
            timeout,
            recv_buf: vec![0u8; MAX_UDP_RESPONSE_SIZE],
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.socket.local_addr().ok()
    }

    pub async fn query(&mut self, domain: &str) -> QueryOutcome {
        let (id, message_bytes) = match MessageBuilder::build_query(domain) {
            Ok(built) => built,
            Err(e) => {
                debug!(domain = %domain, error = %e, "Failed to build UDP query");
                return QueryOutcome::ProtocolError;
            }
        };

        let start = Instant::now();
        let deadline = start + self.timeout;

        if let Err(e) = self.socket.send(&message_bytes).await {
            debug!(server = %self.server_addr, error = %e, "UDP send failed");
            return QueryOutcome::ConnectionError;
        }

        loop {
            let received =
                tokio::time::timeout_at(deadline, self.socket.recv(&mut self.recv_buf)).await;

            let len = match received {
                Err(_) => {
                    trace!(server = %self.server_addr, id, "UDP query timed out");
                    return QueryOutcome::Timeout;
                }
                Ok(Err(e)) => {
                    debug!(server = %self.server_addr, error = %e, "UDP receive failed");
                    return QueryOutcome::ConnectionError;
                }
                Ok(Ok(len)) => len,
            };
            let latency = start.elapsed();
            let reply = &self.recv_buf[..len];

            if ResponseParser::peek_id(reply) != Some(id) {
                trace!(server = %self.server_addr, expected = id, "Discarding stale UDP reply");
                continue;
            }

            return match ResponseParser::parse(reply) {
                Ok(_) => QueryOutcome::success(latency),
                Err(e) => {
                    debug!(server = %self.server_addr, error = %e, "Malformed UDP reply");
                    QueryOutcome::ProtocolError
                }
            };
        }
    }
}
