use crate::dns::forwarding::{MessageBuilder, ResponseParser};
use dnsstress_domain::QueryOutcome;
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::Instant;
use tracing::{debug, trace};

/// DNS over TCP transport (RFC 1035 §4.2.2, RFC 7766).
///
/// The connection is opened on first use and kept across queries. Any I/O
/// failure or timeout drops it; the next query reconnects.
pub struct TcpTransport {
    server_addr: SocketAddr,
    timeout: Duration,
    stream: Option<TcpStream>,
    recv_buf: Vec<u8>,
}

impl TcpTransport {
    pub fn new(server_addr: SocketAddr, timeout: Duration) -> Self {
        Self {
            server_addr,
            timeout,
            stream: None,
            recv_buf: Vec::with_capacity(512),
        }
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    pub async fn query(&mut self, domain: &str) -> QueryOutcome {
        let built = MessageBuilder::build_query(domain)
            .and_then(|(id, bytes)| Ok((id, MessageBuilder::frame_for_tcp(&bytes)?)));
        let (id, framed) = match built {
            Ok(built) => built,
            Err(e) => {
                debug!(domain = %domain, error = %e, "Failed to build TCP query");
                return QueryOutcome::ProtocolError;
            }
        };

        let start = Instant::now();
        let deadline = start + self.timeout;

        let outcome = self.exchange(id, &framed, start, deadline).await;
        if matches!(outcome, QueryOutcome::Timeout | QueryOutcome::ConnectionError) {
            self.stream = None;
        }
        outcome
    }

    async fn exchange(
        &mut self,
        id: u16,
        framed: &[u8],
        start: Instant,
        deadline: Instant,
    ) -> QueryOutcome {
        if self.stream.is_none() {
            match tokio::time::timeout_at(deadline, TcpStream::connect(self.server_addr)).await {
                Ok(Ok(stream)) => {
                    // Disable Nagle's algorithm for lower latency
                    stream.set_nodelay(true).ok();
                    debug!(server = %self.server_addr, "TCP connection established");
                    self.stream = Some(stream);
                }
                Ok(Err(e)) => {
                    debug!(server = %self.server_addr, error = %e, "TCP connect failed");
                    return QueryOutcome::ConnectionError;
                }
                Err(_) => {
                    debug!(server = %self.server_addr, "TCP connect timed out");
                    return QueryOutcome::ConnectionError;
                }
            }
        }

        let Some(stream) = self.stream.as_mut() else {
            return QueryOutcome::ConnectionError;
        };

        match tokio::time::timeout_at(deadline, stream.write_all(framed)).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                debug!(server = %self.server_addr, error = %e, "TCP write failed");
                return QueryOutcome::ConnectionError;
            }
            Err(_) => return QueryOutcome::Timeout,
        }

        loop {
            match tokio::time::timeout_at(deadline, read_frame(stream, &mut self.recv_buf)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    debug!(server = %self.server_addr, error = %e, "TCP read failed");
                    return QueryOutcome::ConnectionError;
                }
                Err(_) => {
                    trace!(server = %self.server_addr, id, "TCP query timed out");
                    return QueryOutcome::Timeout;
                }
            }
            let latency = start.elapsed();

            if ResponseParser::peek_id(&self.recv_buf) != Some(id) {
                trace!(server = %self.server_addr, expected = id, "Discarding stale TCP reply");
                continue;
            }

            return match ResponseParser::parse(&self.recv_buf) {
                Ok(_) => QueryOutcome::success(latency),
                Err(e) => {
                    debug!(server = %self.server_addr, error = %e, "Malformed TCP reply");
                    QueryOutcome::ProtocolError
                }
            };
        }
    }
}

/// Reads one length-prefixed message into `buf`. A closed connection
/// surfaces as `UnexpectedEof`.
async fn read_frame(stream: &mut TcpStream, buf: &mut Vec<u8>) -> io::Result<()> {
    let mut len_bytes = [0u8; 2];
    stream.read_exact(&mut len_bytes).await?;
    let len = u16::from_be_bytes(len_bytes) as usize;

    buf.clear();
    buf.resize(len, 0);
    stream.read_exact(buf).await?;
    Ok(())
}
