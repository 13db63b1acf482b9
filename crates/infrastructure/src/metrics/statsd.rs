//! Fire-and-forget statsd client.
//!
//! Counters go out as `<prefix>.<name>:1|c`, timings as
//! `<prefix>.<name>:<ms>|ms`, one datagram per event. The socket is
//! non-blocking: when the kernel buffer is full the event is dropped rather
//! than stalling a worker.

use dnsstress_application::ports::MetricsSink;
use dnsstress_domain::DomainError;
use std::fmt::Write;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, ToSocketAddrs, UdpSocket};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{debug, info};

pub struct StatsdSink {
    socket: UdpSocket,
    server_addr: SocketAddr,
    prefix: String,
    dropped: AtomicU64,
}

impl StatsdSink {
    /// Resolves `addr` and connects a non-blocking UDP socket to it.
    pub fn connect(addr: &str, prefix: &str) -> Result<Self, DomainError> {
        let server_addr = addr
            .to_socket_addrs()
            .map_err(|e| DomainError::EndpointResolution {
                endpoint: addr.to_string(),
                reason: e.to_string(),
            })?
            .next()
            .ok_or_else(|| DomainError::EndpointResolution {
                endpoint: addr.to_string(),
                reason: "no addresses returned".to_string(),
            })?;

        let bind_addr: SocketAddr = if server_addr.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (Ipv6Addr::UNSPECIFIED, 0).into()
        };

        let socket = UdpSocket::bind(bind_addr)
            .and_then(|socket| {
                socket.connect(server_addr)?;
                socket.set_nonblocking(true)?;
                Ok(socket)
            })
            .map_err(|e| {
                DomainError::Initialization(format!(
                    "Failed to open statsd socket to {}: {}",
                    server_addr, e
                ))
            })?;

        info!(server = %server_addr, prefix = %prefix, "Statsd metrics enabled");

        Ok(Self {
            socket,
            server_addr,
            prefix: prefix.trim_end_matches('.').to_string(),
            dropped: AtomicU64::new(0),
        })
    }

    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Events that could not be handed to the kernel.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn counter_line(&self, name: &str) -> String {
        let mut line = self.metric_name(name);
        line.push_str(":1|c");
        line
    }

    pub fn timing_line(&self, name: &str, value: Duration) -> String {
        let mut line = self.metric_name(name);
        let _ = write!(line, ":{:.3}|ms", value.as_secs_f64() * 1000.0);
        line
    }

    fn metric_name(&self, name: &str) -> String {
        let mut out = String::with_capacity(self.prefix.len() + name.len() + 16);
        if !self.prefix.is_empty() {
            out.push_str(&self.prefix);
            out.push('.');
        }
        out.push_str(name);
        out
    }

    fn emit(&self, line: &str) {
        if let Err(e) = self.socket.send(line.as_bytes()) {
            // Log once.
            if self.dropped.fetch_add(1, Ordering::Relaxed) == 0 {
                debug!(server = %self.server_addr, error = %e, "Dropping statsd events");
            }
        }
    }
}

impl MetricsSink for StatsdSink {
    fn increment(&self, name: &str) {
        self.emit(&self.counter_line(name));
    }

    fn timing(&self, name: &str, value: Duration) {
        self.emit(&self.timing_line(name, value));
    }
}
