#![allow(dead_code)]
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::oneshot;

/// How the mock answers each query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockMode {
    /// Valid reply with one A record
    Answer,
    /// A reply with the wrong ID first, then the valid one
    StaleThenAnswer,
    /// Reply with the right ID but an undecodable body
    Garbage,
    /// Never reply
    Silent,
    /// TCP only: accept, read the query, close without replying
    CloseAfterQuery,
}

/// Mock DNS server for transport tests, UDP or TCP, bound to an ephemeral
/// port on loopback.
pub struct MockDnsServer {
    addr: SocketAddr,
    queries: Arc<AtomicUsize>,
    connections: Arc<AtomicUsize>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockDnsServer {
    pub async fn start_udp(mode: MockMode) -> std::io::Result<Self> {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        let addr = socket.local_addr()?;
        let queries = Arc::new(AtomicUsize::new(0));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let counter = Arc::clone(&queries);
        tokio::spawn(async move {
            let mut buf = vec![0u8; 512];

            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = socket.recv_from(&mut buf) => {
                        let Ok((len, peer)) = result else { continue };
                        counter.fetch_add(1, Ordering::SeqCst);
                        for reply in replies_for(mode, &buf[..len]) {
                            let _ = socket.send_to(&reply, peer).await;
                        }
                    }
                }
            }
        });

        Ok(Self {
            addr,
            queries,
            connections: Arc::new(AtomicUsize::new(0)),
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub async fn start_tcp(mode: MockMode) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let queries = Arc::new(AtomicUsize::new(0));
        let connections = Arc::new(AtomicUsize::new(0));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let (q, c) = (Arc::clone(&queries), Arc::clone(&connections));
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = listener.accept() => {
                        let Ok((stream, _)) = result else { continue };
                        c.fetch_add(1, Ordering::SeqCst);
                        tokio::spawn(serve_tcp(stream, mode, Arc::clone(&q)));
                    }
                }
            }
        });

        Ok(Self {
            addr,
            queries,
            connections,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockDnsServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn serve_tcp(mut stream: TcpStream, mode: MockMode, queries: Arc<AtomicUsize>) {
    loop {
        let mut len_bytes = [0u8; 2];
        if stream.read_exact(&mut len_bytes).await.is_err() {
            return;
        }
        let mut query = vec![0u8; u16::from_be_bytes(len_bytes) as usize];
        if stream.read_exact(&mut query).await.is_err() {
            return;
        }
        queries.fetch_add(1, Ordering::SeqCst);

        if mode == MockMode::CloseAfterQuery {
            return;
        }

        for reply in replies_for(mode, &query) {
            let mut framed = (reply.len() as u16).to_be_bytes().to_vec();
            framed.extend_from_slice(&reply);
            if stream.write_all(&framed).await.is_err() {
                return;
            }
        }
    }
}

fn replies_for(mode: MockMode, query: &[u8]) -> Vec<Vec<u8>> {
    match mode {
        MockMode::Answer => vec![build_mock_response(query)],
        MockMode::StaleThenAnswer => {
            let mut stale = build_mock_response(query);
            if stale.len() >= 2 {
                stale[0] = !stale[0];
            }
            vec![stale, build_mock_response(query)]
        }
        MockMode::Garbage => vec![build_garbage_response(query)],
        MockMode::Silent | MockMode::CloseAfterQuery => Vec::new(),
    }
}

/// Echoes the question and appends one A record (93.184.216.34).
pub fn build_mock_response(query: &[u8]) -> Vec<u8> {
    if query.len() < 12 {
        return vec![];
    }

    let mut response = Vec::with_capacity(512);

    response.extend_from_slice(&query[0..2]); // Transaction ID

    // Flags: QR=1 (response), RD=1, RA=1
    response.push(0x81);
    response.push(0x80);

    response.extend_from_slice(&query[4..6]); // Questions
    response.extend_from_slice(&[0x00, 0x01]); // Answers: 1
    response.extend_from_slice(&[0x00, 0x00]); // Authority RRs: 0
    response.extend_from_slice(&[0x00, 0x00]); // Additional RRs: 0

    response.extend_from_slice(&query[12..]);

    response.extend_from_slice(&[
        0xc0, 0x0c, // Name pointer to question
        0x00, 0x01, // Type A
        0x00, 0x01, // Class IN
        0x00, 0x00, 0x00, 0x3c, // TTL: 60 seconds
        0x00, 0x04, // Data length: 4 bytes
        93, 184, 216, 34,
    ]);

    response
}

/// Right ID and QR bit, but claims a question it does not carry.
pub fn build_garbage_response(query: &[u8]) -> Vec<u8> {
    if query.len() < 2 {
        return vec![];
    }
    let mut response = query[0..2].to_vec();
    response.extend_from_slice(&[0x81, 0x80, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    response.extend_from_slice(&[0x07, b'b', b'r']);
    response
}
