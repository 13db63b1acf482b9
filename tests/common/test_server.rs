use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::oneshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerBehavior {
    Answer,
    Silent,
}

/// In-process resolver that answers every A query with 93.184.216.34 and
/// counts the questions it has seen, per name.
pub struct TestResolver {
    addr: SocketAddr,
    seen: Arc<Mutex<HashMap<String, u64>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl TestResolver {
    pub async fn start_udp(behavior: ServerBehavior) -> Result<Self, std::io::Error> {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        let addr = socket.local_addr()?;
        let seen = Arc::new(Mutex::new(HashMap::new()));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let counts = Arc::clone(&seen);
        tokio::spawn(async move {
            let mut buf = vec![0u8; 512];
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = socket.recv_from(&mut buf) => {
                        let Ok((len, peer)) = result else { continue };
                        record(&counts, &buf[..len]);
                        if behavior == ServerBehavior::Answer {
                            let _ = socket.send_to(&answer(&buf[..len]), peer).await;
                        }
                    }
                }
            }
        });

        Ok(Self {
            addr,
            seen,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub async fn start_tcp(behavior: ServerBehavior) -> Result<Self, std::io::Error> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let seen = Arc::new(Mutex::new(HashMap::new()));
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let counts = Arc::clone(&seen);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = &mut shutdown_rx => break,
                    result = listener.accept() => {
                        let Ok((stream, _)) = result else { continue };
                        tokio::spawn(serve_tcp(stream, behavior, Arc::clone(&counts)));
                    }
                }
            }
        });

        Ok(Self {
            addr,
            seen,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Queries seen per question name, as dotted text with trailing `.`.
    pub fn seen(&self) -> HashMap<String, u64> {
        self.seen.lock().unwrap().clone()
    }

    pub fn total(&self) -> u64 {
        self.seen.lock().unwrap().values().sum()
    }

    pub fn shutdown(mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for TestResolver {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn serve_tcp(
    mut stream: TcpStream,
    behavior: ServerBehavior,
    counts: Arc<Mutex<HashMap<String, u64>>>,
) {
    loop {
        let mut len_bytes = [0u8; 2];
        if stream.read_exact(&mut len_bytes).await.is_err() {
            return;
        }
        let mut query = vec![0u8; u16::from_be_bytes(len_bytes) as usize];
        if stream.read_exact(&mut query).await.is_err() {
            return;
        }
        record(&counts, &query);

        if behavior == ServerBehavior::Answer {
            let reply = answer(&query);
            let mut framed = (reply.len() as u16).to_be_bytes().to_vec();
            framed.extend_from_slice(&reply);
            if stream.write_all(&framed).await.is_err() {
                return;
            }
        }
    }
}

fn record(counts: &Mutex<HashMap<String, u64>>, query: &[u8]) {
    if let Some(name) = question_name(query) {
        *counts.lock().unwrap().entry(name).or_insert(0) += 1;
    }
}

/// Decodes the uncompressed QNAME that follows the 12-byte header.
fn question_name(query: &[u8]) -> Option<String> {
    let mut pos = 12;
    let mut name = String::new();
    loop {
        let len = *query.get(pos)? as usize;
        pos += 1;
        if len == 0 {
            break;
        }
        let label = query.get(pos..pos + len)?;
        name.push_str(std::str::from_utf8(label).ok()?);
        name.push('.');
        pos += len;
    }
    Some(name)
}

fn answer(query: &[u8]) -> Vec<u8> {
    if query.len() < 12 {
        return vec![];
    }

    let mut response = Vec::with_capacity(query.len() + 16);
    response.extend_from_slice(&query[0..2]);
    response.extend_from_slice(&[0x81, 0x80]);
    response.extend_from_slice(&query[4..6]);
    response.extend_from_slice(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x00]);
    response.extend_from_slice(&query[12..]);
    response.extend_from_slice(&[
        0xc0, 0x0c, 0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x3c, 0x00, 0x04, 93, 184, 216, 34,
    ]);
    response
}
