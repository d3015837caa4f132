#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
//! Mock knob server for testing
//!
//! Stands in for the MIDI proxy: accepts TCP clients and hands each accepted
//! stream to the test, which writes knob bytes and closes at will.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Mock knob server
pub struct MockKnobServer {
    addr: SocketAddr,
    accepted: Arc<AtomicUsize>,
    clients: mpsc::UnboundedReceiver<TcpStream>,
    handle: JoinHandle<()>,
}

impl MockKnobServer {
    /// Start a mock knob server on a random port
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));
        let (tx, clients) = mpsc::unbounded_channel();

        let accepted_clone = accepted.clone();
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                accepted_clone.fetch_add(1, Ordering::SeqCst);
                if tx.send(stream).is_err() {
                    break;
                }
            }
        });

        Self {
            addr,
            accepted,
            clients,
            handle,
        }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn port(&self) -> u16 {
        self.addr.port()
    }

    /// Number of client connections accepted so far
    pub fn connection_count(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Next accepted client; panics if none connects within two seconds
    pub async fn accept_client(&mut self) -> TcpStream {
        self.try_accept_client(Duration::from_secs(2))
            .await
            .expect("no knob client connected")
    }

    pub async fn try_accept_client(&mut self, wait: Duration) -> Option<TcpStream> {
        timeout(wait, self.clients.recv()).await.ok().flatten()
    }

    /// Stop the mock server
    pub async fn stop(self) {
        self.handle.abort();
    }
}
