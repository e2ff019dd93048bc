//! In-memory transport for testing and embedding
//!
//! Provides deterministic, in-process channels without network dependencies.
//! Tests hold the server end of a pair and script the peer's behavior; the
//! client end is handed out by a [`MemoryConnector`] keyed by URL.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::traits::{Transport, TransportConnector, TransportError, TransportResult};

/// One end of an in-memory duplex frame channel
pub struct MemoryTransport {
    tx: Option<mpsc::UnboundedSender<String>>,
    rx: mpsc::UnboundedReceiver<String>,
}

/// Create a connected pair of in-memory transports
pub fn memory_pair() -> (MemoryTransport, MemoryTransport) {
    let (a_tx, b_rx) = mpsc::unbounded_channel();
    let (b_tx, a_rx) = mpsc::unbounded_channel();
    (
        MemoryTransport {
            tx: Some(a_tx),
            rx: a_rx,
        },
        MemoryTransport {
            tx: Some(b_tx),
            rx: b_rx,
        },
    )
}

impl MemoryTransport {
    /// Non-blocking receive; `None` when no frame is queued
    ///
    /// Test helper for asserting that no frame was sent.
    pub fn try_recv(&mut self) -> Option<String> {
        self.rx.try_recv().ok()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn send(&mut self, frame: String) -> TransportResult<()> {
        let tx = self.tx.as_ref().ok_or(TransportError::Closed)?;
        tx.send(frame).map_err(|_| TransportError::Closed)
    }

    async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    async fn close(&mut self) -> TransportResult<()> {
        // Dropping the sender ends the peer's receive stream after it drains
        self.tx = None;
        self.rx.close();
        Ok(())
    }
}

/// Connector handing out pre-registered client ends, keyed by URL
///
/// `register(url)` creates a transport pair, stores the client end, and
/// returns the server end to the caller. Each registration serves exactly
/// one `connect(url)`.
#[derive(Default)]
pub struct MemoryConnector {
    endpoints: Mutex<HashMap<String, MemoryTransport>>,
}

impl MemoryConnector {
    /// Create an empty connector
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an endpoint for `url` and return the server end of the pair
    pub fn register(&self, url: impl Into<String>) -> MemoryTransport {
        let (client_end, server_end) = memory_pair();
        self.endpoints.lock().insert(url.into(), client_end);
        server_end
    }
}

#[async_trait]
impl TransportConnector for MemoryConnector {
    async fn connect(&self, url: &str) -> TransportResult<Box<dyn Transport>> {
        let client_end = self
            .endpoints
            .lock()
            .remove(url)
            .ok_or_else(|| TransportError::ConnectionFailed(format!("no endpoint for {}", url)))?;
        Ok(Box::new(client_end))
    }
}
