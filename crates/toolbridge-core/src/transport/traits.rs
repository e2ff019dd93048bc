//! Transport trait definitions

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by a transport implementation
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Transport closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type TransportResult<T> = Result<T, TransportError>;

/// One end of an established full-duplex frame channel
///
/// Frames are opaque strings (JSON on the wire). Implementations must
/// preserve send and receive order; the client relies on per-connection
/// ordering.
#[async_trait]
pub trait Transport: Send {
    /// Transmit one frame
    async fn send(&mut self, frame: String) -> TransportResult<()>;

    /// Receive the next frame; `None` once the channel has ended
    async fn recv(&mut self) -> Option<String>;

    /// Close the channel; subsequent sends fail with [`TransportError::Closed`]
    async fn close(&mut self) -> TransportResult<()>;
}

/// Factory that dials a transport for a server URL
///
/// Implementations:
/// - `MemoryConnector`: in-process channels for tests and embedders
/// - Host adapter: WebSocket or similar, registered per URL scheme
#[async_trait]
pub trait TransportConnector: Send + Sync {
    /// Establish a channel to `url`, resolving once the transport is ready
    async fn connect(&self, url: &str) -> TransportResult<Box<dyn Transport>>;
}
