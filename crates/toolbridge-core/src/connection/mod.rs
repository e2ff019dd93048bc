//! Per-server connection ownership
//!
//! A [`Connection`] owns exactly one transport channel to one server. The
//! boxed transport is confined to a single spawned task that multiplexes an
//! outbound frame queue with inbound receives, so frames keep program order
//! in both directions and no lock guards the channel itself. Inbound frames
//! and the end-of-channel event surface through [`ConnectionEvents`].

use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::logging::Logger;
use crate::transport::{Transport, TransportConnector, TransportError};

/// Errors raised while opening or using a connection
#[derive(Error, Debug)]
pub enum ConnectionError {
    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("Not connected")]
    NotConnected,

    #[error("No transport registered for scheme of: {0}")]
    NoTransport(String),

    #[error("Protocol error: {0}")]
    Protocol(#[from] crate::protocol::ProtocolError),
}

pub type ConnectionResult<T> = Result<T, ConnectionError>;

/// Lifecycle state of a connection
///
/// `Disconnected -> Connecting -> Connected -> {Closed, Errored} -> Disconnected`.
/// `Closed` is a peer-initiated end, `Errored` a transport failure, and
/// `Disconnected` a local close.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Closed,
    Errored,
}

/// Callbacks for inbound connection activity
///
/// Invoked from the connection's reader task, one call at a time per
/// connection. Implementations must not block.
pub trait ConnectionEvents: Send + Sync {
    /// A raw inbound frame arrived
    fn on_message(&self, server: &str, raw: &str);

    /// The channel ended (peer close, transport failure, or local close)
    fn on_closed(&self, server: &str);
}

enum Command {
    Frame(String),
    Shutdown,
}

/// A live channel to one server
pub struct Connection {
    server: String,
    state: Arc<RwLock<ConnectionState>>,
    outbound: mpsc::UnboundedSender<Command>,
    task: JoinHandle<()>,
}

impl Connection {
    /// Dial `url` and start the channel task
    ///
    /// Resolves once the transport reports ready. The caller is responsible
    /// for the discovery round that follows.
    pub async fn open(
        server: impl Into<String>,
        url: &str,
        connector: &dyn TransportConnector,
        events: Arc<dyn ConnectionEvents>,
        logger: Arc<dyn Logger>,
    ) -> ConnectionResult<Self> {
        let server = server.into();
        let state = Arc::new(RwLock::new(ConnectionState::Connecting));

        let transport = connector.connect(url).await.map_err(|e| {
            logger.error(&format!("[Connection:{}] Connect failed: {}", server, e));
            ConnectionError::Transport(e)
        })?;

        *state.write() = ConnectionState::Connected;
        logger.info(&format!("[Connection:{}] Connected to {}", server, url));

        let (outbound, rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run_channel(
            transport,
            rx,
            state.clone(),
            server.clone(),
            events,
            logger,
        ));

        Ok(Self {
            server,
            state,
            outbound,
            task,
        })
    }

    /// The server this connection belongs to
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Current lifecycle state
    pub fn state(&self) -> ConnectionState {
        *self.state.read()
    }

    /// Whether the channel is usable
    pub fn is_connected(&self) -> bool {
        self.state() == ConnectionState::Connected
    }

    /// Enqueue a frame for transmission
    ///
    /// Frames sent through one connection are transmitted in call order.
    pub fn send(&self, frame: String) -> ConnectionResult<()> {
        if !self.is_connected() {
            return Err(ConnectionError::NotConnected);
        }
        self.outbound
            .send(Command::Frame(frame))
            .map_err(|_| ConnectionError::NotConnected)
    }

    /// Best-effort local close; always transitions to `Disconnected`
    pub fn close(&self) {
        *self.state.write() = ConnectionState::Disconnected;
        let _ = self.outbound.send(Command::Shutdown);
    }

    /// Close and wait for the channel task to finish
    pub async fn shutdown(self) {
        self.close();
        let _ = self.task.await;
    }
}

async fn run_channel(
    mut transport: Box<dyn Transport>,
    mut rx: mpsc::UnboundedReceiver<Command>,
    state: Arc<RwLock<ConnectionState>>,
    server: String,
    events: Arc<dyn ConnectionEvents>,
    logger: Arc<dyn Logger>,
) {
    loop {
        tokio::select! {
            command = rx.recv() => match command {
                Some(Command::Frame(frame)) => {
                    if let Err(e) = transport.send(frame).await {
                        logger.error(&format!("[Connection:{}] Send failed: {}", server, e));
                        *state.write() = ConnectionState::Errored;
                        break;
                    }
                }
                Some(Command::Shutdown) | None => {
                    let _ = transport.close().await;
                    *state.write() = ConnectionState::Disconnected;
                    break;
                }
            },
            frame = transport.recv() => match frame {
                Some(raw) => events.on_message(&server, &raw),
                None => {
                    logger.info(&format!("[Connection:{}] Channel ended by peer", server));
                    *state.write() = ConnectionState::Closed;
                    break;
                }
            },
        }
    }

    events.on_closed(&server);
}
