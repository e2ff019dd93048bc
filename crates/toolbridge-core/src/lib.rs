//! ToolBridge Core
//!
//! Runtime-agnostic tool-invocation protocol client.
//! This crate is the piece of an editor-embedded assistant that calls
//! external capabilities ("tools") exposed by independent tool servers over
//! persistent message channels. The host IDE layer supplies server configs
//! and a transport; everything else — connection lifecycle, discovery,
//! the tool registry, call correlation and timeouts — lives here.
//!
//! ## Overview
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use toolbridge_core::{ServerConfig, ToolClient, ConsoleLogger};
//!
//! let client = ToolClient::from_registered_transports(Arc::new(ConsoleLogger::new()));
//! client.add_server(ServerConfig::new("alpha", "ws://localhost:9170"));
//!
//! // Connect all enabled servers; each one answers discovery with its tools
//! client.connect().await?;
//!
//! // Hand the enabled tools to the assistant
//! let tools = client.get_enabled_tools();
//!
//! // Invoke a tool and await the correlated result
//! let result = client.call_tool("alpha:echo", serde_json::json!({"msg": "hi"})).await?;
//! ```
//!
//! Per-server failures stay per-server: a connection that refuses, errors,
//! or never answers discovery only affects its own tools.

pub mod client;
pub mod connection;
pub mod directory;
pub mod logging;
pub mod pending;
pub mod protocol;
pub mod registry;
pub mod transport;
pub mod types;

// Re-export commonly used types
pub use types::{
    qualify, ServerConfig, ToolCallResult, ToolDescriptor, ToolParameter, CUSTOM_SCOPE,
};

pub use logging::{ConsoleLogger, Logger, NoOpLogger};

pub use protocol::{
    parse_frame, serialize_frame, timestamp_ms, Inbound, ProtocolError, ProtocolResult, WireCall,
    WireMessage, WireTool,
};

pub use transport::{
    connector_for, connector_for_url, list_transports, memory_pair, register_transport,
    unregister_transport, MemoryConnector, MemoryTransport, Transport, TransportConnector,
    TransportError,
};

pub use connection::{
    Connection, ConnectionError, ConnectionEvents, ConnectionResult, ConnectionState,
};

pub use directory::ServerDirectory;

pub use registry::{ScopePolicy, ToolFilter, ToolRegistry};

pub use pending::{CallOutcome, PendingCalls};

pub use client::{ClientState, ConnectError, ToolCallError, ToolClient, CALL_TIMEOUT};
