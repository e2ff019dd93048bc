//! Wire protocol frames
//!
//! All frames are JSON objects carrying a `type` discriminator. The client
//! sends `tool_discovery` and `tool_call`; servers answer with `tool_list`,
//! `tool_result`, and `error`. Unknown `type` values are surfaced as
//! [`Inbound::Unknown`] so callers can log and ignore them; malformed frames
//! are a [`ProtocolError`] and the connection stays open.

use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::ToolParameter;

/// Errors raised while encoding or decoding frames
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Malformed frame: {0}")]
    Malformed(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Tool descriptor as servers enumerate it in a `tool_list` frame
///
/// Client-side attributes (qualified id, enabled flag) are attached when the
/// tool registers; the wire shape carries only what the server knows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireTool {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<ToolParameter>,
    #[serde(default)]
    pub permissions: HashSet<String>,
}

/// Payload of a `tool_call` frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WireCall {
    /// Plain tool name as the owning server knows it
    pub tool: String,
    /// Call arguments
    pub parameters: Value,
    /// Correlation id echoed back in the matching `tool_result`
    pub id: String,
}

/// A typed protocol frame
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum WireMessage {
    /// client -> server: request the server's tool list
    ToolDiscovery { server: String, timestamp: u64 },
    /// server -> client: enumerate available tools
    ToolList { tools: Vec<WireTool> },
    /// client -> server: invoke a tool
    ToolCall { call: WireCall, timestamp: u64 },
    /// server -> client: result for an outstanding call
    ToolResult {
        id: String,
        result: Value,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(rename = "executionTime")]
        execution_time: u64,
    },
    /// server -> client: connection-level error report
    Error { error: String },
}

/// A parsed inbound frame
#[derive(Debug, Clone)]
pub enum Inbound {
    /// A frame of a known type
    Message(WireMessage),
    /// A well-formed frame with an unrecognized `type`; carries the type tag
    Unknown(String),
}

/// Parse one inbound frame
///
/// Frames with an unrecognized `type` parse to [`Inbound::Unknown`]; frames
/// that are not JSON objects, lack a `type`, or fail the typed decode are
/// [`ProtocolError::Malformed`].
pub fn parse_frame(raw: &str) -> ProtocolResult<Inbound> {
    let value: Value = serde_json::from_str(raw)
        .map_err(|e| ProtocolError::Malformed(format!("invalid JSON: {}", e)))?;

    let frame_type = value
        .get("type")
        .and_then(|t| t.as_str())
        .ok_or_else(|| ProtocolError::Malformed("missing type field".to_string()))?
        .to_string();

    match frame_type.as_str() {
        "tool_discovery" | "tool_list" | "tool_call" | "tool_result" | "error" => {
            let message = serde_json::from_value(value)
                .map_err(|e| ProtocolError::Malformed(format!("{}: {}", frame_type, e)))?;
            Ok(Inbound::Message(message))
        }
        other => Ok(Inbound::Unknown(other.to_string())),
    }
}

/// Serialize a frame for transmission
pub fn serialize_frame(message: &WireMessage) -> ProtocolResult<String> {
    Ok(serde_json::to_string(message)?)
}

/// Milliseconds since the Unix epoch, for frame timestamps and call ids
pub fn timestamp_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
