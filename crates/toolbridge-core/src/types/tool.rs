//! Tool descriptor and invocation result types

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Scope used for tools registered without a backing server
pub const CUSTOM_SCOPE: &str = "custom";

/// Build a qualified tool id from a server scope and a plain tool name
///
/// The qualified id (`"server:tool"`) is the only collision-free tool
/// identity; plain names may repeat across servers.
pub fn qualify(scope: &str, name: &str) -> String {
    format!("{}:{}", scope, name)
}

fn default_enabled() -> bool {
    true
}

/// A single parameter (or return value) in a tool's contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    /// Parameter name
    pub name: String,
    /// Parameter type (e.g. "string", "number", "object")
    #[serde(rename = "type")]
    pub param_type: String,
    /// Description of the parameter
    #[serde(default)]
    pub description: String,
    /// Whether the parameter must be supplied
    #[serde(default)]
    pub required: bool,
    /// Default value applied when the parameter is omitted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

impl ToolParameter {
    /// Create a new parameter descriptor
    pub fn new(name: impl Into<String>, param_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            param_type: param_type.into(),
            description: String::new(),
            required: false,
            default: None,
        }
    }

    /// Set the description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mark the parameter as required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Set the default value
    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

/// Descriptor for a tool known to the client
///
/// Created from a discovery response or injected via
/// `ToolClient::add_custom_tool`. The qualified id is
/// `"<serverName>:<toolName>"`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Collision-free identity: `"<serverName>:<toolName>"`
    #[serde(rename = "qualifiedId")]
    pub qualified_id: String,
    /// Plain tool name as the owning server knows it
    pub name: String,
    /// Description of what the tool does
    #[serde(default)]
    pub description: String,
    /// Ordered parameter contract
    #[serde(default)]
    pub parameters: Vec<ToolParameter>,
    /// Return value descriptor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returns: Option<ToolParameter>,
    /// Whether the tool may be called
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Permission scopes required to call the tool
    #[serde(default)]
    pub permissions: HashSet<String>,
}

impl ToolDescriptor {
    /// Create a descriptor scoped to a server
    pub fn new(scope: &str, name: impl Into<String>, description: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            qualified_id: qualify(scope, &name),
            name,
            description: description.into(),
            parameters: Vec::new(),
            returns: None,
            enabled: true,
            permissions: HashSet::new(),
        }
    }

    /// Create a descriptor under the `custom` scope (no backing server)
    pub fn custom(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(CUSTOM_SCOPE, name, description)
    }

    /// Set the parameter contract
    pub fn with_parameters(mut self, parameters: Vec<ToolParameter>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set the return descriptor
    pub fn with_returns(mut self, returns: ToolParameter) -> Self {
        self.returns = Some(returns);
        self
    }

    /// Set the permission scopes
    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = String>) -> Self {
        self.permissions = permissions.into_iter().collect();
        self
    }

    /// The server scope the qualified id is bound to
    pub fn scope(&self) -> &str {
        self.qualified_id
            .split_once(':')
            .map(|(scope, _)| scope)
            .unwrap_or(CUSTOM_SCOPE)
    }
}

/// Resolved outcome of a tool call
///
/// A `tool_result` frame resolves the call even when the server reports a
/// tool-level error; `error` is then populated and `result` is whatever the
/// server attached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallResult {
    /// Correlation id of the originating call
    pub id: String,
    /// Result payload
    pub result: Value,
    /// Tool-level error reported by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Server-side execution time in milliseconds
    #[serde(rename = "executionTime")]
    pub execution_time: u64,
}
