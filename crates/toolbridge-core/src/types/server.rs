//! Server configuration

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

fn default_enabled() -> bool {
    true
}

/// Configuration for a single tool server
///
/// Loaded by the host's configuration layer and handed to the client via
/// `add_server`. The `name` is the unique key in the server directory and
/// the scope prefix of every tool the server contributes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Unique server name, also the tool scope
    pub name: String,
    /// Transport URL the connector dials
    pub url: String,
    /// Whether `connect()` should attempt this server
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Permission scopes granted to this server's tools
    #[serde(default)]
    pub permissions: HashSet<String>,
    /// If non-empty, only these tool names register from discovery
    #[serde(default, rename = "toolNames")]
    pub tool_names: HashSet<String>,
}

impl ServerConfig {
    /// Create an enabled server config
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            enabled: true,
            permissions: HashSet::new(),
            tool_names: HashSet::new(),
        }
    }

    /// Mark the server as disabled
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    /// Set the permission scopes
    pub fn with_permissions(mut self, permissions: impl IntoIterator<Item = String>) -> Self {
        self.permissions = permissions.into_iter().collect();
        self
    }

    /// Restrict discovery registration to these tool names
    pub fn with_tool_names(mut self, names: impl IntoIterator<Item = String>) -> Self {
        self.tool_names = names.into_iter().collect();
        self
    }
}
