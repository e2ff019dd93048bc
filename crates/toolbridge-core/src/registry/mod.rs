//! Tool registry
//!
//! The registry maps qualified tool ids (`"server:tool"`) to descriptors and
//! their enabled/disabled flags. Descriptors keep registration order, which
//! makes plain-name lookup deterministic: the first registration wins.
//! User-configured enabled state survives discovery refresh.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::logging::Logger;
use crate::protocol::WireTool;
use crate::types::{qualify, ToolDescriptor};

/// Per-server registration policy, derived from `ServerConfig`
#[derive(Debug, Clone, Default)]
pub struct ScopePolicy {
    /// If non-empty, only these tool names register from discovery
    pub allowed_tools: HashSet<String>,
    /// Permission scopes merged into each registered descriptor
    pub permissions: HashSet<String>,
}

/// Filter for registry queries
#[derive(Debug, Clone, Default)]
pub struct ToolFilter {
    /// If set, only include tools scoped to this server
    pub scope: Option<String>,
    /// Only include enabled tools
    pub only_enabled: bool,
    /// If set, only include tools with these qualified ids
    pub include: Option<HashSet<String>>,
    /// Exclude tools with these qualified ids
    pub exclude: HashSet<String>,
}

impl ToolFilter {
    /// Match every tool
    pub fn all() -> Self {
        Self::default()
    }

    /// Match enabled tools only
    pub fn enabled() -> Self {
        Self {
            only_enabled: true,
            ..Self::default()
        }
    }

    /// Restrict to one server scope
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    /// Only include specific qualified ids
    pub fn with_include(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.include = Some(ids.into_iter().collect());
        self
    }

    /// Exclude specific qualified ids
    pub fn with_exclude(mut self, ids: impl IntoIterator<Item = String>) -> Self {
        self.exclude = ids.into_iter().collect();
        self
    }

    /// Check if a descriptor matches this filter
    pub fn matches(&self, tool: &ToolDescriptor) -> bool {
        if self.only_enabled && !tool.enabled {
            return false;
        }

        if let Some(ref scope) = self.scope {
            if tool.scope() != scope {
                return false;
            }
        }

        if self.exclude.contains(&tool.qualified_id) {
            return false;
        }

        if let Some(ref include) = self.include {
            if !include.contains(&tool.qualified_id) {
                return false;
            }
        }

        true
    }
}

/// Registry of tools known to one client instance
pub struct ToolRegistry {
    /// Descriptors in registration order
    tools: RwLock<Vec<ToolDescriptor>>,
    /// User-configured enabled/disabled state, keyed by qualified id
    tool_states: RwLock<HashMap<String, bool>>,
    /// Registration policies, keyed by server scope
    policies: RwLock<HashMap<String, ScopePolicy>>,
    /// Logger
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            tools: RwLock::new(Vec::new()),
            tool_states: RwLock::new(HashMap::new()),
            policies: RwLock::new(HashMap::new()),
            logger,
        }
    }

    /// Set the registration policy for a server scope
    pub fn set_scope_policy(&self, scope: impl Into<String>, policy: ScopePolicy) {
        self.policies.write().insert(scope.into(), policy);
    }

    /// Register a descriptor, replacing any prior entry for its qualified id
    ///
    /// Replacement keeps the original registration position, so repeated
    /// discovery refresh never changes plain-name lookup order.
    pub fn register(&self, mut descriptor: ToolDescriptor) {
        if let Some(&enabled) = self.tool_states.read().get(&descriptor.qualified_id) {
            descriptor.enabled = enabled;
        }

        let mut tools = self.tools.write();
        if let Some(existing) = tools
            .iter_mut()
            .find(|t| t.qualified_id == descriptor.qualified_id)
        {
            *existing = descriptor;
        } else {
            self.logger.debug(&format!(
                "[ToolRegistry] Registered {}",
                descriptor.qualified_id
            ));
            tools.push(descriptor);
        }
    }

    /// Register a server's discovery response under its scope
    pub fn register_discovered(&self, scope: &str, wire_tools: Vec<WireTool>) {
        let policy = self.policies.read().get(scope).cloned().unwrap_or_default();

        let mut registered = 0usize;
        for wire in wire_tools {
            if !policy.allowed_tools.is_empty() && !policy.allowed_tools.contains(&wire.name) {
                self.logger.debug(&format!(
                    "[ToolRegistry] Skipping {}:{} (not in configured tool names)",
                    scope, wire.name
                ));
                continue;
            }

            let mut permissions = wire.permissions;
            permissions.extend(policy.permissions.iter().cloned());

            let mut descriptor = ToolDescriptor::new(scope, wire.name, wire.description)
                .with_parameters(wire.parameters)
                .with_permissions(permissions);
            if let Some(returns) = wire.returns {
                descriptor = descriptor.with_returns(returns);
            }

            self.register(descriptor);
            registered += 1;
        }

        self.logger.info(&format!(
            "[ToolRegistry] Discovered {} tools from server {}",
            registered, scope
        ));
    }

    /// Resolve a qualified id or plain name to a descriptor
    ///
    /// Qualified ids match exactly. A plain name resolves to the first
    /// registration in insertion order; qualified ids are the only
    /// collision-free identity when servers share tool names.
    pub fn resolve(&self, name_or_id: &str) -> Option<ToolDescriptor> {
        let tools = self.tools.read();
        tools
            .iter()
            .find(|t| t.qualified_id == name_or_id)
            .or_else(|| tools.iter().find(|t| t.name == name_or_id))
            .cloned()
    }

    /// All registered descriptors, in registration order
    pub fn list(&self) -> Vec<ToolDescriptor> {
        self.tools.read().clone()
    }

    /// Descriptors matching a filter
    pub fn get_tools(&self, filter: &ToolFilter) -> Vec<ToolDescriptor> {
        self.tools
            .read()
            .iter()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect()
    }

    /// Descriptors scoped to one server
    pub fn by_scope(&self, scope: &str) -> Vec<ToolDescriptor> {
        self.get_tools(&ToolFilter::all().with_scope(scope))
    }

    /// Enable or disable a tool; does not affect in-flight calls
    pub fn set_enabled(&self, name_or_id: &str, enabled: bool) -> bool {
        let Some(descriptor) = self.resolve(name_or_id) else {
            return false;
        };

        self.tool_states
            .write()
            .insert(descriptor.qualified_id.clone(), enabled);

        let mut tools = self.tools.write();
        if let Some(tool) = tools
            .iter_mut()
            .find(|t| t.qualified_id == descriptor.qualified_id)
        {
            tool.enabled = enabled;
        }
        true
    }

    /// Remove one tool from the registry
    pub fn remove(&self, qualified_id: &str) -> bool {
        let mut tools = self.tools.write();
        let before = tools.len();
        tools.retain(|t| t.qualified_id != qualified_id);
        let removed = tools.len() != before;
        if removed {
            self.tool_states.write().remove(qualified_id);
        }
        removed
    }

    /// Remove every tool scoped to a server; returns the count removed
    pub fn remove_scope(&self, scope: &str) -> usize {
        let prefix = qualify(scope, "");
        let mut tools = self.tools.write();
        let before = tools.len();
        tools.retain(|t| !t.qualified_id.starts_with(&prefix));
        let removed = before - tools.len();

        self.tool_states
            .write()
            .retain(|id, _| !id.starts_with(&prefix));
        self.policies.write().remove(scope);

        if removed > 0 {
            self.logger.info(&format!(
                "[ToolRegistry] Removed {} tools for server {}",
                removed, scope
            ));
        }
        removed
    }

    /// Count of registered tools
    pub fn len(&self) -> usize {
        self.tools.read().len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.read().is_empty()
    }
}
