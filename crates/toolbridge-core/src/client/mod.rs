//! Protocol client façade
//!
//! [`ToolClient`] orchestrates the server directory, connections, discovery,
//! the tool registry, and the pending-call tracker behind the API the IDE
//! integration layer consumes. Every piece of state is owned by the client
//! instance; independent clients never interfere.

mod router;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;
use thiserror::Error;
use tokio::time::timeout;

use crate::connection::{Connection, ConnectionError};
use crate::directory::ServerDirectory;
use crate::logging::Logger;
use crate::pending::{CallOutcome, PendingCalls};
use crate::protocol::{serialize_frame, timestamp_ms, ProtocolError, WireCall, WireMessage};
use crate::registry::{ScopePolicy, ToolFilter, ToolRegistry};
use crate::transport::{connector_for_url, TransportConnector};
use crate::types::{ServerConfig, ToolCallResult, ToolDescriptor, CUSTOM_SCOPE};

use router::Router;

/// Deadline for an in-flight tool call
pub const CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Errors surfaced by [`ToolClient::call_tool`]
#[derive(Error, Debug)]
pub enum ToolCallError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Tool is disabled: {0}")]
    ToolDisabled(String),

    #[error("Server not connected: {0}")]
    ServerNotConnected(String),

    #[error("Server disconnected: {0}")]
    ServerDisconnected(String),

    #[error("Tool call timed out after {timeout_ms}ms: {tool}")]
    ToolCallTimeout { tool: String, timeout_ms: u64 },

    #[error("Local execution is not supported for {0}")]
    LocalExecutionNotSupported(String),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

fn failed_servers(failures: &[(String, ConnectionError)]) -> String {
    failures
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Aggregate of per-server failures from [`ToolClient::connect`]
///
/// A failed server never prevents its siblings from connecting; the client
/// still reaches `Ready` and the successful connections stay live.
#[derive(Error, Debug)]
#[error("Connection failed for: {}", failed_servers(.failures))]
pub struct ConnectError {
    pub failures: Vec<(String, ConnectionError)>,
}

/// Lifecycle state of the client as a whole
///
/// `Ready` means every enabled server's connection attempt has resolved,
/// successfully or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Idle,
    Connecting,
    Ready,
}

enum ConnectorSource {
    Fixed(Arc<dyn TransportConnector>),
    Registry,
}

/// Tool-invocation protocol client
pub struct ToolClient {
    directory: ServerDirectory,
    registry: Arc<ToolRegistry>,
    pending: Arc<PendingCalls>,
    router: Arc<Router>,
    connector: ConnectorSource,
    state: RwLock<ClientState>,
    call_seq: AtomicU64,
    call_timeout: Duration,
    logger: Arc<dyn Logger>,
}

impl ToolClient {
    /// Create a client that dials every server through one connector
    pub fn new(connector: Arc<dyn TransportConnector>, logger: Arc<dyn Logger>) -> Self {
        Self::build(ConnectorSource::Fixed(connector), logger)
    }

    /// Create a client that resolves connectors from the transport registry
    /// by each server URL's scheme
    pub fn from_registered_transports(logger: Arc<dyn Logger>) -> Self {
        Self::build(ConnectorSource::Registry, logger)
    }

    fn build(connector: ConnectorSource, logger: Arc<dyn Logger>) -> Self {
        let registry = Arc::new(ToolRegistry::new(logger.clone()));
        let pending = Arc::new(PendingCalls::new(logger.clone()));
        let router = Arc::new(Router::new(registry.clone(), pending.clone(), logger.clone()));
        Self {
            directory: ServerDirectory::new(logger.clone()),
            registry,
            pending,
            router,
            connector,
            state: RwLock::new(ClientState::Idle),
            call_seq: AtomicU64::new(0),
            call_timeout: CALL_TIMEOUT,
            logger,
        }
    }

    /// Override the 30-second call deadline (mainly for testing)
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    // ==================== SERVER DIRECTORY ====================

    /// Insert or replace a server config; does not open a connection
    pub fn add_server(&self, config: ServerConfig) {
        self.registry.set_scope_policy(
            config.name.as_str(),
            ScopePolicy {
                allowed_tools: config.tool_names.clone(),
                permissions: config.permissions.clone(),
            },
        );
        self.logger
            .info(&format!("[ToolClient] Added server {}", config.name));
        self.directory.insert(config);
    }

    /// Remove a server, its live connection, and every tool in its scope
    ///
    /// Pending calls against the server are rejected with
    /// `ServerDisconnected` rather than left to time out. Idempotent.
    pub async fn remove_server(&self, name: &str) {
        let Some((_config, connection)) = self.directory.remove(name) else {
            return;
        };

        let rejected = self.pending.reject_server(name);
        if let Some(connection) = connection {
            connection.shutdown().await;
        }
        let removed = self.registry.remove_scope(name);

        self.logger.info(&format!(
            "[ToolClient] Removed server {} ({} tools, {} pending calls)",
            name, removed, rejected
        ));
    }

    /// Config for one server
    pub fn get_server_config(&self, name: &str) -> Option<ServerConfig> {
        self.directory.get_config(name)
    }

    /// All server configs
    pub fn list_server_configs(&self) -> Vec<ServerConfig> {
        self.directory.list_configs()
    }

    // ==================== LIFECYCLE ====================

    /// Connect every enabled server that is not already connected
    ///
    /// Attempts run concurrently; each connection that reaches `Connected`
    /// immediately gets a discovery round. Per-server failures are collected
    /// into a [`ConnectError`] and never abort the siblings. The client is
    /// `Ready` once every attempt has resolved either way.
    pub async fn connect(&self) -> Result<(), ConnectError> {
        *self.state.write() = ClientState::Connecting;

        let targets = self.directory.pending_connects();
        self.logger.info(&format!(
            "[ToolClient] Connecting to {} servers",
            targets.len()
        ));

        let attempts = targets.iter().map(|config| async move {
            let result = self.connect_server(config).await;
            (config.name.clone(), result)
        });
        let results = futures::future::join_all(attempts).await;

        *self.state.write() = ClientState::Ready;

        let failures: Vec<(String, ConnectionError)> = results
            .into_iter()
            .filter_map(|(name, result)| result.err().map(|e| (name, e)))
            .collect();

        if failures.is_empty() {
            Ok(())
        } else {
            self.logger.warn(&format!(
                "[ToolClient] {} of {} connection attempts failed",
                failures.len(),
                targets.len()
            ));
            Err(ConnectError { failures })
        }
    }

    async fn connect_server(&self, config: &ServerConfig) -> Result<(), ConnectionError> {
        self.registry.set_scope_policy(
            config.name.as_str(),
            ScopePolicy {
                allowed_tools: config.tool_names.clone(),
                permissions: config.permissions.clone(),
            },
        );

        let connector = self.resolve_connector(&config.url)?;
        let connection = Connection::open(
            config.name.as_str(),
            &config.url,
            connector.as_ref(),
            self.router.clone(),
            self.logger.clone(),
        )
        .await?;

        let discovery = serialize_frame(&WireMessage::ToolDiscovery {
            server: config.name.clone(),
            timestamp: timestamp_ms(),
        })?;
        connection.send(discovery)?;

        self.directory.attach(&config.name, connection);
        Ok(())
    }

    fn resolve_connector(&self, url: &str) -> Result<Arc<dyn TransportConnector>, ConnectionError> {
        match &self.connector {
            ConnectorSource::Fixed(connector) => Ok(connector.clone()),
            ConnectorSource::Registry => {
                connector_for_url(url).ok_or_else(|| ConnectionError::NoTransport(url.to_string()))
            }
        }
    }

    /// Whether at least one server has a live connection
    pub fn is_connected(&self) -> bool {
        self.directory.is_any_connected()
    }

    /// Current client lifecycle state
    pub fn state(&self) -> ClientState {
        *self.state.read()
    }

    /// Close every connection and settle every in-flight call
    ///
    /// Server configs and custom tools survive; server-scoped tools are
    /// dropped (they are stale once the channel is gone) and re-register on
    /// the next discovery round.
    pub async fn disconnect(&self) {
        let rejected = self.pending.reject_all();

        let connections = self.directory.take_connections();
        let closed = connections.len();
        for connection in connections {
            connection.shutdown().await;
        }

        for name in self.directory.names() {
            self.registry.remove_scope(&name);
        }

        *self.state.write() = ClientState::Idle;
        self.logger.info(&format!(
            "[ToolClient] Disconnected ({} connections closed, {} pending calls rejected)",
            closed, rejected
        ));
    }

    // ==================== TOOL REGISTRY ====================

    /// Every registered tool descriptor, in registration order
    pub fn get_available_tools(&self) -> Vec<ToolDescriptor> {
        self.registry.list()
    }

    /// Descriptors scoped to one server
    pub fn get_tools_by_server(&self, name: &str) -> Vec<ToolDescriptor> {
        self.registry.by_scope(name)
    }

    /// Enabled descriptors only, for handing to the assistant
    pub fn get_enabled_tools(&self) -> Vec<ToolDescriptor> {
        self.registry.get_tools(&ToolFilter::enabled())
    }

    /// Flip a tool's enabled flag; in-flight calls are unaffected
    pub fn set_tool_enabled(&self, name_or_id: &str, enabled: bool) -> bool {
        self.registry.set_enabled(name_or_id, enabled)
    }

    /// Register a tool with no network-backed connection
    ///
    /// Build the descriptor with [`ToolDescriptor::custom`] for the default
    /// `custom` scope, or [`ToolDescriptor::new`] for an explicit one.
    /// Calling a `custom`-scoped tool fails with
    /// [`ToolCallError::LocalExecutionNotSupported`].
    pub fn add_custom_tool(&self, descriptor: ToolDescriptor) {
        self.logger.info(&format!(
            "[ToolClient] Added custom tool {}",
            descriptor.qualified_id
        ));
        self.registry.register(descriptor);
    }

    /// Remove one tool from the registry; the owning connection is untouched
    pub fn remove_tool(&self, qualified_id: &str) -> bool {
        self.registry.remove(qualified_id)
    }

    // ==================== INVOCATION ====================

    /// Invoke a tool and await its result
    ///
    /// `name_or_id` is a qualified id or a plain name; a plain name resolves
    /// to its first registration. The call settles exactly once: with the
    /// matching `tool_result`, with `ServerDisconnected` if the owning
    /// server goes away, or with `ToolCallTimeout` at the deadline.
    pub async fn call_tool(
        &self,
        name_or_id: &str,
        parameters: Value,
    ) -> Result<ToolCallResult, ToolCallError> {
        let descriptor = self
            .registry
            .resolve(name_or_id)
            .ok_or_else(|| ToolCallError::ToolNotFound(name_or_id.to_string()))?;

        if !descriptor.enabled {
            return Err(ToolCallError::ToolDisabled(descriptor.qualified_id));
        }

        let scope = descriptor.scope().to_string();
        if scope == CUSTOM_SCOPE {
            return Err(ToolCallError::LocalExecutionNotSupported(
                descriptor.qualified_id,
            ));
        }
        if !self.directory.is_connected(&scope) {
            return Err(ToolCallError::ServerNotConnected(scope));
        }

        let id = self.next_call_id();
        let frame = serialize_frame(&WireMessage::ToolCall {
            call: WireCall {
                tool: descriptor.name.clone(),
                parameters,
                id: id.clone(),
            },
            timestamp: timestamp_ms(),
        })?;

        let rx = self.pending.register(
            id.clone(),
            scope.clone(),
            descriptor.qualified_id.clone(),
            self.call_timeout,
        );

        if let Err(e) = self.directory.send_to(&scope, frame) {
            self.pending.discard(&id);
            return Err(match e {
                ConnectionError::NotConnected => ToolCallError::ServerNotConnected(scope),
                other => other.into(),
            });
        }

        self.logger.debug(&format!(
            "[ToolClient] Dispatched {} as {}",
            descriptor.qualified_id, id
        ));

        match timeout(self.call_timeout, rx).await {
            Ok(Ok(CallOutcome::Result(result))) => Ok(result),
            Ok(Ok(CallOutcome::Disconnected)) => Err(ToolCallError::ServerDisconnected(scope)),
            // The tracker dropped the channel without settling; treat as gone
            Ok(Err(_)) => Err(ToolCallError::ServerDisconnected(scope)),
            Err(_) => {
                self.pending.expire(&id);
                Err(ToolCallError::ToolCallTimeout {
                    tool: descriptor.qualified_id,
                    timeout_ms: self.call_timeout.as_millis() as u64,
                })
            }
        }
    }

    /// Count of in-flight calls
    pub fn pending_call_count(&self) -> usize {
        self.pending.len()
    }

    fn next_call_id(&self) -> String {
        let seq = self.call_seq.fetch_add(1, Ordering::SeqCst);
        format!("call-{}-{}", timestamp_ms(), seq)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;
    use crate::protocol::{parse_frame, Inbound};
    use crate::transport::{MemoryConnector, MemoryTransport, Transport};
    use serde_json::json;
    use std::collections::HashSet;

    fn client_with(connector: Arc<MemoryConnector>) -> ToolClient {
        ToolClient::new(connector, Arc::new(NoOpLogger::new()))
    }

    async fn wait_until(mut condition: impl FnMut() -> bool) {
        for _ in 0..200 {
            if condition() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("condition not met in time");
    }

    async fn send_tool_list(server_end: &mut MemoryTransport, names: &[&str]) {
        let tools: Vec<Value> = names
            .iter()
            .map(|name| json!({"name": name, "description": format!("{} tool", name)}))
            .collect();
        server_end
            .send(json!({"type": "tool_list", "tools": tools}).to_string())
            .await
            .unwrap();
    }

    /// Connect one server, consume its discovery frame, and register tools
    async fn connect_with_tools(
        client: &ToolClient,
        server_end: &mut MemoryTransport,
        name: &str,
        tools: &[&str],
    ) {
        client.add_server(ServerConfig::new(name, format!("memory://{}", name)));
        client.connect().await.unwrap();

        let discovery = server_end.recv().await.unwrap();
        match parse_frame(&discovery).unwrap() {
            Inbound::Message(WireMessage::ToolDiscovery { server, .. }) => {
                assert_eq!(server, name);
            }
            other => panic!("expected discovery frame, got {:?}", other),
        }

        send_tool_list(server_end, tools).await;
        let expected = name.to_string();
        wait_until(|| !client.get_tools_by_server(&expected).is_empty()).await;
    }

    #[tokio::test]
    async fn test_connect_discovers_tools() {
        let connector = Arc::new(MemoryConnector::new());
        let mut alpha = connector.register("memory://alpha");
        let client = client_with(connector);

        assert_eq!(client.state(), ClientState::Idle);
        connect_with_tools(&client, &mut alpha, "alpha", &["echo"]).await;

        assert_eq!(client.state(), ClientState::Ready);
        assert!(client.is_connected());

        let tools = client.get_available_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].qualified_id, "alpha:echo");
        assert!(tools[0].enabled);
    }

    #[tokio::test]
    async fn test_call_tool_round_trip() {
        let connector = Arc::new(MemoryConnector::new());
        let mut alpha = connector.register("memory://alpha");
        let client = client_with(connector);
        connect_with_tools(&client, &mut alpha, "alpha", &["echo"]).await;

        let serve = async {
            let frame = alpha.recv().await.unwrap();
            let call = match parse_frame(&frame).unwrap() {
                Inbound::Message(WireMessage::ToolCall { call, .. }) => call,
                other => panic!("expected tool_call, got {:?}", other),
            };
            assert_eq!(call.tool, "echo");
            assert_eq!(call.parameters, json!({"msg": "hi"}));

            alpha
                .send(
                    json!({
                        "type": "tool_result",
                        "id": call.id,
                        "result": {"msg": "hi"},
                        "executionTime": 12
                    })
                    .to_string(),
                )
                .await
                .unwrap();
            call.id
        };

        let (result, call_id) = tokio::join!(client.call_tool("alpha:echo", json!({"msg": "hi"})), serve);
        let result = result.unwrap();

        assert_eq!(result.id, call_id);
        assert_eq!(result.result, json!({"msg": "hi"}));
        assert!(result.error.is_none());
        assert_eq!(result.execution_time, 12);

        // The tracker no longer holds the id
        assert_eq!(client.pending_call_count(), 0);
    }

    #[tokio::test]
    async fn test_call_unknown_tool_rejects_immediately() {
        let connector = Arc::new(MemoryConnector::new());
        let client = client_with(connector);

        let result = client.call_tool("ghost", json!({})).await;
        assert!(matches!(result, Err(ToolCallError::ToolNotFound(_))));
    }

    #[tokio::test]
    async fn test_disabled_tool_sends_no_frame() {
        let connector = Arc::new(MemoryConnector::new());
        let mut alpha = connector.register("memory://alpha");
        let client = client_with(connector);
        connect_with_tools(&client, &mut alpha, "alpha", &["echo"]).await;

        assert!(client.set_tool_enabled("alpha:echo", false));

        let result = client.call_tool("alpha:echo", json!({})).await;
        assert!(matches!(result, Err(ToolCallError::ToolDisabled(_))));

        // Zero sends: nothing beyond the already-consumed discovery frame
        assert!(alpha.try_recv().is_none());
        assert_eq!(client.pending_call_count(), 0);
    }

    #[tokio::test]
    async fn test_call_timeout_and_late_result_discarded() {
        let connector = Arc::new(MemoryConnector::new());
        let mut alpha = connector.register("memory://alpha");
        let client = client_with(connector).with_call_timeout(Duration::from_millis(100));
        connect_with_tools(&client, &mut alpha, "alpha", &["echo"]).await;

        let serve = async {
            let frame = alpha.recv().await.unwrap();
            match parse_frame(&frame).unwrap() {
                Inbound::Message(WireMessage::ToolCall { call, .. }) => call.id,
                other => panic!("expected tool_call, got {:?}", other),
            }
        };

        let (result, call_id) = tokio::join!(client.call_tool("alpha:echo", json!({})), serve);
        assert!(matches!(
            result,
            Err(ToolCallError::ToolCallTimeout { .. })
        ));
        assert_eq!(client.pending_call_count(), 0);

        // A result arriving after the deadline is silently discarded
        alpha
            .send(
                json!({
                    "type": "tool_result",
                    "id": call_id,
                    "result": {},
                    "executionTime": 1
                })
                .to_string(),
            )
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(client.pending_call_count(), 0);
        assert!(client.is_connected());
    }

    #[tokio::test]
    async fn test_server_not_connected() {
        let connector = Arc::new(MemoryConnector::new());
        let client = client_with(connector);

        // A tool scoped to a configured but unconnected server
        client.add_server(ServerConfig::new("alpha", "memory://alpha"));
        client.add_custom_tool(ToolDescriptor::new("alpha", "echo", "Echo a message"));

        let result = client.call_tool("alpha:echo", json!({})).await;
        assert!(matches!(result, Err(ToolCallError::ServerNotConnected(_))));
    }

    #[tokio::test]
    async fn test_custom_tool_is_not_locally_executable() {
        let connector = Arc::new(MemoryConnector::new());
        let client = client_with(connector);

        client.add_custom_tool(ToolDescriptor::custom("scratch", "Scratchpad"));
        assert_eq!(client.get_available_tools().len(), 1);

        let result = client.call_tool("custom:scratch", json!({})).await;
        assert!(matches!(
            result,
            Err(ToolCallError::LocalExecutionNotSupported(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_server_rejects_pending_and_removes_tools() {
        let connector = Arc::new(MemoryConnector::new());
        let mut alpha = connector.register("memory://alpha");
        let client = client_with(connector);
        connect_with_tools(&client, &mut alpha, "alpha", &["echo"]).await;

        let cleanup = async {
            // Wait for the call frame so the pending entry exists
            let _ = alpha.recv().await.unwrap();
            client.remove_server("alpha").await;
        };

        let (result, _) = tokio::join!(client.call_tool("alpha:echo", json!({})), cleanup);
        assert!(matches!(
            result,
            Err(ToolCallError::ServerDisconnected(_))
        ));

        assert!(client.get_tools_by_server("alpha").is_empty());
        assert!(client.get_available_tools().is_empty());
        assert!(client.get_server_config("alpha").is_none());
        assert!(!client.is_connected());

        // Removing an unknown name is a no-op
        client.remove_server("alpha").await;
    }

    #[tokio::test]
    async fn test_connect_partial_failure() {
        let connector = Arc::new(MemoryConnector::new());
        let mut alpha = connector.register("memory://alpha");
        let client = client_with(connector);

        client.add_server(ServerConfig::new("alpha", "memory://alpha"));
        client.add_server(ServerConfig::new("ghost", "memory://ghost"));

        let error = client.connect().await.unwrap_err();
        assert_eq!(error.failures.len(), 1);
        assert_eq!(error.failures[0].0, "ghost");
        assert!(error.to_string().contains("ghost"));

        // The failed sibling never blocked alpha
        assert_eq!(client.state(), ClientState::Ready);
        assert!(client.is_connected());
        assert!(alpha.recv().await.is_some());
    }

    #[tokio::test]
    async fn test_plain_name_resolves_to_first_registration() {
        let connector = Arc::new(MemoryConnector::new());
        let mut a = connector.register("memory://a");
        let mut b = connector.register("memory://b");
        let client = client_with(connector);

        // Sequential connects pin registration order: a first, then b
        connect_with_tools(&client, &mut a, "a", &["ping"]).await;
        connect_with_tools(&client, &mut b, "b", &["ping"]).await;
        assert_eq!(client.get_available_tools().len(), 2);

        for _ in 0..3 {
            let serve = async {
                let frame = a.recv().await.unwrap();
                let call = match parse_frame(&frame).unwrap() {
                    Inbound::Message(WireMessage::ToolCall { call, .. }) => call,
                    other => panic!("expected tool_call, got {:?}", other),
                };
                a.send(
                    json!({
                        "type": "tool_result",
                        "id": call.id,
                        "result": {"from": "a"},
                        "executionTime": 1
                    })
                    .to_string(),
                )
                .await
                .unwrap();
            };

            let (result, _) = tokio::join!(client.call_tool("ping", json!({})), serve);
            assert_eq!(result.unwrap().result, json!({"from": "a"}));
            // Server b never saw the call
            assert!(b.try_recv().is_none());
        }
    }

    #[tokio::test]
    async fn test_server_tool_names_restrict_discovery() {
        let connector = Arc::new(MemoryConnector::new());
        let mut alpha = connector.register("memory://alpha");
        let client = client_with(connector);

        client.add_server(
            ServerConfig::new("alpha", "memory://alpha")
                .with_tool_names(["echo".to_string()])
                .with_permissions(["fs.read".to_string()]),
        );
        client.connect().await.unwrap();
        let _ = alpha.recv().await.unwrap();

        send_tool_list(&mut alpha, &["echo", "rm"]).await;
        wait_until(|| !client.get_available_tools().is_empty()).await;

        let tools = client.get_available_tools();
        assert_eq!(tools.len(), 1);
        assert_eq!(tools[0].qualified_id, "alpha:echo");
        assert!(tools[0].permissions.contains("fs.read"));
    }

    #[tokio::test]
    async fn test_unknown_and_malformed_frames_are_not_fatal() {
        let connector = Arc::new(MemoryConnector::new());
        let mut alpha = connector.register("memory://alpha");
        let client = client_with(connector);
        connect_with_tools(&client, &mut alpha, "alpha", &["echo"]).await;

        alpha
            .send(json!({"type": "heartbeat"}).to_string())
            .await
            .unwrap();
        alpha.send("not json at all".to_string()).await.unwrap();
        alpha
            .send(json!({"type": "error", "error": "server hiccup"}).to_string())
            .await
            .unwrap();

        // The connection survives and calls still work
        let serve = async {
            let frame = alpha.recv().await.unwrap();
            let call = match parse_frame(&frame).unwrap() {
                Inbound::Message(WireMessage::ToolCall { call, .. }) => call,
                other => panic!("expected tool_call, got {:?}", other),
            };
            alpha
                .send(
                    json!({
                        "type": "tool_result",
                        "id": call.id,
                        "result": {"ok": true},
                        "executionTime": 2
                    })
                    .to_string(),
                )
                .await
                .unwrap();
        };

        let (result, _) = tokio::join!(client.call_tool("alpha:echo", json!({})), serve);
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_disconnect_tears_down() {
        let connector = Arc::new(MemoryConnector::new());
        let mut alpha = connector.register("memory://alpha");
        let client = client_with(connector);
        connect_with_tools(&client, &mut alpha, "alpha", &["echo"]).await;
        client.add_custom_tool(ToolDescriptor::custom("scratch", "Scratchpad"));

        client.disconnect().await;

        assert_eq!(client.state(), ClientState::Idle);
        assert!(!client.is_connected());
        assert_eq!(client.pending_call_count(), 0);

        // Server configs and custom tools survive; discovered tools do not
        assert!(client.get_server_config("alpha").is_some());
        let remaining = client.get_available_tools();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].qualified_id, "custom:scratch");
    }

    #[tokio::test]
    async fn test_discovery_refresh_keeps_single_descriptor() {
        let connector = Arc::new(MemoryConnector::new());
        let mut alpha = connector.register("memory://alpha");
        let client = client_with(connector);
        connect_with_tools(&client, &mut alpha, "alpha", &["echo"]).await;

        // Hot refresh: the server re-announces its list twice more
        send_tool_list(&mut alpha, &["echo"]).await;
        send_tool_list(&mut alpha, &["echo"]).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(client.get_available_tools().len(), 1);
    }

    #[tokio::test]
    async fn test_enabled_filter_and_enabled_tools() {
        let connector = Arc::new(MemoryConnector::new());
        let mut alpha = connector.register("memory://alpha");
        let client = client_with(connector);
        connect_with_tools(&client, &mut alpha, "alpha", &["echo", "ping"]).await;
        wait_until(|| client.get_available_tools().len() == 2).await;

        client.set_tool_enabled("alpha:ping", false);

        let enabled: Vec<String> = client
            .get_enabled_tools()
            .iter()
            .map(|t| t.qualified_id.clone())
            .collect();
        assert_eq!(enabled, vec!["alpha:echo"]);
    }

    #[tokio::test]
    async fn test_call_ids_are_unique() {
        let connector = Arc::new(MemoryConnector::new());
        let client = client_with(connector);

        let mut seen = HashSet::new();
        for _ in 0..1000 {
            assert!(seen.insert(client.next_call_id()));
        }
    }
}
