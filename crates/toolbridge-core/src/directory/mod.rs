//! Server directory
//!
//! Maps a configured server name to its config and, while connected, its
//! live [`Connection`]. Each connection is owned exclusively by its entry;
//! removal hands it back to the caller for teardown.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::connection::{Connection, ConnectionError, ConnectionResult, ConnectionState};
use crate::logging::Logger;
use crate::types::ServerConfig;

struct ServerEntry {
    config: ServerConfig,
    connection: Option<Connection>,
}

/// Directory of configured servers for one client instance
pub struct ServerDirectory {
    servers: RwLock<HashMap<String, ServerEntry>>,
    logger: Arc<dyn Logger>,
}

impl ServerDirectory {
    /// Create an empty directory
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            servers: RwLock::new(HashMap::new()),
            logger,
        }
    }

    /// Insert or replace the config under `config.name`
    ///
    /// Never opens or closes a connection; a live connection on a replaced
    /// entry is kept.
    pub fn insert(&self, config: ServerConfig) {
        let mut servers = self.servers.write();
        match servers.get_mut(&config.name) {
            Some(entry) => {
                self.logger
                    .debug(&format!("[ServerDirectory] Replaced config {}", config.name));
                entry.config = config;
            }
            None => {
                servers.insert(
                    config.name.clone(),
                    ServerEntry {
                        config,
                        connection: None,
                    },
                );
            }
        }
    }

    /// Remove an entry, handing back its config and any live connection
    ///
    /// Idempotent: removing an unknown name returns `None`.
    pub fn remove(&self, name: &str) -> Option<(ServerConfig, Option<Connection>)> {
        self.servers
            .write()
            .remove(name)
            .map(|entry| (entry.config, entry.connection))
    }

    /// Config for one server
    pub fn get_config(&self, name: &str) -> Option<ServerConfig> {
        self.servers.read().get(name).map(|e| e.config.clone())
    }

    /// All configs, sorted by name for deterministic iteration
    pub fn list_configs(&self) -> Vec<ServerConfig> {
        let mut configs: Vec<ServerConfig> = self
            .servers
            .read()
            .values()
            .map(|e| e.config.clone())
            .collect();
        configs.sort_by(|a, b| a.name.cmp(&b.name));
        configs
    }

    /// Attach a live connection to its entry
    ///
    /// A connection for a name no longer in the directory is closed rather
    /// than attached.
    pub fn attach(&self, name: &str, connection: Connection) {
        let mut servers = self.servers.write();
        match servers.get_mut(name) {
            Some(entry) => entry.connection = Some(connection),
            None => {
                self.logger.warn(&format!(
                    "[ServerDirectory] Dropping connection for removed server {}",
                    name
                ));
                connection.close();
            }
        }
    }

    /// Send a frame over a server's live connection
    pub fn send_to(&self, name: &str, frame: String) -> ConnectionResult<()> {
        let servers = self.servers.read();
        let connection = servers
            .get(name)
            .and_then(|e| e.connection.as_ref())
            .ok_or(ConnectionError::NotConnected)?;
        connection.send(frame)
    }

    /// Lifecycle state of a server's connection, if one was ever attached
    pub fn connection_state(&self, name: &str) -> Option<ConnectionState> {
        self.servers
            .read()
            .get(name)?
            .connection
            .as_ref()
            .map(|c| c.state())
    }

    /// Whether a server has a usable connection
    pub fn is_connected(&self, name: &str) -> bool {
        self.connection_state(name) == Some(ConnectionState::Connected)
    }

    /// Whether at least one server has a usable connection
    pub fn is_any_connected(&self) -> bool {
        self.servers
            .read()
            .values()
            .any(|e| e.connection.as_ref().is_some_and(|c| c.is_connected()))
    }

    /// Configs of enabled servers with no usable connection
    pub fn pending_connects(&self) -> Vec<ServerConfig> {
        let mut targets: Vec<ServerConfig> = self
            .servers
            .read()
            .values()
            .filter(|e| e.config.enabled)
            .filter(|e| !e.connection.as_ref().is_some_and(|c| c.is_connected()))
            .map(|e| e.config.clone())
            .collect();
        targets.sort_by(|a, b| a.name.cmp(&b.name));
        targets
    }

    /// Detach every connection, handing them back for teardown
    pub fn take_connections(&self) -> Vec<Connection> {
        self.servers
            .write()
            .values_mut()
            .filter_map(|e| e.connection.take())
            .collect()
    }

    /// Names of all configured servers
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.servers.read().keys().cloned().collect();
        names.sort();
        names
    }
}
