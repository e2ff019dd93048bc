//! Transport registry for discovering connectors by URL scheme
//!
//! Hosts register one connector per URL scheme (`"ws"`, `"wss"`, ...); a
//! client constructed with `ToolClient::from_registered_transports` resolves
//! the connector for each server URL at connect time. This is a plugin
//! factory table, not client state: the tool registry, pending-call tracker,
//! and server directory remain owned by each client instance.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use once_cell::sync::Lazy;

use super::traits::TransportConnector;

/// Global registry of transport connectors, keyed by URL scheme
static REGISTRY: Lazy<RwLock<HashMap<String, Arc<dyn TransportConnector>>>> =
    Lazy::new(|| RwLock::new(HashMap::new()));

/// Register a connector for a URL scheme, replacing any prior registration
pub fn register_transport(scheme: &str, connector: Arc<dyn TransportConnector>) {
    let mut registry = REGISTRY.write().unwrap();
    registry.insert(scheme.to_string(), connector);
}

/// Look up the connector registered for a scheme
pub fn connector_for(scheme: &str) -> Option<Arc<dyn TransportConnector>> {
    let registry = REGISTRY.read().unwrap();
    registry.get(scheme).cloned()
}

/// Look up the connector for a full URL by its scheme prefix
///
/// ```
/// use toolbridge_core::transport::connector_for_url;
///
/// assert!(connector_for_url("nope://server").is_none());
/// ```
pub fn connector_for_url(url: &str) -> Option<Arc<dyn TransportConnector>> {
    let scheme = url.split_once("://").map(|(scheme, _)| scheme)?;
    connector_for(scheme)
}

/// List registered schemes
pub fn list_transports() -> Vec<String> {
    let registry = REGISTRY.read().unwrap();
    registry.keys().cloned().collect()
}

/// Unregister a scheme (mainly for testing)
pub fn unregister_transport(scheme: &str) -> bool {
    let mut registry = REGISTRY.write().unwrap();
    registry.remove(scheme).is_some()
}
