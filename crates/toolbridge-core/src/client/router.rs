//! Inbound frame routing
//!
//! One router instance serves every connection owned by a client: discovery
//! responses feed the tool registry, results settle the pending-call
//! tracker, and everything else is logged and dropped.

use std::sync::Arc;

use crate::connection::ConnectionEvents;
use crate::logging::Logger;
use crate::pending::PendingCalls;
use crate::protocol::{parse_frame, Inbound, WireMessage};
use crate::registry::ToolRegistry;
use crate::types::ToolCallResult;

pub(crate) struct Router {
    registry: Arc<ToolRegistry>,
    pending: Arc<PendingCalls>,
    logger: Arc<dyn Logger>,
}

impl Router {
    pub(crate) fn new(
        registry: Arc<ToolRegistry>,
        pending: Arc<PendingCalls>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            registry,
            pending,
            logger,
        }
    }

    fn dispatch(&self, server: &str, message: WireMessage) {
        match message {
            WireMessage::ToolList { tools } => {
                self.registry.register_discovered(server, tools);
            }
            WireMessage::ToolResult {
                id,
                result,
                error,
                execution_time,
            } => {
                let outcome = ToolCallResult {
                    id: id.clone(),
                    result,
                    error,
                    execution_time,
                };
                self.pending.resolve(&id, outcome);
            }
            WireMessage::Error { error } => {
                self.logger
                    .warn(&format!("[Router] Server {} reported: {}", server, error));
            }
            WireMessage::ToolDiscovery { .. } | WireMessage::ToolCall { .. } => {
                // Client-to-server frames have no business arriving here
                self.logger.warn(&format!(
                    "[Router] Ignoring client-bound frame from {}",
                    server
                ));
            }
        }
    }
}

impl ConnectionEvents for Router {
    fn on_message(&self, server: &str, raw: &str) {
        match parse_frame(raw) {
            Ok(Inbound::Message(message)) => self.dispatch(server, message),
            Ok(Inbound::Unknown(tag)) => {
                self.logger.warn(&format!(
                    "[Router] Ignoring unknown frame type '{}' from {}",
                    tag, server
                ));
            }
            Err(e) => {
                // Malformed frames are dropped; the connection stays open
                self.logger.error(&format!(
                    "[Router] Dropping malformed frame from {}: {}",
                    server, e
                ));
            }
        }
    }

    fn on_closed(&self, server: &str) {
        let rejected = self.pending.reject_server(server);
        if rejected > 0 {
            self.logger.warn(&format!(
                "[Router] Connection to {} ended with {} calls in flight",
                server, rejected
            ));
        }
    }
}
