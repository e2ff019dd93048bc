//! Pending-call tracker
//!
//! Maps an outstanding call's correlation id to its waiting caller and
//! deadline. Every settlement path (matching result, deadline expiry, server
//! removal, client teardown) funnels through one map removal, so a call
//! settles exactly once and a late `tool_result` for an already-settled id
//! is silently discarded.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::logging::Logger;
use crate::types::ToolCallResult;

/// How a pending call settled
#[derive(Debug)]
pub enum CallOutcome {
    /// A matching `tool_result` arrived
    Result(ToolCallResult),
    /// The owning server was removed or its channel ended
    Disconnected,
}

struct PendingEntry {
    tool: String,
    server: String,
    submitted_at: Instant,
    deadline: Instant,
    tx: oneshot::Sender<CallOutcome>,
}

/// Tracker for in-flight calls, owned by one client instance
pub struct PendingCalls {
    calls: Mutex<HashMap<String, PendingEntry>>,
    logger: Arc<dyn Logger>,
}

impl PendingCalls {
    /// Create an empty tracker
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
            logger,
        }
    }

    /// Track a new call and hand back the receiver the caller awaits
    ///
    /// Ids are generated unique for the process lifetime; an id is live in
    /// the tracker at most once.
    pub fn register(
        &self,
        id: impl Into<String>,
        server: impl Into<String>,
        tool: impl Into<String>,
        ttl: Duration,
    ) -> oneshot::Receiver<CallOutcome> {
        let id = id.into();
        let now = Instant::now();
        let (tx, rx) = oneshot::channel();

        self.calls.lock().insert(
            id.clone(),
            PendingEntry {
                tool: tool.into(),
                server: server.into(),
                submitted_at: now,
                deadline: now + ttl,
                tx,
            },
        );
        self.logger
            .debug(&format!("[PendingCalls] Registered {}", id));
        rx
    }

    /// Settle a call with its result; `false` if the id is not live
    ///
    /// An unknown id is a late or unsolicited result and is discarded.
    pub fn resolve(&self, id: &str, result: ToolCallResult) -> bool {
        let Some(entry) = self.calls.lock().remove(id) else {
            self.logger.debug(&format!(
                "[PendingCalls] Discarding result for unknown or settled id {}",
                id
            ));
            return false;
        };

        self.logger.debug(&format!(
            "[PendingCalls] Resolved {} ({}) in {}ms",
            id,
            entry.tool,
            entry.submitted_at.elapsed().as_millis()
        ));
        let _ = entry.tx.send(CallOutcome::Result(result));
        true
    }

    /// Drop a call whose deadline elapsed; `false` if already settled
    pub fn expire(&self, id: &str) -> bool {
        let Some(entry) = self.calls.lock().remove(id) else {
            return false;
        };

        self.logger.warn(&format!(
            "[PendingCalls] Call {} ({}) exceeded its deadline by {}ms",
            id,
            entry.tool,
            entry.deadline.elapsed().as_millis()
        ));
        // Dropping the sender is enough; the caller already timed out
        true
    }

    /// Drop a call that failed before transmission
    pub fn discard(&self, id: &str) {
        self.calls.lock().remove(id);
    }

    /// Settle every call scoped to a server with `Disconnected`
    pub fn reject_server(&self, server: &str) -> usize {
        let drained: Vec<PendingEntry> = {
            let mut calls = self.calls.lock();
            let ids: Vec<String> = calls
                .iter()
                .filter(|(_, entry)| entry.server == server)
                .map(|(id, _)| id.clone())
                .collect();
            ids.into_iter().filter_map(|id| calls.remove(&id)).collect()
        };

        let count = drained.len();
        for entry in drained {
            let _ = entry.tx.send(CallOutcome::Disconnected);
        }
        if count > 0 {
            self.logger.info(&format!(
                "[PendingCalls] Rejected {} pending calls for server {}",
                count, server
            ));
        }
        count
    }

    /// Settle every call with `Disconnected` (client teardown)
    pub fn reject_all(&self) -> usize {
        let drained: Vec<PendingEntry> = self.calls.lock().drain().map(|(_, e)| e).collect();
        let count = drained.len();
        for entry in drained {
            let _ = entry.tx.send(CallOutcome::Disconnected);
        }
        count
    }

    /// Whether an id is currently live
    pub fn contains(&self, id: &str) -> bool {
        self.calls.lock().contains_key(id)
    }

    /// Count of in-flight calls
    pub fn len(&self) -> usize {
        self.calls.lock().len()
    }

    /// Whether no calls are in flight
    pub fn is_empty(&self) -> bool {
        self.calls.lock().is_empty()
    }
}
