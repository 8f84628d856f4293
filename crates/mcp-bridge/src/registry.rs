use crate::runner::{ConnectedRunner, ServerRunner};
use dashmap::DashMap;
use mcp_bridge_core::{BridgeError, RunnerConfig};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Process-wide map from session identifier to its live connection.
///
/// The registry exclusively owns every session's process, transport, and
/// protocol client. Callers borrow a session for the duration of one call
/// via [`SessionRegistry::get`]; only `connect` and `disconnect` mutate
/// the map, and those are serialized per identifier.
pub struct SessionRegistry {
    sessions: DashMap<String, Arc<ConnectedRunner>>,
    // One async lock per identifier, created on first use and retained for
    // the registry's lifetime: per-id serialization must hold across
    // remove/insert cycles, so a lock is never dropped with its session.
    locks: DashMap<String, Arc<Mutex<()>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            locks: DashMap::new(),
        }
    }

    fn session_lock(&self, session_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .entry(session_id.to_string())
            .or_default()
            .clone()
    }

    /// Create a session for `session_id`, replacing any existing one.
    ///
    /// An existing session with the same identifier is torn down first,
    /// best-effort. If the new connection fails at any step, nothing is
    /// registered and no process is left behind.
    pub async fn connect(
        &self,
        session_id: &str,
        config: RunnerConfig,
    ) -> Result<(), BridgeError> {
        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;

        if let Some((_, previous)) = self.sessions.remove(session_id) {
            warn!(session_id, "replacing existing session");
            previous.cancel().await;
        }

        let runner = ServerRunner::new(config).connect().await?;
        self.sessions
            .insert(session_id.to_string(), Arc::new(runner));
        info!(session_id, "session registered");
        Ok(())
    }

    /// Borrow the live client for one call.
    pub fn get(&self, session_id: &str) -> Result<Arc<ConnectedRunner>, BridgeError> {
        self.sessions
            .get(session_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| BridgeError::session_not_found(session_id))
    }

    /// Tear down a session and remove it.
    ///
    /// The entry is removed unconditionally; teardown errors on a degraded
    /// connection are logged, not propagated.
    pub async fn disconnect(&self, session_id: &str) -> Result<(), BridgeError> {
        let lock = self.session_lock(session_id);
        let _guard = lock.lock().await;

        let (_, runner) = self
            .sessions
            .remove(session_id)
            .ok_or_else(|| BridgeError::session_not_found(session_id))?;

        runner.cancel().await;
        info!(session_id, "session removed");
        Ok(())
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.sessions.contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Tear down every remaining session. Used at service shutdown for
    /// callers that never sent a disconnect.
    pub async fn shutdown(&self) {
        let session_ids: Vec<String> = self
            .sessions
            .iter()
            .map(|entry| entry.key().clone())
            .collect();

        for session_id in session_ids {
            if let Err(e) = self.disconnect(&session_id).await {
                warn!(session_id, error = %e, "failed to tear down session at shutdown");
            }
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
