//! Durable event fan-out to connected WebSocket clients.
//!
//! Each broadcast is persisted once, before any delivery: the store
//! allocates the next sequence ID and appends the payload in a single
//! transaction, then the ID-stamped message is fanned out to the current
//! connection snapshot. Zero recipients still persist; a storage failure
//! aborts the broadcast entirely and nothing is delivered.

use std::sync::Arc;

use mirra_store::{Store, StoreError};
use serde_json::Value;
use tracing::{debug, warn};

use super::registry::ConnectionRegistry;

/// Broadcasts sequence-numbered events to all connections.
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    store: Arc<Store>,
}

impl Broadcaster {
    /// Create a broadcaster over a registry and store.
    pub fn new(registry: Arc<ConnectionRegistry>, store: Arc<Store>) -> Self {
        Self { registry, store }
    }

    /// The registry this broadcaster fans out over.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Persist `payload` with the next sequence ID and deliver the stamped
    /// message to every connection. Returns the assigned ID.
    ///
    /// The append runs on the blocking pool so a slow disk cannot stall
    /// other tasks on the runtime. Connections whose send channel is full
    /// or closed are pruned from the registry after the fan-out loop.
    pub async fn broadcast(&self, payload: &Value) -> Result<i64, StoreError> {
        let id = {
            let store = Arc::clone(&self.store);
            let payload = payload.clone();
            tokio::task::spawn_blocking(move || store.append_event(&payload))
                .await
                .map_err(|e| StoreError::Task(e.to_string()))??
        };

        let mut stamped = payload.clone();
        if let Value::Object(ref mut map) = stamped {
            let _ = map.insert("id".to_string(), Value::from(id));
        }
        let message = Arc::new(stamped.to_string());

        let connections = self.registry.snapshot().await;
        debug!(id, recipients = connections.len(), "broadcasting event");

        let mut failed = Vec::new();
        for conn in &connections {
            if !conn.send(Arc::clone(&message)) {
                warn!(conn_id = %conn.id, id, "failed to deliver broadcast");
                failed.push(conn.id.clone());
            }
        }
        for conn_id in failed {
            self.registry.unregister(&conn_id).await;
        }

        Ok(id)
    }
}
