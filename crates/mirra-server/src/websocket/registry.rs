//! Connection registry shared by the broadcaster, prober, and handlers.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use mirra_core::ConnectionId;
use tokio::sync::RwLock;
use tracing::debug;

use super::connection::ClientConnection;

/// Tracks all live WebSocket connections.
pub struct ConnectionRegistry {
    /// Connected clients indexed by connection ID.
    connections: RwLock<HashMap<ConnectionId, Arc<ClientConnection>>>,
    /// Cached count, readable without taking the lock.
    active: AtomicUsize,
}

impl ConnectionRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            connections: RwLock::new(HashMap::new()),
            active: AtomicUsize::new(0),
        }
    }

    /// Add a connection.
    pub async fn register(&self, connection: Arc<ClientConnection>) {
        let mut conns = self.connections.write().await;
        let _ = conns.insert(connection.id.clone(), connection);
        self.active.store(conns.len(), Ordering::Relaxed);
        debug!(count = conns.len(), "connection registered");
    }

    /// Remove a connection by ID. Removing an absent ID is a no-op, so
    /// eviction and normal disconnect can race safely.
    pub async fn unregister(&self, id: &ConnectionId) {
        let mut conns = self.connections.write().await;
        let _ = conns.remove(id);
        self.active.store(conns.len(), Ordering::Relaxed);
        debug!(count = conns.len(), "connection unregistered");
    }

    /// Snapshot of all live connections, for iteration without holding
    /// the lock across sends.
    pub async fn snapshot(&self) -> Vec<Arc<ClientConnection>> {
        self.connections.read().await.values().cloned().collect()
    }

    /// Number of active connections.
    pub fn count(&self) -> usize {
        self.active.load(Ordering::Relaxed)
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn make_connection() -> (Arc<ClientConnection>, mpsc::Receiver<Arc<String>>) {
        let (tx, rx) = mpsc::channel(32);
        (Arc::new(ClientConnection::new(ConnectionId::new(), tx)), rx)
    }

    #[tokio::test]
    async fn register_increments_count() {
        let registry = ConnectionRegistry::new();
        assert_eq!(registry.count(), 0);
        let (conn, _rx) = make_connection();
        registry.register(conn).await;
        assert_eq!(registry.count(), 1);
    }

    #[tokio::test]
    async fn unregister_decrements_count() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = make_connection();
        let id = conn.id.clone();
        registry.register(conn).await;
        registry.unregister(&id).await;
        assert_eq!(registry.count(), 0);
    }

    #[tokio::test]
    async fn unregister_absent_id_is_noop() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = make_connection();
        registry.register(conn).await;
        registry.unregister(&ConnectionId::new()).await;
        assert_eq!(registry.count(), 1);
    }

    #[tokio::test]
    async fn double_unregister_is_noop() {
        let registry = ConnectionRegistry::new();
        let (conn, _rx) = make_connection();
        let id = conn.id.clone();
        registry.register(conn).await;
        registry.unregister(&id).await;
        registry.unregister(&id).await;
        assert_eq!(registry.count(), 0);
    }

    #[tokio::test]
    async fn snapshot_returns_all_connections() {
        let registry = ConnectionRegistry::new();
        let (c1, _rx1) = make_connection();
        let (c2, _rx2) = make_connection();
        registry.register(c1).await;
        registry.register(c2).await;
        assert_eq!(registry.snapshot().await.len(), 2);
    }

    #[tokio::test]
    async fn register_same_id_overwrites() {
        let registry = ConnectionRegistry::new();
        let (tx1, _rx1) = mpsc::channel(32);
        let (tx2, _rx2) = mpsc::channel(32);
        let id = ConnectionId::new();
        registry
            .register(Arc::new(ClientConnection::new(id.clone(), tx1)))
            .await;
        registry
            .register(Arc::new(ClientConnection::new(id, tx2)))
            .await;
        assert_eq!(registry.count(), 1);
    }
}
