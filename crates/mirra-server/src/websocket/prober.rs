//! Periodic liveness probing of WebSocket connections.
//!
//! One loop serves every connection. Each tick checks-and-resets each
//! connection's alive flag: a connection that has not ponged since the
//! previous tick is evicted, so an unresponsive client survives at most
//! two intervals. Connections that pass the check are sent a ping probe.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::registry::ConnectionRegistry;

/// Run the liveness prober until cancelled.
pub async fn run_prober(
    registry: Arc<ConnectionRegistry>,
    interval: Duration,
    cancel: CancellationToken,
) {
    let mut tick = time::interval(interval);
    // The first tick fires immediately; skip it so connections get a full
    // interval to respond before their first check.
    let _ = tick.tick().await;

    loop {
        tokio::select! {
            _ = tick.tick() => {
                probe_once(&registry).await;
            }
            () = cancel.cancelled() => {
                debug!("prober cancelled");
                return;
            }
        }
    }
}

/// One probe pass: evict stale connections, ping the rest.
async fn probe_once(registry: &ConnectionRegistry) {
    let ping = json!({"type": "ping"});
    let mut evicted = Vec::new();

    for conn in registry.snapshot().await {
        if !conn.check_alive() {
            info!(
                conn_id = %conn.id,
                silent_for_secs = conn.last_pong_elapsed().as_secs(),
                "evicting unresponsive connection"
            );
            evicted.push(conn.id.clone());
        } else if !conn.send_json(&ping) {
            info!(conn_id = %conn.id, "evicting connection with dead send channel");
            evicted.push(conn.id.clone());
        }
    }

    for id in evicted {
        registry.unregister(&id).await;
    }
}
