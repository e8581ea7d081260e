//! Per-socket WebSocket loop and client message dispatch.
//!
//! On upgrade the client is greeted with the highest persisted event ID,
//! so it can immediately request a catch-up. The greeting is queued on the
//! connection's channel before the connection is registered, which keeps it
//! ahead of any concurrent broadcast.

use std::sync::Arc;

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use mirra_core::ConnectionId;
use mirra_store::{BroadcastEvent, Store, StoreError};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::connection::ClientConnection;
use crate::server::AppState;

/// Messages a client may send over the socket.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
enum ClientMessage {
    /// Liveness reply to a `{"type": "ping"}` probe.
    Pong,
    /// Request all events after `last_id`.
    MessagesSince {
        #[serde(default)]
        last_id: Value,
    },
}

/// Axum handler for `GET /ws`.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    ws.on_upgrade(move |socket| client_loop(socket, state))
}

/// Drive one client socket until it closes or errors.
async fn client_loop(socket: WebSocket, state: AppState) {
    let (tx, mut rx) = mpsc::channel::<Arc<String>>(state.send_queue_capacity);
    let conn = Arc::new(ClientConnection::new(ConnectionId::new(), tx));

    let hello = {
        let store = Arc::clone(&state.store);
        tokio::task::spawn_blocking(move || greeting(&store))
            .await
            .map_err(|e| StoreError::Task(e.to_string()))
            .and_then(|r| r)
    };
    let hello = match hello {
        Ok(message) => message,
        Err(e) => {
            error!(error = %e, "failed to read last event id, refusing connection");
            return;
        }
    };
    let _ = conn.send_json(&hello);

    state.registry.register(Arc::clone(&conn)).await;
    info!(conn_id = %conn.id, "websocket connected");

    let (mut sink, mut stream) = socket.split();
    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sink.send(Message::Text(text.as_str().into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(message)) = stream.next().await {
        match message {
            Message::Text(text) => {
                // Dispatch on the blocking pool: catch-up reads hit SQLite.
                let store = Arc::clone(&state.store);
                let handler_conn = Arc::clone(&conn);
                let reply = tokio::task::spawn_blocking(move || {
                    handle_client_message(&store, &handler_conn, text.as_str())
                })
                .await;
                if let Ok(Some(reply)) = reply {
                    let _ = conn.send_json(&reply);
                }
            }
            Message::Close(_) => break,
            _ => {}
        }
    }

    state.registry.unregister(&conn.id).await;
    writer.abort();
    info!(
        conn_id = %conn.id,
        age_secs = conn.age().as_secs(),
        dropped = conn.drop_count(),
        "websocket disconnected"
    );
}

/// Build the connection greeting carrying the highest persisted event ID
/// (0 when the log is empty).
fn greeting(store: &Store) -> Result<Value, StoreError> {
    let last_id = store.last_event_id()?;
    Ok(json!({"message": {"last_message_id": last_id}}))
}

/// Dispatch one text frame. Returns the reply to send, if any.
///
/// Malformed or unrecognized messages are ignored; the connection stays
/// open. Only an explicit pong refreshes the alive flag.
fn handle_client_message(store: &Store, conn: &ClientConnection, raw: &str) -> Option<Value> {
    let parsed: ClientMessage = match serde_json::from_str(raw) {
        Ok(m) => m,
        Err(_) => {
            debug!(conn_id = %conn.id, "ignoring unrecognized client message");
            return None;
        }
    };

    match parsed {
        ClientMessage::Pong => {
            conn.mark_alive();
            None
        }
        ClientMessage::MessagesSince { last_id } => Some(catch_up(store, &last_id)),
    }
}

/// Build the catch-up reply for a `messagesSince` request.
fn catch_up(store: &Store, last_id: &Value) -> Value {
    let Some(last_id) = last_id.as_i64() else {
        return json!({"error": format!("invalid last_id: {last_id}")});
    };
    match store.events_since(last_id) {
        Ok(events) => {
            let messages: Vec<Value> = events.iter().map(BroadcastEvent::to_value).collect();
            json!({"messages": messages})
        }
        Err(e) => {
            error!(error = %e, last_id, "catch-up query failed");
            json!({"error": format!("failed to load messages: {e}")})
        }
    }
}
