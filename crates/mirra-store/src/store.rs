//! High-level store facade over the connection pool.
//!
//! Handlers hold an `Arc<Store>` and never touch the pool or repositories
//! directly. The one piece of logic that lives here rather than in a
//! repository is [`Store::append_event`]: sequence allocation and log insert
//! happen in a single transaction so each logical broadcast is persisted
//! exactly once, whether it has zero recipients or fifty.

use mirra_core::DocumentId;
use serde_json::Value;
use tracing::debug;

use crate::connection::{ConnectionConfig, ConnectionPool, new_file, new_in_memory};
use crate::errors::{Result, StoreError};
use crate::migrations::run_migrations;
use crate::repositories::broadcast_log::{BroadcastEvent, BroadcastLogRepo};
use crate::repositories::counters::CounterRepo;
use crate::repositories::documents::{DocumentRepo, ListOptions};

/// Stream name for the broadcast event log's sequence counter.
pub const BROADCAST_STREAM: &str = "messages";

/// Facade over documents, broadcast log, and counters.
pub struct Store {
    pool: ConnectionPool,
}

impl Store {
    /// Wrap an existing pool. Migrations must already have run.
    pub fn new(pool: ConnectionPool) -> Self {
        Self { pool }
    }

    /// Open a file-backed store and run migrations.
    pub fn open(path: &str, config: &ConnectionConfig) -> Result<Self> {
        let pool = new_file(path, config)?;
        let _ = run_migrations(&*pool.get()?)?;
        Ok(Self { pool })
    }

    /// Open an in-memory store (single connection, for testing).
    pub fn open_in_memory() -> Result<Self> {
        // In-memory SQLite databases are per-connection; a pool of one keeps
        // every caller on the same database.
        let config = ConnectionConfig {
            pool_size: 1,
            ..ConnectionConfig::default()
        };
        let pool = new_in_memory(&config)?;
        let _ = run_migrations(&*pool.get()?)?;
        Ok(Self { pool })
    }

    /// Access the underlying pool.
    pub fn pool(&self) -> &ConnectionPool {
        &self.pool
    }

    // ── Documents ───────────────────────────────────────────────────────

    /// Insert a document, assigning a `_id` when the body lacks one.
    /// Returns the saved body.
    pub fn insert_document(&self, collection: &str, body: Value) -> Result<Value> {
        let Value::Object(mut map) = body else {
            return Err(StoreError::InvalidDocument(
                "document body must be a JSON object".into(),
            ));
        };

        let id = match map.get("_id").and_then(Value::as_str) {
            Some(existing) => existing.to_string(),
            None => {
                let generated = DocumentId::new().into_inner();
                let _ = map.insert("_id".to_string(), Value::String(generated.clone()));
                generated
            }
        };

        let body = Value::Object(map);
        let conn = self.pool.get()?;
        DocumentRepo::insert(&conn, collection, &id, &body)?;
        Ok(body)
    }

    /// Fetch one document.
    pub fn get_document(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let conn = self.pool.get()?;
        DocumentRepo::get(&conn, collection, id)
    }

    /// List documents with filters, sort, and pagination.
    pub fn list_documents(&self, collection: &str, opts: &ListOptions) -> Result<Vec<Value>> {
        let conn = self.pool.get()?;
        DocumentRepo::list(&conn, collection, opts)
    }

    /// Replace a document's fields, keeping its `_id`. Returns the updated
    /// body, or `None` if the document is absent.
    pub fn update_document(
        &self,
        collection: &str,
        id: &str,
        body: Value,
    ) -> Result<Option<Value>> {
        let Value::Object(mut map) = body else {
            return Err(StoreError::InvalidDocument(
                "document body must be a JSON object".into(),
            ));
        };
        let _ = map.insert("_id".to_string(), Value::String(id.to_string()));
        let body = Value::Object(map);

        let conn = self.pool.get()?;
        if DocumentRepo::update(&conn, collection, id, &body)? {
            Ok(Some(body))
        } else {
            Ok(None)
        }
    }

    /// Delete a document, returning its last body (`None` if absent).
    pub fn delete_document(&self, collection: &str, id: &str) -> Result<Option<Value>> {
        let conn = self.pool.get()?;
        DocumentRepo::delete(&conn, collection, id)
    }

    // ── Broadcast log ───────────────────────────────────────────────────

    /// Persist one broadcast event: allocate the next sequence id and append
    /// the payload, atomically. Returns the assigned id.
    pub fn append_event(&self, payload: &Value) -> Result<i64> {
        let conn = self.pool.get()?;
        let tx = conn.unchecked_transaction()?;
        let id = CounterRepo::next(&tx, BROADCAST_STREAM)?;
        BroadcastLogRepo::append(&tx, id, payload)?;
        tx.commit()?;
        debug!(id, "broadcast event persisted");
        Ok(id)
    }

    /// All broadcast events with `id > last_id`, ascending.
    pub fn events_since(&self, last_id: i64) -> Result<Vec<BroadcastEvent>> {
        let conn = self.pool.get()?;
        BroadcastLogRepo::since(&conn, last_id)
    }

    /// Highest persisted event id (0 when the log is empty).
    pub fn last_event_id(&self) -> Result<i64> {
        let conn = self.pool.get()?;
        BroadcastLogRepo::max_id(&conn)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
