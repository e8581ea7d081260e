//! Broadcast log repository — the append-only event log behind catch-up.
//!
//! Events are immutable once persisted and are never deleted; the log grows
//! without bound by design. The only read path is "everything after N",
//! which is what a reconnecting client asks for.

use rusqlite::{Connection, params};
use serde_json::Value;

use crate::errors::Result;

/// A persisted broadcast event: opaque payload plus its assigned sequence id.
#[derive(Clone, Debug, PartialEq)]
pub struct BroadcastEvent {
    /// Monotonic sequence id assigned at persistence time.
    pub id: i64,
    /// The broadcast payload as it was handed to the broadcaster.
    pub payload: Value,
}

impl BroadcastEvent {
    /// The payload with the sequence id stamped in, as delivered to clients.
    pub fn to_value(&self) -> Value {
        let mut value = self.payload.clone();
        if let Value::Object(map) = &mut value {
            let _ = map.insert("id".to_string(), Value::from(self.id));
        }
        value
    }
}

/// Broadcast log repository — stateless, every method takes `&Connection`.
pub struct BroadcastLogRepo;

impl BroadcastLogRepo {
    /// Append an event that already carries its allocated id.
    pub fn append(conn: &Connection, id: i64, payload: &Value) -> Result<()> {
        let payload_str = serde_json::to_string(payload)?;
        let _ = conn.execute(
            "INSERT INTO broadcast_log (id, payload, created_at)
             VALUES (?1, ?2, datetime('now'))",
            params![id, payload_str],
        )?;
        Ok(())
    }

    /// All events with `id > last_id`, ascending.
    pub fn since(conn: &Connection, last_id: i64) -> Result<Vec<BroadcastEvent>> {
        let mut stmt = conn.prepare(
            "SELECT id, payload FROM broadcast_log WHERE id > ?1 ORDER BY id ASC",
        )?;
        let rows = stmt
            .query_map(params![last_id], |row| {
                let id: i64 = row.get(0)?;
                let payload_str: String = row.get(1)?;
                Ok((id, payload_str))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, payload_str)| {
                let payload = serde_json::from_str(&payload_str)?;
                Ok(BroadcastEvent { id, payload })
            })
            .collect()
    }

    /// Highest persisted id, or 0 if the log is empty.
    pub fn max_id(conn: &Connection) -> Result<i64> {
        let max: i64 = conn.query_row(
            "SELECT COALESCE(MAX(id), 0) FROM broadcast_log",
            [],
            |row| row.get(0),
        )?;
        Ok(max)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;
    use serde_json::json;

    fn open() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        let _ = run_migrations(&conn).unwrap();
        conn
    }

    #[test]
    fn append_and_read_back() {
        let conn = open();
        let payload = json!({"event": "new_user", "user": {"name": "Alice", "age": 30}});
        BroadcastLogRepo::append(&conn, 1, &payload).unwrap();

        let events = BroadcastLogRepo::since(&conn, 0).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].id, 1);
        assert_eq!(events[0].payload, payload);
    }

    #[test]
    fn since_is_strictly_greater() {
        let conn = open();
        for id in 1..=5 {
            BroadcastLogRepo::append(&conn, id, &json!({"n": id})).unwrap();
        }

        let events = BroadcastLogRepo::since(&conn, 3).unwrap();
        let ids: Vec<i64> = events.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![4, 5]);
    }

    #[test]
    fn since_orders_ascending_regardless_of_insert_order() {
        let conn = open();
        for id in [3, 1, 2] {
            BroadcastLogRepo::append(&conn, id, &json!({"n": id})).unwrap();
        }

        let ids: Vec<i64> = BroadcastLogRepo::since(&conn, 0)
            .unwrap()
            .iter()
            .map(|e| e.id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[test]
    fn since_is_idempotent() {
        let conn = open();
        BroadcastLogRepo::append(&conn, 1, &json!({"a": 1})).unwrap();
        BroadcastLogRepo::append(&conn, 2, &json!({"a": 2})).unwrap();

        let first = BroadcastLogRepo::since(&conn, 0).unwrap();
        let second = BroadcastLogRepo::since(&conn, 0).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn since_past_end_is_empty() {
        let conn = open();
        BroadcastLogRepo::append(&conn, 1, &json!({})).unwrap();
        assert!(BroadcastLogRepo::since(&conn, 1).unwrap().is_empty());
        assert!(BroadcastLogRepo::since(&conn, 99).unwrap().is_empty());
    }

    #[test]
    fn max_id_of_empty_log_is_zero() {
        let conn = open();
        assert_eq!(BroadcastLogRepo::max_id(&conn).unwrap(), 0);
    }

    #[test]
    fn max_id_tracks_highest() {
        let conn = open();
        BroadcastLogRepo::append(&conn, 7, &json!({})).unwrap();
        BroadcastLogRepo::append(&conn, 3, &json!({})).unwrap();
        assert_eq!(BroadcastLogRepo::max_id(&conn).unwrap(), 7);
    }

    #[test]
    fn to_value_stamps_id() {
        let event = BroadcastEvent {
            id: 42,
            payload: json!({"event": "update_user"}),
        };
        let value = event.to_value();
        assert_eq!(value["id"], 42);
        assert_eq!(value["event"], "update_user");
    }

    #[test]
    fn to_value_leaves_payload_untouched() {
        let event = BroadcastEvent {
            id: 1,
            payload: json!({"k": "v"}),
        };
        let _ = event.to_value();
        assert_eq!(event.payload, json!({"k": "v"}));
    }
}
