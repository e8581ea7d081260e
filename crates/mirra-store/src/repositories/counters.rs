//! Sequence counter repository — the allocator behind broadcast event IDs.
//!
//! Allocation is a single upsert-increment statement, so concurrent callers
//! on the same stream are serialized by `SQLite` itself: no two calls ever
//! observe the same value, and values are dense except when a crash lands
//! between allocation and use of the allocated ID.

use rusqlite::{Connection, OptionalExtension, params};

use crate::errors::Result;

/// Counter repository — stateless, every method takes `&Connection`.
pub struct CounterRepo;

impl CounterRepo {
    /// Allocate the next value for `stream`, creating the counter row on
    /// first use. The first allocation returns 1.
    pub fn next(conn: &Connection, stream: &str) -> Result<i64> {
        let seq = conn.query_row(
            "INSERT INTO counters (name, seq) VALUES (?1, 1)
             ON CONFLICT (name) DO UPDATE SET seq = seq + 1
             RETURNING seq",
            params![stream],
            |row| row.get(0),
        )?;
        Ok(seq)
    }

    /// Current value of a stream's counter without allocating (0 if the
    /// stream has never allocated).
    pub fn current(conn: &Connection, stream: &str) -> Result<i64> {
        let seq: Option<i64> = conn
            .query_row(
                "SELECT seq FROM counters WHERE name = ?1",
                params![stream],
                |row| row.get(0),
            )
            .optional()?;
        Ok(seq.unwrap_or(0))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
