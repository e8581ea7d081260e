//! Document repository — opaque JSON bodies per entity collection.
//!
//! Bodies are stored as JSON text and queried with `json_extract`, so
//! equality filters and sorting work on any declared field without
//! per-entity tables. Field names reaching the SQL builder have already
//! been validated against the entity declaration by the REST layer;
//! [`valid_field`] is a second line of defense.

use std::fmt::Write as _;

use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde_json::Value;

use crate::errors::{Result, StoreError};

/// One sort clause: field name plus direction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SortField {
    /// Field to sort on.
    pub field: String,
    /// Descending when true.
    pub descending: bool,
}

impl SortField {
    /// Parse a comma-separated sort expression (`"name,-age"`).
    /// A `-` prefix means descending. Empty segments are skipped.
    pub fn parse_list(raw: &str) -> Vec<Self> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != "-")
            .map(|s| {
                s.strip_prefix('-').map_or_else(
                    || Self {
                        field: s.to_string(),
                        descending: false,
                    },
                    |stripped| Self {
                        field: stripped.to_string(),
                        descending: true,
                    },
                )
            })
            .collect()
    }
}

/// Options for listing documents.
#[derive(Clone, Debug)]
pub struct ListOptions {
    /// Number of documents to skip.
    pub skip: i64,
    /// Maximum number of documents to return.
    pub limit: i64,
    /// Sort clauses, applied in order.
    pub sort: Vec<SortField>,
    /// Equality filters on declared fields (already typed).
    pub filters: Vec<(String, Value)>,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 50,
            sort: Vec::new(),
            filters: Vec::new(),
        }
    }
}

/// Document repository — stateless, every method takes `&Connection`.
pub struct DocumentRepo;

impl DocumentRepo {
    /// Insert a document body under `(collection, id)`. An existing document
    /// with the same key is a [`StoreError::DocumentExists`].
    pub fn insert(conn: &Connection, collection: &str, id: &str, body: &Value) -> Result<()> {
        let body_str = serde_json::to_string(body)?;
        let result = conn.execute(
            "INSERT INTO documents (collection, id, body, created_at, updated_at)
             VALUES (?1, ?2, ?3, datetime('now'), datetime('now'))",
            params![collection, id, body_str],
        );
        match result {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(StoreError::DocumentExists {
                    collection: collection.to_string(),
                    id: id.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Fetch a single document body.
    pub fn get(conn: &Connection, collection: &str, id: &str) -> Result<Option<Value>> {
        let body_str: Option<String> = conn
            .query_row(
                "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
                |row| row.get(0),
            )
            .optional()?;
        match body_str {
            Some(s) => Ok(Some(serde_json::from_str(&s)?)),
            None => Ok(None),
        }
    }

    /// List document bodies with filters, sort, and pagination.
    pub fn list(conn: &Connection, collection: &str, opts: &ListOptions) -> Result<Vec<Value>> {
        let mut sql = String::from("SELECT body FROM documents WHERE collection = ?1");
        let mut bindings: Vec<SqlValue> = vec![SqlValue::Text(collection.to_string())];

        for (field, value) in &opts.filters {
            valid_field(field)?;
            let _ = write!(
                sql,
                " AND json_extract(body, '$.{field}') = ?{}",
                bindings.len() + 1
            );
            bindings.push(bind_value(value)?);
        }

        if opts.sort.is_empty() {
            sql.push_str(" ORDER BY id ASC");
        } else {
            sql.push_str(" ORDER BY ");
            for (i, clause) in opts.sort.iter().enumerate() {
                valid_field(&clause.field)?;
                if i > 0 {
                    sql.push_str(", ");
                }
                let direction = if clause.descending { "DESC" } else { "ASC" };
                let _ = write!(sql, "json_extract(body, '$.{}') {direction}", clause.field);
            }
        }

        let _ = write!(sql, " LIMIT {} OFFSET {}", opts.limit, opts.skip);

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(bindings), |row| {
                row.get::<_, String>(0)
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|s| serde_json::from_str(&s).map_err(StoreError::from))
            .collect()
    }

    /// Replace a document body. Returns `false` if the document is absent.
    pub fn update(conn: &Connection, collection: &str, id: &str, body: &Value) -> Result<bool> {
        let body_str = serde_json::to_string(body)?;
        let changed = conn.execute(
            "UPDATE documents SET body = ?3, updated_at = datetime('now')
             WHERE collection = ?1 AND id = ?2",
            params![collection, id, body_str],
        )?;
        Ok(changed > 0)
    }

    /// Delete a document, returning its last body (None if absent).
    pub fn delete(conn: &Connection, collection: &str, id: &str) -> Result<Option<Value>> {
        let existing = Self::get(conn, collection, id)?;
        if existing.is_some() {
            let _ = conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection, id],
            )?;
        }
        Ok(existing)
    }
}

/// Reject field names that could escape the `json_extract` path literal.
fn valid_field(field: &str) -> Result<()> {
    let ok = !field.is_empty()
        && field
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidDocument(format!(
            "invalid field name: {field:?}"
        )))
    }
}

/// Convert a typed filter value into a `SQLite` binding that compares
/// correctly against `json_extract` output (booleans extract as 0/1).
fn bind_value(value: &Value) -> Result<SqlValue> {
    match value {
        Value::String(s) => Ok(SqlValue::Text(s.clone())),
        Value::Bool(b) => Ok(SqlValue::Integer(i64::from(*b))),
        Value::Number(n) => n.as_i64().map(SqlValue::Integer).ok_or_else(|| {
            StoreError::InvalidDocument(format!("non-integer filter value: {n}"))
        }),
        other => Err(StoreError::InvalidDocument(format!(
            "unsupported filter value: {other}"
        ))),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
