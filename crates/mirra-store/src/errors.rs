//! Error types for the persistence layer.
//!
//! [`StoreError`] is returned by every store operation. Store failures are
//! retryable from the caller's point of view: a failed append or query never
//! takes the process down, it is surfaced to whichever request or broadcast
//! triggered it.

use thiserror::Error;

/// Errors that can occur during store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// JSON serialization/deserialization error.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// Requested document was not found in its collection.
    #[error("document not found: {collection}/{id}")]
    DocumentNotFound {
        /// Collection name.
        collection: String,
        /// Document ID.
        id: String,
    },

    /// Insert collided with an existing document ID.
    #[error("document already exists: {collection}/{id}")]
    DocumentExists {
        /// Collection name.
        collection: String,
        /// Document ID.
        id: String,
    },

    /// A document body that must be a JSON object was something else.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// A store operation handed to a background worker never completed.
    #[error("store task failed: {0}")]
    Task(String),
}

/// Convenience type alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sqlite_error_display() {
        let err = StoreError::Sqlite(rusqlite::Error::QueryReturnedNoRows);
        assert!(err.to_string().contains("sqlite error"));
    }

    #[test]
    fn migration_error_display() {
        let err = StoreError::Migration {
            message: "v001 failed".into(),
        };
        assert_eq!(err.to_string(), "migration error: v001 failed");
    }

    #[test]
    fn document_not_found_display() {
        let err = StoreError::DocumentNotFound {
            collection: "users".into(),
            id: "u1".into(),
        };
        assert_eq!(err.to_string(), "document not found: users/u1");
    }

    #[test]
    fn task_error_display() {
        let err = StoreError::Task("worker panicked".into());
        assert_eq!(err.to_string(), "store task failed: worker panicked");
    }

    #[test]
    fn from_rusqlite_error() {
        let err: StoreError = rusqlite::Error::QueryReturnedNoRows.into();
        assert!(matches!(err, StoreError::Sqlite(_)));
    }

    #[test]
    fn from_serde_error() {
        let serde_err = serde_json::from_str::<String>("bad").unwrap_err();
        let err: StoreError = serde_err.into();
        assert!(matches!(err, StoreError::Serde(_)));
    }
}
