//! Branded ID newtypes.
//!
//! Connection and document IDs are distinct newtype wrappers around `String`
//! so one can never be passed where the other is expected. All generated IDs
//! are UUID v7 (time-ordered).

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Generate a new UUID v7 string (time-ordered).
fn new_v7() -> String {
    Uuid::now_v7().to_string()
}

macro_rules! branded_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new random ID (UUID v7, time-ordered).
            #[must_use]
            pub fn new() -> Self {
                Self(new_v7())
            }

            /// Create from an existing string value.
            #[must_use]
            pub fn from_string(s: String) -> Self {
                Self(s)
            }

            /// Return the inner string as a slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume self and return the inner `String`.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

branded_id! {
    /// Identifies a live push connection for its lifetime.
    ConnectionId
}

branded_id! {
    /// Identifies a stored document within its collection.
    DocumentId
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_ids_are_unique() {
        let a = ConnectionId::new();
        let b = ConnectionId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn v7_ids_are_time_ordered() {
        let first = DocumentId::new();
        let second = DocumentId::new();
        // UUID v7 sorts lexicographically by creation time
        assert!(first.as_str() <= second.as_str());
    }

    #[test]
    fn from_string_round_trip() {
        let id = ConnectionId::from_string("conn_1".into());
        assert_eq!(id.as_str(), "conn_1");
        assert_eq!(id.into_inner(), "conn_1");
    }

    #[test]
    fn display_matches_inner() {
        let id = DocumentId::from("doc_9");
        assert_eq!(id.to_string(), "doc_9");
    }

    #[test]
    fn serde_is_transparent() {
        let id = ConnectionId::from("abc");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"abc\"");
        let back: ConnectionId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn usable_as_map_key() {
        let mut map = std::collections::HashMap::new();
        let _ = map.insert(ConnectionId::from("k"), 1);
        assert_eq!(map.get(&ConnectionId::from("k")), Some(&1));
    }
}
