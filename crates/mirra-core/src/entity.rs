//! Explicit entity declarations.
//!
//! The REST layer exposes one CRUD surface per entity. Instead of reflecting
//! over model types at runtime, each entity declares its name and typed
//! fields up front; the declarations drive query-filter parsing and nothing
//! else — document bodies themselves stay opaque JSON.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Type of a declared entity field, used to parse filter query parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 text.
    String,
    /// 64-bit signed integer.
    Integer,
    /// Boolean (`true`/`false`/`1`/`0` accepted in query params).
    Boolean,
}

impl FieldType {
    /// Parse a raw query-parameter value into a JSON value of this type.
    ///
    /// Returns `None` if the raw value does not parse as the declared type.
    pub fn parse(self, raw: &str) -> Option<Value> {
        match self {
            Self::String => Some(Value::String(raw.to_string())),
            Self::Integer => raw.parse::<i64>().ok().map(Value::from),
            Self::Boolean => match raw {
                "true" | "1" => Some(Value::Bool(true)),
                "false" | "0" => Some(Value::Bool(false)),
                _ => None,
            },
        }
    }
}

/// A single declared field.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name as it appears in document bodies and query params.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
}

/// Declaration of one entity collection.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityDef {
    /// Collection name; also the URL path segment (`/{name}`).
    pub name: String,
    /// Declared fields, in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl EntityDef {
    /// Create an entity with no fields declared yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    /// Declare a field (builder style).
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, field_type: FieldType) -> Self {
        self.fields.push(FieldDef {
            name: name.into(),
            field_type,
        });
        self
    }

    /// Look up the declared type of a field.
    pub fn field_type(&self, name: &str) -> Option<FieldType> {
        self.fields
            .iter()
            .find(|f| f.name == name)
            .map(|f| f.field_type)
    }
}

/// Registry of all entities served by the backend, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct EntityRegistry {
    entities: HashMap<String, EntityDef>,
}

impl EntityRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from declarations. Later duplicates replace earlier.
    pub fn from_defs(defs: Vec<EntityDef>) -> Self {
        let mut registry = Self::new();
        for def in defs {
            registry.register(def);
        }
        registry
    }

    /// Register an entity.
    pub fn register(&mut self, def: EntityDef) {
        let _ = self.entities.insert(def.name.clone(), def);
    }

    /// Look up an entity by name.
    pub fn get(&self, name: &str) -> Option<&EntityDef> {
        self.entities.get(name)
    }

    /// Number of registered entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn users() -> EntityDef {
        EntityDef::new("users")
            .field("name", FieldType::String)
            .field("age", FieldType::Integer)
            .field("active", FieldType::Boolean)
    }

    #[test]
    fn field_lookup() {
        let def = users();
        assert_eq!(def.field_type("name"), Some(FieldType::String));
        assert_eq!(def.field_type("age"), Some(FieldType::Integer));
        assert_eq!(def.field_type("missing"), None);
    }

    #[test]
    fn parse_string_always_succeeds() {
        assert_eq!(
            FieldType::String.parse("Alice"),
            Some(Value::String("Alice".into()))
        );
        assert_eq!(FieldType::String.parse("42"), Some(Value::String("42".into())));
    }

    #[test]
    fn parse_integer() {
        assert_eq!(FieldType::Integer.parse("30"), Some(Value::from(30)));
        assert_eq!(FieldType::Integer.parse("-7"), Some(Value::from(-7)));
        assert_eq!(FieldType::Integer.parse("abc"), None);
        assert_eq!(FieldType::Integer.parse("3.5"), None);
    }

    #[test]
    fn parse_boolean() {
        assert_eq!(FieldType::Boolean.parse("true"), Some(Value::Bool(true)));
        assert_eq!(FieldType::Boolean.parse("0"), Some(Value::Bool(false)));
        assert_eq!(FieldType::Boolean.parse("yes"), None);
    }

    #[test]
    fn registry_lookup() {
        let registry = EntityRegistry::from_defs(vec![users(), EntityDef::new("persons")]);
        assert_eq!(registry.len(), 2);
        assert!(registry.get("users").is_some());
        assert!(registry.get("unknown").is_none());
    }

    #[test]
    fn duplicate_registration_replaces() {
        let mut registry = EntityRegistry::new();
        registry.register(EntityDef::new("users"));
        registry.register(users());
        assert_eq!(registry.len(), 1);
        assert_eq!(
            registry.get("users").unwrap().field_type("age"),
            Some(FieldType::Integer)
        );
    }

    #[test]
    fn entity_def_deserializes_from_json() {
        let json = r#"{"name":"blahs","fields":[
            {"name":"a","type":"string"},
            {"name":"b","type":"integer"},
            {"name":"c","type":"boolean"}
        ]}"#;
        let def: EntityDef = serde_json::from_str(json).unwrap();
        assert_eq!(def.name, "blahs");
        assert_eq!(def.field_type("c"), Some(FieldType::Boolean));
    }

    #[test]
    fn fields_default_to_empty() {
        let def: EntityDef = serde_json::from_str(r#"{"name":"bare"}"#).unwrap();
        assert!(def.fields.is_empty());
    }
}
