//! # mirra-core
//!
//! Foundation crate for the Mirra real-time document backend.
//!
//! Provides:
//! - **Entity declarations**: explicit per-entity field maps used by the REST
//!   layer for typed query filters (no runtime reflection)
//! - **Branded IDs**: UUID v7 newtypes for connections and documents
//! - **Logging**: `tracing` subscriber initialization

#![deny(unsafe_code)]

pub mod entity;
pub mod ids;
pub mod logging;

pub use entity::{EntityDef, EntityRegistry, FieldDef, FieldType};
pub use ids::{ConnectionId, DocumentId};
