//! Generic REST CRUD layer over declared entities.
//!
//! All routes are entity-shaped (`/{entity}`, `/{entity}/{id}`) and resolve
//! the entity against the declaration registry at request time; undeclared
//! entities are 404. Every successful mutation is handed to the broadcaster.

pub mod handlers;
pub mod query;

pub use query::parse_list_options;
