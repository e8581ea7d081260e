//! # mirra-store
//!
//! `SQLite` persistence layer for the Mirra backend.
//!
//! Three storage concerns live here:
//!
//! - **Documents**: opaque JSON bodies per entity collection, with equality
//!   filters, sorting, and pagination over declared fields
//! - **Broadcast log**: append-only event log, queryable by `id > N` for
//!   client catch-up after disconnect
//! - **Sequence counters**: durable per-stream counters backing the
//!   broadcast log's monotonic IDs
//!
//! All access goes through an `r2d2` pool ([`ConnectionPool`]) with WAL mode
//! and a busy timeout set per connection. The [`Store`] facade owns the pool
//! and is the type handlers are given.

#![deny(unsafe_code)]

pub mod connection;
pub mod errors;
pub mod migrations;
pub mod repositories;
pub mod store;

pub use connection::{ConnectionConfig, ConnectionPool, PooledConnection, new_file, new_in_memory};
pub use errors::{Result, StoreError};
pub use migrations::run_migrations;
pub use repositories::broadcast_log::BroadcastEvent;
pub use repositories::documents::{ListOptions, SortField};
pub use store::{BROADCAST_STREAM, Store};
