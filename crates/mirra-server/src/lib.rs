//! # mirra-server
//!
//! Axum HTTP + WebSocket server for the Mirra backend.
//!
//! - **REST layer**: generic CRUD handlers over declared entities, each
//!   mutation feeding the broadcaster
//! - **WebSocket layer**: connection registry, liveness prober, broadcaster
//!   with durable sequence-numbered replay, and the per-socket message loop
//! - **Lifecycle**: config loading, health endpoint, graceful shutdown

#![deny(unsafe_code)]

pub mod config;
pub mod errors;
pub mod health;
pub mod rest;
pub mod server;
pub mod shutdown;
pub mod websocket;

pub use config::ServerConfig;
pub use server::{AppState, MirraServer};
