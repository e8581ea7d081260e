//! WebSocket layer: connection state, registry, liveness prober,
//! broadcaster, and the per-socket message loop.

pub mod broadcaster;
pub mod connection;
pub mod handler;
pub mod prober;
pub mod registry;

pub use broadcaster::Broadcaster;
pub use connection::ClientConnection;
pub use handler::ws_handler;
pub use prober::run_prober;
pub use registry::ConnectionRegistry;
