//! `MirraServer` — Axum HTTP + WebSocket server.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::Router;
use axum::extract::State;
use axum::response::Json;
use axum::routing::get;
use mirra_core::EntityRegistry;
use mirra_store::Store;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::ServerConfig;
use crate::health::{self, HealthResponse};
use crate::rest::handlers;
use crate::shutdown::ShutdownCoordinator;
use crate::websocket::broadcaster::Broadcaster;
use crate::websocket::handler::ws_handler;
use crate::websocket::prober::run_prober;
use crate::websocket::registry::ConnectionRegistry;

/// Shared state accessible from Axum handlers.
#[derive(Clone)]
pub struct AppState {
    /// Document and event persistence.
    pub store: Arc<Store>,
    /// Durable event broadcaster.
    pub broadcaster: Arc<Broadcaster>,
    /// Live WebSocket connections.
    pub registry: Arc<ConnectionRegistry>,
    /// Declared entities.
    pub entities: Arc<EntityRegistry>,
    /// Per-connection outbound queue capacity.
    pub send_queue_capacity: usize,
    /// When the server started.
    pub start_time: Instant,
}

/// The main Mirra server.
pub struct MirraServer {
    config: ServerConfig,
    store: Arc<Store>,
    registry: Arc<ConnectionRegistry>,
    broadcaster: Arc<Broadcaster>,
    entities: Arc<EntityRegistry>,
    shutdown: Arc<ShutdownCoordinator>,
    start_time: Instant,
}

impl MirraServer {
    /// Create a new server over an opened store.
    pub fn new(config: ServerConfig, store: Arc<Store>) -> Self {
        let registry = Arc::new(ConnectionRegistry::new());
        let broadcaster = Arc::new(Broadcaster::new(Arc::clone(&registry), Arc::clone(&store)));
        let entities = Arc::new(EntityRegistry::from_defs(config.entities.clone()));
        Self {
            config,
            store,
            registry,
            broadcaster,
            entities,
            shutdown: Arc::new(ShutdownCoordinator::new()),
            start_time: Instant::now(),
        }
    }

    /// Build the Axum router with all routes.
    ///
    /// Static segments (`/health`, `/ws`, `/static`) take precedence over
    /// the `/{entity}` captures, so the two route families coexist.
    pub fn router(&self) -> Router {
        let state = AppState {
            store: Arc::clone(&self.store),
            broadcaster: Arc::clone(&self.broadcaster),
            registry: Arc::clone(&self.registry),
            entities: Arc::clone(&self.entities),
            send_queue_capacity: self.config.send_queue_capacity,
            start_time: self.start_time,
        };

        let mut router = Router::new()
            .route("/health", get(health_handler))
            .route("/ws", get(ws_handler))
            .route(
                "/{entity}",
                get(handlers::list_documents).post(handlers::create_document),
            )
            .route(
                "/{entity}/{id}",
                get(handlers::get_document)
                    .put(handlers::update_document)
                    .delete(handlers::delete_document),
            )
            .with_state(state);

        if let Some(dir) = &self.config.static_dir {
            let dir = PathBuf::from(dir);
            router = router
                .route_service("/", ServeFile::new(dir.join("index.html")))
                .nest_service("/static", ServeDir::new(dir));
        }

        router
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
    }

    /// Bind, spawn the liveness prober, and serve until shutdown.
    pub async fn serve(&self) -> std::io::Result<()> {
        let addr = format!("{}:{}", self.config.host, self.config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!(addr = %listener.local_addr()?, "server listening");

        let prober = tokio::spawn(run_prober(
            Arc::clone(&self.registry),
            Duration::from_secs(self.config.probe_interval_secs),
            self.shutdown.token(),
        ));

        let token = self.shutdown.token();
        axum::serve(listener, self.router())
            .with_graceful_shutdown(async move { token.cancelled().await })
            .await?;

        self.shutdown.graceful_shutdown(vec![prober], None).await;
        Ok(())
    }

    /// Get the broadcaster.
    pub fn broadcaster(&self) -> &Arc<Broadcaster> {
        &self.broadcaster
    }

    /// Get the shutdown coordinator.
    pub fn shutdown(&self) -> &Arc<ShutdownCoordinator> {
        &self.shutdown
    }

    /// Get the server configuration.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Get the connection registry.
    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }
}

/// GET /health
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let resp = health::health_check(state.start_time, state.registry.count());
    Json(resp)
}
