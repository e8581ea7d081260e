//! # mirrad
//!
//! Mirra backend daemon — opens the store, wires up the server, and runs
//! until interrupted.

#![deny(unsafe_code)]

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use mirra_core::logging::init_subscriber;
use mirra_server::{MirraServer, ServerConfig};
use mirra_store::{ConnectionConfig, Store};
use tracing::info;

/// Mirra backend server.
#[derive(Parser, Debug)]
#[command(name = "mirrad", about = "Mirra backend server")]
struct Cli {
    /// Host to bind.
    #[arg(long)]
    host: Option<String>,

    /// Port to bind (0 for auto-assign).
    #[arg(long)]
    port: Option<u16>,

    /// Path to the `SQLite` database.
    #[arg(long)]
    db_path: Option<PathBuf>,

    /// Path to a JSON config file.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of static files to serve.
    #[arg(long)]
    static_dir: Option<PathBuf>,

    /// Log filter (e.g. `info`, `mirra_server=debug`).
    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn default_db_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
        PathBuf::from(home).join(".mirra").join("mirra.db")
    }
}

fn ensure_parent_dir(path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_subscriber(&args.log_level);

    let mut config = ServerConfig::load(args.config.as_deref())
        .context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(dir) = args.static_dir {
        config.static_dir = Some(dir.to_string_lossy().into_owned());
    }

    let db_path = args.db_path.unwrap_or_else(Cli::default_db_path);
    ensure_parent_dir(&db_path)?;
    let db_str = db_path.to_string_lossy();
    let store = Arc::new(
        Store::open(&db_str, &ConnectionConfig::default()).context("Failed to open database")?,
    );
    info!(db = %db_path.display(), "store opened");

    let server = MirraServer::new(config, store);

    let shutdown = Arc::clone(server.shutdown());
    drop(tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            shutdown.shutdown();
        }
    }));

    server.serve().await.context("server error")?;
    info!("shutdown complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn cli_defaults() {
        let cli = Cli::parse_from(["mirrad"]);
        assert_eq!(cli.host, None);
        assert_eq!(cli.port, None);
        assert_eq!(cli.db_path, None);
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn cli_custom_port_and_host() {
        let cli = Cli::parse_from(["mirrad", "--host", "0.0.0.0", "--port", "8080"]);
        assert_eq!(cli.host.as_deref(), Some("0.0.0.0"));
        assert_eq!(cli.port, Some(8080));
    }

    #[test]
    fn cli_db_path() {
        let cli = Cli::parse_from(["mirrad", "--db-path", "/tmp/test.db"]);
        assert_eq!(cli.db_path, Some(PathBuf::from("/tmp/test.db")));
    }

    #[test]
    fn default_db_path_under_mirra_dir() {
        let path = Cli::default_db_path();
        assert!(path.to_string_lossy().contains(".mirra"));
        assert!(path.to_string_lossy().ends_with("mirra.db"));
    }

    #[test]
    fn ensure_parent_dir_creates_nested() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("test.db");
        ensure_parent_dir(&path).unwrap();
        assert!(path.parent().unwrap().exists());
    }

    #[test]
    fn store_created_on_first_open() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("new.db");
        assert!(!db_path.exists());

        let db_str = db_path.to_string_lossy();
        let store = Store::open(&db_str, &ConnectionConfig::default()).unwrap();
        assert_eq!(store.last_event_id().unwrap(), 0);
        assert!(db_path.exists());
    }
}
