//! Server configuration.
//!
//! Loaded in three layers, matching priority order:
//! 1. Compiled defaults ([`ServerConfig::default`])
//! 2. JSON config file, if one exists at the given path
//! 3. `MIRRA_*` environment variable overrides

use std::path::Path;

use mirra_core::entity::{EntityDef, FieldType};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Configuration for the Mirra server.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Liveness probe interval in seconds.
    pub probe_interval_secs: u64,
    /// Per-connection outbound queue capacity (messages).
    pub send_queue_capacity: usize,
    /// Directory of static files to serve (index.html at `/`), if any.
    pub static_dir: Option<String>,
    /// Entities exposed by the REST layer.
    pub entities: Vec<EntityDef>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            probe_interval_secs: 30,
            send_queue_capacity: 64,
            static_dir: None,
            entities: default_entities(),
        }
    }
}

/// The entity set served when no config file declares its own.
fn default_entities() -> Vec<EntityDef> {
    vec![
        EntityDef::new("users")
            .field("name", FieldType::String)
            .field("age", FieldType::Integer),
        EntityDef::new("persons").field("name", FieldType::String),
        EntityDef::new("blahs")
            .field("a", FieldType::String)
            .field("b", FieldType::Integer)
            .field("c", FieldType::Boolean),
    ]
}

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read.
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    /// Config file is not valid JSON for [`ServerConfig`].
    #[error("invalid config file: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ServerConfig {
    /// Load configuration from an optional JSON file plus env overrides.
    ///
    /// A missing file is fine (defaults apply); an unreadable or malformed
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) if p.exists() => {
                debug!(path = %p.display(), "loading config file");
                let content = std::fs::read_to_string(p)?;
                serde_json::from_str(&content)?
            }
            _ => Self::default(),
        };
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply `MIRRA_*` environment variable overrides. Invalid values are
    /// silently ignored, falling back to the file/default value.
    pub fn apply_env_overrides(&mut self) {
        if let Some(v) = read_env("MIRRA_HOST") {
            self.host = v;
        }
        if let Some(v) = read_env_parsed::<u16>("MIRRA_PORT") {
            self.port = v;
        }
        if let Some(v) = read_env_parsed::<u64>("MIRRA_PROBE_INTERVAL_SECS").filter(|v| *v >= 1) {
            self.probe_interval_secs = v;
        }
        if let Some(v) = read_env("MIRRA_STATIC_DIR") {
            self.static_dir = Some(v);
        }
    }
}

fn read_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn read_env_parsed<T: std::str::FromStr>(name: &str) -> Option<T> {
    read_env(name)?.parse().ok()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
