// src/config.rs

use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKind {
    Postgres,
    /// Non-durable; everything is lost on restart.
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub database_url: Option<String>,
    pub store: StoreKind,
    /// Tried in order at startup; the first bundle that loads is used.
    pub model_bundles: Vec<PathBuf>,
    /// Show internal error text to users. Development only.
    pub expose_internal_errors: bool,
    pub session_ttl_hours: i64,
    pub max_connections: u32,
    pub dashboard_limit: i64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            database_url: None,
            store: StoreKind::Postgres,
            model_bundles: vec![PathBuf::from("model/bundle.json")],
            expose_internal_errors: false,
            session_ttl_hours: 24,
            max_connections: 5,
            dashboard_limit: 5,
        }
    }
}
