use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use adhdscreen_core::app::{build_state, spawn_session_pruner, Repositories};
use adhdscreen_core::auth::SessionStore;
use adhdscreen_core::repositories::MemoryStore;
use adhdscreen_core::scoring::load_first;
use adhdscreen_core::{web, AppConfig, Database, StoreKind};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StoreArg {
    Postgres,
    Memory,
}

#[derive(Parser, Debug, Clone)]
#[command(name = "adhdscreen")]
#[command(author, version, about = "ADHD screening service: questionnaire scoring with per-user result history")]
struct Args {
    /// Address the HTTP server binds to
    #[arg(long, env = "ADHD_BIND_ADDR", default_value = "0.0.0.0:5000")]
    bind_addr: SocketAddr,

    /// Postgres connection URL (required with --store postgres)
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Where users, results and logs live. "memory" is lost on restart.
    #[arg(long, value_enum, default_value = "postgres")]
    store: StoreArg,

    /// Model bundle paths, tried in the order given
    #[arg(
        long = "model-bundle",
        env = "ADHD_MODEL_BUNDLE",
        value_delimiter = ',',
        default_value = "model/bundle.json"
    )]
    model_bundles: Vec<PathBuf>,

    /// Include internal error details in responses (development only)
    #[arg(long, default_value = "false")]
    debug: bool,

    #[arg(long, env = "ADHD_SESSION_TTL_HOURS", default_value = "24")]
    session_ttl_hours: i64,

    #[arg(long, default_value = "5")]
    max_connections: u32,

    /// How many recent results the dashboard shows
    #[arg(long, default_value = "5")]
    dashboard_limit: i64,
}

impl Args {
    fn into_config(self) -> AppConfig {
        AppConfig {
            bind_addr: self.bind_addr,
            database_url: self.database_url,
            store: match self.store {
                StoreArg::Postgres => StoreKind::Postgres,
                StoreArg::Memory => StoreKind::Memory,
            },
            model_bundles: self.model_bundles,
            expose_internal_errors: self.debug,
            session_ttl_hours: self.session_ttl_hours,
            max_connections: self.max_connections,
            dashboard_limit: self.dashboard_limit,
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::from_default_env()
        .add_directive("adhdscreen=info".parse().unwrap_or_default());
    let sub = fmt().with_env_filter(filter).finish();
    if let Err(e) = tracing::subscriber::set_global_default(sub) {
        eprintln!("Failed to set global subscriber: {}", e);
    }
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    init_tracing();
    let config = Args::parse().into_config();
    info!(
        "ADHD screening service starting. store={:?}, bind={}, debug={}",
        config.store, config.bind_addr, config.expose_internal_errors
    );

    if let Err(e) = run(config).await {
        error!("Server error: {:?}", e);
        std::process::exit(1);
    }
    info!("Main finished. Goodbye!");
}

async fn run(config: AppConfig) -> anyhow::Result<()> {
    if config.session_ttl_hours <= 0 {
        bail!("--session-ttl-hours must be positive");
    }
    if config.dashboard_limit <= 0 {
        bail!("--dashboard-limit must be positive");
    }

    let repos = match config.store {
        StoreKind::Postgres => {
            let Some(url) = config.database_url.as_deref() else {
                bail!("--database-url (or DATABASE_URL) is required with --store postgres");
            };
            let db = Database::new(url, config.max_connections)
                .await
                .context("connecting to Postgres")?;
            db.migrate().await.context("applying migrations")?;
            Repositories::postgres(&db)
        }
        StoreKind::Memory => {
            warn!("Using the in-memory store; all data is lost on exit.");
            Repositories::memory(&MemoryStore::new())
        }
    };

    // A missing bundle disables scoring only; the rest of the service still runs.
    let model = load_first(&config.model_bundles);

    let sessions = Arc::new(SessionStore::new(chrono::Duration::hours(config.session_ttl_hours)));
    let _pruner = spawn_session_pruner(sessions.clone(), Duration::from_secs(15 * 60));

    let state = build_state(&config, model, repos, sessions);
    web::serve(config.bind_addr, web::router(state)).await?;
    Ok(())
}
