// src/app.rs
//
// Wires repositories, the model handle and the services into an `AppState`.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use adhdscreen_common::traits::{ActivityLogRepository, ResultRepository, UserRepository};
use crate::auth::SessionStore;
use crate::config::AppConfig;
use crate::db::Database;
use crate::repositories::postgres::{
    PostgresActivityLogRepository, PostgresResultRepository, PostgresUserRepository,
};
use crate::repositories::MemoryStore;
use crate::scoring::ModelHandle;
use crate::services::{AccountService, ActivityLog, ScreeningService};
use crate::web::AppState;

#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub results: Arc<dyn ResultRepository>,
    pub logs: Arc<dyn ActivityLogRepository>,
}

impl Repositories {
    pub fn postgres(db: &Database) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(db.pool().clone())),
            results: Arc::new(PostgresResultRepository::new(db.pool().clone())),
            logs: Arc::new(PostgresActivityLogRepository::new(db.pool().clone())),
        }
    }

    pub fn memory(store: &MemoryStore) -> Self {
        Self {
            users: Arc::new(store.clone()),
            results: Arc::new(store.clone()),
            logs: Arc::new(store.clone()),
        }
    }
}

pub fn build_state(
    config: &AppConfig,
    model: ModelHandle,
    repos: Repositories,
    sessions: Arc<SessionStore>,
) -> AppState {
    let activity = ActivityLog::new(repos.logs.clone());
    let screening = ScreeningService::new(
        model,
        repos.results.clone(),
        activity.clone(),
        config.dashboard_limit,
    );
    let accounts = AccountService::new(repos.users.clone(), sessions, activity);

    AppState {
        screening: Arc::new(screening),
        accounts: Arc::new(accounts),
        expose_internal_errors: config.expose_internal_errors,
        session_ttl_secs: config.session_ttl_hours * 3600,
    }
}

/// Periodically drops idle sessions that nobody came back for.
pub fn spawn_session_pruner(sessions: Arc<SessionStore>, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            let before = sessions.len();
            sessions.prune();
            debug!("session prune: {} -> {}", before, sessions.len());
        }
    })
}
