// src/web/mod.rs

pub mod error;
pub mod extract;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use axum_server::Handle;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::{error, info};

use crate::Error;
use crate::services::{AccountService, ScreeningService};

/// Shared by every request. Services are immutable after startup.
#[derive(Clone)]
pub struct AppState {
    pub screening: Arc<ScreeningService>,
    pub accounts: Arc<AccountService>,
    pub expose_internal_errors: bool,
    pub session_ttl_secs: i64,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        .route("/logout", get(handlers::logout).post(handlers::logout))
        .route("/checklist", get(handlers::checklist_form).post(handlers::checklist_submit))
        .route("/results/{result_id}", get(handlers::result_view))
        .route("/dashboard", get(handlers::dashboard))
        .route("/profile", get(handlers::profile))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
}

/// Serves `app` until Ctrl-C, then drains in-flight requests.
pub async fn serve(addr: SocketAddr, app: Router) -> Result<(), Error> {
    let handle = Handle::new();
    let handle_clone = handle.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Could not listen for shutdown signal: {}", e);
            return;
        }
        info!("Shutdown requested, draining connections.");
        handle_clone.graceful_shutdown(Some(Duration::from_secs(10)));
    });

    info!("ADHD screening service listening on http://{}", addr);
    axum_server::Server::bind(addr)
        .handle(handle)
        .serve(app.into_make_service())
        .await?;
    info!("HTTP server shut down.");
    Ok(())
}
