//! HTTP surface of the review deployer: every route is served at the root
//! and again under `/api`.

use std::sync::Arc;

use axum::{Router, middleware};
use site_connector::InMemorySiteStore;
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::{error, info};

pub mod core;
pub mod error_handler;
pub mod middleware_layer;
pub mod routes;

#[cfg(test)]
mod router_tests;

use crate::{
    core::app_state::{AppConfig, AppState},
    error_handler::AppError,
    middleware_layer::request_context::{json_error_mapper, request_context},
};

/// Builds the application router around shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    let routes = routes::routes();
    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        .layer(middleware::from_fn(json_error_mapper))
        .layer(middleware::from_fn(request_context))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Loads configuration, binds the listener and serves until Ctrl+C.
pub async fn start() -> Result<(), AppError> {
    let cfg = AppConfig::from_env()?;
    let addr = cfg.bind_addr.clone();
    let state = AppState::new(cfg, Arc::new(InMemorySiteStore::new()))?;

    let listener = TcpListener::bind(&addr).await.map_err(AppError::Bind)?;
    info!(%addr, "server listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(AppError::Server)?;

    info!("server stopped");
    Ok(())
}

/// Resolves when Ctrl+C is pressed.
async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
