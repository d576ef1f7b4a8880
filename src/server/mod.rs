//! HTTP API Module
//!
//! JSON front end over the action catalog for browser clients.
//!
//! - `GET /health`
//! - `GET /api/v1/actions[?classification=query]`
//! - `GET /api/v1/actions/:token`
//! - `POST /api/v1/actions/:token/invoke` with `{"arguments": {"binding_name": "value"}}`

pub mod dto;
pub mod error;
pub mod handlers;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Extension, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::action::Catalog;
use crate::backend::ConnectionProvider;
use crate::config::HttpConfig;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<Catalog>,
    pub provider: Arc<dyn ConnectionProvider>,
}

impl AppState {
    pub fn new(catalog: Catalog, provider: Arc<dyn ConnectionProvider>) -> Self {
        AppState {
            catalog: Arc::new(catalog),
            provider,
        }
    }
}

/// Creates the Axum router
pub fn create_router(state: AppState, config: &HttpConfig) -> Router {
    let cors = if !config.cors_origins.is_empty() {
        // Explicit origins configured: restrict to those
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|s| {
                let parsed = s.parse();
                if parsed.is_err() {
                    tracing::warn!(origin = %s, "invalid_cors_origin_ignored");
                }
                parsed.ok()
            })
            .collect();
        Some(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else if config.cors_allow_all {
        Some(CorsLayer::permissive())
    } else {
        // Same-origin only
        None
    };

    let mut app = Router::new()
        .route("/health", get(handlers::health))
        .route("/api/v1/actions", get(handlers::list_actions))
        .route("/api/v1/actions/:token", get(handlers::get_action))
        .route("/api/v1/actions/:token/invoke", post(handlers::invoke_action))
        .layer(Extension(state))
        .layer(TraceLayer::new_for_http());

    if let Some(cors) = cors {
        app = app.layer(cors);
    }

    app
}

/// Serve until SIGINT or SIGTERM
pub async fn start_http_server(
    state: AppState,
    config: &HttpConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = create_router(state, config);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    println!("HTTP server listening on: http://{addr}");
    tracing::info!(%addr, "http_server_started");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("http_server_stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => { eprintln!("\nReceived SIGINT, shutting down..."); }
                    _ = sigterm.recv() => { eprintln!("Received SIGTERM, shutting down..."); }
                }
            }
            Err(e) => {
                eprintln!("WARNING: SIGTERM handler unavailable: {e}");
                let _ = ctrl_c.await;
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = ctrl_c.await;
        eprintln!("\nReceived SIGINT, shutting down...");
    }
}
