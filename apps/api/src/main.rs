mod config;
mod errors;
mod interview;
mod llm_client;
mod routes;
mod session;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::GreenPtClient;
use crate::routes::build_router;
use crate::session::manager::SessionManager;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Greenroom API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize the upstream client
    let backend = Arc::new(GreenPtClient::new(&config));
    info!(
        "GreenPT client initialized (model: {}, stt: {})",
        config.greenpt_model, config.greenpt_stt_model
    );

    // Session registry: one instance, injected through state
    let sessions = SessionManager::new();
    info!(
        "Session manager initialized ({} questions per interview)",
        config.interview_questions
    );

    let cors = build_cors_layer(&config.cors_origin)?;

    let state = AppState {
        sessions,
        backend,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// CORS for the browser client: `*` opens everything up (demo default), any
/// other value is taken as the single allowed origin.
fn build_cors_layer(origin: &str) -> Result<CorsLayer> {
    if origin == "*" {
        return Ok(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any));
    }

    let origin: HeaderValue = origin
        .parse()
        .with_context(|| format!("CORS_ORIGIN '{origin}' is not a valid origin"))?;
    Ok(CorsLayer::new()
        .allow_origin(origin)
        .allow_methods(Any)
        .allow_headers(Any))
}
