mod codec;
mod config;
mod editor;
mod errors;
mod ingest;
mod llm_client;
mod routes;
mod session;
mod state;
mod tailoring;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::llm_client::OllamaClient;
use crate::routes::build_router;
use crate::session::SessionStore;
use crate::state::AppState;

/// How often expired sessions are swept.
const SESSION_SWEEP_PERIOD: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_CRATE_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Tailor API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize LLM client
    let ollama = OllamaClient::new(config.ollama_url(), config.llm_timeout_secs)?;
    info!(
        "LLM client initialized (server: {}, default model: {})",
        ollama.base_url(),
        config.default_model
    );

    // Initialize session store
    let sessions = SessionStore::new(Duration::from_secs(config.session_ttl_secs));
    sessions.spawn_sweeper(SESSION_SWEEP_PERIOD);
    info!("Session store initialized (ttl: {}s)", config.session_ttl_secs);

    let state = AppState {
        llm: Arc::new(ollama),
        sessions,
        config: config.clone(),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
