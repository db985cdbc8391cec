use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::state::AppState;

const SERVICE: &str = "tailor-api";

/// GET /health
/// Returns a simple status object with service version and live session count.
pub async fn health_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": SERVICE,
        "active_sessions": state.sessions.len().await,
    }))
}

/// GET /
pub async fn service_info_handler(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "service": SERVICE,
        "version": env!("CARGO_PKG_VERSION"),
        "default_model": state.config.default_model,
        "max_file_size_mb": state.config.max_file_size_mb,
        "endpoints": {
            "health": "/health",
            "models": "/api/v1/models",
            "codec": ["/api/v1/codec/decode", "/api/v1/codec/encode"],
            "sessions": "/api/v1/sessions",
        },
    }))
}
