use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::error::ApiError;
use crate::server::AppState;

/// GET / - service name, version and routes
pub async fn root() -> Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    Json(json!({
        "name": "Datalake Gateway",
        "version": version,
        "endpoints": {
            "get": "/get (POST: channel, access_token, query?, past_*?)",
            "latest": "/latest (POST: channel, access_token, query.count?)",
            "aggregate": "/aggregate (POST: channel, access_token, pipeline)",
            "health": "/health (GET)",
        }
    }))
}

/// GET /health - store connectivity
pub async fn health(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let now = chrono::Utc::now();

    if let Err(e) = state.datalake.store().ping().await {
        tracing::warn!("Health check failed: {}", e);
        return Err(ApiError::service_unavailable("database unavailable"));
    }

    Ok(Json(json!({
        "status": "ok",
        "timestamp": now,
        "database": "ok"
    })))
}
