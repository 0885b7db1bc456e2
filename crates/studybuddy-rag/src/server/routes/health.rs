//! Health and banner endpoints

use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::server::state::AppState;
use crate::types::HealthResponse;

/// GET /api/v1/health - Service status and ingested documents
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(state.engine().health())
}

/// GET / - Service banner
pub async fn root(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "message": format!("{} is running!", state.engine().config().server.app_name),
        "version": env!("CARGO_PKG_VERSION"),
        "docs": "/docs",
    }))
}
