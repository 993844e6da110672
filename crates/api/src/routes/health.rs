use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use crate::AppState;

pub fn health_router() -> Router<AppState> {
    Router::new().route("/healthz", get(healthz))
}

/// Liveness check. No auth required.
async fn healthz(State(state): State<AppState>) -> Json<Value> {
    let engine_state = state.engine.state().await;
    Json(json!({
        "status": "ok",
        "engine": engine_state.to_string(),
        "active_signals": state.tracker.active_count().await,
    }))
}
