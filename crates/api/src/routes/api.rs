use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use common::{EngineCommand, PriceMap, SignalId, SignalSubmission};
use tracker::{ActiveSignalView, PerformanceSnapshot};

use crate::{auth::require_auth, AppState};

const DEFAULT_EVALUATION_LIMIT: usize = 10;
const MAX_EVALUATION_LIMIT: usize = 500;

pub fn api_router(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/api/performance", get(get_performance))
        .route("/api/evaluations", get(get_evaluations))
        .route("/api/signals", get(get_signals).post(post_signal))
        .route("/api/signals/:id", get(get_signal))
        .route("/api/engine/:command", post(post_engine_command))
        .route("/api/prices", post(post_prices))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

// ─── Performance ──────────────────────────────────────────────────────────────

async fn get_performance(State(state): State<AppState>) -> Json<PerformanceSnapshot> {
    Json(state.tracker.snapshot().await)
}

// ─── Evaluations ──────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct EvaluationsQuery {
    limit: Option<usize>,
}

async fn get_evaluations(
    State(state): State<AppState>,
    Query(q): Query<EvaluationsQuery>,
) -> Json<Value> {
    let limit = q
        .limit
        .unwrap_or(DEFAULT_EVALUATION_LIMIT)
        .min(MAX_EVALUATION_LIMIT);
    let evaluations = state.tracker.recent_evaluations(limit).await;

    Json(json!({
        "evaluations": evaluations,
        "count": evaluations.len(),
        "limit": limit,
    }))
}

// ─── Signals ──────────────────────────────────────────────────────────────────

async fn get_signals(State(state): State<AppState>) -> Json<Vec<ActiveSignalView>> {
    Json(state.tracker.active_signals().await)
}

async fn get_signal(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> (StatusCode, Json<Value>) {
    match state.tracker.active_signal(&SignalId(id)).await {
        Some(view) => (StatusCode::OK, Json(json!(view))),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "no open signal with that id" })),
        ),
    }
}

async fn post_signal(
    State(state): State<AppState>,
    Json(body): Json<SignalSubmission>,
) -> (StatusCode, Json<Value>) {
    let symbol = body.symbol.clone();
    let result = match body.into_request() {
        Ok(request) => state.tracker.submit(request).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(id) => (StatusCode::CREATED, Json(json!({ "id": id }))),
        Err(e) => {
            warn!(symbol = %symbol, error = %e, "POST /api/signals rejected");
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "error": e.to_string() })),
            )
        }
    }
}

// ─── Engine control ───────────────────────────────────────────────────────────

async fn post_engine_command(
    State(state): State<AppState>,
    Path(command): Path<String>,
) -> (StatusCode, Json<Value>) {
    let cmd = match command.as_str() {
        "start" => EngineCommand::Start,
        "stop" => EngineCommand::Stop,
        "pause" => EngineCommand::Pause,
        "resume" => EngineCommand::Resume,
        other => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": format!("unknown engine command '{other}'") })),
            );
        }
    };

    info!(command = %command, "Engine command received via API");
    state.engine.send(cmd).await;
    (StatusCode::ACCEPTED, Json(json!({ "command": command })))
}

// ─── Prices ───────────────────────────────────────────────────────────────────

async fn post_prices(
    State(state): State<AppState>,
    Json(prices): Json<PriceMap>,
) -> Json<Value> {
    let accepted = state.board.update_prices(&prices).await;
    info!(accepted, total = prices.len(), "Price update received");
    Json(json!({
        "accepted": accepted,
        "rejected": prices.len() - accepted,
    }))
}
