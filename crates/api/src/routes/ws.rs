use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use serde::Deserialize;
use tokio::sync::broadcast;
use tracing::warn;

use common::SignalEvaluation;

use crate::{auth::token_matches, AppState};

pub fn ws_router() -> Router<AppState> {
    Router::new().route("/ws/evaluations", get(ws_evaluations_handler))
}

#[derive(Deserialize)]
struct WsQuery {
    token: Option<String>,
}

/// WebSocket endpoint that streams each signal evaluation as it closes.
/// Auth via query param `?token=<DASHBOARD_TOKEN>` (header auth not supported
/// in browser WebSocket API).
async fn ws_evaluations_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(q): Query<WsQuery>,
) -> Response {
    if !token_matches(&state, q.token.as_deref()) {
        return (StatusCode::UNAUTHORIZED, "unauthorized").into_response();
    }

    let evaluation_rx = state.engine.subscribe_evaluations();
    ws.on_upgrade(move |socket| handle_ws(socket, evaluation_rx))
}

async fn handle_ws(mut socket: WebSocket, mut evaluation_rx: broadcast::Receiver<SignalEvaluation>) {
    loop {
        match evaluation_rx.recv().await {
            Ok(evaluation) => {
                let text = match serde_json::to_string(&evaluation) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!(error = %e, "Failed to encode evaluation");
                        continue;
                    }
                };
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(dropped = n, "WebSocket evaluation client lagged");
            }
            Err(broadcast::error::RecvError::Closed) => {
                break;
            }
        }
    }
}
