use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::AppState;

/// Token presented as `Authorization: Bearer <token>`, if any.
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
}

/// An empty configured token never authorizes anything.
pub(crate) fn token_matches(state: &AppState, candidate: Option<&str>) -> bool {
    match candidate {
        Some(t) => !state.dashboard_token.is_empty() && t == state.dashboard_token,
        None => false,
    }
}

/// Middleware guarding the reporting and intake routes.
pub async fn require_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    if token_matches(&state, bearer_token(&headers)) {
        return next.run(request).await;
    }

    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        Json(json!({"error": "unauthorized"})),
    )
        .into_response()
}
