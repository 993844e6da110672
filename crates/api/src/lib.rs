mod auth;
pub mod routes;

use std::net::SocketAddr;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use common::Result;
use engine::EngineHandle;
use feed::PriceBoard;
use tracker::SignalTracker;

/// Shared application state injected into every route handler.
#[derive(Clone)]
pub struct AppState {
    pub tracker: SignalTracker,
    /// Price board that `POST /api/prices` writes into.
    pub board: PriceBoard,
    pub engine: EngineHandle,
    pub dashboard_token: String,
}

/// Assemble every route with state and CORS applied.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_headers(Any)
        .allow_methods(Any);

    Router::new()
        .merge(routes::api_router(state.clone()))
        .merge(routes::ws_router())
        .merge(routes::health_router())
        .with_state(state)
        .layer(cors)
}

/// Build and run the Axum API server.
pub async fn serve(state: AppState, port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let app = router(state);

    info!(%addr, "Reporting API listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
