use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use common::{Config, EngineCommand};
use engine::{Engine, SignalIntake};
use feed::PriceBoard;
use tracker::{SignalTracker, TrackerFileConfig, WindowPolicy};

#[tokio::main]
async fn main() {
    // ── Logging ──────────────────────────────────────────────────────────────
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .init();

    // ── Config ────────────────────────────────────────────────────────────────
    let cfg = Config::from_env();
    info!(
        port = cfg.dashboard_port,
        tick_secs = cfg.tick_interval.as_secs(),
        price_max_age_secs = cfg.price_max_age.as_secs(),
        "Signal tracker starting"
    );

    // ── Window policy ─────────────────────────────────────────────────────────
    let policy = if Path::new(&cfg.window_config_path).exists() {
        TrackerFileConfig::load(&cfg.window_config_path)
            .and_then(TrackerFileConfig::into_policy)
            .unwrap_or_else(|e| panic!("Invalid window config '{}': {e}", cfg.window_config_path))
    } else {
        warn!(path = %cfg.window_config_path, "Window config not found, using reference policy");
        WindowPolicy::default()
    };
    for w in policy.windows() {
        info!(
            window = %w.name,
            minutes = w.duration_minutes,
            profit = w.profit_threshold,
            loss = w.loss_threshold,
            "Validation window"
        );
    }

    // ── Tracker, price board, scheduler ───────────────────────────────────────
    let tracker = SignalTracker::new(policy);
    let board = PriceBoard::with_max_age(cfg.price_max_age);
    let (engine, engine_handle) =
        Engine::new(tracker.clone(), Arc::new(board.clone()), cfg.tick_interval);

    // ── Signal intake ─────────────────────────────────────────────────────────
    // Upstream generators pipe one JSON submission per line on stdin.
    let (line_tx, line_rx) = mpsc::channel::<String>(128);
    let intake = SignalIntake::new(tracker.clone(), line_rx);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line_tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "Failed to read signal stream");
                    break;
                }
            }
        }
    });

    // ── Reporting API ─────────────────────────────────────────────────────────
    let api_state = api::AppState {
        tracker: tracker.clone(),
        board,
        engine: engine_handle.clone(),
        dashboard_token: cfg.dashboard_token.clone(),
    };

    // ── Spawn all tasks ───────────────────────────────────────────────────────
    let port = cfg.dashboard_port;
    tokio::spawn(engine.run());
    tokio::spawn(async move {
        let summary = intake.run().await;
        info!(
            accepted = summary.accepted,
            rejected = summary.rejected,
            malformed = summary.malformed,
            "Signal intake finished"
        );
    });
    tokio::spawn(async move {
        if let Err(e) = api::serve(api_state, port).await {
            warn!(error = %e, "Reporting API stopped");
        }
    });
    engine_handle.send(EngineCommand::Start).await;

    info!("All subsystems started. Waiting for shutdown signal.");
    tokio::signal::ctrl_c().await.unwrap();

    let snapshot = tracker.snapshot().await;
    info!(
        total = snapshot.total_signals,
        wins = snapshot.total_wins,
        losses = snapshot.total_losses,
        draws = snapshot.total_draws,
        active = snapshot.active_signals,
        "Shutdown signal received. Exiting."
    );
}
