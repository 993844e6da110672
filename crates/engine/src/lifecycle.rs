use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{broadcast, mpsc, RwLock};
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use common::{EngineCommand, EngineState, PriceSource, SignalEvaluation};
use tracker::SignalTracker;

/// Cloneable handle passed to other crates (API, binary).
#[derive(Clone)]
pub struct EngineHandle {
    command_tx: mpsc::Sender<EngineCommand>,
    state: Arc<RwLock<EngineState>>,
    evaluation_tx: broadcast::Sender<SignalEvaluation>,
}

impl EngineHandle {
    pub async fn send(&self, cmd: EngineCommand) {
        let _ = self.command_tx.send(cmd).await;
    }

    pub async fn state(&self) -> EngineState {
        *self.state.read().await
    }

    /// Subscribe to evaluations of signals as they close.
    pub fn subscribe_evaluations(&self) -> broadcast::Receiver<SignalEvaluation> {
        self.evaluation_tx.subscribe()
    }
}

/// The tick scheduler: periodically pulls prices for every symbol with an
/// open signal, runs the tracker's evaluation sweep and broadcasts whatever
/// closed.
///
/// A paused or stopped engine simply skips cycles; elapsed time is measured
/// on the wall clock, so nothing is lost by skipping.
pub struct Engine {
    tracker: SignalTracker,
    source: Arc<dyn PriceSource>,
    tick_interval: Duration,
    state: Arc<RwLock<EngineState>>,
    evaluation_tx: broadcast::Sender<SignalEvaluation>,
    command_rx: mpsc::Receiver<EngineCommand>,
}

impl Engine {
    pub fn new(
        tracker: SignalTracker,
        source: Arc<dyn PriceSource>,
        tick_interval: Duration,
    ) -> (Self, EngineHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);
        let (evaluation_tx, _) = broadcast::channel(1024);
        let state = Arc::new(RwLock::new(EngineState::Stopped));

        let handle = EngineHandle {
            command_tx,
            state: state.clone(),
            evaluation_tx: evaluation_tx.clone(),
        };

        let engine = Engine {
            tracker,
            source,
            tick_interval,
            state,
            evaluation_tx,
            command_rx,
        };

        (engine, handle)
    }

    /// Run the engine until every `EngineHandle` is dropped.
    /// Call from `tokio::spawn`.
    pub async fn run(mut self) {
        info!(interval = ?self.tick_interval, "Engine initialized in Stopped state. Waiting for Start command.");

        let mut ticker = tokio::time::interval(self.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                // ── Operator command ──────────────────────────────────────
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(cmd) => self.handle_command(cmd).await,
                        None => {
                            warn!("Engine command channel closed: shutting down");
                            break;
                        }
                    }
                }

                // ── Periodic evaluation ───────────────────────────────────
                _ = ticker.tick() => {
                    if *self.state.read().await == EngineState::Running {
                        self.tick_once().await;
                    }
                }
            }
        }
    }

    async fn handle_command(&mut self, cmd: EngineCommand) {
        let current = *self.state.read().await;
        match cmd {
            EngineCommand::Start => {
                if current == EngineState::Running {
                    info!("Engine already running");
                    return;
                }
                info!("Engine started: evaluating open signals every tick");
                *self.state.write().await = EngineState::Running;
            }
            EngineCommand::Stop => {
                info!("Engine stopped: ticks suspended, open signals kept");
                *self.state.write().await = EngineState::Stopped;
            }
            EngineCommand::Pause => {
                if current == EngineState::Running {
                    info!("Engine paused");
                    *self.state.write().await = EngineState::Paused;
                }
            }
            EngineCommand::Resume => {
                if current == EngineState::Paused {
                    info!("Engine resumed");
                    *self.state.write().await = EngineState::Running;
                } else {
                    warn!(state = %current, "Resume received but engine is not paused");
                }
            }
        }
    }

    /// One evaluation cycle. A price source failure skips the cycle.
    pub async fn tick_once(&self) -> Vec<SignalEvaluation> {
        let symbols = self.tracker.open_symbols().await;
        if symbols.is_empty() {
            return Vec::new();
        }

        let prices = match self.source.prices(&symbols).await {
            Ok(prices) => prices,
            Err(e) => {
                warn!(error = %e, symbols = symbols.len(), "Price source failed: skipping tick");
                return Vec::new();
            }
        };

        let closed = self.tracker.tick(&prices, Utc::now()).await;
        debug!(
            symbols = symbols.len(),
            priced = prices.len(),
            closed = closed.len(),
            "Tick complete"
        );

        for evaluation in &closed {
            // No subscribers is fine; evaluations are also kept in history.
            let _ = self.evaluation_tx.send(evaluation.clone());
        }
        closed
    }
}
