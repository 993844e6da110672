use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{info, warn};

use common::{PriceMap, Result, SignalEvaluation, SignalId, SignalRequest};

use crate::evaluator::advance;
use crate::history::EvaluationHistory;
use crate::registry::{SignalRegistry, TrackedSignal};
use crate::report::{ActiveSignalView, PerformanceSnapshot};
use crate::stats::PerformanceStats;
use crate::window::WindowPolicy;

/// Registry, statistics and history together. Every method here runs to
/// completion without I/O; `SignalTracker` puts one lock around the whole
/// thing so submissions, tick sweeps and aggregation never interleave.
#[derive(Debug)]
pub struct TrackerState {
    policy: WindowPolicy,
    registry: SignalRegistry,
    stats: PerformanceStats,
    history: EvaluationHistory,
}

impl TrackerState {
    pub fn new(policy: WindowPolicy) -> Self {
        Self {
            registry: SignalRegistry::new(),
            stats: PerformanceStats::new(&policy),
            history: EvaluationHistory::new(policy.history_limit()),
            policy,
        }
    }

    /// Start tracking a signal entered at `at`.
    ///
    /// Malformed requests are rejected before anything is inserted or counted.
    pub fn submit(&mut self, request: SignalRequest, at: DateTime<Utc>) -> Result<SignalId> {
        if let Err(reason) = request.validate() {
            warn!(symbol = %request.symbol, reason = %reason, "Signal rejected");
            return Err(reason.into());
        }

        let id = SignalRegistry::next_id(&request.symbol, request.direction, at);
        let signal = TrackedSignal::new(id.clone(), request, at, &self.policy);
        info!(
            id = %id,
            symbol = %signal.symbol,
            direction = %signal.direction,
            entry = signal.entry_price,
            confidence = signal.confidence,
            "Tracking new signal"
        );
        self.registry.insert(signal);
        self.stats.record_submission();
        Ok(id)
    }

    /// Re-evaluate every open signal that has a price in `prices`.
    ///
    /// Returns the evaluations of signals that closed on this tick, in
    /// submission order. Symbols missing from the map (or carrying a
    /// non-positive/non-finite price) are left untouched until a later tick.
    pub fn tick(&mut self, prices: &PriceMap, now: DateTime<Utc>) -> Vec<SignalEvaluation> {
        let mut closed = Vec::new();

        for signal in self.registry.iter_mut() {
            let Some(&price) = prices.get(&signal.symbol) else {
                continue;
            };
            if !price.is_finite() || price <= 0.0 {
                warn!(symbol = %signal.symbol, price = price, "Ignoring unusable price");
                continue;
            }
            if let Some(evaluation) = advance(signal, &self.policy, price, now, &mut self.stats) {
                closed.push(evaluation);
            }
        }

        if closed.is_empty() {
            return closed;
        }

        let mut closed_ids = HashSet::with_capacity(closed.len());
        for evaluation in &closed {
            self.stats
                .record_close(evaluation.final_outcome, evaluation.final_return_pct);
            self.history.push(evaluation.clone());
            closed_ids.insert(evaluation.signal_id.clone());
        }
        self.registry.remove_closed(&closed_ids);

        closed
    }

    pub fn snapshot(&self) -> PerformanceSnapshot {
        PerformanceSnapshot::capture(
            &self.stats,
            &self.policy,
            self.registry.len(),
            self.history.len(),
        )
    }

    /// The last `n` closed evaluations, oldest first.
    pub fn recent_evaluations(&self, n: usize) -> Vec<SignalEvaluation> {
        self.history.recent(n)
    }

    pub fn active_count(&self) -> usize {
        self.registry.len()
    }

    pub fn active_signals(&self) -> Vec<ActiveSignalView> {
        self.registry.iter().map(ActiveSignalView::from).collect()
    }

    pub fn active_signal(&self, id: &SignalId) -> Option<ActiveSignalView> {
        self.registry.get(id).map(ActiveSignalView::from)
    }

    pub fn open_symbols(&self) -> Vec<String> {
        self.registry.symbols()
    }

}

/// Cloneable handle shared by the scheduler, signal intake and the reporting API.
///
/// Writers (`submit`, `tick`) take the write guard for the whole operation;
/// readers copy owned snapshots out under the read guard, so they never
/// observe a signal halfway through an update.
#[derive(Clone)]
pub struct SignalTracker {
    inner: Arc<RwLock<TrackerState>>,
}

impl SignalTracker {
    pub fn new(policy: WindowPolicy) -> Self {
        info!(
            windows = policy.windows().len(),
            terminal = %policy.terminal().name,
            hard_timeout_min = policy.hard_timeout_minutes(),
            "SignalTracker initialized"
        );
        Self {
            inner: Arc::new(RwLock::new(TrackerState::new(policy))),
        }
    }

    /// Track a signal entered now.
    pub async fn submit(&self, request: SignalRequest) -> Result<SignalId> {
        self.submit_at(request, Utc::now()).await
    }

    pub async fn submit_at(&self, request: SignalRequest, at: DateTime<Utc>) -> Result<SignalId> {
        self.inner.write().await.submit(request, at)
    }

    pub async fn tick(&self, prices: &PriceMap, now: DateTime<Utc>) -> Vec<SignalEvaluation> {
        self.inner.write().await.tick(prices, now)
    }

    pub async fn snapshot(&self) -> PerformanceSnapshot {
        self.inner.read().await.snapshot()
    }

    pub async fn recent_evaluations(&self, n: usize) -> Vec<SignalEvaluation> {
        self.inner.read().await.recent_evaluations(n)
    }

    pub async fn active_count(&self) -> usize {
        self.inner.read().await.active_count()
    }

    pub async fn active_signals(&self) -> Vec<ActiveSignalView> {
        self.inner.read().await.active_signals()
    }

    pub async fn active_signal(&self, id: &SignalId) -> Option<ActiveSignalView> {
        self.inner.read().await.active_signal(id)
    }

    pub async fn open_symbols(&self) -> Vec<String> {
        self.inner.read().await.open_symbols()
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
