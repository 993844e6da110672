use std::collections::{BTreeSet, HashSet};

use chrono::{DateTime, Utc};
use serde::Serialize;

use common::{Direction, Outcome, SignalId, SignalRequest, WindowResult};

use crate::window::WindowPolicy;

/// One price observation on an open signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PricePoint {
    pub time: DateTime<Utc>,
    pub price: f64,
}

/// An open bet being re-evaluated on every tick.
///
/// Owned by the `SignalRegistry` from `submit` until it closes.
#[derive(Debug, Clone)]
pub struct TrackedSignal {
    pub id: SignalId,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub confidence: f64,
    pub payload: serde_json::Value,
    /// Running maximum of the signed return since entry (starts at 0).
    pub max_profit_pct: f64,
    /// Running minimum of the signed return since entry (starts at 0).
    pub max_loss_pct: f64,
    /// One entry per configured window, in policy order.
    pub window_outcomes: Vec<WindowResult>,
    /// Entry sample followed by every price seen on a tick.
    pub price_history: Vec<PricePoint>,
    pub last_return_pct: Option<f64>,
}

impl TrackedSignal {
    pub fn new(id: SignalId, request: SignalRequest, entry_time: DateTime<Utc>, policy: &WindowPolicy) -> Self {
        let window_outcomes = policy
            .windows()
            .iter()
            .map(|w| WindowResult {
                window: w.name.clone(),
                outcome: Outcome::Active,
            })
            .collect();

        Self {
            id,
            price_history: vec![PricePoint {
                time: entry_time,
                price: request.entry_price,
            }],
            symbol: request.symbol,
            direction: request.direction,
            entry_price: request.entry_price,
            entry_time,
            confidence: request.confidence,
            payload: request.payload,
            max_profit_pct: 0.0,
            max_loss_pct: 0.0,
            window_outcomes,
            last_return_pct: None,
        }
    }

    /// Minutes since entry, never negative (a clock stepping backwards counts as zero).
    pub fn elapsed_minutes(&self, now: DateTime<Utc>) -> f64 {
        let millis = (now - self.entry_time).num_milliseconds().max(0);
        millis as f64 / 60_000.0
    }

    pub fn is_resolved(&self) -> bool {
        self.window_outcomes.iter().all(|r| r.outcome.is_terminal())
    }

    pub fn last_price(&self) -> f64 {
        self.price_history
            .last()
            .map(|p| p.price)
            .unwrap_or(self.entry_price)
    }
}

/// The set of currently open signals, kept in submission order.
#[derive(Debug, Default)]
pub struct SignalRegistry {
    signals: Vec<TrackedSignal>,
}

impl SignalRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a process-unique id: symbol, direction and entry instant for
    /// readability, plus a random suffix so same-millisecond submissions
    /// never collide.
    pub fn next_id(symbol: &str, direction: Direction, at: DateTime<Utc>) -> SignalId {
        SignalId(format!(
            "{symbol}-{direction}-{}-{}",
            at.timestamp_millis(),
            uuid::Uuid::new_v4().simple()
        ))
    }

    pub fn insert(&mut self, signal: TrackedSignal) {
        self.signals.push(signal);
    }

    /// Drop every signal whose id is in `closed` in a single pass, keeping
    /// the rest in submission order. Returns how many were removed.
    pub fn remove_closed(&mut self, closed: &HashSet<SignalId>) -> usize {
        if closed.is_empty() {
            return 0;
        }
        let before = self.signals.len();
        self.signals.retain(|s| !closed.contains(&s.id));
        before - self.signals.len()
    }

    pub fn get(&self, id: &SignalId) -> Option<&TrackedSignal> {
        self.signals.iter().find(|s| &s.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrackedSignal> {
        self.signals.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut TrackedSignal> {
        self.signals.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }

    /// Distinct symbols with at least one open signal, sorted.
    pub fn symbols(&self) -> Vec<String> {
        self.signals
            .iter()
            .map(|s| s.symbol.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}
