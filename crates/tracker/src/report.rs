use chrono::{DateTime, Utc};
use serde::Serialize;

use common::{Direction, SignalId, WindowResult};

use crate::registry::TrackedSignal;
use crate::stats::PerformanceStats;
use crate::window::WindowPolicy;

/// Per-window slice of the performance snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WindowSnapshot {
    pub name: String,
    pub duration_minutes: u32,
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
    pub expired: u64,
    pub win_rate: f64,
}

/// Read-only copy of the performance statistics, taken under the tracker lock.
///
/// `profit_factor` is `+inf` when there are wins and no losses;
/// JSON encodes that as `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerformanceSnapshot {
    pub total_signals: u64,
    pub active_signals: usize,
    pub windows: Vec<WindowSnapshot>,
    pub total_wins: u64,
    pub total_losses: u64,
    pub total_draws: u64,
    pub total_expired: u64,
    pub win_rate: f64,
    pub cumulative_return_pct: f64,
    pub avg_win_pct: f64,
    pub avg_loss_pct: f64,
    pub profit_factor: f64,
    pub consecutive_wins: u64,
    pub consecutive_losses: u64,
    pub max_consecutive_wins: u64,
    pub max_consecutive_losses: u64,
    pub evaluations_recorded: usize,
}

impl PerformanceSnapshot {
    pub fn capture(
        stats: &PerformanceStats,
        policy: &WindowPolicy,
        active_signals: usize,
        evaluations_recorded: usize,
    ) -> Self {
        let windows = policy
            .windows()
            .iter()
            .filter_map(|w| {
                stats.window(&w.name).map(|t| WindowSnapshot {
                    name: w.name.clone(),
                    duration_minutes: w.duration_minutes,
                    wins: t.wins,
                    losses: t.losses,
                    draws: t.draws,
                    expired: t.expired,
                    win_rate: t.win_rate(),
                })
            })
            .collect();

        Self {
            total_signals: stats.total_signals,
            active_signals,
            windows,
            total_wins: stats.wins,
            total_losses: stats.losses,
            total_draws: stats.draws,
            total_expired: stats.expired,
            win_rate: stats.win_rate(),
            cumulative_return_pct: stats.cumulative_return_pct,
            avg_win_pct: stats.avg_win_pct(),
            avg_loss_pct: stats.avg_loss_pct(),
            profit_factor: stats.profit_factor(),
            consecutive_wins: stats.consecutive_wins,
            consecutive_losses: stats.consecutive_losses,
            max_consecutive_wins: stats.max_consecutive_wins,
            max_consecutive_losses: stats.max_consecutive_losses,
            evaluations_recorded,
        }
    }

    pub fn window(&self, name: &str) -> Option<&WindowSnapshot> {
        self.windows.iter().find(|w| w.name == name)
    }
}

/// Reporting view of a signal that is still open.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActiveSignalView {
    pub id: SignalId,
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub confidence: f64,
    pub last_price: f64,
    pub last_return_pct: Option<f64>,
    pub max_profit_pct: f64,
    pub max_loss_pct: f64,
    pub window_results: Vec<WindowResult>,
    pub price_samples: usize,
}

impl From<&TrackedSignal> for ActiveSignalView {
    fn from(signal: &TrackedSignal) -> Self {
        Self {
            id: signal.id.clone(),
            symbol: signal.symbol.clone(),
            direction: signal.direction,
            entry_price: signal.entry_price,
            entry_time: signal.entry_time,
            confidence: signal.confidence,
            last_price: signal.last_price(),
            last_return_pct: signal.last_return_pct,
            max_profit_pct: signal.max_profit_pct,
            max_loss_pct: signal.max_loss_pct,
            window_results: signal.window_outcomes.clone(),
            price_samples: signal.price_history.len(),
        }
    }
}
