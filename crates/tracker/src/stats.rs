use common::Outcome;

use crate::window::WindowPolicy;

/// Live tallies for a single window. Updated the moment the window resolves,
/// independent of whether the whole signal has closed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct WindowTally {
    pub wins: u64,
    pub losses: u64,
    pub draws: u64,
    /// Windows forced closed by the hard timeout. Not part of the win-rate
    /// denominator.
    pub expired: u64,
}

impl WindowTally {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Loss => self.losses += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::Expired => self.expired += 1,
            Outcome::Active => {}
        }
    }

    pub fn win_rate(&self) -> f64 {
        win_rate(self.wins, self.losses, self.draws)
    }
}

/// Streaming performance statistics. Every update is O(1); nothing here
/// replays history.
///
/// Average win/loss returns are derived from running sums rather than
/// blended incrementally, which keeps repeated updates free of drift.
#[derive(Debug, Clone, PartialEq)]
pub struct PerformanceStats {
    /// Submission volume, including signals that later expire.
    pub total_signals: u64,
    windows: Vec<(String, WindowTally)>,
    pub wins: u64,
    pub losses: u64,
    /// Closed signals whose final outcome was DRAW or EXPIRED.
    pub draws: u64,
    /// Subset of `draws` whose final outcome was EXPIRED.
    pub expired: u64,
    pub cumulative_return_pct: f64,
    win_return_sum: f64,
    loss_return_sum: f64,
    pub consecutive_wins: u64,
    pub consecutive_losses: u64,
    pub max_consecutive_wins: u64,
    pub max_consecutive_losses: u64,
}

impl PerformanceStats {
    pub fn new(policy: &WindowPolicy) -> Self {
        Self {
            total_signals: 0,
            windows: policy
                .windows()
                .iter()
                .map(|w| (w.name.clone(), WindowTally::default()))
                .collect(),
            wins: 0,
            losses: 0,
            draws: 0,
            expired: 0,
            cumulative_return_pct: 0.0,
            win_return_sum: 0.0,
            loss_return_sum: 0.0,
            consecutive_wins: 0,
            consecutive_losses: 0,
            max_consecutive_wins: 0,
            max_consecutive_losses: 0,
        }
    }

    pub fn record_submission(&mut self) {
        self.total_signals += 1;
    }

    /// Count a window resolution. `index` follows policy order.
    pub fn record_window(&mut self, index: usize, outcome: Outcome) {
        if let Some((_, tally)) = self.windows.get_mut(index) {
            tally.record(outcome);
        }
    }

    /// Fold a closed signal into the overall counters and streaks.
    pub fn record_close(&mut self, final_outcome: Outcome, final_return_pct: f64) {
        match final_outcome {
            Outcome::Win => {
                self.wins += 1;
                self.cumulative_return_pct += final_return_pct;
                self.win_return_sum += final_return_pct;
                self.consecutive_wins += 1;
                self.consecutive_losses = 0;
                self.max_consecutive_wins = self.max_consecutive_wins.max(self.consecutive_wins);
            }
            Outcome::Loss => {
                self.losses += 1;
                self.cumulative_return_pct += final_return_pct;
                self.loss_return_sum += final_return_pct;
                self.consecutive_losses += 1;
                self.consecutive_wins = 0;
                self.max_consecutive_losses =
                    self.max_consecutive_losses.max(self.consecutive_losses);
            }
            Outcome::Draw | Outcome::Expired | Outcome::Active => {
                self.draws += 1;
                if final_outcome != Outcome::Draw {
                    self.expired += 1;
                }
            }
        }
    }

    pub fn window(&self, name: &str) -> Option<&WindowTally> {
        self.windows.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    /// Per-window tallies in policy order.
    pub fn windows(&self) -> impl Iterator<Item = (&str, &WindowTally)> {
        self.windows.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn win_rate(&self) -> f64 {
        win_rate(self.wins, self.losses, self.draws)
    }

    pub fn avg_win_pct(&self) -> f64 {
        mean(self.win_return_sum, self.wins)
    }

    /// Expected to be negative.
    pub fn avg_loss_pct(&self) -> f64 {
        mean(self.loss_return_sum, self.losses)
    }

    /// Total winning return over total losing return magnitude.
    /// `+inf` with wins but no losses, `0` with neither.
    pub fn profit_factor(&self) -> f64 {
        let gross_loss = self.loss_return_sum.abs();
        if self.losses > 0 && gross_loss > 0.0 {
            self.win_return_sum / gross_loss
        } else if self.losses == 0 && self.wins > 0 {
            f64::INFINITY
        } else {
            0.0
        }
    }
}

fn win_rate(wins: u64, losses: u64, draws: u64) -> f64 {
    let total = wins + losses + draws;
    if total == 0 {
        0.0
    } else {
        wins as f64 / total as f64
    }
}

fn mean(sum: f64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}
