use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use common::{Error, Result};

/// Signals still open after this many minutes have their unresolved windows
/// forced to `EXPIRED`, independent of any individual window's duration.
pub const DEFAULT_HARD_TIMEOUT_MINUTES: u32 = 15;

/// One evaluation horizon with its own profit/loss thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationWindow {
    /// Identifier used in tallies and reports, e.g. "3min".
    pub name: String,
    pub duration_minutes: u32,
    /// Signed return (percent) at or above which the window is a WIN.
    pub profit_threshold: f64,
    /// Signed return (percent) at or below which the window is a LOSS.
    pub loss_threshold: f64,
}

impl ValidationWindow {
    pub fn new(
        name: impl Into<String>,
        duration_minutes: u32,
        profit_threshold: f64,
        loss_threshold: f64,
    ) -> Self {
        Self {
            name: name.into(),
            duration_minutes,
            profit_threshold,
            loss_threshold,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidPolicy("window name must not be empty".into()));
        }
        if self.duration_minutes == 0 {
            return Err(Error::InvalidPolicy(format!(
                "window '{}' must have a positive duration",
                self.name
            )));
        }
        if !self.profit_threshold.is_finite() || self.profit_threshold <= 0.0 {
            return Err(Error::InvalidPolicy(format!(
                "window '{}' profit threshold must be > 0, got {}",
                self.name, self.profit_threshold
            )));
        }
        if !self.loss_threshold.is_finite() || self.loss_threshold >= 0.0 {
            return Err(Error::InvalidPolicy(format!(
                "window '{}' loss threshold must be < 0, got {}",
                self.name, self.loss_threshold
            )));
        }
        Ok(())
    }
}

/// Immutable evaluation configuration, created once at startup.
///
/// Windows are kept sorted by duration; the last one is the terminal window
/// whose outcome becomes a signal's final outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowPolicy {
    windows: Vec<ValidationWindow>,
    hard_timeout_minutes: u32,
    history_limit: Option<usize>,
}

impl WindowPolicy {
    pub fn new(
        mut windows: Vec<ValidationWindow>,
        hard_timeout_minutes: u32,
        history_limit: Option<usize>,
    ) -> Result<Self> {
        if windows.is_empty() {
            return Err(Error::InvalidPolicy("at least one window is required".into()));
        }
        if hard_timeout_minutes == 0 {
            return Err(Error::InvalidPolicy("hard timeout must be positive".into()));
        }
        if history_limit == Some(0) {
            return Err(Error::InvalidPolicy("history limit must be positive when set".into()));
        }

        let mut names = HashSet::new();
        let mut durations = HashSet::new();
        for window in &windows {
            window.validate()?;
            if !names.insert(window.name.as_str()) {
                return Err(Error::InvalidPolicy(format!(
                    "duplicate window name '{}'",
                    window.name
                )));
            }
            if !durations.insert(window.duration_minutes) {
                return Err(Error::InvalidPolicy(format!(
                    "duplicate window duration {} minutes",
                    window.duration_minutes
                )));
            }
        }

        windows.sort_by_key(|w| w.duration_minutes);
        Ok(Self {
            windows,
            hard_timeout_minutes,
            history_limit,
        })
    }

    /// Windows ordered by ascending duration.
    pub fn windows(&self) -> &[ValidationWindow] {
        &self.windows
    }

    /// The window with the largest duration.
    pub fn terminal(&self) -> &ValidationWindow {
        // Non-empty is enforced in `new`.
        &self.windows[self.windows.len() - 1]
    }

    pub fn terminal_index(&self) -> usize {
        self.windows.len() - 1
    }

    pub fn hard_timeout_minutes(&self) -> u32 {
        self.hard_timeout_minutes
    }

    pub fn history_limit(&self) -> Option<usize> {
        self.history_limit
    }
}

impl Default for WindowPolicy {
    /// 3/5/10 minute windows at ±0.3 / ±0.4 / ±0.5 percent, 15 minute
    /// hard timeout, unbounded history.
    fn default() -> Self {
        Self {
            windows: vec![
                ValidationWindow::new("3min", 3, 0.3, -0.3),
                ValidationWindow::new("5min", 5, 0.4, -0.4),
                ValidationWindow::new("10min", 10, 0.5, -0.5),
            ],
            hard_timeout_minutes: DEFAULT_HARD_TIMEOUT_MINUTES,
            history_limit: None,
        }
    }
}
