use common::Outcome;

use crate::window::ValidationWindow;

/// Decide a window's outcome from the current signed return.
///
/// Once the window's time is up the result is always terminal: a return
/// inside the thresholds is a DRAW. Before the deadline only a threshold hit
/// resolves the window; a flat return stays ACTIVE.
pub fn classify(signed_return_pct: f64, window: &ValidationWindow, elapsed_minutes: f64) -> Outcome {
    let threshold_hit = if signed_return_pct >= window.profit_threshold {
        Some(Outcome::Win)
    } else if signed_return_pct <= window.loss_threshold {
        Some(Outcome::Loss)
    } else {
        None
    };

    match threshold_hit {
        Some(outcome) => outcome,
        None if elapsed_minutes >= f64::from(window.duration_minutes) => Outcome::Draw,
        None => Outcome::Active,
    }
}
