use chrono::{DateTime, Utc};
use tracing::{debug, info};

use common::{Outcome, SignalEvaluation};

use crate::classifier::classify;
use crate::registry::{PricePoint, TrackedSignal};
use crate::stats::PerformanceStats;
use crate::window::WindowPolicy;

/// Advance one open signal with a fresh price.
///
/// Updates extrema and price history, resolves any windows that are now
/// decided (counting each into the per-window tallies immediately), applies
/// the hard timeout, and returns the evaluation if every window is resolved.
/// Only touches `signal` and the commutative per-window counters in `stats`,
/// so signals can be advanced in any order.
pub fn advance(
    signal: &mut TrackedSignal,
    policy: &WindowPolicy,
    price: f64,
    now: DateTime<Utc>,
    stats: &mut PerformanceStats,
) -> Option<SignalEvaluation> {
    let signed_return = signal.direction.signed_return_pct(signal.entry_price, price);

    signal.max_profit_pct = signal.max_profit_pct.max(signed_return);
    signal.max_loss_pct = signal.max_loss_pct.min(signed_return);
    signal.last_return_pct = Some(signed_return);
    signal.price_history.push(PricePoint { time: now, price });

    let elapsed = signal.elapsed_minutes(now);

    for (idx, window) in policy.windows().iter().enumerate() {
        let slot = &mut signal.window_outcomes[idx];
        if slot.outcome.is_terminal() {
            continue;
        }
        let outcome = classify(signed_return, window, elapsed);
        if outcome.is_terminal() {
            slot.outcome = outcome;
            stats.record_window(idx, outcome);
            debug!(
                id = %signal.id,
                window = %window.name,
                outcome = %outcome,
                return_pct = signed_return,
                elapsed_min = elapsed,
                "Window resolved"
            );
        }
    }

    if elapsed > f64::from(policy.hard_timeout_minutes()) {
        for (idx, slot) in signal.window_outcomes.iter_mut().enumerate() {
            if slot.outcome == Outcome::Active {
                slot.outcome = Outcome::Expired;
                stats.record_window(idx, Outcome::Expired);
            }
        }
    }

    if !signal.is_resolved() {
        return None;
    }

    let final_outcome = match signal.window_outcomes[policy.terminal_index()].outcome {
        Outcome::Active => Outcome::Expired,
        other => other,
    };

    info!(
        id = %signal.id,
        symbol = %signal.symbol,
        outcome = %final_outcome,
        return_pct = signed_return,
        elapsed_min = elapsed,
        "Signal closed"
    );

    Some(SignalEvaluation {
        signal_id: signal.id.clone(),
        symbol: signal.symbol.clone(),
        direction: signal.direction,
        confidence: signal.confidence,
        payload: signal.payload.clone(),
        entry_price: signal.entry_price,
        entry_time: signal.entry_time,
        close_price: price,
        close_time: now,
        window_results: signal.window_outcomes.clone(),
        max_profit_pct: signal.max_profit_pct,
        max_loss_pct: signal.max_loss_pct,
        elapsed_minutes: elapsed,
        final_outcome,
        final_return_pct: signed_return,
    })
}
