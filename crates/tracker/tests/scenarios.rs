use chrono::{DateTime, Duration, Utc};
use common::{Direction, Outcome, PriceMap, SignalRequest};
use tracker::{SignalTracker, TrackerState, ValidationWindow, WindowPolicy};

fn prices(symbol: &str, price: f64) -> PriceMap {
    PriceMap::from([(symbol.to_string(), price)])
}

fn long(symbol: &str, entry: f64) -> SignalRequest {
    SignalRequest::new(symbol, Direction::Long, entry, 0.6)
}

fn single_window(name: &str, minutes: u32, threshold: f64, timeout: u32) -> WindowPolicy {
    WindowPolicy::new(
        vec![ValidationWindow::new(name, minutes, threshold, -threshold)],
        timeout,
        None,
    )
    .unwrap()
}

/// Close one signal with a WIN (+1%), LOSS (-1%) or DRAW (flat past every deadline).
fn close_with(state: &mut TrackerState, outcome: Outcome, t0: DateTime<Utc>) {
    state.submit(long("BTCUSDT", 100.0), t0).unwrap();
    let closed = match outcome {
        Outcome::Win => state.tick(&prices("BTCUSDT", 101.0), t0 + Duration::minutes(1)),
        Outcome::Loss => state.tick(&prices("BTCUSDT", 99.0), t0 + Duration::minutes(1)),
        _ => state.tick(&prices("BTCUSDT", 100.0), t0 + Duration::minutes(11)),
    };
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].final_outcome, outcome);
}

#[test]
fn early_exit_is_asymmetric() {
    let t0 = Utc::now();
    let mut state = TrackerState::new(single_window("3min", 3, 0.3, 15));

    state.submit(long("WIN", 100.0), t0).unwrap();
    state.submit(long("FLAT", 100.0), t0).unwrap();

    let closed = state.tick(&prices("WIN", 100.35), t0 + Duration::minutes(1));
    assert_eq!(closed.len(), 1, "threshold crossed before the deadline resolves at once");
    assert_eq!(closed[0].window_outcome("3min"), Some(Outcome::Win));

    let closed = state.tick(&prices("FLAT", 100.0), t0 + Duration::minutes(1));
    assert!(closed.is_empty(), "a flat return must not resolve early");
    let view = &state.active_signals()[0];
    assert_eq!(view.symbol, "FLAT");
    assert_eq!(view.window_results[0].outcome, Outcome::Active);
}

#[test]
fn return_inside_thresholds_at_deadline_is_draw() {
    let t0 = Utc::now();
    let mut state = TrackerState::new(single_window("3min", 3, 0.3, 15));
    state.submit(long("BTCUSDT", 100.0), t0).unwrap();

    let closed = state.tick(&prices("BTCUSDT", 100.1), t0 + Duration::minutes(3));
    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].window_outcome("3min"), Some(Outcome::Draw));
    assert_eq!(closed[0].final_outcome, Outcome::Draw);
}

#[test]
fn terminal_window_determines_final_outcome() {
    let t0 = Utc::now();
    let mut state = TrackerState::new(WindowPolicy::default());
    state.submit(long("BTCUSDT", 100.0), t0).unwrap();

    // -0.35%: 3min LOSS, others still open.
    assert!(state
        .tick(&prices("BTCUSDT", 99.65), t0 + Duration::minutes(1))
        .is_empty());
    // +0.1% at the 5min deadline: 5min DRAW.
    assert!(state
        .tick(&prices("BTCUSDT", 100.1), t0 + Duration::minutes(5))
        .is_empty());
    // +0.6%: 10min WIN, signal closes.
    let closed = state.tick(&prices("BTCUSDT", 100.6), t0 + Duration::minutes(7));

    assert_eq!(closed.len(), 1);
    let eval = &closed[0];
    assert_eq!(eval.window_outcome("3min"), Some(Outcome::Loss));
    assert_eq!(eval.window_outcome("5min"), Some(Outcome::Draw));
    assert_eq!(eval.window_outcome("10min"), Some(Outcome::Win));
    assert_eq!(eval.final_outcome, Outcome::Win);
    assert!((eval.max_loss_pct + 0.35).abs() < 1e-9);
    assert!((eval.max_profit_pct - 0.6).abs() < 1e-9);

    let snap = state.snapshot();
    assert_eq!(snap.window("3min").unwrap().losses, 1);
    assert_eq!(snap.window("5min").unwrap().draws, 1);
    assert_eq!(snap.window("10min").unwrap().wins, 1);
    assert_eq!(snap.total_wins, 1);
}

#[test]
fn hard_timeout_expires_open_windows_and_closes() {
    let t0 = Utc::now();
    let policy = WindowPolicy::new(
        vec![
            ValidationWindow::new("3min", 3, 0.3, -0.3),
            ValidationWindow::new("5min", 5, 0.4, -0.4),
            ValidationWindow::new("20min", 20, 0.5, -0.5),
        ],
        15,
        None,
    )
    .unwrap();
    let mut state = TrackerState::new(policy);
    state.submit(long("BTCUSDT", 100.0), t0).unwrap();

    assert!(state
        .tick(&prices("BTCUSDT", 100.05), t0 + Duration::minutes(10))
        .is_empty());
    let closed = state.tick(&prices("BTCUSDT", 100.05), t0 + Duration::minutes(16));

    assert_eq!(closed.len(), 1);
    let eval = &closed[0];
    assert_eq!(eval.window_outcome("3min"), Some(Outcome::Draw));
    assert_eq!(eval.window_outcome("5min"), Some(Outcome::Draw));
    assert_eq!(eval.window_outcome("20min"), Some(Outcome::Expired));
    assert_eq!(eval.final_outcome, Outcome::Expired);
    assert_eq!(state.active_count(), 0);

    let snap = state.snapshot();
    assert_eq!(snap.total_draws, 1);
    assert_eq!(snap.total_expired, 1);
    assert_eq!(snap.window("20min").unwrap().expired, 1);
}

#[test]
fn aggregator_counts_and_streaks_follow_closure_order() {
    let t0 = Utc::now();
    let mut state = TrackerState::new(WindowPolicy::default());
    let sequence = [
        Outcome::Win,
        Outcome::Win,
        Outcome::Loss,
        Outcome::Win,
        Outcome::Win,
        Outcome::Draw,
        Outcome::Win,
        Outcome::Loss,
        Outcome::Loss,
    ];
    for outcome in sequence {
        close_with(&mut state, outcome, t0);
    }

    let snap = state.snapshot();
    assert_eq!(snap.total_signals, 9);
    assert_eq!(snap.total_wins, 5);
    assert_eq!(snap.total_losses, 3);
    assert_eq!(snap.total_draws, 1);
    // Draws do not break a streak: W W (D) W counts as three.
    assert_eq!(snap.max_consecutive_wins, 3);
    assert_eq!(snap.max_consecutive_losses, 2);
    assert_eq!(snap.consecutive_losses, 2);
    assert_eq!(snap.consecutive_wins, 0);
    assert!((snap.win_rate - 5.0 / 9.0).abs() < 1e-9);
    assert!((snap.cumulative_return_pct - 2.0).abs() < 1e-9);
}

#[test]
fn profit_factor_from_closed_signals() {
    let t0 = Utc::now();
    let mut state = TrackerState::new(WindowPolicy::default());
    for _ in 0..4 {
        state.submit(long("BTCUSDT", 100.0), t0).unwrap();
        state.tick(&prices("BTCUSDT", 101.0), t0 + Duration::minutes(1));
    }
    for _ in 0..2 {
        state.submit(long("ETHUSDT", 100.0), t0).unwrap();
        state.tick(&prices("ETHUSDT", 99.5), t0 + Duration::minutes(1));
    }

    let snap = state.snapshot();
    assert_eq!(snap.total_wins, 4);
    assert_eq!(snap.total_losses, 2);
    assert!((snap.avg_win_pct - 1.0).abs() < 1e-9);
    assert!((snap.avg_loss_pct + 0.5).abs() < 1e-9);
    assert!((snap.profit_factor - 4.0).abs() < 1e-9);
}

#[test]
fn signals_on_other_symbols_are_independent() {
    let t0 = Utc::now();
    let mut state = TrackerState::new(WindowPolicy::default());
    state.submit(long("BTCUSDT", 100.0), t0).unwrap();
    state
        .submit(SignalRequest::new("ETHUSDT", Direction::Short, 50.0, 0.9), t0)
        .unwrap();

    let mut both = prices("BTCUSDT", 101.0);
    both.insert("ETHUSDT".into(), 50.0);
    let closed = state.tick(&both, t0 + Duration::minutes(1));

    assert_eq!(closed.len(), 1);
    assert_eq!(closed[0].symbol, "BTCUSDT");
    assert_eq!(state.open_symbols(), vec!["ETHUSDT".to_string()]);
}

#[tokio::test]
async fn end_to_end_long_btc_closes_on_first_tick() {
    let tracker = SignalTracker::new(WindowPolicy::default());
    let t0 = Utc::now();
    let payload = serde_json::json!({ "rsi": 18.4 });
    let id = tracker
        .submit_at(long("BTC", 100.0).with_payload(payload.clone()), t0)
        .await
        .unwrap();

    let closed = tracker
        .tick(&prices("BTC", 100.5), t0 + Duration::minutes(1))
        .await;

    assert_eq!(closed.len(), 1);
    let eval = &closed[0];
    assert_eq!(eval.signal_id, id);
    assert_eq!(eval.window_outcome("3min"), Some(Outcome::Win));
    assert_eq!(eval.window_outcome("5min"), Some(Outcome::Win));
    assert_eq!(eval.window_outcome("10min"), Some(Outcome::Win));
    assert_eq!(eval.final_outcome, Outcome::Win);
    assert!((eval.final_return_pct - 0.5).abs() < 1e-9);
    assert!((eval.elapsed_minutes - 1.0).abs() < 1e-9);
    assert_eq!(eval.confidence, 0.6);
    assert_eq!(eval.payload, payload);

    assert_eq!(tracker.active_count().await, 0);
    let snap = tracker.snapshot().await;
    assert_eq!(snap.total_signals, 1);
    assert_eq!(snap.total_wins, 1);
    assert!(snap.profit_factor.is_infinite());

    let recent = tracker.recent_evaluations(10).await;
    assert_eq!(recent.len(), 1);
    assert_eq!(&recent[0], eval);
    assert_eq!(tracker.snapshot().await, snap);
}
