use chrono::{Duration, Utc};
use common::{Direction, Outcome, PriceMap, SignalRequest};
use proptest::prelude::*;
use tracker::{classify, TrackerState, ValidationWindow, WindowPolicy};

fn direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Long), Just(Direction::Short)]
}

proptest! {
    /// Tick evaluation on randomized prices and clocks must never panic, and
    /// every submitted signal is either still open or closed exactly once.
    #[test]
    fn tick_never_panics_and_conserves_signals(
        entries in prop::collection::vec((direction(), 0.0001f64..1_000_000.0f64), 1..20),
        moves in prop::collection::vec((-0.05f64..0.05f64, -120i64..1_200i64), 1..10),
    ) {
        let t0 = Utc::now();
        let mut state = TrackerState::new(WindowPolicy::default());
        for (dir, entry) in &entries {
            state
                .submit(SignalRequest::new("TESTUSDT", *dir, *entry, 0.5), t0)
                .unwrap();
        }

        let mut closed = Vec::new();
        for (i, (pct, secs)) in moves.iter().enumerate() {
            // One shared price per tick, so returns differ per signal.
            let (_, base) = entries[i % entries.len()];
            let price = base * (1.0 + pct);
            let prices = PriceMap::from([("TESTUSDT".to_string(), price)]);
            closed.extend(state.tick(&prices, t0 + Duration::seconds(*secs)));
        }

        let snap = state.snapshot();
        prop_assert_eq!(snap.total_signals as usize, entries.len());
        prop_assert_eq!(snap.active_signals + closed.len(), entries.len());
        prop_assert_eq!((snap.total_wins + snap.total_losses + snap.total_draws) as usize, closed.len());
        prop_assert_eq!(snap.evaluations_recorded, closed.len());

        let mut ids: Vec<_> = closed.iter().map(|e| e.signal_id.clone()).collect();
        ids.sort();
        ids.dedup();
        prop_assert_eq!(ids.len(), closed.len());

        for eval in &closed {
            prop_assert!(eval.window_results.iter().all(|r| r.outcome != Outcome::Active));
            prop_assert!(eval.max_profit_pct >= 0.0);
            prop_assert!(eval.max_loss_pct <= 0.0);
            prop_assert!(eval.elapsed_minutes >= 0.0);
        }

        // Each closed signal resolved every window exactly once.
        for window in &snap.windows {
            let resolved = window.wins + window.losses + window.draws + window.expired;
            prop_assert!(resolved as usize >= closed.len());
            prop_assert!(resolved as usize <= entries.len());
        }
    }

    /// Max win streak bounds the longest uninterrupted run of WIN closures.
    #[test]
    fn max_win_streak_covers_longest_run(
        wins in prop::collection::vec(any::<bool>(), 1..40),
    ) {
        let t0 = Utc::now();
        let mut state = TrackerState::new(WindowPolicy::default());
        let mut longest = 0u64;
        let mut run = 0u64;
        for (i, win) in wins.iter().enumerate() {
            let symbol = format!("S{i}");
            state
                .submit(SignalRequest::new(symbol.clone(), Direction::Long, 100.0, 0.5), t0)
                .unwrap();
            let price = if *win { 101.0 } else { 99.0 };
            let closed = state.tick(&PriceMap::from([(symbol, price)]), t0 + Duration::minutes(1));
            prop_assert_eq!(closed.len(), 1);
            if *win { run += 1; longest = longest.max(run); } else { run = 0; }
        }

        let snap = state.snapshot();
        let expected_wins = wins.iter().filter(|w| **w).count() as u64;
        prop_assert_eq!(snap.total_wins, expected_wins);
        prop_assert_eq!(snap.total_losses, wins.len() as u64 - expected_wins);
        prop_assert!(snap.max_consecutive_wins >= longest);
    }

    /// Before the deadline the classifier never yields DRAW; at or after it
    /// never yields ACTIVE.
    #[test]
    fn classifier_respects_deadline_asymmetry(
        ret in -5.0f64..5.0f64,
        elapsed in 0.0f64..30.0f64,
        duration in 1u32..20u32,
        threshold in 0.01f64..2.0f64,
    ) {
        let window = ValidationWindow::new("w", duration, threshold, -threshold);
        let outcome = classify(ret, &window, elapsed);
        if elapsed < f64::from(duration) {
            prop_assert_ne!(outcome, Outcome::Draw);
        } else {
            prop_assert_ne!(outcome, Outcome::Active);
        }
        prop_assert_ne!(outcome, Outcome::Expired);
    }
}
