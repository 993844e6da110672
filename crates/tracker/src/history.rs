use std::collections::VecDeque;

use common::SignalEvaluation;

/// Closed evaluations in closure order, optionally capped.
#[derive(Debug, Default)]
pub struct EvaluationHistory {
    entries: VecDeque<SignalEvaluation>,
    limit: Option<usize>,
}

impl EvaluationHistory {
    /// `None` keeps everything; `Some(n)` drops the oldest entries past `n`.
    pub fn new(limit: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            limit,
        }
    }

    pub fn push(&mut self, evaluation: SignalEvaluation) {
        self.entries.push_back(evaluation);
        if let Some(limit) = self.limit {
            while self.entries.len() > limit {
                self.entries.pop_front();
            }
        }
    }

    /// The last `n` evaluations, oldest first.
    pub fn recent(&self, n: usize) -> Vec<SignalEvaluation> {
        let skip = self.entries.len().saturating_sub(n);
        self.entries.iter().skip(skip).cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use common::{Direction, Outcome, SignalId};

    fn make_eval(n: usize) -> SignalEvaluation {
        let now = Utc::now();
        SignalEvaluation {
            signal_id: SignalId(format!("sig-{n}")),
            symbol: "BTCUSDT".into(),
            direction: Direction::Long,
            confidence: 0.5,
            payload: serde_json::Value::Null,
            entry_price: 100.0,
            entry_time: now,
            close_price: 100.0,
            close_time: now,
            window_results: Vec::new(),
            max_profit_pct: 0.0,
            max_loss_pct: 0.0,
            elapsed_minutes: 0.0,
            final_outcome: Outcome::Draw,
            final_return_pct: 0.0,
        }
    }

    #[test]
    fn recent_returns_suffix_in_closure_order() {
        let mut history = EvaluationHistory::new(None);
        for n in 0..5 {
            history.push(make_eval(n));
        }
        let recent = history.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].signal_id.as_str(), "sig-3");
        assert_eq!(recent[1].signal_id.as_str(), "sig-4");
        assert_eq!(history.recent(50).len(), 5);
        assert!(history.recent(0).is_empty());
    }

    #[test]
    fn limit_drops_oldest_entries() {
        let mut history = EvaluationHistory::new(Some(3));
        for n in 0..5 {
            history.push(make_eval(n));
        }
        assert_eq!(history.len(), 3);
        assert_eq!(history.recent(10)[0].signal_id.as_str(), "sig-2");
    }
}
