use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use common::{Result, SignalId, SignalSubmission};
use tracker::SignalTracker;

/// Counts reported when the intake loop finishes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IntakeSummary {
    pub accepted: u64,
    /// Well-formed submissions the tracker refused (bad price, unknown direction, ...).
    pub rejected: u64,
    /// Lines that were not a JSON submission at all.
    pub malformed: u64,
}

/// Feeds signals from the signal-generation layer into the tracker.
///
/// Upstream generators hand over one JSON submission per message, e.g.
/// `{"symbol":"BTCUSDT","direction":"long","entry_price":100.0,"confidence":0.6}`.
pub struct SignalIntake {
    tracker: SignalTracker,
    line_rx: mpsc::Receiver<String>,
}

impl SignalIntake {
    pub fn new(tracker: SignalTracker, line_rx: mpsc::Receiver<String>) -> Self {
        Self { tracker, line_rx }
    }

    /// Run until every sender is dropped. Rejected and malformed lines are
    /// logged and dropped; they never reach the tracker's statistics.
    pub async fn run(mut self) -> IntakeSummary {
        info!("SignalIntake running");
        let mut summary = IntakeSummary::default();

        while let Some(line) = self.line_rx.recv().await {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let submission = match serde_json::from_str::<SignalSubmission>(line) {
                Ok(submission) => submission,
                Err(e) => {
                    summary.malformed += 1;
                    warn!(error = %e, "Malformed signal line ignored");
                    continue;
                }
            };

            let symbol = submission.symbol.clone();
            match self.submit(submission).await {
                Ok(id) => {
                    summary.accepted += 1;
                    debug!(id = %id, "Signal accepted");
                }
                Err(e) => {
                    summary.rejected += 1;
                    warn!(symbol = %symbol, error = %e, "Signal submission rejected");
                }
            }
        }

        warn!(
            accepted = summary.accepted,
            rejected = summary.rejected,
            malformed = summary.malformed,
            "Signal channel closed: stopping intake"
        );
        summary
    }

    async fn submit(&self, submission: SignalSubmission) -> Result<SignalId> {
        let request = submission.into_request()?;
        self.tracker.submit(request).await
    }
}
