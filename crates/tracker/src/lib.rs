pub mod classifier;
pub mod config;
pub mod evaluator;
pub mod history;
pub mod registry;
pub mod report;
pub mod stats;
pub mod tracker;
pub mod window;

pub use classifier::classify;
pub use config::TrackerFileConfig;
pub use history::EvaluationHistory;
pub use registry::{PricePoint, SignalRegistry, TrackedSignal};
pub use report::{ActiveSignalView, PerformanceSnapshot, WindowSnapshot};
pub use stats::{PerformanceStats, WindowTally};
pub use tracker::{SignalTracker, TrackerState};
pub use window::{ValidationWindow, WindowPolicy, DEFAULT_HARD_TIMEOUT_MINUTES};
