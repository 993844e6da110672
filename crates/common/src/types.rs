use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::Error;

/// Latest price per symbol, delivered once per tick by the price source.
pub type PriceMap = HashMap<String, f64>;

/// Direction of a tracked bet. Serialized as `LONG`/`SHORT`, accepted in any case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", try_from = "String")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// Percentage move normalized for direction: positive is favorable.
    pub fn signed_return_pct(&self, entry_price: f64, price: f64) -> f64 {
        match self {
            Direction::Long => (price - entry_price) * 100.0 / entry_price,
            Direction::Short => (entry_price - price) * 100.0 / entry_price,
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Long => write!(f, "LONG"),
            Direction::Short => write!(f, "SHORT"),
        }
    }
}

impl FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "LONG" => Ok(Direction::Long),
            "SHORT" => Ok(Direction::Short),
            _ => Err(RejectionReason::UnknownDirection(s.to_string()).into()),
        }
    }
}

impl TryFrom<String> for Direction {
    type Error = Error;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Result of evaluating one window (or a whole signal).
/// `Active` is the only non-terminal value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Outcome {
    #[default]
    Active,
    Win,
    Loss,
    Draw,
    Expired,
}

impl Outcome {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Outcome::Active)
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Active => write!(f, "ACTIVE"),
            Outcome::Win => write!(f, "WIN"),
            Outcome::Loss => write!(f, "LOSS"),
            Outcome::Draw => write!(f, "DRAW"),
            Outcome::Expired => write!(f, "EXPIRED"),
        }
    }
}

/// A new signal handed over by the signal-generation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalRequest {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    /// Expected in `0.0..=1.0` but passed through unchecked.
    pub confidence: f64,
    /// Opaque indicator context, carried through to the evaluation.
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl SignalRequest {
    pub fn new(
        symbol: impl Into<String>,
        direction: Direction,
        entry_price: f64,
        confidence: f64,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            direction,
            entry_price,
            confidence,
            payload: serde_json::Value::Null,
        }
    }

    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = payload;
        self
    }

    /// Check the fields the tracker cannot work without.
    pub fn validate(&self) -> Result<(), RejectionReason> {
        if self.symbol.trim().is_empty() {
            return Err(RejectionReason::EmptySymbol);
        }
        if !self.entry_price.is_finite() || self.entry_price <= 0.0 {
            return Err(RejectionReason::InvalidEntryPrice(self.entry_price));
        }
        Ok(())
    }
}

/// A submission as it arrives over the wire, before the direction is parsed.
///
/// Keeping `direction` as text lets an unknown value surface as
/// `RejectionReason::UnknownDirection` instead of a decode failure.
#[derive(Debug, Clone, Deserialize)]
pub struct SignalSubmission {
    pub symbol: String,
    pub direction: String,
    pub entry_price: f64,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl SignalSubmission {
    pub fn into_request(self) -> Result<SignalRequest, Error> {
        let direction = self.direction.parse::<Direction>()?;
        Ok(SignalRequest::new(self.symbol, direction, self.entry_price, self.confidence)
            .with_payload(self.payload))
    }
}

/// Process-unique identifier of a tracked signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalId(pub String);

impl SignalId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SignalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Final outcome of one window on a closed signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowResult {
    pub window: String,
    pub outcome: Outcome,
}

/// Emitted exactly once per closed signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalEvaluation {
    pub signal_id: SignalId,
    pub symbol: String,
    pub direction: Direction,
    pub confidence: f64,
    pub payload: serde_json::Value,
    pub entry_price: f64,
    pub entry_time: DateTime<Utc>,
    pub close_price: f64,
    pub close_time: DateTime<Utc>,
    /// Per-window outcomes, shortest window first.
    pub window_results: Vec<WindowResult>,
    pub max_profit_pct: f64,
    pub max_loss_pct: f64,
    pub elapsed_minutes: f64,
    /// Outcome of the terminal (longest) window.
    pub final_outcome: Outcome,
    /// Signed return at closing time.
    pub final_return_pct: f64,
}

impl SignalEvaluation {
    pub fn window_outcome(&self, window: &str) -> Option<Outcome> {
        self.window_results
            .iter()
            .find(|r| r.window == window)
            .map(|r| r.outcome)
    }
}

/// Why a signal submission was refused.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RejectionReason {
    EmptySymbol,
    InvalidEntryPrice(f64),
    UnknownDirection(String),
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectionReason::EmptySymbol => write!(f, "symbol must not be empty"),
            RejectionReason::InvalidEntryPrice(p) => {
                write!(f, "entry price must be a positive number, got {p}")
            }
            RejectionReason::UnknownDirection(d) => {
                write!(f, "direction must be LONG or SHORT, got '{d}'")
            }
        }
    }
}

/// Current state of the tick scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    #[default]
    Stopped,
    Running,
    Paused,
}

impl std::fmt::Display for EngineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineState::Stopped => write!(f, "stopped"),
            EngineState::Running => write!(f, "running"),
            EngineState::Paused => write!(f, "paused"),
        }
    }
}

/// Commands sent to the scheduler via the command channel.
#[derive(Debug, Clone)]
pub enum EngineCommand {
    Start,
    Stop,
    Pause,
    Resume,
}
