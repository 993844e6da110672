use serde::{Deserialize, Serialize};

use common::Result;

use crate::window::{ValidationWindow, WindowPolicy, DEFAULT_HARD_TIMEOUT_MINUTES};

/// Window policy file (TOML).
///
/// Example `config/windows.toml`:
/// ```toml
/// hard_timeout_minutes = 15
/// history_limit = 1000
///
/// [[window]]
/// name = "3min"
/// duration_minutes = 3
/// profit_threshold = 0.3
/// loss_threshold = -0.3
/// ```
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TrackerFileConfig {
    #[serde(default = "default_hard_timeout")]
    pub hard_timeout_minutes: u32,
    /// Maximum closed evaluations kept in memory. Unbounded when absent.
    #[serde(default)]
    pub history_limit: Option<usize>,
    #[serde(rename = "window")]
    pub windows: Vec<ValidationWindow>,
}

fn default_hard_timeout() -> u32 {
    DEFAULT_HARD_TIMEOUT_MINUTES
}

impl TrackerFileConfig {
    /// Load from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Validate and convert into the policy the tracker runs with.
    pub fn into_policy(self) -> Result<WindowPolicy> {
        WindowPolicy::new(self.windows, self.hard_timeout_minutes, self.history_limit)
    }
}
