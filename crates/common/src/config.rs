use std::time::Duration;

/// All process configuration loaded from environment variables at startup.
/// Missing required variables cause an immediate panic with a clear message.
#[derive(Debug, Clone)]
pub struct Config {
    // Reporting API
    pub dashboard_token: String,
    pub dashboard_port: u16,

    // Scheduler
    pub tick_interval: Duration,
    /// Quotes older than this are treated as missing on a tick.
    pub price_max_age: Duration,

    // Window policy file path
    pub window_config_path: String,
}

impl Config {
    /// Load all configuration from environment variables.
    /// Loads `.env` if present. Panics on any missing required variable.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv(); // ignore error if .env not present

        let tick_secs: u64 = optional_env("TICK_INTERVAL_SECS")
            .map(|v| {
                v.trim().parse().unwrap_or_else(|_| {
                    panic!("TICK_INTERVAL_SECS must be a whole number of seconds, got: '{v}'")
                })
            })
            .unwrap_or(60);
        if tick_secs == 0 {
            panic!("TICK_INTERVAL_SECS must be greater than zero");
        }

        // Default leaves room for one late push between ticks.
        let max_age_secs: u64 = optional_env("PRICE_MAX_AGE_SECS")
            .map(|v| {
                v.trim().parse().unwrap_or_else(|_| {
                    panic!("PRICE_MAX_AGE_SECS must be a whole number of seconds, got: '{v}'")
                })
            })
            .unwrap_or(tick_secs * 2);
        if max_age_secs == 0 {
            panic!("PRICE_MAX_AGE_SECS must be greater than zero");
        }

        Config {
            dashboard_token: required_env("DASHBOARD_TOKEN"),
            dashboard_port: optional_env("DASHBOARD_PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            tick_interval: Duration::from_secs(tick_secs),
            price_max_age: Duration::from_secs(max_age_secs),
            window_config_path: optional_env("WINDOW_CONFIG_PATH")
                .unwrap_or_else(|| "config/windows.toml".to_string()),
        }
    }
}

fn required_env(key: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| {
        panic!("Required environment variable '{key}' is not set. Check your .env file.")
    })
}

fn optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
