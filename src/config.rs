use std::env;
use std::time::Duration;

use crate::error::ConfigError;

const DEFAULT_TARGET_NAME: &str = "LYWSD02";
const DEFAULT_SCAN_WINDOW_SECS: u64 = 30;
const DEFAULT_SCAN_DEADLINE_SECS: u64 = 30;
const DEFAULT_REPEAT_SCAN: bool = true;
const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_OVERALL_TIMEOUT_SECS: u64 = 30;
const DEFAULT_DATA_READY_DELAY_SECS: u64 = 10;

/// Runtime configuration, loaded from the environment with recognized
/// defaults for every value.
#[derive(Debug, Clone)]
pub struct Config {
    /// Case-sensitive substring the advertised device name must contain
    pub target_name: String,
    /// Length of the single-pass scan window
    pub scan_window: Duration,
    /// Total time budget of the repeated-scan strategy
    pub scan_deadline: Duration,
    /// Use short repeated scan windows instead of one long window
    pub repeat_scan: bool,
    /// Budget for one connect attempt including the liveness check
    pub connect_timeout: Duration,
    /// Outer deadline covering connect and telemetry together
    pub overall_timeout: Duration,
    /// Settling time after connect before the first characteristic read
    pub data_ready_delay: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load environment variables from .env if present
        dotenv::dotenv().ok();

        Ok(Config {
            target_name: env::var("SENSOR_NAME")
                .unwrap_or_else(|_| DEFAULT_TARGET_NAME.to_string()),
            scan_window: secs_var("SCAN_WINDOW_SECS", DEFAULT_SCAN_WINDOW_SECS)?,
            scan_deadline: secs_var("SCAN_DEADLINE_SECS", DEFAULT_SCAN_DEADLINE_SECS)?,
            repeat_scan: bool_var("REPEAT_SCAN", DEFAULT_REPEAT_SCAN)?,
            connect_timeout: secs_var("CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?,
            overall_timeout: secs_var("OVERALL_TIMEOUT_SECS", DEFAULT_OVERALL_TIMEOUT_SECS)?,
            data_ready_delay: secs_var("DATA_READY_DELAY_SECS", DEFAULT_DATA_READY_DELAY_SECS)?,
        })
    }
}

fn secs_var(key: &'static str, default: u64) -> Result<Duration, ConfigError> {
    match env::var(key) {
        Ok(value) => match value.trim().parse::<u64>() {
            Ok(secs) => Ok(Duration::from_secs(secs)),
            Err(e) => Err(ConfigError::Invalid {
                key,
                value,
                reason: e.to_string(),
            }),
        },
        Err(_) => Ok(Duration::from_secs(default)),
    }
}

fn bool_var(key: &'static str, default: bool) -> Result<bool, ConfigError> {
    match env::var(key) {
        Ok(value) => match value.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" => Ok(false),
            _ => Err(ConfigError::Invalid {
                key,
                value,
                reason: "expected true/false".to_string(),
            }),
        },
        Err(_) => Ok(default),
    }
}
