//! Runtime configuration loaded from environment variables.

use std::path::PathBuf;
use std::time::Duration;

use crate::store::{IncomeMode, RetryPolicy};

/// Default decay tick period: every 30 minutes.
pub const DEFAULT_DECAY_INTERVAL_SECS: u64 = 30 * 60;

#[derive(Clone, Debug)]
pub struct Config {
    /// Database file (from POCKET_ZOO_DB). `None` uses the platform data dir.
    pub db_path: Option<PathBuf>,
    /// Period of the stat decay tick (from POCKET_ZOO_DECAY_INTERVAL_SECS).
    pub decay_interval: Duration,
    /// Passive income policy (from POCKET_ZOO_INCOME_MODE: `delta` or `cumulative`).
    pub income_mode: IncomeMode,
    /// Save retry policy; attempts from POCKET_ZOO_SAVE_RETRIES.
    pub save_retry: RetryPolicy,
}

impl Config {
    pub fn from_env() -> Self {
        let db_path = std::env::var("POCKET_ZOO_DB").ok().map(PathBuf::from);

        let decay_interval = std::env::var("POCKET_ZOO_DECAY_INTERVAL_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_DECAY_INTERVAL_SECS));

        let income_mode = match std::env::var("POCKET_ZOO_INCOME_MODE") {
            Ok(raw) => IncomeMode::from_str(raw.trim()).unwrap_or_else(|| {
                tracing::warn!("Unknown POCKET_ZOO_INCOME_MODE '{}', using delta", raw);
                IncomeMode::Delta
            }),
            Err(_) => IncomeMode::Delta,
        };

        let mut save_retry = RetryPolicy::default();
        if let Some(attempts) = std::env::var("POCKET_ZOO_SAVE_RETRIES")
            .ok()
            .and_then(|s| s.parse::<u32>().ok())
        {
            save_retry.max_attempts = attempts;
        }

        Self {
            db_path,
            decay_interval,
            income_mode,
            save_retry,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: None,
            decay_interval: Duration::from_secs(DEFAULT_DECAY_INTERVAL_SECS),
            income_mode: IncomeMode::Delta,
            save_retry: RetryPolicy::default(),
        }
    }
}
