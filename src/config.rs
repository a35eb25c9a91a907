// Runtime configuration, read from the environment (and `.env` via dotenv).

use crate::core::moderation::ModerationError;
use std::time::Duration;

pub const DATABASE_URL_ENV_VAR: &str = "MODERATION_DATABASE_URL";
pub const SWEEP_INTERVAL_ENV_VAR: &str = "MODERATION_SWEEP_INTERVAL_SECS";

/// Keep runtime databases in a dedicated folder so the repo root stays tidy.
pub const DEFAULT_DATABASE_URL: &str = "data/moderation.db";
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_url: String,
    pub sweep_interval: Duration,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ModerationError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup. Unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ModerationError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup(DATABASE_URL_ENV_VAR)
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string());

        let sweep_secs = match lookup(SWEEP_INTERVAL_ENV_VAR) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .ok()
                .filter(|secs| *secs > 0)
                .ok_or_else(|| {
                    ModerationError::ConfigError(format!(
                        "{} must be a positive number of seconds, got '{}'",
                        SWEEP_INTERVAL_ENV_VAR, raw
                    ))
                })?,
            None => DEFAULT_SWEEP_INTERVAL_SECS,
        };

        Ok(Self {
            database_url,
            sweep_interval: Duration::from_secs(sweep_secs),
        })
    }
}
