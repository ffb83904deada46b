//! Configuration management.
//!
//! Credentials never go in here; the host keeps those.

use aquawatch_fetch::RetryStrategy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::persistence::{default_config_path, load_json, save_json};

/// Default time between scheduled refreshes (12 hours).
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(12 * 60 * 60);

/// Shortest refresh interval accepted from a config file.
pub const MIN_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Service configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Seconds between scheduled refreshes.
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// Retry policy for transient failures.
    #[serde(default)]
    pub retry: RetryConfig,
}

/// Retry settings for transient refresh failures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Attempts per scheduled refresh, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry, doubled on each further retry.
    #[serde(default = "default_base_delay_secs")]
    pub base_delay_secs: u64,
    /// Upper bound on any retry delay.
    #[serde(default = "default_max_delay_secs")]
    pub max_delay_secs: u64,
}

fn default_refresh_interval_secs() -> u64 {
    DEFAULT_REFRESH_INTERVAL.as_secs()
}

fn default_max_attempts() -> u32 {
    3
}

fn default_base_delay_secs() -> u64 {
    30
}

fn default_max_delay_secs() -> u64 {
    600
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_secs: default_base_delay_secs(),
            max_delay_secs: default_max_delay_secs(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            refresh_interval_secs: default_refresh_interval_secs(),
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Loads configuration from the default path.
    pub async fn load() -> Result<Self, StoreError> {
        Self::load_from(&default_config_path()).await
    }

    /// Loads configuration from a specific path, falling back to defaults
    /// when the file does not exist.
    pub async fn load_from(path: &Path) -> Result<Self, StoreError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let config: Config = load_json(path).await?;
        config.validate()?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Saves configuration to the default path.
    pub async fn save(&self) -> Result<(), StoreError> {
        self.save_to(&default_config_path()).await
    }

    /// Saves configuration to a specific path.
    pub async fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        self.validate()?;
        save_json(path, self).await?;

        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    /// Checks values that cannot be clamped into something sensible.
    pub fn validate(&self) -> Result<(), StoreError> {
        if self.retry.max_attempts == 0 {
            return Err(StoreError::Config(
                "retry.max_attempts must be at least 1".into(),
            ));
        }
        if self.retry.base_delay_secs > self.retry.max_delay_secs {
            return Err(StoreError::Config(format!(
                "retry.base_delay_secs ({}) exceeds retry.max_delay_secs ({})",
                self.retry.base_delay_secs, self.retry.max_delay_secs
            )));
        }
        Ok(())
    }

    /// The refresh interval, never shorter than [`MIN_REFRESH_INTERVAL`].
    pub fn refresh_interval(&self) -> Duration {
        let configured = Duration::from_secs(self.refresh_interval_secs);
        if configured < MIN_REFRESH_INTERVAL {
            warn!(
                configured_secs = self.refresh_interval_secs,
                "Refresh interval too short, clamping"
            );
            return MIN_REFRESH_INTERVAL;
        }
        configured
    }

    /// The retry policy described by this config.
    pub fn retry_strategy(&self) -> RetryStrategy {
        RetryStrategy::new(self.retry.max_attempts)
            .with_base_delay(self.retry.base_delay_secs)
            .with_max_delay(self.retry.max_delay_secs)
    }
}
