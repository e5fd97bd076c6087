//! Configuration for engine operations
//!
//! Spread and decay coefficients, lock budgets, mutation strategy selection
//! and the decay sweep cadence.

use crate::RumorError;
use rumor_domain::{DecayPolicy, SpreadPolicy};
use rumor_mutation::StrategyConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Configuration for the rumor engine
///
/// Every field has a default, so a TOML file only needs the values it
/// changes.
///
/// # Examples
///
/// ```
/// use rumor_engine::EngineConfig;
///
/// // Default configuration (balanced)
/// let config = EngineConfig::default();
/// assert_eq!(config.decay.sweep_interval_minutes, 60);
///
/// // Aggressive forgetting
/// let config = EngineConfig::aggressive();
/// assert_eq!(config.decay.sweep_interval_minutes, 15);
///
/// // Lenient forgetting
/// let config = EngineConfig::lenient();
/// assert_eq!(config.decay.sweep_interval_minutes, 240);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Believability transfer coefficients
    pub spread: SpreadPolicy,

    /// Decay coefficients and cadence
    pub decay: DecayConfig,

    /// Lock acquisition budget
    pub locking: LockConfig,

    /// Mutation strategy selection
    pub mutation: StrategyConfig,
}

/// The `[decay]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayConfig {
    /// Decay coefficients
    #[serde(flatten)]
    pub policy: DecayPolicy,

    /// How often the background worker runs a decay pass (in minutes)
    /// Default: Every 60 minutes (hourly)
    pub sweep_interval_minutes: u64,
}

impl Default for DecayConfig {
    fn default() -> Self {
        Self {
            policy: DecayPolicy::default(),
            sweep_interval_minutes: 60,
        }
    }
}

/// Longest allowed sweep interval (one year)
pub const MAX_SWEEP_INTERVAL_MINUTES: u64 = 365 * 24 * 60;

/// The `[locking]` table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// How long one attempt waits for a rumor's lock (in milliseconds)
    pub lock_timeout_ms: u64,

    /// Extra attempts after the first before reporting a conflict.
    /// Also bounds retries after an optimistic version mismatch.
    pub max_retries: u32,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: 500,
            max_retries: 3,
        }
    }
}

impl LockConfig {
    /// Get lock timeout as Duration
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }
}

impl EngineConfig {
    /// Aggressive configuration (fast forgetting, frequent sweeps)
    ///
    /// - Base decay: 0.2 per day
    /// - Sweep interval: 15 minutes
    pub fn aggressive() -> Self {
        let mut config = Self::default();
        config.decay.policy.base_rate_per_day = 0.2;
        config.decay.sweep_interval_minutes = 15;
        config
    }

    /// Lenient configuration (slow forgetting, infrequent sweeps)
    ///
    /// - Base decay: 0.05 per day
    /// - Sweep interval: 240 minutes (4 hours)
    pub fn lenient() -> Self {
        let mut config = Self::default();
        config.decay.policy.base_rate_per_day = 0.05;
        config.decay.sweep_interval_minutes = 240;
        config
    }

    /// Parse a TOML document and validate it
    pub fn from_toml_str(s: &str) -> Result<Self, RumorError> {
        let config: Self = toml::from_str(s).map_err(|e| RumorError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, RumorError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RumorError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&contents)
    }

    /// Reject out-of-range coefficients
    pub fn validate(&self) -> Result<(), RumorError> {
        let config_err = |e: rumor_domain::DomainError| RumorError::Config(e.to_string());
        self.spread.validate().map_err(config_err)?;
        self.decay.policy.validate().map_err(config_err)?;
        self.mutation.validate().map_err(config_err)?;

        if self.decay.sweep_interval_minutes == 0 {
            return Err(RumorError::Config(
                "sweep_interval_minutes must be greater than 0".to_string(),
            ));
        }
        if self.decay.sweep_interval_minutes > MAX_SWEEP_INTERVAL_MINUTES {
            return Err(RumorError::Config(format!(
                "sweep_interval_minutes must be at most {}",
                MAX_SWEEP_INTERVAL_MINUTES
            )));
        }
        if self.locking.lock_timeout_ms == 0 {
            return Err(RumorError::Config(
                "lock_timeout_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Get sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.decay.sweep_interval_minutes.saturating_mul(60))
    }
}
