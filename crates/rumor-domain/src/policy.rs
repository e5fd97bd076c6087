//! Spread and decay policy
//!
//! The coefficients relating trust to believability transfer, and severity
//! to decay speed, are configuration rather than constants. The *shape* of
//! the rules is fixed here: transfer is monotonic in both the source's belief
//! and the relationship factor and always bounded to [0, 1]; decay is linear
//! in elapsed time and slower for more severe rumors.

use crate::{DomainError, Severity};
use serde::{Deserialize, Serialize};

/// Default fraction of the source's belief carried over a neutral relationship
pub const TRANSFER_RATE: f64 = 0.8;

/// Default weight of the relationship factor on transfer
pub const RELATIONSHIP_WEIGHT: f64 = 0.25;

/// Default bonus when a spread raises an existing, weaker belief
pub const REINFORCEMENT_BONUS: f64 = 0.05;

/// Default believability seeded for initial entities at creation
pub const INITIAL_BELIEVABILITY: f64 = 0.8;

/// Default believability lost per day by a moderate rumor
pub const BASE_DECAY_PER_DAY: f64 = 0.1;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Policy for computing a target's believability during a spread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadPolicy {
    /// Fraction of the source's belief transferred when the relationship is neutral.
    /// Must be in (0, 1) so that every hop loses some credibility.
    pub transfer_rate: f64,

    /// How strongly trust (+) or distrust (-) scales the transfer, in [0, 1]
    pub relationship_weight: f64,

    /// Added on top of the computed value when it beats an existing weaker belief
    pub reinforcement_bonus: f64,

    /// Believability seeded for the initial entities of a new rumor
    pub initial_believability: f64,
}

impl Default for SpreadPolicy {
    fn default() -> Self {
        Self {
            transfer_rate: TRANSFER_RATE,
            relationship_weight: RELATIONSHIP_WEIGHT,
            reinforcement_bonus: REINFORCEMENT_BONUS,
            initial_believability: INITIAL_BELIEVABILITY,
        }
    }
}

impl SpreadPolicy {
    /// Check every coefficient against its allowed range
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(self.transfer_rate > 0.0 && self.transfer_rate < 1.0) {
            return Err(DomainError::InvalidParameter(format!(
                "transfer_rate must be in (0, 1), got {}",
                self.transfer_rate
            )));
        }
        crate::ensure_unit("relationship_weight", self.relationship_weight)?;
        crate::ensure_unit("reinforcement_bonus", self.reinforcement_bonus)?;
        crate::ensure_unit("initial_believability", self.initial_believability)?;
        Ok(())
    }

    /// Believability transferred from a source to a target
    ///
    /// `relationship_factor` in [-1, 1]: positive values model trust, negative
    /// values distrust.
    pub fn transfer(&self, source_believability: f64, relationship_factor: f64) -> f64 {
        let trust = 1.0 + self.relationship_weight * relationship_factor;
        (source_believability * self.transfer_rate * trust).clamp(0.0, 1.0)
    }

    /// Combine a freshly computed believability with what the target already holds
    ///
    /// Repeated exposure never lowers a belief. When the new value beats a
    /// weaker existing belief, the reinforcement bonus is added.
    pub fn reinforce(&self, existing: Option<f64>, computed: f64) -> f64 {
        match existing {
            Some(current) if current >= computed => current,
            Some(_) => (computed + self.reinforcement_bonus).min(1.0),
            None => computed,
        }
    }
}

/// Per-severity multipliers on the base decay rate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityMultipliers {
    /// Multiplier for trivial rumors
    pub trivial: f64,
    /// Multiplier for minor rumors
    pub minor: f64,
    /// Multiplier for moderate rumors
    pub moderate: f64,
    /// Multiplier for major rumors
    pub major: f64,
    /// Multiplier for critical rumors
    pub critical: f64,
}

impl Default for SeverityMultipliers {
    fn default() -> Self {
        Self {
            trivial: 1.5,
            minor: 1.2,
            moderate: 1.0,
            major: 0.8,
            critical: 0.6,
        }
    }
}

impl SeverityMultipliers {
    /// Multiplier for one severity
    pub fn get(&self, severity: Severity) -> f64 {
        match severity {
            Severity::Trivial => self.trivial,
            Severity::Minor => self.minor,
            Severity::Moderate => self.moderate,
            Severity::Major => self.major,
            Severity::Critical => self.critical,
        }
    }
}

/// Policy for time-based believability decay
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecayPolicy {
    /// Believability lost per day at multiplier 1.0
    pub base_rate_per_day: f64,

    /// Severity scaling of the base rate
    pub severity_multipliers: SeverityMultipliers,
}

impl Default for DecayPolicy {
    fn default() -> Self {
        Self {
            base_rate_per_day: BASE_DECAY_PER_DAY,
            severity_multipliers: SeverityMultipliers::default(),
        }
    }
}

impl DecayPolicy {
    /// Check that rates are finite and non-negative, and that more severe
    /// rumors never decay faster than less severe ones
    pub fn validate(&self) -> Result<(), DomainError> {
        if !(self.base_rate_per_day.is_finite() && self.base_rate_per_day >= 0.0) {
            return Err(DomainError::InvalidParameter(format!(
                "base_rate_per_day must be a non-negative number, got {}",
                self.base_rate_per_day
            )));
        }

        let multipliers: Vec<f64> = Severity::ALL
            .iter()
            .map(|s| self.severity_multipliers.get(*s))
            .collect();
        if multipliers.iter().any(|m| !(m.is_finite() && *m >= 0.0)) {
            return Err(DomainError::InvalidParameter(
                "severity multipliers must be non-negative numbers".to_string(),
            ));
        }
        if multipliers.windows(2).any(|w| w[1] > w[0]) {
            return Err(DomainError::InvalidParameter(
                "severity multipliers must not increase with severity".to_string(),
            ));
        }
        Ok(())
    }

    /// Believability lost over `elapsed_secs` by a rumor of this severity
    pub fn amount(&self, severity: Severity, elapsed_secs: u64) -> f64 {
        let days = elapsed_secs as f64 / SECONDS_PER_DAY;
        self.base_rate_per_day * self.severity_multipliers.get(severity) * days
    }

    /// Apply decay to a believability value, never going below zero
    pub fn apply(&self, believability: f64, severity: Severity, elapsed_secs: u64) -> f64 {
        (believability - self.amount(severity, elapsed_secs)).max(0.0)
    }
}
