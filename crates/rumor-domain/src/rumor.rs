//! Rumor module - the root of every lineage

use crate::{ensure_unit, DomainError, EntityId, RumorId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Ordinal importance of a rumor
///
/// Severity modulates decay: the more severe a rumor, the longer it is
/// remembered. The derived ordering follows declaration order, so
/// `Trivial < Minor < Moderate < Major < Critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Idle gossip
    Trivial,
    /// Interesting but not consequential
    Minor,
    /// Could affect a reputation
    Moderate,
    /// Could affect relationships or alliances
    Major,
    /// Could trigger major events
    Critical,
}

impl Severity {
    /// All severities in ascending order
    pub const ALL: [Severity; 5] = [
        Severity::Trivial,
        Severity::Minor,
        Severity::Moderate,
        Severity::Major,
        Severity::Critical,
    ];

    /// Get the severity name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Trivial => "trivial",
            Severity::Minor => "minor",
            Severity::Moderate => "moderate",
            Severity::Major => "major",
            Severity::Critical => "critical",
        }
    }

    /// Parse a severity from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "trivial" => Some(Severity::Trivial),
            "minor" => Some(Severity::Minor),
            "moderate" => Some(Severity::Moderate),
            "major" => Some(Severity::Major),
            "critical" => Some(Severity::Critical),
            _ => None,
        }
    }

    /// Position in the ordinal scale, 0 for trivial through 4 for critical
    pub fn rank(&self) -> u8 {
        *self as u8
    }
}

impl std::str::FromStr for Severity {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| DomainError::InvalidParameter(format!("Unknown severity: {}", s)))
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Topic tag attached to a rumor
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Rulers, councils, elections
    Political,
    /// Private affairs of an individual
    Personal,
    /// Community standing and customs
    Social,
    /// Armies, raids, fortifications
    Military,
    /// Trade, prices, fortunes
    Economic,
    /// Temples, omens, heresy
    Religious,
    /// Events of the distant past
    Historical,
    /// Small talk
    Gossip,
    /// Threats to life and limb
    Danger,
    /// Anything else
    Other,
}

impl Category {
    /// Get the category name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Political => "political",
            Category::Personal => "personal",
            Category::Social => "social",
            Category::Military => "military",
            Category::Economic => "economic",
            Category::Religious => "religious",
            Category::Historical => "historical",
            Category::Gossip => "gossip",
            Category::Danger => "danger",
            Category::Other => "other",
        }
    }

    /// Parse a category from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "political" => Some(Category::Political),
            "personal" => Some(Category::Personal),
            "social" => Some(Category::Social),
            "military" => Some(Category::Military),
            "economic" => Some(Category::Economic),
            "religious" => Some(Category::Religious),
            "historical" => Some(Category::Historical),
            "gossip" => Some(Category::Gossip),
            "danger" => Some(Category::Danger),
            "other" => Some(Category::Other),
            _ => None,
        }
    }

    /// Parse a category, mapping unknown tags to `Other`
    pub fn parse_lenient(s: &str) -> Self {
        Self::parse(s).unwrap_or(Category::Other)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rumor - the root of a lineage
///
/// Created once. Only `updated_at` changes afterwards; content, truth value
/// and severity are fixed for the lifetime of the rumor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rumor {
    /// Unique identifier
    pub id: RumorId,

    /// Text as first told by the originator
    pub original_content: String,

    /// Topic tags (never empty)
    pub categories: BTreeSet<Category>,

    /// Ordinal importance
    pub severity: Severity,

    /// Objective accuracy in [0, 1], independent of who believes it
    pub truth_value: f64,

    /// Entity the rumor started with
    pub originator_id: EntityId,

    /// When this rumor was created
    pub created_at: Timestamp,

    /// Last time any part of the rumor's record changed
    pub updated_at: Timestamp,
}

impl Rumor {
    /// Create a new rumor with a fresh id
    ///
    /// # Errors
    /// Returns `InvalidParameter` if the content is empty or the truth value
    /// is outside [0, 1]. An empty category set defaults to `{Other}`.
    pub fn new(
        originator_id: EntityId,
        content: impl Into<String>,
        categories: impl IntoIterator<Item = Category>,
        severity: Severity,
        truth_value: f64,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(DomainError::InvalidParameter(
                "Rumor content cannot be empty".to_string(),
            ));
        }
        let truth_value = ensure_unit("truth_value", truth_value)?;

        let mut categories: BTreeSet<Category> = categories.into_iter().collect();
        if categories.is_empty() {
            categories.insert(Category::Other);
        }

        Ok(Self {
            id: RumorId::new(),
            original_content: content,
            categories,
            severity,
            truth_value,
            originator_id,
            created_at: now,
            updated_at: now,
        })
    }

    /// Check whether the rumor carries any of the given categories
    pub fn has_any_category(&self, categories: &[Category]) -> bool {
        categories.iter().any(|c| self.categories.contains(c))
    }
}
