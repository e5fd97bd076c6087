//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the rumor engine and its
//! collaborators. Implementations live in other crates.

use crate::{Category, EntityId, Rumor, RumorEvent, RumorId, RumorRecord, Severity, SubjectId};
use thiserror::Error;

/// Result of an optimistic record update
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateStatus {
    /// The record was written; carries the new version
    Committed {
        /// Version now stored
        version: u64,
    },
    /// Someone else wrote the record first; carries the stored version
    Stale {
        /// Version currently stored
        current: u64,
    },
}

/// Storage for rumor records, keyed by rumor id
///
/// Implemented by the infrastructure layer (rumor-store). Implementations must
/// store and load whole records atomically so that readers never observe a
/// half-written spread.
pub trait RumorRepository: Send + Sync {
    /// Error type for store operations
    type Error: std::error::Error + Send + Sync + 'static;

    /// Store a new record
    fn create(&self, record: RumorRecord) -> Result<RumorId, Self::Error>;

    /// Load a record by rumor id
    fn get(&self, id: RumorId) -> Result<Option<RumorRecord>, Self::Error>;

    /// Resolve a rumor or variant id to its root rumor id
    fn root_of(&self, subject_id: SubjectId) -> Result<Option<RumorId>, Self::Error>;

    /// Replace a record if its `version` still matches the stored one
    ///
    /// Returns `Err` if the record does not exist.
    fn update(&self, record: &RumorRecord) -> Result<UpdateStatus, Self::Error>;

    /// Page through rumors matching a filter
    fn list(&self, filter: &RumorFilter, page: Page) -> Result<RumorPage, Self::Error>;

    /// Ids of every stored rumor
    fn ids(&self) -> Result<Vec<RumorId>, Self::Error>;

    /// Remove a record with all its variants and beliefs
    ///
    /// Returns `false` if nothing was stored under the id.
    fn delete(&self, id: RumorId) -> Result<bool, Self::Error>;
}

/// Query criteria for listing rumors
#[derive(Debug, Clone, Default)]
pub struct RumorFilter {
    /// Match rumors carrying any of these categories
    pub categories: Vec<Category>,

    /// Minimum truth value (inclusive)
    pub min_truth: Option<f64>,

    /// Maximum truth value (inclusive)
    pub max_truth: Option<f64>,

    /// Exact severity
    pub severity: Option<Severity>,

    /// Minimum severity (inclusive)
    pub min_severity: Option<Severity>,

    /// Case-insensitive substring of the original content
    pub search_text: Option<String>,

    /// Only rumors some version of which this entity knows
    pub known_by: Option<EntityId>,
}

impl RumorFilter {
    /// Check every criterion that can be decided from the rumor alone
    pub fn matches_rumor(&self, rumor: &Rumor) -> bool {
        if !self.categories.is_empty() && !rumor.has_any_category(&self.categories) {
            return false;
        }
        if self.min_truth.is_some_and(|min| rumor.truth_value < min) {
            return false;
        }
        if self.max_truth.is_some_and(|max| rumor.truth_value > max) {
            return false;
        }
        if self.severity.is_some_and(|s| rumor.severity != s) {
            return false;
        }
        if self.min_severity.is_some_and(|s| rumor.severity < s) {
            return false;
        }
        if let Some(text) = &self.search_text {
            if !rumor
                .original_content
                .to_lowercase()
                .contains(&text.to_lowercase())
            {
                return false;
            }
        }
        true
    }

    /// Check every criterion, including knowledge by an entity
    pub fn matches(&self, record: &RumorRecord) -> bool {
        if !self.matches_rumor(&record.rumor) {
            return false;
        }
        match &self.known_by {
            Some(entity) => record.ledger.entity_knows(entity),
            None => true,
        }
    }
}

/// Pagination window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// Maximum number of rumors to return
    pub limit: usize,
    /// Number of matching rumors to skip
    pub offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self { limit: 50, offset: 0 }
    }
}

/// One page of rumors, newest first
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RumorPage {
    /// Rumors in this page
    pub rumors: Vec<Rumor>,
    /// Number of rumors matching the filter across all pages
    pub total: usize,
}

impl RumorPage {
    /// Sort newest first and cut one page out of all matches
    ///
    /// UUIDv7 ids are chronological, so ordering by id descending is stable
    /// for unchanged data and puts the newest rumor first.
    pub fn paginate(mut matches: Vec<Rumor>, page: Page) -> Self {
        matches.sort_by(|a, b| b.id.cmp(&a.id));
        let total = matches.len();
        let rumors = matches.into_iter().skip(page.offset).take(page.limit).collect();
        Self { rumors, total }
    }
}

/// Failure to deliver an event
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Event publish failed: {0}")]
pub struct PublishError(pub String);

/// Fire-and-continue delivery of lifecycle events
///
/// Implementations must not block indefinitely.
pub trait EventPublisher: Send + Sync {
    /// Deliver one event
    fn publish(&self, event: &RumorEvent) -> Result<(), PublishError>;
}

/// Content mutation applied when a rumor is retold
///
/// Implemented by the mutation layer (rumor-mutation). Higher `strength`
/// must produce proportionally larger divergence from the input; strength
/// zero may return the input unchanged.
pub trait MutationStrategy: Send + Sync {
    /// Short name recorded on the variants this strategy produces
    fn name(&self) -> &str;

    /// Produce mutated content. Never fails: strategies that depend on
    /// external services fall back to a deterministic rewrite.
    fn mutate(&self, content: &str, strength: f64) -> String;

    /// Mutated content together with the name of the strategy that wrote it
    ///
    /// Strategies that delegate to a fallback override this so the variant
    /// records who actually produced the text.
    fn produce(&self, content: &str, strength: f64) -> MutatedContent {
        MutatedContent {
            content: self.mutate(content, strength),
            strategy: self.name().to_string(),
        }
    }
}

/// Output of a mutation with its provenance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutatedContent {
    /// The rewritten text
    pub content: String,
    /// Name of the strategy that produced it
    pub strategy: String,
}
