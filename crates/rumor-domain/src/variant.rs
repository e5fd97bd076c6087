//! Variant module - mutated retellings of a rumor

use crate::{ensure_unit, DomainError, EntityId, SubjectId, Timestamp, VariantId};
use serde::{Deserialize, Serialize};

/// A mutation of a Rumor or of another Variant
///
/// Variants are created only by the spread engine and never change afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Variant {
    /// Unique identifier
    pub id: VariantId,

    /// Text as retold, may differ arbitrarily from the source
    pub content: String,

    /// The Rumor or Variant this one mutated from (never itself)
    pub source_id: SubjectId,

    /// Magnitude of divergence applied, in [0, 1]
    pub mutation_strength: f64,

    /// Entity whose retelling produced this variant
    pub creator_entity_id: EntityId,

    /// Name of the mutation strategy that generated the content
    pub strategy: String,

    /// When this variant was created
    pub created_at: Timestamp,
}

impl Variant {
    /// Create a new variant with a fresh id
    ///
    /// # Errors
    /// Returns `InvalidParameter` if `mutation_strength` is outside [0, 1]
    pub fn new(
        source_id: SubjectId,
        content: impl Into<String>,
        mutation_strength: f64,
        creator_entity_id: EntityId,
        strategy: impl Into<String>,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        let mutation_strength = ensure_unit("mutation_strength", mutation_strength)?;

        Ok(Self {
            id: VariantId::new(),
            content: content.into(),
            source_id,
            mutation_strength,
            creator_entity_id,
            strategy: strategy.into(),
            created_at: now,
        })
    }
}
