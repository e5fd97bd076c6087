//! Lifecycle events emitted by the engine
//!
//! Events are observability, not correctness: they are published after the
//! state change is committed and a failed publish never rolls anything back.

use crate::{EntityId, RumorId, SubjectId, Timestamp, VariantId};
use serde::Serialize;

/// Kind of lifecycle event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum RumorEventKind {
    /// A rumor was created
    #[serde(rename = "rumor.created")]
    Created,
    /// An entity heard a subject for the first time
    #[serde(rename = "rumor.spread")]
    Spread,
    /// An entity that already knew the subject heard it again
    #[serde(rename = "rumor.updated")]
    Updated,
    /// A spread produced a new variant
    #[serde(rename = "rumor.mutated")]
    Mutated,
    /// A belief was changed manually
    #[serde(rename = "rumor.believability_updated")]
    BelievabilityUpdated,
    /// A decay pass changed beliefs in this rumor's lineage
    #[serde(rename = "rumor.decayed")]
    Decayed,
    /// The rumor and everything descending from it was deleted
    #[serde(rename = "rumor.deleted")]
    Deleted,
}

impl RumorEventKind {
    /// Dotted event type name
    pub fn as_str(&self) -> &'static str {
        match self {
            RumorEventKind::Created => "rumor.created",
            RumorEventKind::Spread => "rumor.spread",
            RumorEventKind::Updated => "rumor.updated",
            RumorEventKind::Mutated => "rumor.mutated",
            RumorEventKind::BelievabilityUpdated => "rumor.believability_updated",
            RumorEventKind::Decayed => "rumor.decayed",
            RumorEventKind::Deleted => "rumor.deleted",
        }
    }
}

/// Kind-specific payload
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventDetails {
    /// No extra data
    None,
    /// Transmission from one entity to another
    Spread {
        /// Entity that told the rumor
        from_entity_id: EntityId,
        /// Believability stored for the target
        believability: f64,
        /// Whether the telling produced a new variant
        mutated: bool,
    },
    /// A new variant was created
    Mutated {
        /// The new variant
        variant_id: VariantId,
        /// What it mutated from
        source_id: SubjectId,
        /// Text before mutation
        original_content: String,
        /// Text after mutation
        mutated_content: String,
        /// Strategy that produced the text
        strategy: String,
    },
    /// Manual belief change
    Believability {
        /// Value before
        previous: f64,
        /// Value after
        current: f64,
    },
    /// Decay pass counts for one rumor
    Decayed {
        /// Entries that lost believability
        updated: usize,
        /// Entries that were forgotten
        forgotten: usize,
    },
}

/// A lifecycle event
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RumorEvent {
    /// What happened
    pub kind: RumorEventKind,
    /// Root rumor of the affected lineage
    pub rumor_id: RumorId,
    /// Rumor or variant the event is about, when narrower than the rumor
    pub subject_id: Option<SubjectId>,
    /// Entity the event is about
    pub entity_id: Option<EntityId>,
    /// When it happened
    pub occurred_at: Timestamp,
    /// Kind-specific payload
    pub details: EventDetails,
}

impl RumorEvent {
    /// Create an event with no subject, entity or payload
    pub fn new(kind: RumorEventKind, rumor_id: RumorId, occurred_at: Timestamp) -> Self {
        Self {
            kind,
            rumor_id,
            subject_id: None,
            entity_id: None,
            occurred_at,
            details: EventDetails::None,
        }
    }

    /// Attach the subject
    pub fn with_subject(mut self, subject_id: SubjectId) -> Self {
        self.subject_id = Some(subject_id);
        self
    }

    /// Attach the entity
    pub fn with_entity(mut self, entity_id: EntityId) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    /// Attach the payload
    pub fn with_details(mut self, details: EventDetails) -> Self {
        self.details = details;
        self
    }
}
