//! Error types for engine operations

use rumor_domain::{DomainError, EntityId, RumorId, SubjectId};
use thiserror::Error;

/// Errors that can occur during engine operations
///
/// Mutation callback failures and event publishing failures are recovered
/// inside the engine and never appear here.
#[derive(Error, Debug)]
pub enum RumorError {
    /// Unknown rumor, variant or belief
    #[error("Not found: {0}")]
    NotFound(String),

    /// A value outside its declared domain, rejected before any state change
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// The telling entity holds no belief in the subject
    #[error("Entity {entity} has no knowledge of {subject}")]
    SourceHasNoKnowledge {
        /// Entity that was asked to spread
        entity: EntityId,
        /// Subject it was asked to spread
        subject: SubjectId,
    },

    /// Lock or version contention outlasted the retry budget
    #[error("Concurrency conflict on rumor {0}")]
    ConcurrencyConflict(RumorId),

    /// The lineage rejected a variant
    #[error("Lineage error: {0}")]
    Lineage(String),

    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}

impl RumorError {
    /// Not-found error for a rumor or variant id
    pub fn subject_not_found(id: SubjectId) -> Self {
        RumorError::NotFound(format!("rumor or variant {}", id))
    }
}

impl From<DomainError> for RumorError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::InvalidParameter(msg) => RumorError::InvalidParameter(msg),
            DomainError::UnknownSubject(id) => RumorError::subject_not_found(id),
            other => RumorError::Lineage(other.to_string()),
        }
    }
}
