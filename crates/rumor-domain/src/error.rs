//! Error types for domain validation and lineage bookkeeping

use crate::SubjectId;
use thiserror::Error;

/// Errors raised by domain constructors and the lineage graph
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DomainError {
    /// A value was outside its declared domain
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// A variant referenced a source that is not part of the lineage
    #[error("Source not found in lineage: {0}")]
    SourceNotFound(SubjectId),

    /// The insertion would make the lineage cyclic
    #[error("Variant {0} would create a cycle in the lineage")]
    Cycle(SubjectId),

    /// A subject with this id is already present
    #[error("Duplicate subject: {0}")]
    DuplicateSubject(SubjectId),

    /// The id does not belong to this lineage
    #[error("Unknown subject: {0}")]
    UnknownSubject(SubjectId),
}
