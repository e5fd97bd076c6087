//! Rumor Mill Domain Layer
//!
//! This crate contains the core data model for the rumor engine: how a piece of
//! information originates with one entity, spreads across a social graph,
//! mutates into divergent variants, and loses credibility over time.
//!
//! ## Key Concepts
//!
//! - **Rumor**: The root of a lineage, with a fixed truth value and severity
//! - **Variant**: A mutated retelling of a Rumor or of another Variant
//! - **Believability**: How strongly one entity believes one Rumor/Variant
//! - **Lineage**: The forest of variants rooted at each Rumor (never cyclic)
//! - **Record**: The denormalized per-rumor unit that is locked and persisted
//!
//! ## Architecture
//!
//! - Pure business logic, no I/O
//! - Persistence, mutation strategies and event delivery live in other crates
//!   behind the traits in [`traits`]
//! - Truth value and believability are independent axes: a false rumor can be
//!   universally believed

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod believability;
pub mod error;
pub mod event;
pub mod id;
pub mod lineage;
pub mod policy;
pub mod record;
pub mod rumor;
pub mod traits;
pub mod variant;

// Re-exports for convenience
pub use believability::{Adjustment, BelievabilityEntry, BelievabilityLedger, Exposure, LedgerDecay};
pub use error::DomainError;
pub use event::{EventDetails, RumorEvent, RumorEventKind};
pub use id::{EntityId, RumorId, SubjectId, VariantId};
pub use lineage::LineageGraph;
pub use policy::{DecayPolicy, SpreadPolicy};
pub use record::RumorRecord;
pub use rumor::{Category, Rumor, Severity};
pub use variant::Variant;

/// Seconds since the Unix epoch
pub type Timestamp = u64;

/// Validate that a value lies in the closed unit interval [0, 1]
///
/// NaN is rejected along with out-of-range values.
pub fn ensure_unit(name: &str, value: f64) -> Result<f64, DomainError> {
    if (0.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(DomainError::InvalidParameter(format!(
            "{} must be in [0, 1], got {}",
            name, value
        )))
    }
}

/// Validate that a value lies in the closed interval [-1, 1]
pub fn ensure_signed_unit(name: &str, value: f64) -> Result<f64, DomainError> {
    if (-1.0..=1.0).contains(&value) {
        Ok(value)
    } else {
        Err(DomainError::InvalidParameter(format!(
            "{} must be in [-1, 1], got {}",
            name, value
        )))
    }
}
