//! Rumor record - the denormalized unit of persistence and locking
//!
//! One record holds a rumor together with every variant descending from it
//! and every belief in any of them. Writers lock, load, modify and store a
//! whole record, so a variant and the belief that references it are always
//! committed together.

use crate::{
    BelievabilityEntry, BelievabilityLedger, DomainError, EntityId, LineageGraph, Rumor, RumorId,
    SubjectId, Timestamp, Variant,
};

/// A rumor with its full lineage and ledger
#[derive(Debug, Clone, PartialEq)]
pub struct RumorRecord {
    /// The root rumor
    pub rumor: Rumor,

    /// Variants descending from the rumor
    pub lineage: LineageGraph,

    /// Beliefs in the rumor and its variants
    pub ledger: BelievabilityLedger,

    /// Optimistic concurrency counter, bumped by the store on every update
    pub version: u64,
}

impl RumorRecord {
    /// Start a record for a new rumor, seeding the originator's full belief
    pub fn new(rumor: Rumor) -> Self {
        let mut ledger = BelievabilityLedger::new();
        let seed = BelievabilityEntry::seed(rumor.id, rumor.originator_id.clone(), rumor.created_at);
        // A fresh ledger cannot already hold the seed pair
        ledger.set(seed).ok();

        Self {
            lineage: LineageGraph::new(rumor.id),
            rumor,
            ledger,
            version: 0,
        }
    }

    /// Reassemble a record from stored parts
    ///
    /// # Errors
    /// Fails if the variants do not form a valid lineage or an entry refers
    /// to a subject outside it.
    pub fn from_parts(
        rumor: Rumor,
        variants: Vec<Variant>,
        entries: Vec<BelievabilityEntry>,
        version: u64,
    ) -> Result<Self, DomainError> {
        let lineage = LineageGraph::from_variants(rumor.id, variants)?;
        if let Some(stray) = entries.iter().find(|e| !lineage.contains(e.subject_id)) {
            return Err(DomainError::UnknownSubject(stray.subject_id));
        }
        let ledger = BelievabilityLedger::from_entries(entries)?;

        Ok(Self {
            rumor,
            lineage,
            ledger,
            version,
        })
    }

    /// Id of the root rumor
    pub fn id(&self) -> RumorId {
        self.rumor.id
    }

    /// Check whether the subject is the rumor or one of its variants
    pub fn contains(&self, subject_id: SubjectId) -> bool {
        self.lineage.contains(subject_id)
    }

    /// Current text of the rumor or variant
    pub fn content_of(&self, subject_id: SubjectId) -> Option<&str> {
        if subject_id == self.rumor.id {
            Some(&self.rumor.original_content)
        } else {
            self.lineage.get(subject_id).map(|v| v.content.as_str())
        }
    }

    /// Seed an initial entity's belief in the root rumor, as told by the originator
    ///
    /// The originator itself is skipped since it already holds the seed record.
    pub fn seed_entity(
        &mut self,
        entity_id: EntityId,
        believability: f64,
        now: Timestamp,
    ) -> Result<(), DomainError> {
        if entity_id == self.rumor.originator_id {
            return Ok(());
        }
        let entry = BelievabilityEntry::new(
            self.rumor.id,
            entity_id,
            believability,
            Some(self.rumor.originator_id.clone()),
            now,
        )?;
        self.ledger.set(entry)?;
        Ok(())
    }

    /// All subject ids of the lineage, root first
    pub fn subject_ids(&self) -> impl Iterator<Item = SubjectId> + '_ {
        std::iter::once(self.rumor.id).chain(self.lineage.variants().iter().map(|v| v.id))
    }

    /// Mark the record as changed at `now`
    pub fn touch(&mut self, now: Timestamp) {
        self.rumor.updated_at = self.rumor.updated_at.max(now);
    }
}
