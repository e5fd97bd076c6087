//! Believability ledger - per-entity belief in each rumor or variant

use crate::{
    ensure_signed_unit, ensure_unit, DecayPolicy, DomainError, EntityId, Rumor, Severity,
    SpreadPolicy, SubjectId, Timestamp,
};
use serde::{Deserialize, Serialize};

/// One entity's knowledge of one Rumor or Variant
///
/// At most one entry exists per `(subject_id, entity_id)` pair; later
/// exposures update it in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BelievabilityEntry {
    /// The Rumor or Variant known
    pub subject_id: SubjectId,

    /// Entity holding the belief
    pub entity_id: EntityId,

    /// Strength of belief in [0, 1]
    pub believability: f64,

    /// Who the entity heard it from; `None` only for the originator's seed record
    pub heard_from_entity_id: Option<EntityId>,

    /// Last time the entity was exposed to the subject
    pub heard_at: Timestamp,

    /// Decay clock: time up to which decay has already been applied
    pub last_decayed_at: Timestamp,
}

impl BelievabilityEntry {
    /// Create an entry for an entity that heard the subject from someone
    pub fn new(
        subject_id: SubjectId,
        entity_id: EntityId,
        believability: f64,
        heard_from_entity_id: Option<EntityId>,
        now: Timestamp,
    ) -> Result<Self, DomainError> {
        Ok(Self {
            subject_id,
            entity_id,
            believability: ensure_unit("believability", believability)?,
            heard_from_entity_id,
            heard_at: now,
            last_decayed_at: now,
        })
    }

    /// The originator's own record for its own rumor: full belief, no source
    pub fn seed(subject_id: SubjectId, entity_id: EntityId, now: Timestamp) -> Self {
        Self {
            subject_id,
            entity_id,
            believability: 1.0,
            heard_from_entity_id: None,
            heard_at: now,
            last_decayed_at: now,
        }
    }

    /// Whether this is the originator's seed record for `rumor`
    ///
    /// Seed records are exempt from organic decay.
    pub fn is_originator_seed(&self, rumor: &Rumor) -> bool {
        self.subject_id == rumor.id
            && self.entity_id == rumor.originator_id
            && self.heard_from_entity_id.is_none()
    }
}

/// Manual believability change, bypassing the spread rules
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Adjustment {
    /// Add a value in [-1, 1], clamping the result to [0, 1]
    Delta(f64),
    /// Replace with a value in [0, 1]
    Absolute(f64),
}

impl Adjustment {
    /// Reject values outside the declared ranges
    pub fn validate(&self) -> Result<(), DomainError> {
        match *self {
            Adjustment::Delta(delta) => ensure_signed_unit("delta", delta).map(|_| ()),
            Adjustment::Absolute(value) => ensure_unit("believability", value).map(|_| ()),
        }
    }

    /// Apply to a current value
    pub fn apply(&self, current: f64) -> f64 {
        match *self {
            Adjustment::Delta(delta) => (current + delta).clamp(0.0, 1.0),
            Adjustment::Absolute(value) => value,
        }
    }
}

/// Outcome of exposing an entity to a subject
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exposure {
    /// Stored believability after the exposure
    pub believability: f64,
    /// Believability held before, if the entity already knew the subject
    pub previous: Option<f64>,
}

impl Exposure {
    /// True when the entity had no entry for the subject before
    pub fn is_first(&self) -> bool {
        self.previous.is_none()
    }
}

/// Counts produced by one decay pass over a ledger
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LedgerDecay {
    /// Entries whose believability dropped but stayed above zero
    pub updated: usize,
    /// Entries that reached zero and were removed
    pub forgotten: usize,
}

/// All belief records of one rumor's lineage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BelievabilityLedger {
    entries: Vec<BelievabilityEntry>,
}

impl BelievabilityLedger {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a ledger from stored entries
    ///
    /// # Errors
    /// Rejects duplicate `(subject, entity)` pairs and out-of-range values.
    pub fn from_entries(entries: Vec<BelievabilityEntry>) -> Result<Self, DomainError> {
        let mut ledger = Self::new();
        for entry in entries {
            ensure_unit("believability", entry.believability)?;
            if ledger.get(entry.subject_id, &entry.entity_id).is_some() {
                return Err(DomainError::InvalidParameter(format!(
                    "duplicate belief for subject {} and entity {}",
                    entry.subject_id, entry.entity_id
                )));
            }
            ledger.entries.push(entry);
        }
        Ok(ledger)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no entity knows anything of this lineage
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in insertion order
    pub fn entries(&self) -> &[BelievabilityEntry] {
        &self.entries
    }

    /// Look up one entity's belief in one subject
    pub fn get(&self, subject_id: SubjectId, entity_id: &EntityId) -> Option<&BelievabilityEntry> {
        self.entries
            .iter()
            .find(|e| e.subject_id == subject_id && &e.entity_id == entity_id)
    }

    fn position(&self, subject_id: SubjectId, entity_id: &EntityId) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| e.subject_id == subject_id && &e.entity_id == entity_id)
    }

    /// Insert or replace the entry for the entry's pair
    ///
    /// Returns the entry that was replaced, if any.
    pub fn set(&mut self, entry: BelievabilityEntry) -> Result<Option<BelievabilityEntry>, DomainError> {
        ensure_unit("believability", entry.believability)?;
        match self.position(entry.subject_id, &entry.entity_id) {
            Some(idx) => Ok(Some(std::mem::replace(&mut self.entries[idx], entry))),
            None => {
                self.entries.push(entry);
                Ok(None)
            }
        }
    }

    /// Record that `entity_id` heard `subject_id` from `heard_from`
    ///
    /// The stored value follows [`SpreadPolicy::reinforce`]: a repeated exposure
    /// never lowers an existing belief. Re-exposure refreshes `heard_at` and
    /// restarts the decay clock. The originator's seed keeps its empty source.
    pub fn expose(
        &mut self,
        subject_id: SubjectId,
        entity_id: &EntityId,
        heard_from: &EntityId,
        computed: f64,
        policy: &SpreadPolicy,
        now: Timestamp,
    ) -> Exposure {
        let computed = computed.clamp(0.0, 1.0);
        match self.position(subject_id, entity_id) {
            Some(idx) => {
                let entry = &mut self.entries[idx];
                let previous = entry.believability;
                entry.believability = policy.reinforce(Some(previous), computed);
                entry.heard_at = now;
                entry.last_decayed_at = now;
                if entry.heard_from_entity_id.is_some() {
                    entry.heard_from_entity_id = Some(heard_from.clone());
                }
                Exposure {
                    believability: entry.believability,
                    previous: Some(previous),
                }
            }
            None => {
                self.entries.push(BelievabilityEntry {
                    subject_id,
                    entity_id: entity_id.clone(),
                    believability: computed,
                    heard_from_entity_id: Some(heard_from.clone()),
                    heard_at: now,
                    last_decayed_at: now,
                });
                Exposure {
                    believability: computed,
                    previous: None,
                }
            }
        }
    }

    /// Manually change an existing belief
    ///
    /// Returns `(previous, current)`, or `None` if the entity holds no entry
    /// for the subject. The decay clock restarts at `now`.
    pub fn adjust(
        &mut self,
        subject_id: SubjectId,
        entity_id: &EntityId,
        adjustment: Adjustment,
        now: Timestamp,
    ) -> Result<Option<(f64, f64)>, DomainError> {
        adjustment.validate()?;
        let Some(idx) = self.position(subject_id, entity_id) else {
            return Ok(None);
        };
        let entry = &mut self.entries[idx];
        let previous = entry.believability;
        entry.believability = adjustment.apply(previous);
        entry.last_decayed_at = now;
        Ok(Some((previous, entry.believability)))
    }

    /// Decay every entry not matched by `exempt` at the given severity
    ///
    /// Entries whose decay clock is at or after `now` are untouched, which
    /// makes repeated passes at the same instant a no-op. Entries that reach
    /// exactly zero are removed.
    pub fn decay_by_severity<F>(
        &mut self,
        severity: Severity,
        policy: &DecayPolicy,
        exempt: F,
        now: Timestamp,
    ) -> LedgerDecay
    where
        F: Fn(&BelievabilityEntry) -> bool,
    {
        let mut outcome = LedgerDecay::default();

        self.entries.retain_mut(|entry| {
            if exempt(entry) || now <= entry.last_decayed_at {
                return true;
            }

            let elapsed = now - entry.last_decayed_at;
            let before = entry.believability;
            entry.believability = policy.apply(before, severity, elapsed);
            entry.last_decayed_at = now;

            if entry.believability == 0.0 {
                outcome.forgotten += 1;
                false
            } else {
                if entry.believability < before {
                    outcome.updated += 1;
                }
                true
            }
        });

        outcome
    }

    /// Decay all entries of `rumor`'s lineage at the rumor's severity,
    /// leaving the originator's seed record alone
    pub fn decay_all(&mut self, rumor: &Rumor, policy: &DecayPolicy, now: Timestamp) -> LedgerDecay {
        self.decay_by_severity(rumor.severity, policy, |e| e.is_originator_seed(rumor), now)
    }

    /// Entries held by one entity
    pub fn entries_for_entity(&self, entity_id: &EntityId) -> impl Iterator<Item = &BelievabilityEntry> {
        let entity_id = entity_id.clone();
        self.entries.iter().filter(move |e| e.entity_id == entity_id)
    }

    /// The entity's most recently heard version of this lineage
    pub fn latest_for_entity(&self, entity_id: &EntityId) -> Option<&BelievabilityEntry> {
        self.entries_for_entity(entity_id)
            .fold(None, |best: Option<&BelievabilityEntry>, e| match best {
                Some(b) if b.heard_at > e.heard_at => Some(b),
                _ => Some(e),
            })
    }

    /// Check whether an entity knows any subject of this lineage
    pub fn entity_knows(&self, entity_id: &EntityId) -> bool {
        self.entries.iter().any(|e| &e.entity_id == entity_id)
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::Category;
    use proptest::prelude::*;

    proptest! {
        /// Property: believability stays in [0, 1] through any sequence of exposures and decay passes
        #[test]
        fn test_believability_bounds_invariant(
            steps in prop::collection::vec((0.0f64..=1.0, 0u64..200_000, any::<bool>()), 1..40),
        ) {
            let originator = EntityId::new("npc_58").unwrap();
            let rumor = Rumor::new(originator.clone(), "x", [Category::Gossip], Severity::Minor, 0.5, 0).unwrap();
            let mut ledger = BelievabilityLedger::new();
            ledger.set(BelievabilityEntry::seed(rumor.id, originator.clone(), 0)).unwrap();

            let target = EntityId::new("npc_104").unwrap();
            let mut now = 0u64;
            for (value, advance, expose) in steps {
                now += advance;
                if expose {
                    ledger.expose(rumor.id, &target, &originator, value, &SpreadPolicy::default(), now);
                } else {
                    ledger.decay_all(&rumor, &DecayPolicy::default(), now);
                }
                for entry in ledger.entries() {
                    prop_assert!((0.0..=1.0).contains(&entry.believability));
                }
                prop_assert!(ledger.get(rumor.id, &originator).is_some());
            }
        }
    }
}
