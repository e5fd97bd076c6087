//! Decay scheduler - time-based forgetting across rumor records

use rumor_domain::{DecayPolicy, LedgerDecay, RumorRecord, Severity, Timestamp};
use serde::Serialize;
use std::collections::BTreeMap;

/// Counts produced by one decay pass over all rumors
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DecayReport {
    /// Instant the pass decayed up to
    pub as_of: Timestamp,

    /// Rumors examined
    pub rumors_scanned: usize,

    /// Rumors whose ledger changed
    pub rumors_changed: usize,

    /// Entries that lost believability but are still remembered
    pub entries_updated: usize,

    /// Entries that reached zero and were removed
    pub entries_forgotten: usize,

    /// Updated entries per severity of their root rumor
    pub updated_by_severity: BTreeMap<Severity, usize>,

    /// Forgotten entries per severity of their root rumor
    pub forgotten_by_severity: BTreeMap<Severity, usize>,
}

impl DecayReport {
    /// Start an empty report for a pass at `as_of`
    pub fn new(as_of: Timestamp) -> Self {
        Self {
            as_of,
            ..Self::default()
        }
    }

    /// Add one rumor's outcome
    pub fn record(&mut self, severity: Severity, outcome: LedgerDecay) {
        self.rumors_scanned += 1;
        if outcome.updated + outcome.forgotten == 0 {
            return;
        }
        self.rumors_changed += 1;
        self.entries_updated += outcome.updated;
        self.entries_forgotten += outcome.forgotten;
        if outcome.updated > 0 {
            *self.updated_by_severity.entry(severity).or_insert(0) += outcome.updated;
        }
        if outcome.forgotten > 0 {
            *self.forgotten_by_severity.entry(severity).or_insert(0) += outcome.forgotten;
        }
    }
}

/// Applies severity-scaled decay to rumor records
///
/// Decay runs up to an explicit instant. Each entry remembers how far it has
/// already been decayed, so repeating a pass at the same instant changes
/// nothing.
pub struct DecayScheduler {
    policy: DecayPolicy,
}

impl DecayScheduler {
    /// Create a scheduler with the given policy
    pub fn new(policy: DecayPolicy) -> Self {
        Self { policy }
    }

    /// The decay policy
    pub fn policy(&self) -> &DecayPolicy {
        &self.policy
    }

    /// Decay every belief in one record up to `now`
    ///
    /// The originator's seed record is exempt. The record is touched only
    /// when something changed.
    pub fn decay_record(&self, record: &mut RumorRecord, now: Timestamp) -> LedgerDecay {
        let outcome = record.ledger.decay_all(&record.rumor, &self.policy, now);
        if outcome.updated + outcome.forgotten > 0 {
            record.touch(now);
        }
        outcome
    }
}
