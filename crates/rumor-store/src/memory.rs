//! In-memory rumor repository

use crate::StoreError;
use parking_lot::RwLock;
use rumor_domain::traits::{Page, RumorFilter, RumorPage, RumorRepository, UpdateStatus};
use rumor_domain::{RumorId, RumorRecord, SubjectId};
use std::collections::HashMap;

#[derive(Default)]
struct Inner {
    records: HashMap<RumorId, RumorRecord>,
    // Every rumor and variant id, mapped to its root
    subjects: HashMap<SubjectId, RumorId>,
}

impl Inner {
    fn index(&mut self, record: &RumorRecord) {
        let root = record.id();
        for subject in record.subject_ids() {
            self.subjects.insert(subject, root);
        }
    }
}

/// Map-backed implementation of RumorRepository
///
/// Records are cloned in and out, so callers never hold references into the
/// store. Nothing survives the process.
#[derive(Default)]
pub struct InMemoryStore {
    inner: RwLock<Inner>,
}

impl InMemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored rumors
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// True when no rumors are stored
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RumorRepository for InMemoryStore {
    type Error = StoreError;

    fn create(&self, record: RumorRecord) -> Result<RumorId, Self::Error> {
        let mut inner = self.inner.write();
        let id = record.id();
        if inner.records.contains_key(&id) {
            return Err(StoreError::Duplicate(id.to_string()));
        }
        inner.index(&record);
        inner.records.insert(id, record);
        Ok(id)
    }

    fn get(&self, id: RumorId) -> Result<Option<RumorRecord>, Self::Error> {
        Ok(self.inner.read().records.get(&id).cloned())
    }

    fn root_of(&self, subject_id: SubjectId) -> Result<Option<RumorId>, Self::Error> {
        Ok(self.inner.read().subjects.get(&subject_id).copied())
    }

    fn update(&self, record: &RumorRecord) -> Result<UpdateStatus, Self::Error> {
        let mut inner = self.inner.write();
        let id = record.id();
        let current = inner
            .records
            .get(&id)
            .map(|r| r.version)
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if current != record.version {
            return Ok(UpdateStatus::Stale { current });
        }

        let mut stored = record.clone();
        stored.version = current + 1;
        inner.index(&stored);
        inner.records.insert(id, stored);
        Ok(UpdateStatus::Committed {
            version: current + 1,
        })
    }

    fn list(&self, filter: &RumorFilter, page: Page) -> Result<RumorPage, Self::Error> {
        let inner = self.inner.read();
        let matches = inner
            .records
            .values()
            .filter(|r| filter.matches(r))
            .map(|r| r.rumor.clone())
            .collect();
        Ok(RumorPage::paginate(matches, page))
    }

    fn ids(&self) -> Result<Vec<RumorId>, Self::Error> {
        let mut ids: Vec<RumorId> = self.inner.read().records.keys().copied().collect();
        ids.sort();
        Ok(ids)
    }

    fn delete(&self, id: RumorId) -> Result<bool, Self::Error> {
        let mut inner = self.inner.write();
        match inner.records.remove(&id) {
            Some(record) => {
                for subject in record.subject_ids() {
                    inner.subjects.remove(&subject);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
