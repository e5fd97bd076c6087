//! Rumor service - every public operation of the engine
//!
//! Writers follow one pattern: lock the root rumor, load its record, modify
//! a working copy, store it with an optimistic version check, then publish
//! events. Nothing is written if the modification fails, so a variant and
//! the belief that references it are committed together or not at all.

use crate::clock::{Clock, SystemClock};
use crate::events::NoopPublisher;
use crate::{
    DecayReport, DecayScheduler, EngineConfig, RumorError, RumorLocks, SpreadEngine,
    SpreadRequest, SpreadResult,
};
use rumor_domain::traits::{
    EventPublisher, MutationStrategy, Page, RumorFilter, RumorPage, RumorRepository, UpdateStatus,
};
use rumor_domain::{
    Adjustment, BelievabilityEntry, Category, EntityId, EventDetails, Rumor, RumorEvent,
    RumorEventKind, RumorId, RumorRecord, Severity, SubjectId, Timestamp, Variant, VariantId,
};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// Input for creating a rumor
#[derive(Debug, Clone, PartialEq)]
pub struct CreateRumor {
    /// Entity the rumor starts with
    pub originator_id: EntityId,
    /// Text as first told
    pub content: String,
    /// Topic tags; empty means `other`
    pub categories: Vec<Category>,
    /// Ordinal importance
    pub severity: Severity,
    /// Objective accuracy in [0, 1]
    pub truth_value: f64,
    /// Entities that hear the rumor from the originator at creation
    pub initial_entities: Vec<EntityId>,
}

/// Parse category names, mapping unknown ones to `other` with a warning
pub fn categories_from_names<S: AsRef<str>>(names: &[S]) -> Vec<Category> {
    names
        .iter()
        .map(|name| {
            let name = name.as_ref();
            Category::parse(name).unwrap_or_else(|| {
                tracing::warn!(category = name, "Unknown category, using 'other'");
                Category::Other
            })
        })
        .collect()
}

/// Filter for the known-by query
#[derive(Debug, Clone, PartialEq)]
pub struct KnownByQuery {
    /// Only rumors carrying any of these categories
    pub categories: Vec<Category>,
    /// Minimum believability (inclusive)
    pub min_believability: f64,
    /// Maximum number of results
    pub limit: usize,
}

impl Default for KnownByQuery {
    fn default() -> Self {
        Self {
            categories: Vec::new(),
            min_believability: 0.0,
            limit: 50,
        }
    }
}

/// One entity's view of one rumor
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnownRumor {
    /// Root rumor
    pub rumor_id: RumorId,
    /// The version the entity heard most recently
    pub subject_id: SubjectId,
    /// Text of that version
    pub content: String,
    /// How strongly the entity believes it
    pub believability: f64,
    /// Who told the entity
    pub heard_from_entity_id: Option<EntityId>,
    /// When the entity heard it
    pub heard_at: Timestamp,
    /// Severity of the root rumor
    pub severity: Severity,
    /// Truth value of the root rumor
    pub truth_value: f64,
}

/// Aggregate figures over all stored rumors
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RumorStatistics {
    /// Number of rumors
    pub total_rumors: usize,
    /// Number of variants across all rumors
    pub total_variants: usize,
    /// Number of belief entries across all rumors
    pub total_spread_records: usize,
    /// Rumors per category (a rumor counts once per category it carries)
    pub by_category: BTreeMap<Category, usize>,
    /// Rumors per severity
    pub by_severity: BTreeMap<Severity, usize>,
    /// Mean truth value, 0 when there are no rumors
    pub average_truth_value: f64,
    /// Mean variants per rumor
    pub average_variants_per_rumor: f64,
    /// Mean belief entries per rumor
    pub average_spread_records_per_rumor: f64,
}

/// The rumor engine
///
/// Safe to share across threads behind an `Arc`; all operations take
/// `&self`. Operations on different rumors never block each other.
///
/// # Examples
///
/// ```
/// use rumor_engine::{CreateRumor, EngineConfig, RumorService, SpreadParams, SpreadRequest};
/// use rumor_domain::{EntityId, Severity};
/// use rumor_store::InMemoryStore;
///
/// let service = RumorService::new(InMemoryStore::new(), EngineConfig::default()).unwrap();
/// let npc_58 = EntityId::new("npc_58").unwrap();
/// let npc_104 = EntityId::new("npc_104").unwrap();
///
/// let id = service
///     .create(CreateRumor {
///         originator_id: npc_58.clone(),
///         content: "The king is ill".to_string(),
///         categories: vec![],
///         severity: Severity::Major,
///         truth_value: 0.3,
///         initial_entities: vec![],
///     })
///     .unwrap();
///
/// let result = service
///     .spread(SpreadRequest {
///         subject_id: id,
///         from_entity_id: npc_58,
///         to_entity_id: npc_104,
///         params: SpreadParams::faithful(0.0),
///     })
///     .unwrap();
/// assert!(result.new_believability < 1.0);
/// ```
pub struct RumorService<R: RumorRepository> {
    repo: R,
    config: EngineConfig,
    spread: SpreadEngine,
    decay: DecayScheduler,
    locks: RumorLocks,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl<R: RumorRepository> RumorService<R> {
    /// Create a service over `repo`
    ///
    /// The mutation strategy is built from `config.mutation`; events are
    /// dropped until a publisher is installed.
    pub fn new(repo: R, config: EngineConfig) -> Result<Self, RumorError> {
        config.validate()?;
        let strategy = config.mutation.build();
        Ok(Self {
            spread: SpreadEngine::new(config.spread.clone(), strategy),
            decay: DecayScheduler::new(config.decay.policy.clone()),
            locks: RumorLocks::new(config.locking.lock_timeout(), config.locking.max_retries),
            publisher: Arc::new(NoopPublisher),
            clock: Arc::new(SystemClock),
            repo,
            config,
        })
    }

    /// Replace the event publisher
    pub fn with_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.publisher = publisher;
        self
    }

    /// Replace the mutation strategy
    pub fn with_strategy(mut self, strategy: Arc<dyn MutationStrategy>) -> Self {
        self.spread = SpreadEngine::new(self.config.spread.clone(), strategy);
        self
    }

    /// Replace the clock
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// The active configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The underlying repository
    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// Current time according to the service clock
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn store_err(e: R::Error) -> RumorError {
        RumorError::Store(e.to_string())
    }

    fn publish(&self, event: RumorEvent) {
        if let Err(e) = self.publisher.publish(&event) {
            tracing::warn!(
                event = event.kind.as_str(),
                rumor_id = %event.rumor_id,
                error = %e,
                "Failed to publish rumor event"
            );
        }
    }

    fn resolve_root(&self, subject_id: SubjectId) -> Result<RumorId, RumorError> {
        self.repo
            .root_of(subject_id)
            .map_err(Self::store_err)?
            .ok_or_else(|| RumorError::subject_not_found(subject_id))
    }

    fn load(&self, id: RumorId) -> Result<RumorRecord, RumorError> {
        self.repo
            .get(id)
            .map_err(Self::store_err)?
            .ok_or_else(|| RumorError::NotFound(format!("rumor {}", id)))
    }

    /// Load the record holding a rumor or variant
    fn load_containing(&self, subject_id: SubjectId) -> Result<RumorRecord, RumorError> {
        let root = self.resolve_root(subject_id)?;
        self.load(root)
    }

    /// Lock, load, modify and store one record
    ///
    /// `op` returns its output and whether it changed the record; unchanged
    /// records are not written. A version mismatch reloads and reruns `op`
    /// up to `max_retries` times.
    fn modify<T>(
        &self,
        root: RumorId,
        mut op: impl FnMut(&mut RumorRecord) -> Result<(T, bool), RumorError>,
    ) -> Result<(T, RumorRecord), RumorError> {
        let max_retries = self.config.locking.max_retries;
        self.locks.with_lock(root, || {
            for attempt in 0..=max_retries {
                let mut record = self.load(root).inspect_err(|e| {
                    // Deleted while this caller waited; drop the entry it recreated
                    if matches!(e, RumorError::NotFound(_)) {
                        self.locks.forget(root);
                    }
                })?;
                let (output, changed) = op(&mut record)?;
                if !changed {
                    return Ok((output, record));
                }
                match self.repo.update(&record).map_err(Self::store_err)? {
                    UpdateStatus::Committed { version } => {
                        record.version = version;
                        return Ok((output, record));
                    }
                    UpdateStatus::Stale { current } => {
                        tracing::warn!(
                            rumor_id = %root,
                            loaded = record.version,
                            current,
                            attempt = attempt + 1,
                            "Stale rumor record, retrying"
                        );
                    }
                }
            }
            Err(RumorError::ConcurrencyConflict(root))
        })
    }

    /// Create a rumor
    ///
    /// The originator believes it fully; each initial entity hears it from
    /// the originator at the configured initial believability.
    pub fn create(&self, input: CreateRumor) -> Result<RumorId, RumorError> {
        let now = self.clock.now();
        let rumor = Rumor::new(
            input.originator_id,
            input.content,
            input.categories,
            input.severity,
            input.truth_value,
            now,
        )?;
        let mut record = RumorRecord::new(rumor);
        let initial = self.config.spread.initial_believability;
        for entity in input.initial_entities {
            record.seed_entity(entity, initial, now)?;
        }

        let id = self.repo.create(record.clone()).map_err(Self::store_err)?;
        tracing::info!(
            rumor_id = %id,
            originator = %record.rumor.originator_id,
            severity = %record.rumor.severity,
            initial_entities = record.ledger.len() - 1,
            "Rumor created"
        );

        self.publish(
            RumorEvent::new(RumorEventKind::Created, id, now)
                .with_subject(id)
                .with_entity(record.rumor.originator_id.clone()),
        );
        Ok(id)
    }

    /// Full record of a rumor: the rumor, its variants and all beliefs
    pub fn get(&self, id: RumorId) -> Result<RumorRecord, RumorError> {
        self.load(id)
    }

    /// Page through rumors, newest first
    pub fn list(&self, filter: &RumorFilter, page: Page) -> Result<RumorPage, RumorError> {
        self.repo.list(filter, page).map_err(Self::store_err)
    }

    /// Spread a rumor or variant from one entity to another
    ///
    /// A mutating spread runs its strategy before taking the rumor lock, so
    /// a slow mutation callback only delays its own spread.
    pub fn spread(&self, request: SpreadRequest) -> Result<SpreadResult, RumorError> {
        request.validate()?;
        let root = self.resolve_root(request.subject_id)?;

        let prepared = if request.params.mutate {
            let snapshot = self.load(root)?;
            self.spread.prepare_mutation(&snapshot, &request)?
        } else {
            None
        };

        let now = self.clock.now();
        let (result, record) = self.modify(root, |record| {
            let result = self.spread.apply_prepared(record, &request, prepared.clone(), now)?;
            Ok((result, true))
        })?;

        tracing::debug!(
            rumor_id = %root,
            from = %request.from_entity_id,
            to = %request.to_entity_id,
            mutated = result.mutated,
            believability = result.new_believability,
            "Rumor spread"
        );

        if let Some(variant) = &result.variant {
            let original = record.content_of(variant.source_id).unwrap_or_default();
            self.publish(
                RumorEvent::new(RumorEventKind::Mutated, root, now)
                    .with_subject(variant.id)
                    .with_entity(request.from_entity_id.clone())
                    .with_details(EventDetails::Mutated {
                        variant_id: variant.id,
                        source_id: variant.source_id,
                        original_content: original.to_string(),
                        mutated_content: variant.content.clone(),
                        strategy: variant.strategy.clone(),
                    }),
            );
        }

        let kind = if result.is_first_exposure() {
            RumorEventKind::Spread
        } else {
            RumorEventKind::Updated
        };
        self.publish(
            RumorEvent::new(kind, root, now)
                .with_subject(result.resulting_subject_id)
                .with_entity(request.to_entity_id.clone())
                .with_details(EventDetails::Spread {
                    from_entity_id: request.from_entity_id.clone(),
                    believability: result.new_believability,
                    mutated: result.mutated,
                }),
        );

        Ok(result)
    }

    /// Manually change an entity's belief in a rumor or variant
    ///
    /// Bypasses the spread rules. The entry's decay clock restarts.
    pub fn update_believability(
        &self,
        subject_id: SubjectId,
        entity_id: &EntityId,
        adjustment: Adjustment,
    ) -> Result<BelievabilityEntry, RumorError> {
        adjustment.validate()?;
        let root = self.resolve_root(subject_id)?;
        let now = self.clock.now();

        let ((previous, current), record) = self.modify(root, |record| {
            let change = record
                .ledger
                .adjust(subject_id, entity_id, adjustment, now)?
                .ok_or_else(|| {
                    RumorError::NotFound(format!(
                        "belief of entity {} in {}",
                        entity_id, subject_id
                    ))
                })?;
            record.touch(now);
            Ok((change, true))
        })?;

        let entry = record
            .ledger
            .get(subject_id, entity_id)
            .cloned()
            .ok_or_else(|| RumorError::NotFound(format!("belief of entity {}", entity_id)))?;

        self.publish(
            RumorEvent::new(RumorEventKind::BelievabilityUpdated, root, now)
                .with_subject(subject_id)
                .with_entity(entity_id.clone())
                .with_details(EventDetails::Believability { previous, current }),
        );
        Ok(entry)
    }

    /// Decay every belief in every rumor up to `as_of`
    ///
    /// Rumors are locked one at a time. A rumor deleted during the pass is
    /// skipped.
    pub fn decay(&self, as_of: Timestamp) -> Result<DecayReport, RumorError> {
        let mut report = DecayReport::new(as_of);
        let ids = self.repo.ids().map_err(Self::store_err)?;

        for id in ids {
            let modified = self.modify(id, |record| {
                let outcome = self.decay.decay_record(record, as_of);
                Ok((outcome, outcome.updated + outcome.forgotten > 0))
            });
            let (outcome, record) = match modified {
                Ok(done) => done,
                Err(RumorError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            };

            report.record(record.rumor.severity, outcome);
            if outcome.updated + outcome.forgotten > 0 {
                self.publish(
                    RumorEvent::new(RumorEventKind::Decayed, id, as_of).with_details(
                        EventDetails::Decayed {
                            updated: outcome.updated,
                            forgotten: outcome.forgotten,
                        },
                    ),
                );
            }
        }

        tracing::info!(
            as_of,
            rumors = report.rumors_scanned,
            updated = report.entries_updated,
            forgotten = report.entries_forgotten,
            "Decay pass complete"
        );
        Ok(report)
    }

    /// Decay up to the current time
    pub fn decay_now(&self) -> Result<DecayReport, RumorError> {
        self.decay(self.clock.now())
    }

    /// Delete a rumor with all its variants and beliefs
    ///
    /// Only rumor ids are accepted; a variant id is `NotFound`.
    pub fn delete(&self, id: RumorId) -> Result<(), RumorError> {
        let removed = self.locks.with_lock(id, || {
            let removed = self.repo.delete(id).map_err(Self::store_err)?;
            self.locks.forget(id);
            Ok(removed)
        })?;
        if !removed {
            return Err(RumorError::NotFound(format!("rumor {}", id)));
        }

        tracing::info!(rumor_id = %id, "Rumor deleted");
        self.publish(RumorEvent::new(RumorEventKind::Deleted, id, self.clock.now()));
        Ok(())
    }

    /// Sources from the immediate one up to the root rumor
    pub fn ancestors_of(&self, subject_id: SubjectId) -> Result<Vec<SubjectId>, RumorError> {
        Ok(self.load_containing(subject_id)?.lineage.ancestors_of(subject_id)?)
    }

    /// Every variant transitively mutated from the subject
    pub fn descendants_of(&self, subject_id: SubjectId) -> Result<BTreeSet<VariantId>, RumorError> {
        Ok(self.load_containing(subject_id)?.lineage.descendants_of(subject_id)?)
    }

    /// The rumor a subject descends from (a rumor is its own root)
    pub fn root_of(&self, subject_id: SubjectId) -> Result<Rumor, RumorError> {
        Ok(self.load_containing(subject_id)?.rumor)
    }

    /// A single variant
    pub fn variant(&self, variant_id: VariantId) -> Result<Variant, RumorError> {
        self.load_containing(variant_id)?
            .lineage
            .get(variant_id)
            .cloned()
            .ok_or_else(|| RumorError::NotFound(format!("variant {}", variant_id)))
    }

    /// Rumors an entity knows, most believed first
    ///
    /// For each rumor the entity's most recently heard version is reported.
    pub fn rumors_known_by(
        &self,
        entity_id: &EntityId,
        query: &KnownByQuery,
    ) -> Result<Vec<KnownRumor>, RumorError> {
        let filter = RumorFilter {
            categories: query.categories.clone(),
            known_by: Some(entity_id.clone()),
            ..Default::default()
        };
        let page = self.list(
            &filter,
            Page {
                limit: usize::MAX,
                offset: 0,
            },
        )?;

        let mut known = Vec::new();
        for rumor in page.rumors {
            // Deleted since listing
            let Some(record) = self.repo.get(rumor.id).map_err(Self::store_err)? else {
                continue;
            };
            let Some(entry) = record.ledger.latest_for_entity(entity_id) else {
                continue;
            };
            if entry.believability < query.min_believability {
                continue;
            }
            known.push(KnownRumor {
                rumor_id: record.id(),
                subject_id: entry.subject_id,
                content: record
                    .content_of(entry.subject_id)
                    .unwrap_or_default()
                    .to_string(),
                believability: entry.believability,
                heard_from_entity_id: entry.heard_from_entity_id.clone(),
                heard_at: entry.heard_at,
                severity: record.rumor.severity,
                truth_value: record.rumor.truth_value,
            });
        }

        known.sort_by(|a, b| b.believability.total_cmp(&a.believability));
        known.truncate(query.limit);
        Ok(known)
    }

    /// Aggregate figures over all rumors
    pub fn statistics(&self) -> Result<RumorStatistics, RumorError> {
        let mut stats = RumorStatistics::default();
        let mut truth_sum = 0.0;

        for id in self.repo.ids().map_err(Self::store_err)? {
            let Some(record) = self.repo.get(id).map_err(Self::store_err)? else {
                continue;
            };
            stats.total_rumors += 1;
            stats.total_variants += record.lineage.len();
            stats.total_spread_records += record.ledger.len();
            truth_sum += record.rumor.truth_value;
            *stats.by_severity.entry(record.rumor.severity).or_insert(0) += 1;
            for category in &record.rumor.categories {
                *stats.by_category.entry(*category).or_insert(0) += 1;
            }
        }

        if stats.total_rumors > 0 {
            let n = stats.total_rumors as f64;
            stats.average_truth_value = truth_sum / n;
            stats.average_variants_per_rumor = stats.total_variants as f64 / n;
            stats.average_spread_records_per_rumor = stats.total_spread_records as f64 / n;
        }
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::events::RecordingPublisher;
    use crate::SpreadParams;
    use rumor_domain::traits::PublishError;
    use rumor_mutation::MockCallback;
    use rumor_store::InMemoryStore;
    use std::time::Duration;

    const T0: Timestamp = 1_700_000_000;

    struct Fixture {
        service: RumorService<InMemoryStore>,
        events: RecordingPublisher,
        clock: Arc<ManualClock>,
    }

    fn npc(id: &str) -> EntityId {
        EntityId::new(id).unwrap()
    }

    fn fixture() -> Fixture {
        let events = RecordingPublisher::new();
        let clock = Arc::new(ManualClock::new(T0));
        let service = RumorService::new(InMemoryStore::new(), EngineConfig::default())
            .unwrap()
            .with_publisher(Arc::new(events.clone()))
            .with_clock(clock.clone());
        Fixture {
            service,
            events,
            clock,
        }
    }

    fn create(service: &RumorService<InMemoryStore>, initial: &[&str]) -> RumorId {
        service
            .create(CreateRumor {
                originator_id: npc("npc_58"),
                content: "The king is ill".to_string(),
                categories: vec![Category::Political],
                severity: Severity::Major,
                truth_value: 0.3,
                initial_entities: initial.iter().map(|e| npc(e)).collect(),
            })
            .unwrap()
    }

    fn spread(subject_id: SubjectId, from: &str, to: &str, params: SpreadParams) -> SpreadRequest {
        SpreadRequest {
            subject_id,
            from_entity_id: npc(from),
            to_entity_id: npc(to),
            params,
        }
    }

    #[test]
    fn test_create_seeds_originator_only() {
        let f = fixture();
        let id = create(&f.service, &[]);

        let record = f.service.get(id).unwrap();
        assert_eq!(record.ledger.len(), 1);
        let seed = &record.ledger.entries()[0];
        assert_eq!(seed.subject_id, id);
        assert_eq!(seed.entity_id, npc("npc_58"));
        assert_eq!(seed.believability, 1.0);
        assert!(seed.heard_from_entity_id.is_none());
        assert_eq!(f.events.kinds(), vec![RumorEventKind::Created]);
    }

    #[test]
    fn test_create_seeds_initial_entities() {
        let f = fixture();
        let id = create(&f.service, &["npc_1", "npc_2", "npc_58"]);

        let record = f.service.get(id).unwrap();
        assert_eq!(record.ledger.len(), 3);
        let entry = record.ledger.get(id, &npc("npc_1")).unwrap();
        assert_eq!(entry.believability, 0.8);
        assert_eq!(entry.heard_from_entity_id, Some(npc("npc_58")));
    }

    #[test]
    fn test_create_rejects_bad_input() {
        let f = fixture();
        let mut input = CreateRumor {
            originator_id: npc("npc_58"),
            content: "x".to_string(),
            categories: vec![],
            severity: Severity::Minor,
            truth_value: 1.2,
            initial_entities: vec![],
        };
        assert!(matches!(f.service.create(input.clone()), Err(RumorError::InvalidParameter(_))));

        input.truth_value = 0.5;
        input.content = "  ".to_string();
        assert!(matches!(f.service.create(input), Err(RumorError::InvalidParameter(_))));
        assert!(f.events.events().is_empty());
    }

    #[test]
    fn test_spread_then_update_events() {
        let f = fixture();
        let id = create(&f.service, &[]);
        f.events.clear();

        let first = f.service.spread(spread(id, "npc_58", "npc_104", SpreadParams::faithful(0.0))).unwrap();
        assert!(first.new_believability > 0.0 && first.new_believability < 1.0);
        let second = f.service.spread(spread(id, "npc_58", "npc_104", SpreadParams::faithful(-1.0))).unwrap();
        assert_eq!(second.new_believability, first.new_believability);

        assert_eq!(f.events.kinds(), vec![RumorEventKind::Spread, RumorEventKind::Updated]);
        assert_eq!(f.service.get(id).unwrap().version, 2);
    }

    #[test]
    fn test_mutating_spread_publishes_mutation() {
        let f = fixture();
        let id = create(&f.service, &[]);
        f.events.clear();

        let result = f.service.spread(spread(id, "npc_58", "npc_104", SpreadParams::mutating(0.3, 0.0))).unwrap();
        let variant_id = result.resulting_subject_id;

        assert_eq!(f.events.kinds(), vec![RumorEventKind::Mutated, RumorEventKind::Spread]);
        let mutated = &f.events.of_kind(RumorEventKind::Mutated)[0];
        match &mutated.details {
            EventDetails::Mutated { source_id, original_content, .. } => {
                assert_eq!(*source_id, id);
                assert_eq!(original_content, "The king is ill");
            }
            other => panic!("unexpected details {:?}", other),
        }

        assert_eq!(f.service.ancestors_of(variant_id).unwrap(), vec![id]);
        assert_eq!(f.service.root_of(variant_id).unwrap().id, id);
        assert_eq!(f.service.variant(variant_id).unwrap().source_id, id);
    }

    #[test]
    fn test_spread_of_variant_chain() {
        let f = fixture();
        let id = create(&f.service, &[]);

        let first = f.service.spread(spread(id, "npc_58", "npc_1", SpreadParams::mutating(0.4, 0.0))).unwrap();
        let second = f
            .service
            .spread(spread(first.resulting_subject_id, "npc_1", "npc_2", SpreadParams::mutating(0.4, 0.0)))
            .unwrap();

        assert_eq!(
            f.service.ancestors_of(second.resulting_subject_id).unwrap(),
            vec![first.resulting_subject_id, id]
        );
        let descendants = f.service.descendants_of(id).unwrap();
        assert_eq!(descendants.len(), 2);
        assert!(f.service.descendants_of(second.resulting_subject_id).unwrap().is_empty());
    }

    #[test]
    fn test_spread_failures_leave_no_trace() {
        let f = fixture();
        let id = create(&f.service, &[]);
        let before = f.service.get(id).unwrap();
        f.events.clear();

        let no_knowledge = f.service.spread(spread(id, "npc_7", "npc_104", SpreadParams::mutating(0.5, 0.0)));
        assert!(matches!(no_knowledge, Err(RumorError::SourceHasNoKnowledge { .. })));

        let unknown = f.service.spread(spread(SubjectId::new(), "npc_58", "npc_104", SpreadParams::default()));
        assert!(matches!(unknown, Err(RumorError::NotFound(_))));

        let bad = f.service.spread(spread(id, "npc_58", "npc_104", SpreadParams::faithful(3.0)));
        assert!(matches!(bad, Err(RumorError::InvalidParameter(_))));

        assert_eq!(f.service.get(id).unwrap(), before);
        assert!(f.events.events().is_empty());
    }

    #[test]
    fn test_update_believability() {
        let f = fixture();
        let id = create(&f.service, &["npc_1"]);

        let entry = f
            .service
            .update_believability(id, &npc("npc_1"), Adjustment::Delta(-0.3))
            .unwrap();
        assert!((entry.believability - 0.5).abs() < 1e-9);

        let entry = f
            .service
            .update_believability(id, &npc("npc_1"), Adjustment::Absolute(0.95))
            .unwrap();
        assert_eq!(entry.believability, 0.95);

        let events = f.events.of_kind(RumorEventKind::BelievabilityUpdated);
        assert_eq!(events.len(), 2);
        match events[1].details {
            EventDetails::Believability { previous, current } => {
                assert!((previous - 0.5).abs() < 1e-9);
                assert_eq!(current, 0.95);
            }
            ref other => panic!("unexpected details {:?}", other),
        }

        assert!(matches!(
            f.service.update_believability(id, &npc("npc_404"), Adjustment::Delta(0.1)),
            Err(RumorError::NotFound(_))
        ));
        assert!(matches!(
            f.service.update_believability(id, &npc("npc_1"), Adjustment::Absolute(1.1)),
            Err(RumorError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_decay_idempotent_and_forgets() {
        let f = fixture();
        let id = create(&f.service, &["npc_1"]);
        f.events.clear();

        let day = 86_400;
        let first = f.service.decay(T0 + day).unwrap();
        assert_eq!(first.entries_updated, 1);
        assert_eq!(f.events.kinds(), vec![RumorEventKind::Decayed]);

        let again = f.service.decay(T0 + day).unwrap();
        assert_eq!(again.entries_updated + again.entries_forgotten, 0);
        assert_eq!(f.events.kinds().len(), 1);

        let late = f.service.decay(T0 + 365 * day).unwrap();
        assert_eq!(late.entries_forgotten, 1);
        let record = f.service.get(id).unwrap();
        assert_eq!(record.ledger.len(), 1);
        assert_eq!(record.ledger.entries()[0].entity_id, npc("npc_58"));
    }

    #[test]
    fn test_decay_now_uses_clock() {
        let f = fixture();
        create(&f.service, &["npc_1"]);
        f.clock.advance(86_400);

        let report = f.service.decay_now().unwrap();
        assert_eq!(report.as_of, T0 + 86_400);
        assert_eq!(report.entries_updated, 1);
    }

    #[test]
    fn test_delete_cascades() {
        let f = fixture();
        let id = create(&f.service, &[]);
        let result = f.service.spread(spread(id, "npc_58", "npc_104", SpreadParams::mutating(0.5, 0.0))).unwrap();

        assert!(matches!(f.service.delete(result.resulting_subject_id), Err(RumorError::NotFound(_))));
        f.service.delete(id).unwrap();

        assert!(matches!(f.service.get(id), Err(RumorError::NotFound(_))));
        assert!(matches!(f.service.ancestors_of(result.resulting_subject_id), Err(RumorError::NotFound(_))));
        assert!(matches!(f.service.delete(id), Err(RumorError::NotFound(_))));
        assert_eq!(f.events.kinds().last(), Some(&RumorEventKind::Deleted));
    }

    #[test]
    fn test_rumors_known_by() {
        let f = fixture();
        let a = create(&f.service, &["npc_1"]);
        let b = create(&f.service, &[]);
        create(&f.service, &[]);

        let variant = f.service.spread(spread(b, "npc_58", "npc_1", SpreadParams::mutating(0.5, 1.0))).unwrap();
        f.service.update_believability(a, &npc("npc_1"), Adjustment::Absolute(0.4)).unwrap();

        let known = f.service.rumors_known_by(&npc("npc_1"), &KnownByQuery::default()).unwrap();
        assert_eq!(known.len(), 2);
        assert_eq!(known[0].rumor_id, b);
        assert_eq!(known[0].subject_id, variant.resulting_subject_id);
        assert_eq!(known[1].rumor_id, a);
        assert_eq!(known[1].believability, 0.4);

        let strong = KnownByQuery {
            min_believability: 0.5,
            ..Default::default()
        };
        assert_eq!(f.service.rumors_known_by(&npc("npc_1"), &strong).unwrap().len(), 1);
        assert!(f.service.rumors_known_by(&npc("npc_999"), &KnownByQuery::default()).unwrap().is_empty());
    }

    #[test]
    fn test_statistics() {
        let f = fixture();
        let id = create(&f.service, &["npc_1"]);
        create(&f.service, &[]);
        f.service.spread(spread(id, "npc_58", "npc_2", SpreadParams::mutating(0.5, 0.0))).unwrap();

        let stats = f.service.statistics().unwrap();
        assert_eq!(stats.total_rumors, 2);
        assert_eq!(stats.total_variants, 1);
        assert_eq!(stats.total_spread_records, 4);
        assert_eq!(stats.by_category[&Category::Political], 2);
        assert_eq!(stats.by_severity[&Severity::Major], 2);
        assert!((stats.average_truth_value - 0.3).abs() < 1e-9);
        assert!((stats.average_spread_records_per_rumor - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_publish_failure_does_not_fail_operation() {
        let failing = RecordingPublisher::failing();
        let service = RumorService::new(InMemoryStore::new(), EngineConfig::default())
            .unwrap()
            .with_publisher(Arc::new(failing.clone()));

        let id = create(&service, &[]);
        service.spread(spread(id, "npc_58", "npc_104", SpreadParams::default())).unwrap();
        assert_eq!(failing.events().len(), 2);
        assert!(service.get(id).unwrap().ledger.entity_knows(&npc("npc_104")));
    }

    #[test]
    fn test_callback_strategy_is_used() {
        let mock = MockCallback::new("The king is dead");
        let strategy = EngineConfig::default().mutation.build_with_callback(mock.clone().into_callback());
        let f = fixture();
        let service = f.service.with_strategy(strategy);

        let id = create(&service, &[]);
        let result = service.spread(spread(id, "npc_58", "npc_104", SpreadParams::mutating(0.9, 0.0))).unwrap();

        let variant = result.variant.unwrap();
        assert_eq!(variant.content, "The king is dead");
        assert_eq!(variant.strategy, "external_callback");
        assert_eq!(mock.call_count(), 1);
    }

    #[test]
    fn test_failed_callback_records_fallback_strategy() {
        let strategy = EngineConfig::default()
            .mutation
            .build_with_callback(MockCallback::failing().into_callback());
        let f = fixture();
        let service = f.service.with_strategy(strategy);

        let id = create(&service, &[]);
        let result = service.spread(spread(id, "npc_58", "npc_104", SpreadParams::mutating(1.0, 0.0))).unwrap();

        let variant = result.variant.unwrap();
        assert_eq!(variant.strategy, "word_substitution");
        let record = service.get(id).unwrap();
        assert_eq!(record.lineage.get(variant.id).unwrap().strategy, "word_substitution");
    }

    #[test]
    fn test_slow_callback_does_not_hold_rumor_lock() {
        let mut config = EngineConfig::default();
        config.locking.lock_timeout_ms = 50;
        config.locking.max_retries = 0;
        config.mutation.callback_timeout_ms = 5_000;

        let mock = MockCallback::new("The king is dead").with_delay(Duration::from_millis(600));
        let strategy = config.mutation.build_with_callback(mock.clone().into_callback());
        let service = Arc::new(
            RumorService::new(InMemoryStore::new(), config)
                .unwrap()
                .with_strategy(strategy),
        );
        let id = create(&service, &[]);

        let mutating = {
            let service = Arc::clone(&service);
            std::thread::spawn(move || {
                service.spread(spread(id, "npc_58", "npc_104", SpreadParams::mutating(0.9, 0.0)))
            })
        };

        std::thread::sleep(Duration::from_millis(100));
        let started = std::time::Instant::now();
        let faithful = service.spread(spread(id, "npc_58", "npc_2", SpreadParams::faithful(0.0)));
        assert!(faithful.is_ok());
        assert!(started.elapsed() < Duration::from_millis(400));

        let mutated = mutating.join().unwrap().unwrap();
        assert_eq!(mutated.variant.unwrap().content, "The king is dead");
        assert_eq!(mock.call_count(), 1);

        let record = service.get(id).unwrap();
        assert!(record.ledger.entity_knows(&npc("npc_2")));
        assert!(record.ledger.entity_knows(&npc("npc_104")));
    }

    #[test]
    fn test_deleted_rumor_leaves_no_lock_entry() {
        let f = fixture();
        let id = create(&f.service, &[]);
        f.service
            .spread(spread(id, "npc_58", "npc_104", SpreadParams::faithful(0.0)))
            .unwrap();
        assert_eq!(f.service.locks.len(), 1);

        f.service.delete(id).unwrap();
        assert!(f.service.locks.is_empty());

        // A writer that resolved the rumor before the delete arrives late
        let late = f.service.modify(id, |_| Ok(((), false)));
        assert!(matches!(late, Err(RumorError::NotFound(_))));
        assert!(f.service.locks.is_empty());
    }

    #[test]
    fn test_categories_from_names() {
        let parsed = categories_from_names(&["Political", "dragons", "danger"]);
        assert_eq!(parsed, vec![Category::Political, Category::Other, Category::Danger]);
    }

    /// Repository whose updates always report a newer version
    struct AlwaysStale(InMemoryStore);

    impl RumorRepository for AlwaysStale {
        type Error = rumor_store::StoreError;

        fn create(&self, record: RumorRecord) -> Result<RumorId, Self::Error> {
            self.0.create(record)
        }
        fn get(&self, id: RumorId) -> Result<Option<RumorRecord>, Self::Error> {
            self.0.get(id)
        }
        fn root_of(&self, subject_id: SubjectId) -> Result<Option<RumorId>, Self::Error> {
            self.0.root_of(subject_id)
        }
        fn update(&self, record: &RumorRecord) -> Result<UpdateStatus, Self::Error> {
            Ok(UpdateStatus::Stale { current: record.version + 1 })
        }
        fn list(&self, filter: &RumorFilter, page: Page) -> Result<RumorPage, Self::Error> {
            self.0.list(filter, page)
        }
        fn ids(&self) -> Result<Vec<RumorId>, Self::Error> {
            self.0.ids()
        }
        fn delete(&self, id: RumorId) -> Result<bool, Self::Error> {
            self.0.delete(id)
        }
    }

    #[test]
    fn test_stale_updates_become_conflict() {
        let service = RumorService::new(AlwaysStale(InMemoryStore::new()), EngineConfig::default()).unwrap();
        let id = service
            .create(CreateRumor {
                originator_id: npc("npc_58"),
                content: "x".to_string(),
                categories: vec![],
                severity: Severity::Minor,
                truth_value: 0.5,
                initial_entities: vec![],
            })
            .unwrap();

        let result = service.spread(spread(id, "npc_58", "npc_104", SpreadParams::default()));
        assert!(matches!(result, Err(RumorError::ConcurrencyConflict(conflict)) if conflict == id));
    }

    #[test]
    fn test_publish_error_type_is_displayable() {
        assert!(PublishError("x".to_string()).to_string().contains("x"));
    }
}
