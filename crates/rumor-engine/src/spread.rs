//! Spread engine - one entity telling another about a rumor or variant

use crate::RumorError;
use rumor_domain::traits::{MutatedContent, MutationStrategy};
use rumor_domain::{
    ensure_signed_unit, ensure_unit, EntityId, RumorRecord, SpreadPolicy, SubjectId, Timestamp,
    Variant,
};
use serde::Serialize;
use std::sync::Arc;

/// How a single telling behaves
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpreadParams {
    /// Whether the telling produces a new variant
    pub mutate: bool,

    /// Divergence applied when mutating, in [0, 1]
    pub mutation_strength: f64,

    /// Trust (+) or distrust (-) between the entities, in [-1, 1]
    pub relationship_factor: f64,
}

impl Default for SpreadParams {
    fn default() -> Self {
        Self {
            mutate: false,
            mutation_strength: 0.0,
            relationship_factor: 0.0,
        }
    }
}

impl SpreadParams {
    /// A faithful retelling
    pub fn faithful(relationship_factor: f64) -> Self {
        Self {
            relationship_factor,
            ..Self::default()
        }
    }

    /// A retelling that mutates the content
    pub fn mutating(mutation_strength: f64, relationship_factor: f64) -> Self {
        Self {
            mutate: true,
            mutation_strength,
            relationship_factor,
        }
    }

    /// Reject values outside their declared ranges
    pub fn validate(&self) -> Result<(), RumorError> {
        ensure_unit("mutation_strength", self.mutation_strength)?;
        ensure_signed_unit("relationship_factor", self.relationship_factor)?;
        Ok(())
    }
}

/// A spread from one entity to another
#[derive(Debug, Clone, PartialEq)]
pub struct SpreadRequest {
    /// Rumor or variant being told
    pub subject_id: SubjectId,
    /// Entity telling it
    pub from_entity_id: EntityId,
    /// Entity hearing it
    pub to_entity_id: EntityId,
    /// Telling behavior
    pub params: SpreadParams,
}

impl SpreadRequest {
    /// Check the request without looking at any state
    pub fn validate(&self) -> Result<(), RumorError> {
        self.params.validate()?;
        if self.from_entity_id == self.to_entity_id {
            return Err(RumorError::InvalidParameter(format!(
                "entity {} cannot spread a rumor to itself",
                self.from_entity_id
            )));
        }
        Ok(())
    }
}

/// Outcome of a spread
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpreadResult {
    /// Whether a new variant was created
    pub mutated: bool,

    /// Subject the target now believes: the new variant, or the told subject
    pub resulting_subject_id: SubjectId,

    /// Believability stored for the target
    pub new_believability: f64,

    /// Believability the target held before, if it already knew the subject
    pub previous_believability: Option<f64>,

    /// The new variant, when mutated
    pub variant: Option<Variant>,
}

impl SpreadResult {
    /// True when the target had not heard the resulting subject before
    pub fn is_first_exposure(&self) -> bool {
        self.previous_believability.is_none()
    }
}

/// Applies spreads to rumor records
///
/// The engine only changes the record it is handed; committing it, locking
/// and publishing events is up to the caller. A failed spread leaves the
/// caller's copy in an unspecified state and must not be committed.
pub struct SpreadEngine {
    policy: SpreadPolicy,
    strategy: Arc<dyn MutationStrategy>,
}

impl SpreadEngine {
    /// Create an engine with a policy and a mutation strategy
    pub fn new(policy: SpreadPolicy, strategy: Arc<dyn MutationStrategy>) -> Self {
        Self { policy, strategy }
    }

    /// The transfer policy
    pub fn policy(&self) -> &SpreadPolicy {
        &self.policy
    }

    /// Name of the mutation strategy in use
    pub fn strategy_name(&self) -> &str {
        self.strategy.name()
    }

    /// Run the mutation strategy for a mutating request against `record`
    ///
    /// Content of rumors and variants never changes, so this can run on an
    /// unlocked snapshot; the result is handed to [`apply_prepared`]. Returns
    /// `None` for faithful requests.
    ///
    /// [`apply_prepared`]: SpreadEngine::apply_prepared
    pub fn prepare_mutation(
        &self,
        record: &RumorRecord,
        request: &SpreadRequest,
    ) -> Result<Option<MutatedContent>, RumorError> {
        request.validate()?;
        if !request.params.mutate {
            return Ok(None);
        }
        let (content, _) = Self::told(record, request)?;
        Ok(Some(self.strategy.produce(content, request.params.mutation_strength)))
    }

    /// Apply one spread to `record`, mutating inline when requested
    ///
    /// # Errors
    /// - `InvalidParameter` for out-of-range params or a self-spread
    /// - `NotFound` if the subject is not part of this record
    /// - `SourceHasNoKnowledge` if the teller holds no belief in the subject
    pub fn apply(
        &self,
        record: &mut RumorRecord,
        request: &SpreadRequest,
        now: Timestamp,
    ) -> Result<SpreadResult, RumorError> {
        self.apply_prepared(record, request, None, now)
    }

    /// Apply one spread using content from [`prepare_mutation`]
    ///
    /// A mutating request without prepared content runs the strategy here.
    ///
    /// [`prepare_mutation`]: SpreadEngine::prepare_mutation
    pub fn apply_prepared(
        &self,
        record: &mut RumorRecord,
        request: &SpreadRequest,
        prepared: Option<MutatedContent>,
        now: Timestamp,
    ) -> Result<SpreadResult, RumorError> {
        request.validate()?;

        let subject_id = request.subject_id;
        let (content, source_believability) = Self::told(record, request)?;
        let computed = self
            .policy
            .transfer(source_believability, request.params.relationship_factor);

        let variant = if request.params.mutate {
            let strength = request.params.mutation_strength;
            let mutated = match prepared {
                Some(mutated) => mutated,
                None => self.strategy.produce(content, strength),
            };
            let variant = Variant::new(
                subject_id,
                mutated.content,
                strength,
                request.from_entity_id.clone(),
                mutated.strategy,
                now,
            )?;
            record.lineage.add_variant(variant.clone())?;
            tracing::debug!(
                variant_id = %variant.id,
                source_id = %subject_id,
                strategy = %variant.strategy,
                "Created variant"
            );
            Some(variant)
        } else {
            None
        };

        let resulting_subject_id = variant.as_ref().map_or(subject_id, |v| v.id);
        let exposure = record.ledger.expose(
            resulting_subject_id,
            &request.to_entity_id,
            &request.from_entity_id,
            computed,
            &self.policy,
            now,
        );
        record.touch(now);

        Ok(SpreadResult {
            mutated: variant.is_some(),
            resulting_subject_id,
            new_believability: exposure.believability,
            previous_believability: exposure.previous,
            variant,
        })
    }

    /// Content of the told subject and the teller's belief in it
    fn told<'r>(record: &'r RumorRecord, request: &SpreadRequest) -> Result<(&'r str, f64), RumorError> {
        let subject_id = request.subject_id;
        let content = record
            .content_of(subject_id)
            .ok_or_else(|| RumorError::subject_not_found(subject_id))?;
        let source = record
            .ledger
            .get(subject_id, &request.from_entity_id)
            .ok_or_else(|| RumorError::SourceHasNoKnowledge {
                entity: request.from_entity_id.clone(),
                subject: subject_id,
            })?;
        Ok((content, source.believability))
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;
    use rumor_domain::{Category, Rumor, Severity};
    use rumor_mutation::TemplateStrategy;

    proptest! {
        #[test]
        fn believability_stays_in_unit_interval(
            hops in prop::collection::vec((0usize..6, 0usize..6, -1.0f64..=1.0, any::<bool>()), 1..40),
        ) {
            let engine = SpreadEngine::new(SpreadPolicy::default(), Arc::new(TemplateStrategy::seeded(1)));
            let originator = EntityId::new("npc_0").unwrap();
            let rumor = Rumor::new(originator, "A comet was seen", [Category::Other], Severity::Minor, 0.5, 0).unwrap();
            let mut rec = RumorRecord::new(rumor);

            for (i, (from, to, rf, mutate)) in hops.into_iter().enumerate() {
                let from = EntityId::new(format!("npc_{}", from)).unwrap();
                let Some(subject) = rec.ledger.latest_for_entity(&from).map(|e| e.subject_id) else {
                    continue;
                };
                let params = if mutate { SpreadParams::mutating(0.5, rf) } else { SpreadParams::faithful(rf) };
                let req = SpreadRequest {
                    subject_id: subject,
                    from_entity_id: from,
                    to_entity_id: EntityId::new(format!("npc_{}", to)).unwrap(),
                    params,
                };
                let mut working = rec.clone();
                if engine.apply(&mut working, &req, i as u64).is_ok() {
                    rec = working;
                }
            }

            for entry in rec.ledger.entries() {
                prop_assert!((0.0..=1.0).contains(&entry.believability));
            }
        }
    }
}
