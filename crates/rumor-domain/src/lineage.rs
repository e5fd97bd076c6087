//! Lineage graph - the variants descending from one rumor
//!
//! Every variant points at exactly one source: the root rumor or an earlier
//! variant. Following source pointers from any variant must reach the root
//! in a finite number of hops. Traversals are explicit loops over parent
//! pointers so adversarially long spread chains cannot exhaust the stack.

use crate::{DomainError, RumorId, SubjectId, Variant, VariantId};
use std::collections::{BTreeSet, HashMap, VecDeque};

/// Directed acyclic graph of variants rooted at one rumor
#[derive(Debug, Clone, PartialEq)]
pub struct LineageGraph {
    root: RumorId,
    variants: Vec<Variant>,
    index: HashMap<VariantId, usize>,
}

impl LineageGraph {
    /// Create a lineage containing only the root rumor
    pub fn new(root: RumorId) -> Self {
        Self {
            root,
            variants: Vec::new(),
            index: HashMap::new(),
        }
    }

    /// Rebuild a lineage from stored variants in creation order
    pub fn from_variants(root: RumorId, variants: Vec<Variant>) -> Result<Self, DomainError> {
        let mut graph = Self::new(root);
        for variant in variants {
            graph.add_variant(variant)?;
        }
        Ok(graph)
    }

    /// Id of the root rumor
    pub fn root(&self) -> RumorId {
        self.root
    }

    /// Check whether the id is the root or one of its variants
    pub fn contains(&self, id: SubjectId) -> bool {
        id == self.root || self.index.contains_key(&id)
    }

    /// Look up a variant
    pub fn get(&self, id: VariantId) -> Option<&Variant> {
        self.index.get(&id).map(|&idx| &self.variants[idx])
    }

    /// All variants in creation order
    pub fn variants(&self) -> &[Variant] {
        &self.variants
    }

    /// Number of variants (the root is not counted)
    pub fn len(&self) -> usize {
        self.variants.len()
    }

    /// True when the rumor has not mutated yet
    pub fn is_empty(&self) -> bool {
        self.variants.is_empty()
    }

    /// Add a variant below its source
    ///
    /// # Errors
    /// - `DuplicateSubject` if the id is already in the graph
    /// - `SourceNotFound` if `source_id` is not the root or a known variant
    /// - `Cycle` if following sources from the new variant would revisit it
    pub fn add_variant(&mut self, variant: Variant) -> Result<(), DomainError> {
        if self.contains(variant.id) {
            return Err(DomainError::DuplicateSubject(variant.id));
        }
        if variant.source_id == variant.id {
            return Err(DomainError::Cycle(variant.id));
        }
        if !self.contains(variant.source_id) {
            return Err(DomainError::SourceNotFound(variant.source_id));
        }

        // Walk up from the source; the new id must not appear and the walk
        // must reach the root within as many hops as there are variants.
        let mut current = variant.source_id;
        let mut hops = 0;
        while current != self.root {
            if current == variant.id || hops > self.variants.len() {
                return Err(DomainError::Cycle(variant.id));
            }
            current = self.parent_of(current)?;
            hops += 1;
        }

        self.index.insert(variant.id, self.variants.len());
        self.variants.push(variant);
        Ok(())
    }

    fn parent_of(&self, id: VariantId) -> Result<SubjectId, DomainError> {
        self.get(id)
            .map(|v| v.source_id)
            .ok_or(DomainError::UnknownSubject(id))
    }

    /// Sources of `id`, from its immediate source up to and including the root
    ///
    /// The root itself has no ancestors.
    pub fn ancestors_of(&self, id: SubjectId) -> Result<Vec<SubjectId>, DomainError> {
        if !self.contains(id) {
            return Err(DomainError::UnknownSubject(id));
        }

        let mut ancestors = Vec::new();
        let mut current = id;
        while current != self.root {
            current = self.parent_of(current)?;
            ancestors.push(current);
            if ancestors.len() > self.variants.len() {
                return Err(DomainError::Cycle(id));
            }
        }
        Ok(ancestors)
    }

    /// Every variant transitively mutated from `id`
    pub fn descendants_of(&self, id: SubjectId) -> Result<BTreeSet<VariantId>, DomainError> {
        if !self.contains(id) {
            return Err(DomainError::UnknownSubject(id));
        }

        let mut children: HashMap<SubjectId, Vec<VariantId>> = HashMap::new();
        for v in &self.variants {
            children.entry(v.source_id).or_default().push(v.id);
        }

        let mut found = BTreeSet::new();
        let mut queue = VecDeque::from([id]);
        while let Some(current) = queue.pop_front() {
            for &child in children.get(&current).into_iter().flatten() {
                if found.insert(child) {
                    queue.push_back(child);
                }
            }
        }
        Ok(found)
    }

    /// Root rumor of any member of the lineage
    pub fn root_of(&self, id: SubjectId) -> Result<RumorId, DomainError> {
        if self.contains(id) {
            Ok(self.root)
        } else {
            Err(DomainError::UnknownSubject(id))
        }
    }

    /// Number of hops from `id` to the root
    pub fn depth_of(&self, id: SubjectId) -> Result<usize, DomainError> {
        self.ancestors_of(id).map(|a| a.len())
    }
}
