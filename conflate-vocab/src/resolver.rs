//! The type-vocabulary resolver.
//!
//! Walks an item's declared types through the graph's type relations and
//! collects tag rules with evidence paths. The walk is an explicit
//! worklist with a monotonic `seen` set, never recursion: termination
//! holds for any graph shape, including self-referential and cyclic
//! subclass edges.
//!
//! Fetch failures are not fatal: a type that cannot be resolved is an
//! empty-contribution leaf, logged and skipped. The only fatal walk
//! condition is a redirect loop in the entity store.

use crate::error::Result;
use crate::overrides::{Overrides, AERODROME, AIRPORT, BUILDING, TRAM_STOP};
use conflate_core::item::{props, ItemId, KnowledgeItem};
use conflate_core::store::{resolve_item, EntityStore};
use conflate_core::tag_rule::TagRule;
use conflate_core::CoreError;
use rustc_hash::{FxHashMap, FxHashSet};

/// One step of an evidence path: the walked type and its display label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeStep {
    pub id: ItemId,
    pub label: String,
}

/// An evidence path, ordered from the declared type outward.
pub type TypePath = Vec<TypeStep>;

/// Tag rules derived from an item's type closure, each with the evidence
/// paths that produced it. Built fresh per resolution call.
#[derive(Debug, Clone, Default)]
pub struct TypeVocabulary {
    entries: FxHashMap<TagRule, Vec<TypePath>>,
}

impl TypeVocabulary {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// The rules in the vocabulary, unordered.
    pub fn rules(&self) -> impl Iterator<Item = &TagRule> {
        self.entries.keys()
    }

    /// Evidence paths for a rule, empty if absent.
    pub fn evidence(&self, rule: &TagRule) -> &[TypePath] {
        self.entries.get(rule).map_or(&[], Vec::as_slice)
    }

    fn push(&mut self, rule: TagRule, path: TypePath) {
        self.entries.entry(rule).or_default().push(path);
    }
}

/// Walks type hierarchies against an entity store with injected override
/// tables.
pub struct VocabularyResolver<'a> {
    store: &'a dyn EntityStore,
    overrides: &'a Overrides,
}

/// Type relations whose targets continue the walk.
const EXPANSION_PROPS: [conflate_core::item::PropertyId; 5] = [
    props::SUBCLASS_OF,
    props::RELIGION,
    props::SPORT,
    props::USE,
    props::FACET_OF,
];

impl<'a> VocabularyResolver<'a> {
    pub fn new(store: &'a dyn EntityStore, overrides: &'a Overrides) -> Self {
        VocabularyResolver { store, overrides }
    }

    /// Resolve the tag vocabulary for an item.
    ///
    /// Returns an empty vocabulary when the item declares no types or no
    /// type in its closure contributes tag equivalences.
    pub async fn resolve(&self, item: &KnowledgeItem) -> Result<TypeVocabulary> {
        let declared = item.type_ids();
        let mut vocabulary = TypeVocabulary::default();
        if declared.is_empty() {
            return Ok(vocabulary);
        }

        let mut skip = self.overrides.skip_types().clone();
        // A tram stop or airfield item typed as a generic building would
        // drag in the whole building subtree; suppress it.
        if declared
            .iter()
            .any(|id| [TRAM_STOP, AIRPORT, AERODROME].contains(id))
        {
            skip.insert(BUILDING);
        }

        let mut seen: FxHashSet<ItemId> = declared.iter().copied().collect();
        seen.extend(skip.iter().copied());

        // Cache of fetched types for the duration of this call.
        let mut cache: FxHashMap<ItemId, Option<KnowledgeItem>> = FxHashMap::default();

        let mut frontier: Vec<(KnowledgeItem, TypePath)> = Vec::new();
        for id in declared {
            if let Some(type_item) = self.fetch_type(&mut cache, id).await? {
                frontier.push((type_item, TypePath::new()));
            }
        }

        while let Some((type_item, path)) = frontier.pop() {
            let mut current_path = path;
            current_path.push(TypeStep {
                id: type_item.id,
                label: type_item
                    .label("en")
                    .unwrap_or_default()
                    .to_owned(),
            });

            for rule in self.rules_for(&type_item) {
                vocabulary.push(rule, current_path.clone());
            }

            // Specific enough; its ancestors would only generalize.
            if self.overrides.is_stop_type(type_item.id) {
                continue;
            }

            let mut next: Vec<ItemId> = Vec::new();
            for property in EXPANSION_PROPS {
                for id in type_item.entity_refs(property) {
                    if seen.insert(id) {
                        next.push(id);
                    }
                }
            }

            for id in next {
                if let Some(parent) = self.fetch_type(&mut cache, id).await? {
                    frontier.push((parent, current_path.clone()));
                }
            }
        }

        Ok(vocabulary)
    }

    /// Declared tag equivalences of a type, minus the generic blocklist,
    /// plus curated extra keys.
    fn rules_for(&self, type_item: &KnowledgeItem) -> Vec<TagRule> {
        let mut rules = Vec::new();

        for st in type_item.claim(props::OSM_TAG) {
            let Some(text) = st.value.as_text() else {
                tracing::warn!(
                    item = %type_item.id,
                    "tag equivalence statement without string value, skipping"
                );
                continue;
            };
            let Some(rule) = TagRule::parse(text) else {
                tracing::warn!(item = %type_item.id, tag = text, "unparseable tag equivalence");
                continue;
            };
            if !self.overrides.is_blocked(&rule) {
                rules.push(rule);
            }
        }

        rules.extend(self.overrides.extra_keys(type_item.id).iter().cloned());
        rules
    }

    /// Resolve a type node, caching for this call. Missing or
    /// unfetchable types resolve to `None`; only redirect loops and hard
    /// store failures propagate.
    async fn fetch_type(
        &self,
        cache: &mut FxHashMap<ItemId, Option<KnowledgeItem>>,
        id: ItemId,
    ) -> Result<Option<KnowledgeItem>> {
        if let Some(cached) = cache.get(&id) {
            return Ok(cached.clone());
        }

        let resolved = match resolve_item(self.store, id).await {
            Ok(found) => {
                if found.is_none() {
                    tracing::warn!(type_id = %id, "type not found, skipping subtree");
                }
                found
            }
            Err(e @ CoreError::RedirectLoop { .. }) => return Err(e.into()),
            Err(e) => {
                tracing::warn!(type_id = %id, error = %e, "type fetch failed, skipping subtree");
                None
            }
        };

        cache.insert(id, resolved.clone());
        Ok(resolved)
    }
}
