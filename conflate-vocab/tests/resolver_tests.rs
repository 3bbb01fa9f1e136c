//! Type-walk integration tests against an in-memory entity store.

use async_trait::async_trait;
use conflate_core::item::{props, ItemId, KnowledgeItem};
use conflate_core::statement::{Statement, StatementValue};
use conflate_core::store::{EntityStore, Fetched};
use conflate_core::tag_rule::TagRule;
use conflate_core::{CoreError, Result};
use conflate_vocab::overrides::{BUILDING, TRAM_STOP};
use conflate_vocab::{filter_by_types, isa_counts, Overrides, VocabularyResolver};
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;

struct MemoryStore {
    items: BTreeMap<u64, KnowledgeItem>,
}

impl MemoryStore {
    fn new(items: impl IntoIterator<Item = KnowledgeItem>) -> Self {
        MemoryStore {
            items: items.into_iter().map(|i| (i.id.0, i)).collect(),
        }
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get_item(&self, id: ItemId) -> Result<Option<KnowledgeItem>> {
        Ok(self.items.get(&id.0).cloned())
    }

    async fn fetch_remote(&self, id: ItemId) -> Result<Fetched> {
        Err(CoreError::NotFound(id))
    }

    async fn upsert(&self, _item: KnowledgeItem) -> Result<()> {
        Ok(())
    }
}

/// A type node with a label, tag equivalences, and subclass edges.
fn type_node(id: u64, label: &str, tags: &[&str], subclass_of: &[u64]) -> KnowledgeItem {
    let mut item = KnowledgeItem {
        id: ItemId(id),
        labels: BTreeMap::from([("en".to_owned(), label.to_owned())]),
        last_revision: 1,
        ..Default::default()
    };
    if !tags.is_empty() {
        item.claims.insert(
            props::OSM_TAG,
            tags.iter().map(|t| Statement::text(*t)).collect(),
        );
    }
    if !subclass_of.is_empty() {
        item.claims.insert(
            props::SUBCLASS_OF,
            subclass_of
                .iter()
                .map(|id| Statement::entity(ItemId(*id)))
                .collect(),
        );
    }
    item
}

/// An item declaring the given instance-of types.
fn instance_of(id: u64, types: &[u64]) -> KnowledgeItem {
    let mut item = KnowledgeItem {
        id: ItemId(id),
        last_revision: 1,
        ..Default::default()
    };
    item.claims.insert(
        props::INSTANCE_OF,
        types
            .iter()
            .map(|t| Statement::entity(ItemId(*t)))
            .collect(),
    );
    item
}

#[tokio::test]
async fn test_no_declared_types_yields_empty_vocabulary() {
    let store = MemoryStore::new([]);
    let overrides = Overrides::builtin();
    let resolver = VocabularyResolver::new(&store, &overrides);

    let item = KnowledgeItem {
        id: ItemId(1),
        last_revision: 1,
        ..Default::default()
    };
    let vocabulary = resolver.resolve(&item).await.unwrap();
    assert!(vocabulary.is_empty());
}

#[tokio::test]
async fn test_walk_passes_generic_building_for_plain_library() {
    // "library building" has no direct tag statement; one subclass edge
    // leads to "library" (which carries the tag), another to the generic
    // building class.
    let store = MemoryStore::new([
        type_node(100, "library building", &[], &[200, BUILDING.0]),
        type_node(200, "library", &["Tag:amenity=library"], &[]),
        type_node(BUILDING.0, "building", &[], &[]),
    ]);
    let overrides = Overrides::empty();
    let resolver = VocabularyResolver::new(&store, &overrides);

    let item = instance_of(1, &[100]);
    let vocabulary = resolver.resolve(&item).await.unwrap();

    let rule = TagRule::parse("Tag:amenity=library").unwrap();
    let evidence = vocabulary.evidence(&rule);
    assert_eq!(evidence.len(), 1);
    assert_eq!(evidence[0].len(), 2);
    assert_eq!(evidence[0][0].id, ItemId(100));
    assert_eq!(evidence[0][0].label, "library building");
    assert_eq!(evidence[0][1].id, ItemId(200));
}

#[tokio::test]
async fn test_tram_stop_suppresses_building_subtree() {
    let store = MemoryStore::new([
        type_node(TRAM_STOP.0, "tram stop", &["Tag:railway=tram_stop"], &[BUILDING.0]),
        type_node(BUILDING.0, "building", &["Key:building"], &[]),
    ]);
    let overrides = Overrides::empty();
    let resolver = VocabularyResolver::new(&store, &overrides);

    let item = instance_of(1, &[TRAM_STOP.0]);
    let vocabulary = resolver.resolve(&item).await.unwrap();

    assert!(!vocabulary.evidence(&TagRule::parse("Tag:railway=tram_stop").unwrap()).is_empty());
    assert!(vocabulary.evidence(&TagRule::parse("Key:building").unwrap()).is_empty());
}

#[tokio::test]
async fn test_cyclic_subclass_edges_terminate() {
    let store = MemoryStore::new([
        type_node(100, "a", &["Key:one"], &[200]),
        type_node(200, "b", &["Key:two"], &[100]), // cycle back
    ]);
    let overrides = Overrides::empty();
    let resolver = VocabularyResolver::new(&store, &overrides);

    let item = instance_of(1, &[100]);
    let vocabulary = resolver.resolve(&item).await.unwrap();

    assert!(!vocabulary.evidence(&TagRule::parse("Key:one").unwrap()).is_empty());
    assert!(!vocabulary.evidence(&TagRule::parse("Key:two").unwrap()).is_empty());
}

#[tokio::test]
async fn test_stop_type_halts_expansion() {
    let store = MemoryStore::new([
        type_node(100, "church building", &["Tag:building=church"], &[200]),
        type_node(200, "place of worship", &["Tag:amenity=place_of_worship"], &[]),
    ]);
    let overrides = Overrides::empty().with_stop_types([ItemId(100)]);
    let resolver = VocabularyResolver::new(&store, &overrides);

    let item = instance_of(1, &[100]);
    let vocabulary = resolver.resolve(&item).await.unwrap();

    assert!(!vocabulary.evidence(&TagRule::parse("Tag:building=church").unwrap()).is_empty());
    assert!(vocabulary
        .evidence(&TagRule::parse("Tag:amenity=place_of_worship").unwrap())
        .is_empty());
}

#[tokio::test]
async fn test_missing_type_is_empty_subtree() {
    // Declared type 100 exists; its parent 999 does not.
    let store = MemoryStore::new([type_node(100, "pier", &["Tag:man_made=pier"], &[999])]);
    let overrides = Overrides::empty();
    let resolver = VocabularyResolver::new(&store, &overrides);

    let item = instance_of(1, &[100]);
    let vocabulary = resolver.resolve(&item).await.unwrap();
    assert_eq!(vocabulary.len(), 1);
}

#[tokio::test]
async fn test_filter_by_types_is_idempotent() {
    let store = MemoryStore::new([
        type_node(200, "castle", &[], &[100]), // subclass of fortification
        type_node(100, "fortification", &[], &[]),
    ]);

    let items = vec![
        instance_of(1, &[100]),
        instance_of(2, &[200]),
        instance_of(3, &[300]), // unrelated
    ];
    let requested: FxHashSet<ItemId> = [ItemId(100)].into_iter().collect();

    let once = filter_by_types(&store, items, &requested).await.unwrap();
    let ids: Vec<u64> = once.iter().map(|i| i.id.0).collect();
    assert_eq!(ids, vec![1, 2]);

    let twice = filter_by_types(&store, once.clone(), &requested)
        .await
        .unwrap();
    assert_eq!(
        twice.iter().map(|i| i.id.0).collect::<Vec<_>>(),
        ids
    );
}

#[tokio::test]
async fn test_isa_counts_most_common_first() {
    let store = MemoryStore::new([type_node(100, "church", &[], &[])]);

    let items = vec![
        instance_of(1, &[100]),
        instance_of(2, &[100]),
        instance_of(3, &[200]),
    ];

    let counts = isa_counts(&store, &items).await.unwrap();
    assert_eq!(counts.len(), 2);
    assert_eq!(counts[0].id, ItemId(100));
    assert_eq!(counts[0].count, 2);
    assert_eq!(counts[0].label.as_deref(), Some("church"));
    assert_eq!(counts[1].label, None);
}
