//! End-to-end pipeline tests over in-memory collaborator fakes.

use async_trait::async_trait;
use conflate_core::error::{CoreError, Result as CoreResult};
use conflate_core::feature::{GeometryKind, SpatialFeature};
use conflate_core::item::{props, Coordinate, ItemId, ItemLocation, KnowledgeItem};
use conflate_core::statement::Statement;
use conflate_core::store::{
    EntityStore, Fetched, Preset, PresetLookup, ReverseGeocoder,
};
use conflate_core::tag_rule::TagRule;
use conflate_match::{MatchError, Matcher};
use conflate_spatial::{FeatureFilter, SpatialError, SpatialStore};
use geo::Contains;
use geo_types::{line_string, point, Geometry};
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

const HERE: Coordinate = Coordinate {
    latitude: 51.5,
    longitude: -0.1,
};

// ─── Fakes ──────────────────────────────────────────────────────────────

struct MemoryStore {
    items: Mutex<BTreeMap<u64, KnowledgeItem>>,
}

impl MemoryStore {
    fn with_items(items: Vec<KnowledgeItem>) -> Arc<Self> {
        Arc::new(MemoryStore {
            items: Mutex::new(items.into_iter().map(|i| (i.id.0, i)).collect()),
        })
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn get_item(&self, id: ItemId) -> CoreResult<Option<KnowledgeItem>> {
        Ok(self.items.lock().unwrap().get(&id.0).cloned())
    }

    async fn fetch_remote(&self, id: ItemId) -> CoreResult<Fetched> {
        Err(CoreError::NotFound(id))
    }

    async fn upsert(&self, item: KnowledgeItem) -> CoreResult<()> {
        self.items.lock().unwrap().insert(item.id.0, item);
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq)]
enum FailMode {
    Backend,
    Unavailable,
}

#[derive(Default)]
struct MemorySpatial {
    features: Vec<SpatialFeature>,
    failures: Vec<(GeometryKind, FailMode)>,
    queries: Mutex<Vec<GeometryKind>>,
}

impl MemorySpatial {
    fn queried_kinds(&self) -> Vec<GeometryKind> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SpatialStore for MemorySpatial {
    async fn query(
        &self,
        kind: GeometryKind,
        filter: &FeatureFilter,
    ) -> Result<Vec<SpatialFeature>, SpatialError> {
        self.queries.lock().unwrap().push(kind);

        if let Some((_, mode)) = self.failures.iter().find(|(k, _)| *k == kind) {
            return Err(match mode {
                FailMode::Backend => SpatialError::Backend("query failed".to_owned()),
                FailMode::Unavailable => SpatialError::Unavailable("store down".to_owned()),
            });
        }

        let rows: Vec<SpatialFeature> = self
            .features
            .iter()
            .filter(|f| f.kind == kind)
            .filter(|f| {
                filter.envelopes.is_empty()
                    || filter.envelopes.iter().any(|e| e.intersects(&f.geometry))
            })
            .filter(|f| filter.matches_tags(&f.tags))
            .filter(|f| {
                filter
                    .covers
                    .as_ref()
                    .is_none_or(|inner| f.geometry.contains(inner))
            })
            .filter(|f| {
                filter
                    .within
                    .as_ref()
                    .is_none_or(|outer| outer.contains(&f.geometry))
            })
            .cloned()
            .collect();
        Ok(rows)
    }
}

struct SchemaPresets;

#[async_trait]
impl PresetLookup for SchemaPresets {
    async fn classify(
        &self,
        key: &str,
        value: &str,
        _kind: GeometryKind,
        _locale: Option<&str>,
    ) -> CoreResult<Option<Preset>> {
        let name = match (key, value) {
            ("amenity", "library") => "Library",
            ("amenity", "clock") => "Clock",
            ("highway", "residential") => "Residential Road",
            _ => return Ok(None),
        };
        Ok(Some(Preset {
            rule: TagRule::RequireKeyValue(key.to_owned(), value.to_owned()),
            schema_path: format!("{key}/{value}"),
            name: name.to_owned(),
        }))
    }
}

struct FixedGeocoder(&'static str);

#[async_trait]
impl ReverseGeocoder for FixedGeocoder {
    async fn countries_covering(&self, _point: Coordinate) -> CoreResult<FxHashSet<String>> {
        Ok(FxHashSet::from_iter([self.0.to_owned()]))
    }
}

struct FailingGeocoder;

#[async_trait]
impl ReverseGeocoder for FailingGeocoder {
    async fn countries_covering(&self, _point: Coordinate) -> CoreResult<FxHashSet<String>> {
        Err(CoreError::Backend("geocode service exhausted".to_owned()))
    }
}

// ─── Fixtures ───────────────────────────────────────────────────────────

/// An item located at `HERE`, typed with `type_id`.
fn item_at(id: u64, label: &str, type_id: u64, locations: &[Coordinate]) -> KnowledgeItem {
    let mut item = KnowledgeItem {
        id: ItemId(id),
        labels: BTreeMap::from([("en".to_owned(), label.to_owned())]),
        ..Default::default()
    };
    item.claims
        .insert(props::INSTANCE_OF, vec![Statement::entity(ItemId(type_id))]);
    item.locations = locations
        .iter()
        .enumerate()
        .map(|(order, c)| ItemLocation {
            property: props::COORDINATES,
            statement_order: order as u32,
            coordinate: *c,
        })
        .collect();
    item
}

/// A type item carrying one tag equivalence.
fn type_item(id: u64, tag: &str) -> KnowledgeItem {
    let mut item = KnowledgeItem {
        id: ItemId(id),
        ..Default::default()
    };
    item.claims
        .insert(props::OSM_TAG, vec![Statement::text(tag)]);
    item
}

fn point_feature(src_id: i64, lat: f64, lng: f64, tags: &[(&str, &str)]) -> SpatialFeature {
    SpatialFeature {
        kind: GeometryKind::Point,
        src_id,
        tags: tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        geometry: Geometry::Point(point!(x: lng, y: lat)),
    }
}

fn line_feature(src_id: i64, lat: f64, tags: &[(&str, &str)]) -> SpatialFeature {
    SpatialFeature {
        kind: GeometryKind::Line,
        src_id,
        tags: tags
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
        geometry: Geometry::LineString(line_string![
            (x: -0.105, y: lat),
            (x: -0.095, y: lat),
        ]),
    }
}

fn matcher(spatial: MemorySpatial, items: Vec<KnowledgeItem>) -> (Matcher, Arc<MemorySpatial>) {
    let spatial = Arc::new(spatial);
    let m = Matcher::new(
        MemoryStore::with_items(items),
        spatial.clone(),
        Arc::new(SchemaPresets),
        Arc::new(FixedGeocoder("GB")),
    );
    (m, spatial)
}

// ─── Tests ──────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_library_is_found_and_enriched() {
    let spatial = MemorySpatial {
        features: vec![
            point_feature(
                7,
                51.5005,
                -0.1,
                &[("amenity", "library"), ("name", "Central Library")],
            ),
            // Nearby but not in the vocabulary.
            point_feature(8, 51.5004, -0.1, &[("amenity", "atm")]),
        ],
        ..Default::default()
    };
    let (matcher, _) = matcher(
        spatial,
        vec![type_item(1000, "Tag:amenity=library")],
    );
    let item = item_at(1, "Central Library", 1000, &[HERE]);

    let outcome = matcher.find_candidates(&item).await.unwrap();
    assert!(outcome.failed_kinds.is_empty());
    assert_eq!(outcome.candidates.len(), 1);

    let candidate = &outcome.candidates[0];
    assert_eq!(candidate.feature.identifier(), "node/7");
    assert_eq!(candidate.display_name.as_deref(), Some("Central Library"));
    assert!(candidate.name_match);
    assert!(candidate.distance > 0.0 && candidate.distance < 100.0);
    assert!(candidate.presets.iter().any(|p| p.name == "Library"));
}

#[tokio::test]
async fn test_empty_vocabulary_issues_no_queries() {
    let spatial = MemorySpatial {
        features: vec![point_feature(7, 51.5005, -0.1, &[("amenity", "library")])],
        ..Default::default()
    };
    // The declared type contributes no tag rules.
    let (matcher, spatial) = matcher(spatial, vec![type_item(1000, "not a tag")]);
    let item = item_at(1, "Somewhere", 1000, &[HERE]);

    let outcome = matcher.find_candidates(&item).await.unwrap();
    assert!(outcome.candidates.is_empty());
    assert!(spatial.queried_kinds().is_empty());
}

#[tokio::test]
async fn test_street_retry_drops_name_filter() {
    let spatial = MemorySpatial {
        // An unnamed residential road 500 m out: invisible to the
        // name-filtered first pass, found by the retry.
        features: vec![line_feature(42, 51.5045, &[("highway", "residential")])],
        ..Default::default()
    };
    let (matcher, spatial) = matcher(spatial, vec![type_item(79007, "Key:highway")]);
    let item = item_at(1, "Foo Lane", 79007, &[HERE]);

    let outcome = matcher.find_candidates(&item).await.unwrap();
    assert_eq!(outcome.candidates.len(), 1);
    assert_eq!(outcome.candidates[0].feature.identifier(), "way/42");

    let kinds = spatial.queried_kinds();
    // Streets never query points, and the line collection is hit twice.
    assert!(!kinds.contains(&GeometryKind::Point));
    assert_eq!(
        kinds.iter().filter(|k| **k == GeometryKind::Line).count(),
        2
    );
}

#[tokio::test]
async fn test_point_like_items_never_retry() {
    let spatial = MemorySpatial::default();
    let (matcher, spatial) = matcher(spatial, vec![type_item(1000, "Tag:amenity=library")]);
    let item = item_at(1, "Central Library", 1000, &[HERE]);

    let outcome = matcher.find_candidates(&item).await.unwrap();
    assert!(outcome.candidates.is_empty());
    // One pass over the three collections, nothing more.
    assert_eq!(spatial.queried_kinds().len(), 3);
}

#[tokio::test]
async fn test_failing_kind_yields_partial_result() {
    let spatial = MemorySpatial {
        features: vec![point_feature(
            7,
            51.5005,
            -0.1,
            &[("amenity", "library"), ("name", "Central Library")],
        )],
        failures: vec![(GeometryKind::Line, FailMode::Backend)],
        ..Default::default()
    };
    let (matcher, _) = matcher(spatial, vec![type_item(1000, "Tag:amenity=library")]);
    let item = item_at(1, "Central Library", 1000, &[HERE]);

    let outcome = matcher.find_candidates(&item).await.unwrap();
    assert_eq!(outcome.candidates.len(), 1);
    assert_eq!(outcome.failed_kinds, vec![GeometryKind::Line]);
}

#[tokio::test]
async fn test_unavailable_store_is_fatal() {
    let spatial = MemorySpatial {
        failures: vec![(GeometryKind::Point, FailMode::Unavailable)],
        ..Default::default()
    };
    let (matcher, _) = matcher(spatial, vec![type_item(1000, "Tag:amenity=library")]);
    let item = item_at(1, "Central Library", 1000, &[HERE]);

    let err = matcher.find_candidates(&item).await.unwrap_err();
    assert!(matches!(
        err,
        MatchError::Spatial(SpatialError::Unavailable(_))
    ));
}

#[tokio::test]
async fn test_distance_is_minimum_across_locations() {
    let far = Coordinate {
        latitude: 51.503,
        longitude: -0.1,
    };
    let spatial = MemorySpatial {
        features: vec![point_feature(
            7,
            51.503,
            -0.1,
            &[("amenity", "library"), ("name", "Central Library")],
        )],
        ..Default::default()
    };
    let (matcher, _) = matcher(spatial, vec![type_item(1000, "Tag:amenity=library")]);
    // Two locations: the feature sits on the second one.
    let item = item_at(1, "Central Library", 1000, &[HERE, far]);

    let outcome = matcher.find_candidates(&item).await.unwrap();
    assert_eq!(outcome.candidates.len(), 1);
    assert!(outcome.candidates[0].distance < 1.0);
}

#[tokio::test]
async fn test_sundial_preset_override() {
    let spatial = MemorySpatial {
        features: vec![point_feature(
            7,
            51.5005,
            -0.1,
            &[
                ("amenity", "clock"),
                ("display", "sundial"),
                ("name", "Old Sundial"),
            ],
        )],
        ..Default::default()
    };
    let (matcher, _) = matcher(spatial, vec![type_item(1500, "Tag:amenity=clock")]);
    let item = item_at(1, "Old Sundial", 1500, &[HERE]);

    let outcome = matcher.find_candidates(&item).await.unwrap();
    assert_eq!(outcome.candidates.len(), 1);
    let presets = &outcome.candidates[0].presets;
    assert!(presets.iter().any(|p| p.name == "Sundial"));
    assert!(!presets.iter().any(|p| p.name == "Clock"));
}

#[tokio::test]
async fn test_geocoder_failure_degrades_to_default_context() {
    let spatial = MemorySpatial {
        features: vec![point_feature(
            7,
            51.5005,
            -0.1,
            &[
                ("amenity", "library"),
                ("addr:housenumber", "12"),
                ("addr:street", "High Street"),
            ],
        )],
        ..Default::default()
    };
    let matcher = Matcher::new(
        MemoryStore::with_items(vec![type_item(1000, "Tag:amenity=library")]),
        Arc::new(spatial),
        Arc::new(SchemaPresets),
        Arc::new(FailingGeocoder),
    );
    let item = item_at(1, "Central Library", 1000, &[HERE]);

    // Country lookup only steers address ordering and preset locale;
    // losing it must not lose the candidates.
    let outcome = matcher.find_candidates(&item).await.unwrap();
    assert_eq!(outcome.candidates.len(), 1);
    // Default ordering is street-first.
    assert_eq!(
        outcome.candidates[0].display_name.as_deref(),
        Some("High Street 12")
    );
}

#[tokio::test]
async fn test_cap_keeps_the_nearest_candidates() {
    // More in-range matches than the point-like cap of 40; the nearest
    // row arrives last from the store.
    let mut features: Vec<SpatialFeature> = (1..=40)
        .map(|i| {
            point_feature(
                i,
                51.5072,
                -0.1 + 0.0001 * i as f64,
                &[("amenity", "library")],
            )
        })
        .collect();
    features.push(point_feature(999, 51.50045, -0.1, &[("amenity", "library")]));

    let spatial = MemorySpatial {
        features,
        ..Default::default()
    };
    let (matcher, _) = matcher(spatial, vec![type_item(1000, "Tag:amenity=library")]);
    let item = item_at(1, "Central Library", 1000, &[HERE]);

    let outcome = matcher.find_candidates(&item).await.unwrap();
    assert_eq!(outcome.candidates.len(), 40);
    assert_eq!(outcome.candidates[0].feature.identifier(), "node/999");
    assert!(outcome.candidates[0].distance < 100.0);
}

#[tokio::test]
async fn test_building_address_nodes_are_collected() {
    use geo_types::polygon;

    let building = SpatialFeature {
        kind: GeometryKind::Polygon,
        src_id: 42,
        tags: [
            ("building".to_owned(), "yes".to_owned()),
            ("amenity".to_owned(), "library".to_owned()),
            ("name".to_owned(), "Central Library".to_owned()),
        ]
        .into_iter()
        .collect(),
        geometry: Geometry::Polygon(polygon![
            (x: -0.101, y: 51.4995),
            (x: -0.099, y: 51.4995),
            (x: -0.099, y: 51.5005),
            (x: -0.101, y: 51.5005),
        ]),
    };
    let spatial = MemorySpatial {
        features: vec![
            building,
            point_feature(
                9,
                51.5,
                -0.1,
                &[
                    ("addr:housenumber", "12"),
                    ("addr:street", "High Street"),
                    ("name", "Copy Shop"),
                ],
            ),
        ],
        ..Default::default()
    };
    let (matcher, _) = matcher(spatial, vec![type_item(1000, "Tag:amenity=library")]);
    let item = item_at(1, "Central Library", 1000, &[HERE]);

    let outcome = matcher.find_candidates(&item).await.unwrap();
    let candidate = outcome
        .candidates
        .iter()
        .find(|c| c.feature.identifier() == "way/42")
        .unwrap();

    // GB is number-first.
    assert_eq!(candidate.addresses, vec!["Copy Shop (12 High Street)"]);
    assert!(candidate.area.is_some());
}
