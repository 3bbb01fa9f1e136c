//! Candidate enrichment: display name, addresses, containment, presets.
//!
//! Enrichment is read-only and per-call: nothing here mutates the item
//! or the feature store. Spatial side-queries (address nodes, covering
//! polygons) are best-effort; only a hard store outage aborts.

use crate::context::ResolutionContext;
use crate::error::Result;
use crate::names::matches_known_name;
use conflate_core::feature::{GeometryKind, SpatialFeature};
use conflate_core::item::KnowledgeItem;
use conflate_core::store::{Preset, PresetLookup};
use conflate_core::tag_rule::TagRule;
use conflate_spatial::query::TagPredicate;
use conflate_spatial::{CandidateGroup, Envelope, FeatureFilter, SpatialError, SpatialStore};
use std::collections::BTreeMap;

/// Display-name tag keys, in priority order.
pub const DISPLAY_NAME_KEYS: [&str; 6] = [
    "bridge:name",
    "tunnel:name",
    "lock_name",
    "name",
    "addr:housename",
    "inscription",
];

/// Bookkeeping tags carried by the store but meaningless to users.
const BOOKKEEPING_TAGS: [&str; 1] = ["way_area"];

/// A fully enriched candidate, ready to present.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub feature: SpatialFeature,
    /// Minimum distance from the item's locations, metres.
    pub distance: f64,
    pub display_name: Option<String>,
    /// True when the display name case-folds to one of the item's known
    /// names.
    pub name_match: bool,
    /// Addresses of nodes inside the candidate (buildings only).
    pub addresses: Vec<String>,
    /// Names of covering landuse/amenity polygons.
    pub part_of: Vec<String>,
    pub presets: Vec<Preset>,
    /// Geodesic area, polygons only.
    pub area: Option<f64>,
}

/// Enriches candidate groups against the stores, scoped to one
/// resolution call.
pub struct Enricher<'a> {
    store: &'a dyn SpatialStore,
    presets: &'a dyn PresetLookup,
    context: &'a ResolutionContext,
    envelopes: &'a [Envelope],
}

impl<'a> Enricher<'a> {
    pub fn new(
        store: &'a dyn SpatialStore,
        presets: &'a dyn PresetLookup,
        context: &'a ResolutionContext,
        envelopes: &'a [Envelope],
    ) -> Self {
        Enricher {
            store,
            presets,
            context,
            envelopes,
        }
    }

    /// Enrich one candidate group.
    pub async fn enrich(&self, group: CandidateGroup, item: &KnowledgeItem) -> Result<Candidate> {
        let mut feature = group.feature;
        for tag in BOOKKEEPING_TAGS {
            feature.tags.remove(tag);
        }

        let display_name = self.display_name(&feature);
        let name_match = display_name
            .as_deref()
            .is_some_and(|name| matches_known_name(name, item));

        let addresses = if feature.kind == GeometryKind::Polygon
            && feature.tags.contains_key("building")
        {
            self.contained_addresses(&feature).await?
        } else {
            Vec::new()
        };

        let part_of = self.covering_polygon_names(&feature).await?;
        let presets = self.classify_tags(&feature).await?;

        Ok(Candidate {
            distance: group.distance,
            area: group.area,
            feature,
            display_name,
            name_match,
            addresses,
            part_of,
            presets,
        })
    }

    /// Display name from the priority keys, falling back to a
    /// synthesized address for addressable features.
    fn display_name(&self, feature: &SpatialFeature) -> Option<String> {
        for key in DISPLAY_NAME_KEYS {
            if let Some(value) = feature.tag(key) {
                return Some(value.to_owned());
            }
        }
        if feature.has_street_address() {
            return address_from_tags(&feature.tags, self.context.number_first());
        }
        None
    }

    /// Addresses of point features inside a building polygon, each
    /// labelled with the node's own name when it has one.
    async fn contained_addresses(&self, building: &SpatialFeature) -> Result<Vec<String>> {
        let filter = FeatureFilter {
            envelopes: self.envelopes.to_vec(),
            tag_all: vec![
                TagPredicate::HasKey("addr:housenumber".to_owned()),
                TagPredicate::HasKey("addr:street".to_owned()),
            ],
            within: Some(building.geometry.clone()),
            ..Default::default()
        };

        let nodes = self.side_query(GeometryKind::Point, &filter).await?;
        let mut addresses = Vec::with_capacity(nodes.len());
        for node in nodes {
            let Some(address) = address_from_tags(&node.tags, self.context.number_first()) else {
                continue;
            };
            addresses.push(match node.tag("name") {
                Some(name) => format!("{name} ({address})"),
                None => address,
            });
        }
        Ok(addresses)
    }

    /// Names of named landuse/amenity polygons covering the candidate.
    /// Containment context, not candidates themselves.
    async fn covering_polygon_names(&self, feature: &SpatialFeature) -> Result<Vec<String>> {
        let filter = FeatureFilter {
            envelopes: self.envelopes.to_vec(),
            tag_all: vec![
                TagPredicate::HasKey("name".to_owned()),
                TagPredicate::AnyOf(vec![
                    TagPredicate::HasKey("landuse".to_owned()),
                    TagPredicate::HasKey("amenity".to_owned()),
                ]),
            ],
            covers: Some(feature.geometry.clone()),
            ..Default::default()
        };

        let own_name = feature.tag("name");
        let mut names = Vec::new();
        for polygon in self.side_query(GeometryKind::Polygon, &filter).await? {
            if polygon.kind == feature.kind && polygon.src_id == feature.src_id {
                continue;
            }
            let Some(name) = polygon.tag("name") else {
                continue;
            };
            if Some(name) == own_name || names.iter().any(|n| n == name) {
                continue;
            }
            names.push(name.to_owned());
        }
        Ok(names)
    }

    /// Classify each tag pair through the preset schema. A clock
    /// displayed as a sundial is always labelled "Sundial", whatever the
    /// schema says.
    async fn classify_tags(&self, feature: &SpatialFeature) -> Result<Vec<Preset>> {
        let mut found = Vec::new();
        for (key, value) in &feature.tags {
            if key == "amenity" && value == "clock" && feature.tag("display") == Some("sundial") {
                found.push(Preset {
                    rule: TagRule::RequireKeyValue(key.clone(), value.clone()),
                    schema_path: "amenity/clock".to_owned(),
                    name: "Sundial".to_owned(),
                });
                continue;
            }

            if let Some(preset) = self
                .presets
                .classify(key, value, feature.kind, self.context.preset_locale())
                .await?
            {
                found.push(preset);
            }
        }
        Ok(found)
    }

    /// Enrichment query: timeouts and backend failures degrade to an
    /// empty result, a store outage propagates.
    async fn side_query(
        &self,
        kind: GeometryKind,
        filter: &FeatureFilter,
    ) -> Result<Vec<SpatialFeature>> {
        match self.store.query(kind, filter).await {
            Ok(rows) => Ok(rows),
            Err(e @ SpatialError::Unavailable(_)) => Err(e.into()),
            Err(e) => {
                tracing::warn!(%kind, error = %e, "enrichment query failed");
                Ok(Vec::new())
            }
        }
    }
}

/// Synthesize an address from `addr:housenumber` and `addr:street`,
/// ordered by local convention.
pub fn address_from_tags(tags: &BTreeMap<String, String>, number_first: bool) -> Option<String> {
    let number = tags.get("addr:housenumber")?;
    let street = tags.get("addr:street")?;
    Some(if number_first {
        format!("{number} {street}")
    } else {
        format!("{street} {number}")
    })
}
