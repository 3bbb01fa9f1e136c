//! Tag predicates, feature filters, and the spatial store contract.
//!
//! A query against the store is a [`FeatureFilter`]: the feature must
//! intersect at least one envelope, match at least one rule of the
//! vocabulary's expanded OR-set, and pass every additional predicate
//! layer (street name requirements, bus-stop and incidental-amenity
//! exclusions).

use crate::envelope::Envelope;
use crate::error::Result;
use async_trait::async_trait;
use conflate_core::feature::{GeometryKind, SpatialFeature};
use conflate_core::tag_rule::{expand_rules, TagRule};
use geo_types::Geometry;
use std::collections::BTreeMap;

/// Amenity values that cluster near any address and are excluded
/// whenever the vocabulary carries the generic amenity rule.
pub const INCIDENTAL_AMENITIES: [&str; 4] =
    ["bicycle_parking", "bicycle_repair_station", "atm", "recycling"];

/// A predicate over a feature's tag map.
#[derive(Debug, Clone, PartialEq)]
pub enum TagPredicate {
    /// Key present with a value other than `no`.
    HasKey(String),
    /// Key present with exactly this value.
    KeyEquals(String, String),
    /// Key absent, or present with a different value.
    KeyNotEquals(String, String),
    /// Key present with one of these values.
    KeyIn(String, Vec<String>),
    /// At least one inner predicate holds.
    AnyOf(Vec<TagPredicate>),
}

impl TagPredicate {
    pub fn matches(&self, tags: &BTreeMap<String, String>) -> bool {
        match self {
            TagPredicate::HasKey(k) => tags.get(k).is_some_and(|v| v != "no"),
            TagPredicate::KeyEquals(k, v) => tags.get(k) == Some(v),
            TagPredicate::KeyNotEquals(k, v) => tags.get(k) != Some(v),
            TagPredicate::KeyIn(k, values) => {
                tags.get(k).is_some_and(|v| values.iter().any(|w| w == v))
            }
            TagPredicate::AnyOf(inner) => inner.iter().any(|p| p.matches(tags)),
        }
    }

    /// The predicate form of a tag rule.
    pub fn from_rule(rule: &TagRule) -> Self {
        match rule {
            TagRule::RequireKey(k) => TagPredicate::HasKey(k.clone()),
            TagRule::RequireKeyValue(k, v) => TagPredicate::KeyEquals(k.clone(), v.clone()),
        }
    }
}

/// One store query: envelope intersection plus tag predicates.
#[derive(Debug, Clone, Default)]
pub struct FeatureFilter {
    /// The feature must intersect at least one of these.
    pub envelopes: Vec<Envelope>,
    /// At least one must match (the expanded vocabulary rules). Empty
    /// means no tag constraint.
    pub tag_any: Vec<TagPredicate>,
    /// All must match (additional layers).
    pub tag_all: Vec<TagPredicate>,
    /// The feature's geometry must cover this geometry.
    pub covers: Option<Geometry<f64>>,
    /// The feature's geometry must lie within this geometry.
    pub within: Option<Geometry<f64>>,
    /// Store-side area cap in square metres (polygons).
    pub max_area: Option<f64>,
}

impl FeatureFilter {
    /// Evaluate the tag part of the filter. In-memory stores and tests
    /// use this directly; SQL-backed stores compile the predicates
    /// instead.
    pub fn matches_tags(&self, tags: &BTreeMap<String, String>) -> bool {
        let any_ok = self.tag_any.is_empty() || self.tag_any.iter().any(|p| p.matches(tags));
        any_ok && self.tag_all.iter().all(|p| p.matches(tags))
    }
}

/// The spatial feature store: three homogeneous geometry collections.
#[async_trait]
pub trait SpatialStore: Send + Sync {
    /// Query one collection, returning every matching row. Rows are not
    /// required to be ordered or deduplicated; grouping, distance
    /// ranking, and capping happen in the caller.
    async fn query(&self, kind: GeometryKind, filter: &FeatureFilter)
        -> Result<Vec<SpatialFeature>>;
}

/// Search parameters for one query plan.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    /// Envelope radius around each location, metres.
    pub radius: f64,
    /// Skip the point collection entirely (linear features).
    pub exclude_points: bool,
    /// Require a `name` tag (streets without explicit name variants).
    pub require_name: bool,
    /// Match `name` or `old_name` against these instead of requiring a
    /// bare `name` key.
    pub name_variants: Vec<String>,
    /// Exclude `highway=bus_stop` rows (streets).
    pub exclude_bus_stops: bool,
}

/// Per-geometry-kind filters for one search pass.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub filters: Vec<(GeometryKind, FeatureFilter)>,
    /// Geodesic area of the first location's envelope; the polygon
    /// grouping cap is 20x this.
    pub envelope_area: f64,
}

/// Area multiple above which a polygon group is considered an
/// administrative-scale match swallowing the search box.
pub const AREA_CAP_MULTIPLE: f64 = 20.0;

/// Build the per-kind query filters for a rule set and location list.
///
/// Returns `None` when there are no rules or no locations: no query
/// should be issued at all in that case.
pub fn build_queries(
    rules: &[TagRule],
    locations: &[conflate_core::item::Coordinate],
    params: &QueryParams,
) -> Option<QueryPlan> {
    if rules.is_empty() || locations.is_empty() {
        return None;
    }

    let envelopes: Vec<Envelope> = locations
        .iter()
        .map(|loc| Envelope::around(*loc, params.radius))
        .collect();
    let envelope_area = envelopes[0].area();

    let tag_any: Vec<TagPredicate> = expand_rules(rules)
        .iter()
        .map(TagPredicate::from_rule)
        .collect();

    let mut tag_all = Vec::new();
    if !params.name_variants.is_empty() {
        tag_all.push(TagPredicate::AnyOf(vec![
            TagPredicate::KeyIn("name".to_owned(), params.name_variants.clone()),
            TagPredicate::KeyIn("old_name".to_owned(), params.name_variants.clone()),
        ]));
    } else if params.require_name {
        tag_all.push(TagPredicate::HasKey("name".to_owned()));
    }
    if params.exclude_bus_stops {
        tag_all.push(TagPredicate::KeyNotEquals(
            "highway".to_owned(),
            "bus_stop".to_owned(),
        ));
    }
    if rules
        .iter()
        .any(|r| matches!(r, TagRule::RequireKey(k) if k == "amenity"))
    {
        for value in INCIDENTAL_AMENITIES {
            tag_all.push(TagPredicate::KeyNotEquals(
                "amenity".to_owned(),
                value.to_owned(),
            ));
        }
    }

    let mut filters = Vec::new();
    for kind in GeometryKind::ALL {
        if kind == GeometryKind::Point && params.exclude_points {
            continue;
        }
        filters.push((
            kind,
            FeatureFilter {
                envelopes: envelopes.clone(),
                tag_any: tag_any.clone(),
                tag_all: tag_all.clone(),
                covers: None,
                within: None,
                max_area: (kind == GeometryKind::Polygon)
                    .then_some(AREA_CAP_MULTIPLE * envelope_area),
            },
        ));
    }

    Some(QueryPlan {
        filters,
        envelope_area,
    })
}
