//! Grouping raw store rows into candidate groups.
//!
//! A multi-part feature may come back as several rows with the same
//! source id. Rows are grouped by source identity, the group geometry is
//! the union of the member parts, and the group distance is the minimum
//! over all item locations and members. Polygon groups whose unioned
//! area exceeds the cap are dropped: an administrative boundary
//! swallowing the search box is never the feature we are looking for.

use crate::distance::min_distance;
use crate::query::AREA_CAP_MULTIPLE;
use conflate_core::feature::{GeometryKind, SpatialFeature};
use conflate_core::item::Coordinate;
use geo::GeodesicArea;
use geo_types::{Geometry, MultiLineString, MultiPolygon};
use rustc_hash::FxHashMap;

/// A deduplicated candidate: one source feature with its merged
/// geometry and minimum distance.
#[derive(Debug, Clone)]
pub struct CandidateGroup {
    pub feature: SpatialFeature,
    /// Minimum great-circle distance from any item location, metres.
    pub distance: f64,
    /// Geodesic area of the unioned geometry, polygons only.
    pub area: Option<f64>,
}

/// Group one collection's rows by source id.
///
/// `envelope_area` is the geodesic area of the first location's
/// envelope; polygon groups larger than [`AREA_CAP_MULTIPLE`] times it
/// are dropped. Lines and points are never area-capped.
pub fn group_rows(
    rows: Vec<SpatialFeature>,
    locations: &[Coordinate],
    envelope_area: f64,
) -> Vec<CandidateGroup> {
    let mut by_source: FxHashMap<i64, Vec<SpatialFeature>> = FxHashMap::default();
    for row in rows {
        by_source.entry(row.src_id).or_default().push(row);
    }

    let mut groups = Vec::with_capacity(by_source.len());
    for (_, mut members) in by_source {
        let kind = members[0].kind;
        let geometry = union_geometries(kind, &members);

        let distance = locations
            .iter()
            .map(|loc| min_distance(*loc, &geometry))
            .fold(f64::INFINITY, f64::min);

        let area = match kind {
            GeometryKind::Polygon => Some(geometry.geodesic_area_unsigned()),
            _ => None,
        };
        if let Some(area) = area {
            if area >= AREA_CAP_MULTIPLE * envelope_area {
                tracing::debug!(
                    source = %members[0].identifier(),
                    area,
                    "dropping oversized polygon group"
                );
                continue;
            }
        }

        let mut representative = members.swap_remove(0);
        representative.geometry = geometry;
        groups.push(CandidateGroup {
            feature: representative,
            distance,
            area,
        });
    }

    groups
}

/// Merge groups from several queries by source identity, keeping the
/// minimum distance per candidate, ordered ascending. The merge is a
/// reduce over a distance-keyed map: commutative and associative, so
/// concurrent query results can be combined in any order.
pub fn merge_groups(groups: Vec<CandidateGroup>, limit: Option<usize>) -> Vec<CandidateGroup> {
    let mut best: FxHashMap<String, CandidateGroup> = FxHashMap::default();
    for group in groups {
        let key = group.feature.identifier();
        match best.get_mut(&key) {
            Some(existing) if existing.distance <= group.distance => {}
            Some(existing) => *existing = group,
            None => {
                best.insert(key, group);
            }
        }
    }

    let mut merged: Vec<CandidateGroup> = best.into_values().collect();
    merged.sort_by(|a, b| {
        a.distance
            .partial_cmp(&b.distance)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| a.feature.identifier().cmp(&b.feature.identifier()))
    });
    if let Some(limit) = limit {
        merged.truncate(limit);
    }
    merged
}

/// Union the member geometries of one group.
///
/// Members of a group are disjoint parts of one source feature, so the
/// union is the multi-geometry of the collected parts.
fn union_geometries(kind: GeometryKind, members: &[SpatialFeature]) -> Geometry<f64> {
    if members.len() == 1 {
        return members[0].geometry.clone();
    }

    match kind {
        GeometryKind::Polygon => {
            let mut parts = Vec::new();
            for member in members {
                match &member.geometry {
                    Geometry::Polygon(p) => parts.push(p.clone()),
                    Geometry::MultiPolygon(mp) => parts.extend(mp.iter().cloned()),
                    other => {
                        tracing::warn!(
                            source = %member.identifier(),
                            "non-surface geometry in polygon group: {other:?}"
                        );
                    }
                }
            }
            Geometry::MultiPolygon(MultiPolygon(parts))
        }
        GeometryKind::Line => {
            let mut parts = Vec::new();
            for member in members {
                match &member.geometry {
                    Geometry::LineString(ls) => parts.push(ls.clone()),
                    Geometry::MultiLineString(mls) => parts.extend(mls.iter().cloned()),
                    other => {
                        tracing::warn!(
                            source = %member.identifier(),
                            "non-linear geometry in line group: {other:?}"
                        );
                    }
                }
            }
            Geometry::MultiLineString(MultiLineString(parts))
        }
        GeometryKind::Point => members[0].geometry.clone(),
    }
}
