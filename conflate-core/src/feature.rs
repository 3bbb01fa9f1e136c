//! Spatial features: tagged geometries from the feature store.
//!
//! The store holds three homogeneous collections (points, lines,
//! polygons). Geometry kind is modelled as an enum rather than shared
//! base behavior: only polygons carry an area, only points are always
//! positively identified.

use geo_types::Geometry;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Which geometry collection a feature came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GeometryKind {
    Point,
    Line,
    Polygon,
}

impl GeometryKind {
    /// All kinds, in query order.
    pub const ALL: [GeometryKind; 3] =
        [GeometryKind::Point, GeometryKind::Line, GeometryKind::Polygon];

    /// The preset-schema geometry suffix for this kind.
    pub fn preset_suffix(&self) -> &'static str {
        match self {
            GeometryKind::Point => "point",
            GeometryKind::Line => "line",
            GeometryKind::Polygon => "area",
        }
    }
}

impl fmt::Display for GeometryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryKind::Point => write!(f, "point"),
            GeometryKind::Line => write!(f, "line"),
            GeometryKind::Polygon => write!(f, "polygon"),
        }
    }
}

/// Upstream element type of a feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementType {
    Node,
    Way,
    Relation,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementType::Node => write!(f, "node"),
            ElementType::Way => write!(f, "way"),
            ElementType::Relation => write!(f, "relation"),
        }
    }
}

/// One row from a geometry collection.
#[derive(Debug, Clone)]
pub struct SpatialFeature {
    pub kind: GeometryKind,
    /// Signed source identifier. For lines and polygons a negative id
    /// marks a relation; points are always nodes with positive ids.
    pub src_id: i64,
    /// Tag map, keys unique.
    pub tags: BTreeMap<String, String>,
    pub geometry: Geometry<f64>,
}

impl SpatialFeature {
    /// Element type inferred from kind and id sign.
    pub fn element_type(&self) -> ElementType {
        match self.kind {
            GeometryKind::Point => ElementType::Node,
            GeometryKind::Line | GeometryKind::Polygon => {
                if self.src_id > 0 {
                    ElementType::Way
                } else {
                    ElementType::Relation
                }
            }
        }
    }

    /// Unsigned display id.
    pub fn id(&self) -> u64 {
        self.src_id.unsigned_abs()
    }

    /// Display identifier, e.g. `way/42`.
    pub fn identifier(&self) -> String {
        format!("{}/{}", self.element_type(), self.id())
    }

    /// Tag value lookup.
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.tags.get(key).map(String::as_str)
    }

    /// True if the feature carries both a house number and a street.
    pub fn has_street_address(&self) -> bool {
        self.tags.contains_key("addr:housenumber") && self.tags.contains_key("addr:street")
    }
}
