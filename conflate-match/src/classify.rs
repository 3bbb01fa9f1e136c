//! Item classification and search profiles.
//!
//! A linear feature (street or watercourse) is searched very differently
//! from a point-like one: a wider radius, no result cap, points skipped,
//! a name filter instead of distance alone, and one retry with the name
//! filter dropped. Classification is a membership test against curated
//! type sets; everything else is point-like.

use conflate_core::item::{ItemId, KnowledgeItem};
use rustc_hash::FxHashSet;

/// Road and thoroughfare types.
pub const STREET_TYPES: [ItemId; 6] = [
    ItemId(12731),    // dead end street
    ItemId(34442),    // road
    ItemId(79007),    // street
    ItemId(83620),    // thoroughfare
    ItemId(21000333), // shopping street
    ItemId(62685721), // pedestrian street
];

/// River, stream, and canal types.
pub const WATERCOURSE_TYPES: [ItemId; 4] = [
    ItemId(4022),     // stream
    ItemId(12284),    // canal
    ItemId(355304),   // watercourse
    ItemId(55659167), // natural watercourse
];

/// How an item is searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureClass {
    Street,
    Watercourse,
    PointLike,
}

/// Classify an item by its declared types.
pub fn classify(item: &KnowledgeItem) -> FeatureClass {
    let streets: FxHashSet<ItemId> = STREET_TYPES.into_iter().collect();
    if item.is_instance_of_any(&streets) {
        return FeatureClass::Street;
    }
    let watercourses: FxHashSet<ItemId> = WATERCOURSE_TYPES.into_iter().collect();
    if item.is_instance_of_any(&watercourses) {
        return FeatureClass::Watercourse;
    }
    FeatureClass::PointLike
}

/// Search parameters for one class of item.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchProfile {
    pub class: FeatureClass,
    /// Envelope radius, metres.
    pub radius: f64,
    /// Candidate cap after merging. `None` = unbounded.
    pub limit: Option<usize>,
    /// Skip the point collection.
    pub exclude_points: bool,
    /// Retry once with the name filter dropped when the first pass is
    /// empty.
    pub retry_eligible: bool,
}

/// Retry radius for linear features, metres.
pub const RETRY_RADIUS: f64 = 1_000.0;

/// Retry candidate cap for linear features.
pub const RETRY_LIMIT: usize = 100;

impl SearchProfile {
    /// The profile for an item's class.
    pub fn for_class(class: FeatureClass) -> Self {
        match class {
            FeatureClass::Street => SearchProfile {
                class,
                radius: 5_000.0,
                limit: None,
                exclude_points: true,
                retry_eligible: true,
            },
            FeatureClass::Watercourse => SearchProfile {
                class,
                radius: 20_000.0,
                limit: None,
                exclude_points: true,
                retry_eligible: true,
            },
            FeatureClass::PointLike => SearchProfile {
                class,
                radius: 1_000.0,
                limit: Some(40),
                exclude_points: false,
                retry_eligible: false,
            },
        }
    }

    /// The fallback profile used when the first pass over a linear
    /// feature comes back empty: tighter radius, higher cap, no name
    /// filter.
    pub fn retry(&self) -> Self {
        SearchProfile {
            radius: RETRY_RADIUS,
            limit: Some(RETRY_LIMIT),
            ..*self
        }
    }
}
