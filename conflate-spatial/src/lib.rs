//! Spatial querying for the conflate matcher.
//!
//! Builds per-geometry-kind query specifications from a tag vocabulary
//! and item locations, and turns raw store rows into deduplicated,
//! distance-ordered candidate groups.
//!
//! ```text
//! locations ──► Envelope per location (geodesic, cardinal projection)
//!                      │
//! vocabulary ──► FeatureFilter per geometry kind (tag OR-set + layers)
//!                      │
//!                SpatialStore::query  (one call per kind)
//!                      │
//!                group_rows  (by source id, min distance, area cap)
//!                      │
//!                merge_groups  (across locations, min distance)
//! ```
//!
//! # Modules
//!
//! - [`envelope`]: geodesic bounding envelopes around item locations
//! - [`distance`]: great-circle point-to-geometry distance
//! - [`query`]: tag predicates, feature filters, and the store trait
//! - [`group`]: grouping, area capping, and distance merging

pub mod distance;
pub mod envelope;
pub mod error;
pub mod group;
pub mod query;

pub use envelope::Envelope;
pub use error::{Result, SpatialError};
pub use group::{group_rows, merge_groups, CandidateGroup};
pub use query::{FeatureFilter, QueryPlan, SpatialStore, TagPredicate};
