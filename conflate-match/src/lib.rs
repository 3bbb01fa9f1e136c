//! Candidate resolution: match knowledge items to spatial features.
//!
//! Given an item with coordinate locations, the pipeline resolves its
//! tag vocabulary ([`conflate_vocab`]), classifies it (street,
//! watercourse, or point-like), queries the spatial store per geometry
//! kind ([`conflate_spatial`]), and returns deduplicated,
//! distance-ordered, enriched candidates.
//!
//! # Modules
//!
//! - [`classify`]: item classification and per-class search profiles
//! - [`names`]: street name-variant expansion and name matching
//! - [`context`]: per-call country, address-ordering, and locale facts
//! - [`enrich`]: display names, addresses, containment, presets
//! - [`pipeline`]: the [`Matcher`] entry point and retry orchestration

pub mod classify;
pub mod context;
pub mod enrich;
pub mod error;
pub mod names;
pub mod pipeline;

pub use classify::{classify, FeatureClass, SearchProfile};
pub use context::ResolutionContext;
pub use enrich::Candidate;
pub use error::{MatchError, Result};
pub use pipeline::{Matcher, SearchOutcome};
