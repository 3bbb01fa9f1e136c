//! Shared data model and collaborator contracts for the conflate matcher.
//!
//! This crate defines the types that flow between the resolution layers:
//!
//! - [`item`]: knowledge-graph items, their statements, and locations
//! - [`statement`]: typed statement values and qualifiers
//! - [`tag_rule`]: tag predicates derived from an item's type closure
//! - [`feature`]: spatial features (point/line/polygon rows with tag maps)
//! - [`store`]: async traits for the external collaborators (entity
//!   fetch, preset lookup, reverse geocoding, changeset upload)
//!
//! Higher layers (`conflate-vocab`, `conflate-spatial`, `conflate-match`)
//! depend on these abstractions, not on any concrete backend.

pub mod error;
pub mod feature;
pub mod item;
pub mod statement;
pub mod store;
pub mod tag_rule;

pub use error::{CoreError, Result};
pub use feature::{ElementType, GeometryKind, SpatialFeature};
pub use item::{Coordinate, ItemId, ItemLocation, KnowledgeItem, PropertyId};
pub use statement::{Statement, StatementValue};
pub use store::{EntityStore, Fetched, Preset, PresetLookup, ReverseGeocoder};
pub use tag_rule::TagRule;
