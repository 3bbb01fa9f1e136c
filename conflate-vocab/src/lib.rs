//! Tag-vocabulary resolution for knowledge items.
//!
//! Walks an item's declared types through the knowledge graph's type
//! relations (subclass-of, religion, sport, use, facet-of) and collects
//! the OSM tag vocabulary the item's real-world counterpart is likely to
//! carry, each rule annotated with the evidence path that produced it.
//!
//! # Modules
//!
//! - [`overrides`]: curated reference tables (skip set, stop set, extra
//!   keys, generic-tag blocklist), injected into the resolver
//! - [`resolver`]: the worklist type walk producing a [`TypeVocabulary`]
//! - [`filter`]: one-level subclass-closure filtering and bulk type
//!   counting over item sets

pub mod error;
pub mod filter;
pub mod overrides;
pub mod resolver;

pub use error::{Result, VocabError};
pub use filter::{filter_by_types, isa_counts, TypeCount};
pub use overrides::Overrides;
pub use resolver::{TypePath, TypeStep, TypeVocabulary, VocabularyResolver};
