//! Typed statement values and qualifiers.
//!
//! A statement is a (property, value, qualifiers) triple on a knowledge
//! item. Values are a tagged union over the shapes the matcher consumes;
//! anything else a source entity carries is represented as [`StatementValue::NoValue`]
//! and skipped by consumers with a logged warning rather than aborting a
//! walk.

use crate::item::{Coordinate, ItemId, PropertyId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// The globe entity id for Earth. Coordinates on any other globe are
/// ignored when extracting item locations.
pub const EARTH: ItemId = ItemId(2);

/// A single statement value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum StatementValue {
    /// Reference to another item.
    Entity(ItemId),
    /// Plain string value.
    Text(String),
    /// Language-tagged string value (official names, street addresses).
    Monolingual { text: String, language: String },
    /// Point in time, ISO 8601 as recorded by the source.
    Time(String),
    /// A coordinate, tagged with the globe it applies to.
    Coordinate {
        latitude: f64,
        longitude: f64,
        globe: Option<ItemId>,
    },
    /// Typed external identifier.
    ExternalId(String),
    /// The source recorded no usable value (novalue/somevalue snaks,
    /// missing datavalue). Consumers skip these.
    NoValue,
}

impl Default for StatementValue {
    fn default() -> Self {
        StatementValue::NoValue
    }
}

impl StatementValue {
    /// The referenced item id, if this is an entity reference.
    pub fn as_entity(&self) -> Option<ItemId> {
        match self {
            StatementValue::Entity(id) => Some(*id),
            _ => None,
        }
    }

    /// The text content, for plain and language-tagged strings.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            StatementValue::Text(s) => Some(s),
            StatementValue::Monolingual { text, .. } => Some(text),
            StatementValue::ExternalId(s) => Some(s),
            _ => None,
        }
    }

    /// The coordinate, if this is an Earth-globe coordinate value.
    pub fn as_earth_coordinate(&self) -> Option<Coordinate> {
        match self {
            StatementValue::Coordinate {
                latitude,
                longitude,
                globe,
            } if globe.is_none() || *globe == Some(EARTH) => Some(Coordinate {
                latitude: *latitude,
                longitude: *longitude,
            }),
            _ => None,
        }
    }
}

/// A statement: main value plus optional qualifiers.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Statement {
    pub value: StatementValue,
    /// Qualifier property -> ordered qualifier values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub qualifiers: BTreeMap<PropertyId, Vec<StatementValue>>,
}

impl Statement {
    /// Statement with a bare value and no qualifiers.
    pub fn of(value: StatementValue) -> Self {
        Statement {
            value,
            qualifiers: BTreeMap::new(),
        }
    }

    /// Statement referencing another item.
    pub fn entity(id: ItemId) -> Self {
        Statement::of(StatementValue::Entity(id))
    }

    /// Statement with a plain string value.
    pub fn text(s: impl Into<String>) -> Self {
        Statement::of(StatementValue::Text(s.into()))
    }

    /// Qualifier values for a property, empty if absent.
    pub fn qualifier(&self, property: PropertyId) -> &[StatementValue] {
        self.qualifiers.get(&property).map_or(&[], Vec::as_slice)
    }

    /// Attach a qualifier value (builder style, used by tests and
    /// ingestion).
    pub fn with_qualifier(mut self, property: PropertyId, value: StatementValue) -> Self {
        self.qualifiers.entry(property).or_default().push(value);
        self
    }
}
