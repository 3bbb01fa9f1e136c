//! Knowledge-graph items: identity, labels, claims, and locations.
//!
//! Item identity is immutable once created; `last_revision` strictly
//! increases on update and stale upserts are rejected by the entity
//! store. Locations are extracted from coordinate statements at ingest
//! time and carried on the item, ordered by source property and
//! statement order.

use crate::statement::{Statement, StatementValue};
use rustc_hash::FxHashSet;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

/// Numeric item identifier. Displayed with the stable external key form
/// `Q{n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ItemId(pub u64);

/// Numeric property identifier, displayed as `P{n}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyId(pub u32);

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.0)
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

impl Default for ItemId {
    fn default() -> Self {
        ItemId(0)
    }
}

impl ItemId {
    /// Parse the external key form `Q{n}`.
    pub fn parse(key: &str) -> Option<Self> {
        let digits = key.strip_prefix('Q').or_else(|| key.strip_prefix('q'))?;
        digits.parse().ok().map(ItemId)
    }
}

impl PropertyId {
    /// Parse the external key form `P{n}`.
    pub fn parse(key: &str) -> Option<Self> {
        let digits = key.strip_prefix('P').or_else(|| key.strip_prefix('p'))?;
        digits.parse().ok().map(PropertyId)
    }
}

// Ids serialize in their external key form ("Q42" / "P31") so claim maps
// round-trip as ordinary JSON objects.

impl Serialize for ItemId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ItemId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ItemId::parse(&s).ok_or_else(|| D::Error::custom(format!("invalid item id: {s:?}")))
    }
}

impl Serialize for PropertyId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PropertyId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        PropertyId::parse(&s).ok_or_else(|| D::Error::custom(format!("invalid property id: {s:?}")))
    }
}

/// Well-known property ids consumed by the matcher.
pub mod props {
    use super::PropertyId;

    /// instance of
    pub const INSTANCE_OF: PropertyId = PropertyId(31);
    /// subclass of
    pub const SUBCLASS_OF: PropertyId = PropertyId(279);
    /// religion
    pub const RELIGION: PropertyId = PropertyId(140);
    /// headquarters location
    pub const HEADQUARTERS: PropertyId = PropertyId(159);
    /// part of
    pub const PART_OF: PropertyId = PropertyId(361);
    /// use
    pub const USE: PropertyId = PropertyId(366);
    /// applies to part
    pub const APPLIES_TO_PART: PropertyId = PropertyId(518);
    /// coordinate location
    pub const COORDINATES: PropertyId = PropertyId(625);
    /// sport
    pub const SPORT: PropertyId = PropertyId(641);
    /// facet of
    pub const FACET_OF: PropertyId = PropertyId(1269);
    /// OSM tag or key equivalence
    pub const OSM_TAG: PropertyId = PropertyId(1282);
    /// official name
    pub const OFFICIAL_NAME: PropertyId = PropertyId(1448);
    /// native label
    pub const NATIVE_LABEL: PropertyId = PropertyId(1705);
    /// street address
    pub const STREET_ADDRESS: PropertyId = PropertyId(6375);
}

/// A WGS84 coordinate, degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// One resolved item location, tagged with the statement it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ItemLocation {
    /// Property the coordinate was read from (direct or via qualifier).
    pub property: PropertyId,
    /// Order of the statement within its property's claim list.
    pub statement_order: u32,
    pub coordinate: Coordinate,
}

/// A knowledge-graph item.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeItem {
    pub id: ItemId,
    /// Language tag -> label.
    #[serde(default)]
    pub labels: BTreeMap<String, String>,
    /// Language tag -> description.
    #[serde(default)]
    pub descriptions: BTreeMap<String, String>,
    /// Language tag -> alias list.
    #[serde(default)]
    pub aliases: BTreeMap<String, Vec<String>>,
    /// Property -> ordered statements.
    #[serde(default)]
    pub claims: BTreeMap<PropertyId, Vec<Statement>>,
    /// Resolved coordinate locations, ordered by source statement.
    #[serde(default)]
    pub locations: Vec<ItemLocation>,
    /// Strictly increasing revision of the source entity.
    pub last_revision: u64,
}

impl KnowledgeItem {
    /// Preferred label: requested language, then English, then any.
    pub fn label(&self, lang: &str) -> Option<&str> {
        self.labels
            .get(lang)
            .or_else(|| self.labels.get("en"))
            .or_else(|| self.labels.values().next())
            .map(String::as_str)
    }

    /// Description with the same language fallback as [`Self::label`].
    pub fn description(&self, lang: &str) -> Option<&str> {
        self.descriptions
            .get(lang)
            .or_else(|| self.descriptions.get("en"))
            .map(String::as_str)
    }

    /// Statements for a property, empty if the property is absent.
    pub fn claim(&self, property: PropertyId) -> &[Statement] {
        self.claims.get(&property).map_or(&[], Vec::as_slice)
    }

    /// Item ids referenced by a property's statements. Statements without
    /// a usable entity value are skipped with a warning.
    pub fn entity_refs(&self, property: PropertyId) -> Vec<ItemId> {
        let mut refs = Vec::new();
        for st in self.claim(property) {
            match st.value.as_entity() {
                Some(id) => refs.push(id),
                None => {
                    tracing::warn!(item = %self.id, %property, "statement without entity value, skipping");
                }
            }
        }
        refs
    }

    /// Declared type ids: `instance of` targets plus any `applies to
    /// part` qualifier targets on those statements. Both contribute at
    /// the same level of the type walk.
    pub fn type_ids(&self) -> Vec<ItemId> {
        let mut ids = Vec::new();
        let mut seen = FxHashSet::default();
        for st in self.claim(props::INSTANCE_OF) {
            if let Some(id) = st.value.as_entity() {
                if seen.insert(id) {
                    ids.push(id);
                }
            }
            for q in st.qualifier(props::APPLIES_TO_PART) {
                if let Some(id) = q.as_entity() {
                    if seen.insert(id) {
                        ids.push(id);
                    }
                }
            }
        }
        ids
    }

    /// True if any declared type is in `types`.
    pub fn is_instance_of_any(&self, types: &FxHashSet<ItemId>) -> bool {
        self.type_ids().iter().any(|id| types.contains(id))
    }

    /// Extract locations from claims: direct coordinate statements on the
    /// Earth globe, plus coordinate qualifiers on headquarters
    /// statements. Preserves statement order.
    pub fn locations_from_claims(claims: &BTreeMap<PropertyId, Vec<Statement>>) -> Vec<ItemLocation> {
        let mut locations = Vec::new();

        for (order, st) in claims
            .get(&props::COORDINATES)
            .map_or(&[][..], Vec::as_slice)
            .iter()
            .enumerate()
        {
            if let Some(coordinate) = st.value.as_earth_coordinate() {
                locations.push(ItemLocation {
                    property: props::COORDINATES,
                    statement_order: order as u32,
                    coordinate,
                });
            }
        }

        let mut order = 0;
        for st in claims.get(&props::HEADQUARTERS).map_or(&[][..], Vec::as_slice) {
            for q in st.qualifier(props::COORDINATES) {
                if let Some(coordinate) = q.as_earth_coordinate() {
                    locations.push(ItemLocation {
                        property: props::HEADQUARTERS,
                        statement_order: order,
                        coordinate,
                    });
                    order += 1;
                }
            }
        }

        locations
    }

    /// All names this item is known by: labels in every language, aliases
    /// (skipping languages with more than three, which tend to be noise),
    /// and name-bearing statements (official name, native label, street
    /// address).
    pub fn known_names(&self) -> FxHashSet<String> {
        let mut names: FxHashSet<String> = self.labels.values().cloned().collect();

        for alias_list in self.aliases.values() {
            if alias_list.len() > 3 {
                continue;
            }
            names.extend(alias_list.iter().cloned());
        }

        for property in [
            props::OFFICIAL_NAME,
            props::NATIVE_LABEL,
            props::STREET_ADDRESS,
        ] {
            for st in self.claim(property) {
                if let Some(text) = st.value.as_text() {
                    names.insert(text.to_owned());
                }
            }
        }

        names
    }
}
