//! Tag rules: predicates over a spatial feature's key/value tags.
//!
//! Rules come from an item's type closure in the string forms `Key:x`
//! (require the key, with any value other than `no`) and `Tag:x=y`
//! (require the exact pair). Rule lists are combined with logical OR;
//! their order is irrelevant.
//!
//! # Lifecycle prefixes
//!
//! Mapped features are often retagged with a lifecycle prefix when they
//! close or fall into disuse (`disused:amenity=pub`). Expansion adds a
//! prefixed variant of every rule so such features still match. Expansion
//! is suppressed for large rule sets to bound query fan-out.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Lifecycle prefixes recognised during rule expansion.
pub const LIFECYCLE_PREFIXES: [&str; 7] = [
    "disused",
    "was",
    "abandoned",
    "demolished",
    "destroyed",
    "ruins",
    "historic",
];

/// Rule-set size at or above which lifecycle expansion is suppressed.
pub const EXPANSION_CUTOFF: usize = 10;

/// A predicate over a feature's tags.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TagRule {
    /// The key must be present with a value other than `no`.
    RequireKey(String),
    /// The key must be present with exactly this value.
    RequireKeyValue(String, String),
}

impl TagRule {
    /// Parse the `Key:x` / `Tag:x=y` string forms. Returns `None` for
    /// anything else.
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(key) = s.strip_prefix("Key:") {
            return Some(TagRule::RequireKey(key.to_owned()));
        }
        let tag = s.strip_prefix("Tag:")?;
        let (key, value) = tag.split_once('=')?;
        Some(TagRule::RequireKeyValue(key.to_owned(), value.to_owned()))
    }

    /// The tag key this rule tests.
    pub fn key(&self) -> &str {
        match self {
            TagRule::RequireKey(k) => k,
            TagRule::RequireKeyValue(k, _) => k,
        }
    }

    /// The same rule behind a lifecycle prefix.
    pub fn with_prefix(&self, prefix: &str) -> Self {
        match self {
            TagRule::RequireKey(k) => TagRule::RequireKey(format!("{prefix}:{k}")),
            TagRule::RequireKeyValue(k, v) => {
                TagRule::RequireKeyValue(format!("{prefix}:{k}"), v.clone())
            }
        }
    }

    /// Test the rule against a feature's tag map.
    pub fn matches(&self, tags: &BTreeMap<String, String>) -> bool {
        match self {
            TagRule::RequireKey(k) => tags.get(k).is_some_and(|v| v != "no"),
            TagRule::RequireKeyValue(k, v) => tags.get(k) == Some(v),
        }
    }
}

impl fmt::Display for TagRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagRule::RequireKey(k) => write!(f, "Key:{k}"),
            TagRule::RequireKeyValue(k, v) => write!(f, "Tag:{k}={v}"),
        }
    }
}

/// Expand a rule set with lifecycle-prefix variants.
///
/// Each base rule is kept and, when the base set is smaller than
/// [`EXPANSION_CUTOFF`], joined by one variant per prefix. At or above
/// the cutoff the base set is returned unchanged.
pub fn expand_rules(rules: &[TagRule]) -> Vec<TagRule> {
    let mut expanded: Vec<TagRule> = rules.to_vec();
    if rules.len() >= EXPANSION_CUTOFF {
        return expanded;
    }

    for rule in rules {
        for prefix in LIFECYCLE_PREFIXES {
            expanded.push(rule.with_prefix(prefix));
        }
    }

    expanded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display_roundtrip() {
        for s in ["Key:amenity", "Tag:amenity=library"] {
            assert_eq!(TagRule::parse(s).unwrap().to_string(), s);
        }
        assert!(TagRule::parse("amenity=library").is_none());
        assert!(TagRule::parse("Tag:amenity").is_none());
    }

    #[test]
    fn test_matches_excludes_no_value() {
        let tags = BTreeMap::from([("building".to_owned(), "no".to_owned())]);
        assert!(!TagRule::RequireKey("building".to_owned()).matches(&tags));

        let tags = BTreeMap::from([("building".to_owned(), "yes".to_owned())]);
        assert!(TagRule::RequireKey("building".to_owned()).matches(&tags));
    }

    #[test]
    fn test_expansion_adds_every_prefix() {
        let rules = vec![TagRule::parse("Tag:amenity=pub").unwrap()];
        let expanded = expand_rules(&rules);

        assert_eq!(expanded.len(), 1 + LIFECYCLE_PREFIXES.len());
        assert!(expanded.contains(&TagRule::parse("Tag:disused:amenity=pub").unwrap()));
        assert!(expanded.contains(&TagRule::parse("Tag:historic:amenity=pub").unwrap()));
    }

    #[test]
    fn test_expansion_suppressed_at_cutoff() {
        let rules: Vec<TagRule> = (0..EXPANSION_CUTOFF)
            .map(|i| TagRule::RequireKey(format!("key{i}")))
            .collect();

        let expanded = expand_rules(&rules);
        assert_eq!(expanded.len(), rules.len());

        let below: Vec<TagRule> = rules[..EXPANSION_CUTOFF - 1].to_vec();
        let expanded = expand_rules(&below);
        assert_eq!(
            expanded.len(),
            below.len() * (1 + LIFECYCLE_PREFIXES.len())
        );
    }
}
