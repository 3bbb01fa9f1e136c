//! Name variants and name matching.
//!
//! Street names in map data rarely match the knowledge graph's label
//! exactly: abbreviated "St", a "The" article, a disambiguating suffix
//! after a comma, several names joined with slashes. The variant set
//! widens the street name filter to cover these spellings.

use conflate_core::item::KnowledgeItem;
use std::collections::BTreeSet;

/// The name-variant set for a street item: label and aliases in every
/// language, expanded with common alternate spellings.
pub fn street_name_variants(item: &KnowledgeItem) -> Vec<String> {
    let mut names: BTreeSet<String> = item.labels.values().cloned().collect();
    for aliases in item.aliases.values() {
        names.extend(aliases.iter().cloned());
    }

    let mut expanded = names.clone();
    for name in &names {
        if let Some(rest) = name.strip_prefix("St ") {
            expanded.insert(format!("Saint {rest}"));
        }
        if let Some(rest) = name.strip_prefix("St. ") {
            expanded.insert(format!("Saint {rest}"));
        }
        if let Some((prefix, _)) = name.split_once(',') {
            let prefix = prefix.trim();
            if !prefix.is_empty() {
                expanded.insert(prefix.to_owned());
            }
        }
        if name.contains('/') {
            for part in name.split('/') {
                let part = part.trim();
                if !part.is_empty() {
                    expanded.insert(part.to_owned());
                }
            }
        }
    }

    let with_article: Vec<String> = expanded
        .iter()
        .filter(|n| !n.starts_with("The "))
        .map(|n| format!("The {n}"))
        .collect();
    expanded.extend(with_article);

    expanded.into_iter().collect()
}

/// The bare labels of an item, deduplicated. The watercourse name
/// filter.
pub fn bare_labels(item: &KnowledgeItem) -> Vec<String> {
    let labels: BTreeSet<String> = item.labels.values().cloned().collect();
    labels.into_iter().collect()
}

/// Case-folded comparison of a display name against the item's known
/// names.
pub fn matches_known_name(display_name: &str, item: &KnowledgeItem) -> bool {
    let folded = display_name.to_lowercase();
    item.known_names()
        .iter()
        .any(|name| name.to_lowercase() == folded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use conflate_core::item::ItemId;
    use std::collections::BTreeMap;

    fn item_named(label: &str) -> KnowledgeItem {
        KnowledgeItem {
            id: ItemId(1),
            labels: BTreeMap::from([("en".to_owned(), label.to_owned())]),
            ..Default::default()
        }
    }

    #[test]
    fn test_saint_expansion() {
        let variants = street_name_variants(&item_named("St Mary's Church"));
        assert!(variants.contains(&"St Mary's Church".to_owned()));
        assert!(variants.contains(&"Saint Mary's Church".to_owned()));
        assert!(variants.contains(&"The St Mary's Church".to_owned()));
        assert!(variants.contains(&"The Saint Mary's Church".to_owned()));
    }

    #[test]
    fn test_comma_and_slash_parts() {
        let variants = street_name_variants(&item_named("High Street, Oxford"));
        assert!(variants.contains(&"High Street".to_owned()));

        let variants = street_name_variants(&item_named("Main Road / Heol Fawr"));
        assert!(variants.contains(&"Main Road".to_owned()));
        assert!(variants.contains(&"Heol Fawr".to_owned()));
    }

    #[test]
    fn test_existing_article_not_doubled() {
        let variants = street_name_variants(&item_named("The Strand"));
        assert!(variants.contains(&"The Strand".to_owned()));
        assert!(!variants.contains(&"The The Strand".to_owned()));
    }

    #[test]
    fn test_name_match_is_case_folded() {
        let mut item = item_named("Town Hall");
        item.aliases
            .insert("en".to_owned(), vec!["City Hall".to_owned()]);

        assert!(matches_known_name("town hall", &item));
        assert!(matches_known_name("CITY HALL", &item));
        assert!(!matches_known_name("Market Hall", &item));
    }
}
