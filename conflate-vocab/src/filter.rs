//! Subclass-closure filtering and bulk type counting over item sets.
//!
//! Used to narrow bulk area queries to a caller-chosen set of types. The
//! closure is one level deep: a requested type matches items declaring
//! it directly or declaring an immediate subclass of it.

use crate::error::Result;
use conflate_core::item::{props, ItemId, KnowledgeItem};
use conflate_core::store::{resolve_item, EntityStore};
use conflate_core::CoreError;
use rustc_hash::{FxHashMap, FxHashSet};

/// Count of one instance-of type across an item set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeCount {
    pub id: ItemId,
    pub count: usize,
    /// English label of the type, when it can be resolved.
    pub label: Option<String>,
}

/// Retain items whose declared types intersect `requested` or are an
/// immediate subclass of a requested type.
///
/// Idempotent: filtering an already filtered set with the same request
/// is a no-op.
pub async fn filter_by_types(
    store: &dyn EntityStore,
    items: Vec<KnowledgeItem>,
    requested: &FxHashSet<ItemId>,
) -> Result<Vec<KnowledgeItem>> {
    // Per-call memo: does this declared type fall inside the closure?
    let mut in_closure: FxHashMap<ItemId, bool> = FxHashMap::default();
    let mut kept = Vec::new();

    for item in items {
        let mut matched = false;
        for type_id in item.type_ids() {
            if requested.contains(&type_id) {
                matched = true;
                break;
            }
            let subclass_hit = match in_closure.get(&type_id) {
                Some(hit) => *hit,
                None => {
                    let hit = subclass_of_any(store, type_id, requested).await?;
                    in_closure.insert(type_id, hit);
                    hit
                }
            };
            if subclass_hit {
                matched = true;
                break;
            }
        }
        if matched {
            kept.push(item);
        }
    }

    Ok(kept)
}

async fn subclass_of_any(
    store: &dyn EntityStore,
    type_id: ItemId,
    requested: &FxHashSet<ItemId>,
) -> Result<bool> {
    let type_item = match resolve_item(store, type_id).await {
        Ok(found) => found,
        Err(e @ CoreError::RedirectLoop { .. }) => return Err(e.into()),
        Err(e) => {
            tracing::warn!(type_id = %type_id, error = %e, "type fetch failed during filtering");
            None
        }
    };

    Ok(type_item.is_some_and(|t| {
        t.entity_refs(props::SUBCLASS_OF)
            .iter()
            .any(|id| requested.contains(id))
    }))
}

/// Count instance-of types across an item set, most common first. Labels
/// are resolved through the store where possible.
pub async fn isa_counts(
    store: &dyn EntityStore,
    items: &[KnowledgeItem],
) -> Result<Vec<TypeCount>> {
    let mut counts: FxHashMap<ItemId, usize> = FxHashMap::default();
    for item in items {
        for type_id in item.type_ids() {
            *counts.entry(type_id).or_default() += 1;
        }
    }

    let mut ordered: Vec<(ItemId, usize)> = counts.into_iter().collect();
    ordered.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

    let mut result = Vec::with_capacity(ordered.len());
    for (id, count) in ordered {
        let label = match resolve_item(store, id).await {
            Ok(found) => found.and_then(|t| t.label("en").map(str::to_owned)),
            Err(e @ CoreError::RedirectLoop { .. }) => return Err(e.into()),
            Err(e) => {
                tracing::warn!(type_id = %id, error = %e, "type fetch failed during counting");
                None
            }
        };
        result.push(TypeCount { id, count, label });
    }

    Ok(result)
}
