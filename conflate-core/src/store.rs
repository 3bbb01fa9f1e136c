//! Async contracts for the external collaborators.
//!
//! The resolution core consumes these as black boxes: an entity
//! store/fetch service, the tag-schema preset lookup, reverse geocoding
//! for country codes, and (contract only) the changeset upload service.
//! Concrete backends live outside this workspace; tests use in-memory
//! fakes.

use crate::error::{CoreError, Result};
use crate::feature::GeometryKind;
use crate::item::{Coordinate, ItemId, KnowledgeItem};
use crate::tag_rule::TagRule;
use async_trait::async_trait;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Outcome of a remote entity fetch.
#[derive(Debug, Clone)]
pub enum Fetched {
    Entity(KnowledgeItem),
    /// The requested key is superseded by a canonical item.
    Redirect(ItemId),
}

/// Entity store and fetch service.
///
/// `get_item` serves the local mirror; `fetch_remote` reaches the
/// upstream knowledge graph. Upserts are idempotent, keyed by stable id,
/// and reject non-increasing revisions with
/// [`CoreError::StaleRevision`].
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Look up a locally mirrored item. `Ok(None)` when not cached.
    async fn get_item(&self, id: ItemId) -> Result<Option<KnowledgeItem>>;

    /// Fetch the entity from upstream.
    async fn fetch_remote(&self, id: ItemId) -> Result<Fetched>;

    /// Idempotent upsert of a fetched entity.
    async fn upsert(&self, item: KnowledgeItem) -> Result<()>;
}

/// Resolve an item through the store, fetching and mirroring it when not
/// cached. A redirect is followed once; a target that redirects again is
/// a [`CoreError::RedirectLoop`].
pub async fn resolve_item(store: &dyn EntityStore, id: ItemId) -> Result<Option<KnowledgeItem>> {
    if let Some(item) = store.get_item(id).await? {
        return Ok(Some(item));
    }

    let target = match store.fetch_remote(id).await {
        Ok(Fetched::Entity(item)) => {
            store.upsert(item.clone()).await?;
            return Ok(Some(item));
        }
        Ok(Fetched::Redirect(target)) => target,
        Err(CoreError::NotFound(_)) => return Ok(None),
        Err(e) => return Err(e),
    };

    tracing::debug!(from = %id, to = %target, "following entity redirect");
    if let Some(item) = store.get_item(target).await? {
        return Ok(Some(item));
    }
    match store.fetch_remote(target).await {
        Ok(Fetched::Entity(item)) => {
            store.upsert(item.clone()).await?;
            Ok(Some(item))
        }
        Ok(Fetched::Redirect(next)) => Err(CoreError::RedirectLoop {
            from: target,
            to: next,
        }),
        Err(CoreError::NotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}

/// A schema-defined classification for a tag or key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    /// The rule the preset was found for.
    pub rule: TagRule,
    /// Schema path, e.g. `amenity/library`.
    pub schema_path: String,
    /// Localized human-readable name.
    pub name: String,
}

/// Tag-schema preset lookup.
#[async_trait]
pub trait PresetLookup: Send + Sync {
    /// Classify one (key, value) pair for a geometry kind. `locale` is a
    /// regional-language code chosen from the item's country, `None` for
    /// the schema default.
    async fn classify(
        &self,
        key: &str,
        value: &str,
        kind: GeometryKind,
        locale: Option<&str>,
    ) -> Result<Option<Preset>>;
}

/// Reverse geocoding against country polygons.
#[async_trait]
pub trait ReverseGeocoder: Send + Sync {
    /// ISO 3166-1 alpha-2 codes of the countries covering a point.
    async fn countries_covering(&self, point: Coordinate) -> Result<FxHashSet<String>>;
}

// ─── Changeset upload contract ──────────────────────────────────────────
//
// The upload state machine itself lives outside this workspace; only the
// edit vocabulary is shared so callers can type their requests.

/// Requested operation on a feature's item tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditOperation {
    Add,
    Remove,
    Change,
}

/// One requested edit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditCommand {
    pub item: ItemId,
    /// Display identifier of the feature, e.g. `way/42`.
    pub feature: String,
    pub operation: EditOperation,
}

/// Per-edit outcome reported by the upload service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditOutcome {
    Saved,
    AlreadyAdded,
    AlreadyRemoved,
    DifferentValue,
    Deleted,
    VersionMismatch,
    ElementError,
}

/// Changeset upload service (contract only).
#[async_trait]
pub trait UploadService: Send + Sync {
    /// Apply a batch of edits, reporting one outcome per command in
    /// order.
    async fn apply(&self, edits: &[EditCommand]) -> Result<Vec<EditOutcome>>;
}
