//! The resolution pipeline.
//!
//! `Matcher::find_candidates` composes the layers: vocabulary walk,
//! classification, query building, concurrent per-kind spatial queries,
//! grouping and distance merging, enrichment, and the linear-feature
//! retry. A failing geometry kind degrades the result to a partial one;
//! only a store outage or a redirect loop aborts the call.

use crate::classify::{classify, FeatureClass, SearchProfile};
use crate::context::ResolutionContext;
use crate::enrich::{Candidate, Enricher};
use crate::error::Result;
use crate::names::{bare_labels, street_name_variants};
use conflate_core::feature::GeometryKind;
use conflate_core::item::{Coordinate, KnowledgeItem};
use conflate_core::store::{EntityStore, PresetLookup, ReverseGeocoder};
use conflate_core::tag_rule::TagRule;
use conflate_spatial::query::{build_queries, QueryParams, QueryPlan};
use conflate_spatial::{group_rows, merge_groups, CandidateGroup, Envelope, SpatialError, SpatialStore};
use conflate_vocab::{Overrides, VocabularyResolver};
use std::sync::Arc;

/// The outcome of one resolution call.
#[derive(Debug, Clone, Default)]
pub struct SearchOutcome {
    /// Candidates ordered ascending by distance.
    pub candidates: Vec<Candidate>,
    /// Geometry kinds whose query failed; the result is partial when
    /// non-empty.
    pub failed_kinds: Vec<GeometryKind>,
}

/// The candidate matcher over injected collaborators.
pub struct Matcher {
    entities: Arc<dyn EntityStore>,
    spatial: Arc<dyn SpatialStore>,
    presets: Arc<dyn PresetLookup>,
    geocoder: Arc<dyn ReverseGeocoder>,
    overrides: Overrides,
}

impl Matcher {
    pub fn new(
        entities: Arc<dyn EntityStore>,
        spatial: Arc<dyn SpatialStore>,
        presets: Arc<dyn PresetLookup>,
        geocoder: Arc<dyn ReverseGeocoder>,
    ) -> Self {
        Matcher {
            entities,
            spatial,
            presets,
            geocoder,
            overrides: Overrides::builtin(),
        }
    }

    /// Replace the built-in override tables.
    pub fn with_overrides(mut self, overrides: Overrides) -> Self {
        self.overrides = overrides;
        self
    }

    /// Find and enrich spatial candidates for an item.
    ///
    /// An item without locations or without a tag vocabulary yields an
    /// empty outcome without touching the spatial store.
    pub async fn find_candidates(&self, item: &KnowledgeItem) -> Result<SearchOutcome> {
        let locations: Vec<Coordinate> =
            item.locations.iter().map(|loc| loc.coordinate).collect();
        if locations.is_empty() {
            tracing::debug!(item = %item.id, "item has no locations");
            return Ok(SearchOutcome::default());
        }

        let resolver = VocabularyResolver::new(self.entities.as_ref(), &self.overrides);
        let vocabulary = resolver.resolve(item).await?;
        if vocabulary.is_empty() {
            tracing::debug!(item = %item.id, "empty tag vocabulary, skipping spatial search");
            return Ok(SearchOutcome::default());
        }
        let rules: Vec<TagRule> = vocabulary.rules().cloned().collect();

        let class = classify(item);
        let profile = SearchProfile::for_class(class);
        let context =
            ResolutionContext::for_locations(self.geocoder.as_ref(), &locations).await;

        let params = first_pass_params(item, class, &profile);
        let Some(plan) = build_queries(&rules, &locations, &params) else {
            return Ok(SearchOutcome::default());
        };
        let mut envelopes = plan_envelopes(&plan);
        let (mut merged, mut failed_kinds) =
            self.execute(&plan, &locations, profile.limit).await?;

        if merged.is_empty() && profile.retry_eligible {
            tracing::debug!(item = %item.id, "first pass empty, retrying without name filter");
            let retry = profile.retry();
            let retry_params = QueryParams {
                radius: retry.radius,
                exclude_points: retry.exclude_points,
                exclude_bus_stops: class == FeatureClass::Street,
                ..Default::default()
            };
            if let Some(retry_plan) = build_queries(&rules, &locations, &retry_params) {
                envelopes = plan_envelopes(&retry_plan);
                let (retry_merged, retry_failed) =
                    self.execute(&retry_plan, &locations, retry.limit).await?;
                merged = retry_merged;
                for kind in retry_failed {
                    if !failed_kinds.contains(&kind) {
                        failed_kinds.push(kind);
                    }
                }
            }
        }

        let enricher = Enricher::new(
            self.spatial.as_ref(),
            self.presets.as_ref(),
            &context,
            &envelopes,
        );
        let mut candidates = Vec::with_capacity(merged.len());
        for group in merged {
            candidates.push(enricher.enrich(group, item).await?);
        }

        Ok(SearchOutcome {
            candidates,
            failed_kinds,
        })
    }

    /// Issue the plan's per-kind queries concurrently, then group and
    /// merge. Failed kinds are recorded; a store outage aborts.
    async fn execute(
        &self,
        plan: &QueryPlan,
        locations: &[Coordinate],
        limit: Option<usize>,
    ) -> Result<(Vec<CandidateGroup>, Vec<GeometryKind>)> {
        let queries = plan.filters.iter().map(|(kind, filter)| async move {
            (*kind, self.spatial.query(*kind, filter).await)
        });
        let results = futures::future::join_all(queries).await;

        let mut groups = Vec::new();
        let mut failed = Vec::new();
        for (kind, result) in results {
            match result {
                Ok(rows) => {
                    groups.extend(group_rows(rows, locations, plan.envelope_area));
                }
                Err(e @ SpatialError::Unavailable(_)) => return Err(e.into()),
                Err(e) => {
                    tracing::warn!(%kind, error = %e, "spatial query failed, partial result");
                    failed.push(kind);
                }
            }
        }

        Ok((merge_groups(groups, limit), failed))
    }
}

/// The name and point layers for the first search pass.
fn first_pass_params(
    item: &KnowledgeItem,
    class: FeatureClass,
    profile: &SearchProfile,
) -> QueryParams {
    let mut params = QueryParams {
        radius: profile.radius,
        exclude_points: profile.exclude_points,
        ..Default::default()
    };
    match class {
        FeatureClass::Street => {
            params.name_variants = street_name_variants(item);
            params.require_name = true;
            params.exclude_bus_stops = true;
        }
        FeatureClass::Watercourse => {
            params.name_variants = bare_labels(item);
        }
        FeatureClass::PointLike => {}
    }
    params
}

/// The envelopes a plan queries against, shared by every kind.
fn plan_envelopes(plan: &QueryPlan) -> Vec<Envelope> {
    plan.filters
        .first()
        .map(|(_, filter)| filter.envelopes.clone())
        .unwrap_or_default()
}
