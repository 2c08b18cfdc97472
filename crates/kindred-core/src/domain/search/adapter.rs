//! Per-entity search adapters
//!
//! An adapter turns one term plus filters into scored [`SearchResult`]s for a
//! single entity type. Candidates come from one bounded store fetch and are
//! scored afterwards, so records outside the fetched window are never seen.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Error, Result};

use super::entity::{EntityType, SearchFilters, SearchResult, SortBy};
use super::filter::{FilterEngine, OrderBy, Window};
use super::records::SearchableRecord;
use super::repository_trait::RecordStore;
use super::scorer::RelevanceScorer;

/// Search contract for one entity type
#[async_trait]
pub trait EntitySearchAdapter: Send + Sync {
    /// Entity type this adapter serves
    fn entity_type(&self) -> EntityType;

    /// Fetch one candidate window, score it and return the matches
    async fn find_candidates(
        &self,
        term: &str,
        filters: &SearchFilters,
        sort_by: SortBy,
        window: Window,
    ) -> Result<Vec<SearchResult>>;

    /// Display titles from a small sample in store order, for suggestions
    async fn sample_titles(&self, limit: u32) -> Result<Vec<String>>;
}

/// Adapter over any [`RecordStore`]
pub struct StoreAdapter<R: SearchableRecord> {
    store: Arc<dyn RecordStore<R>>,
    scorer: RelevanceScorer,
    filter_engine: FilterEngine,
}

impl<R: SearchableRecord> StoreAdapter<R> {
    pub fn new(store: Arc<dyn RecordStore<R>>) -> Self {
        Self {
            store,
            scorer: RelevanceScorer::new(),
            filter_engine: FilterEngine::new(),
        }
    }

    fn unavailable(err: Error) -> Error {
        match err {
            err @ Error::SourceUnavailable { .. } => err,
            other => Error::source_unavailable(R::ENTITY_TYPE, other),
        }
    }
}

impl<R: SearchableRecord> std::fmt::Debug for StoreAdapter<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreAdapter")
            .field("entity_type", &R::ENTITY_TYPE)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl<R: SearchableRecord> EntitySearchAdapter for StoreAdapter<R> {
    fn entity_type(&self) -> EntityType {
        R::ENTITY_TYPE
    }

    async fn find_candidates(
        &self,
        term: &str,
        filters: &SearchFilters,
        sort_by: SortBy,
        window: Window,
    ) -> Result<Vec<SearchResult>> {
        let plan = self.filter_engine.plan::<R>(filters);

        let candidates = self
            .store
            .query(&plan.constraints, OrderBy::for_sort(sort_by), window)
            .await
            .map_err(Self::unavailable)?;
        let fetched = candidates.len();

        let results: Vec<SearchResult> = candidates
            .into_iter()
            .filter_map(|record| {
                let score = self.scorer.score(term, &record.searchable_text());
                (score > 0 && plan.post_filter.matches(&record))
                    .then(|| record.to_result(score))
            })
            .collect();

        debug!(
            entity_type = %R::ENTITY_TYPE,
            fetched,
            matched = results.len(),
            "Scored candidate window"
        );

        Ok(results)
    }

    async fn sample_titles(&self, limit: u32) -> Result<Vec<String>> {
        // Entity defaults still apply, so private groups never surface
        let constraints = self
            .filter_engine
            .store_constraints(R::ENTITY_TYPE, &SearchFilters::default());
        let records = self
            .store
            .query(&constraints, None, Window::first(limit))
            .await
            .map_err(Self::unavailable)?;
        Ok(records.iter().map(|r| r.title().to_string()).collect())
    }
}
