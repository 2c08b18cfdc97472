//! Query coordination
//!
//! Fans a query out to the adapters of every targeted entity type, tolerates
//! individual source failures, and merges what came back.

use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};

use super::adapter::{EntitySearchAdapter, StoreAdapter};
use super::entity::{EntityType, SearchQuery, SearchResult};
use super::filter::Window;
use super::ranking::merge_and_sort;
use super::records::{ContentRecord, GroupRecord, ProfileRecord};
use super::repository_trait::RecordStore;

/// Outcome of a fan-out, including the sources that failed
#[derive(Debug)]
pub struct CoordinatedSearch {
    /// Merged and sorted results from every source that answered
    pub results: Vec<SearchResult>,
    /// Errors of the sources that failed
    pub failures: Vec<Error>,
    answered: bool,
}

impl CoordinatedSearch {
    fn skipped() -> Self {
        Self {
            results: Vec::new(),
            failures: Vec::new(),
            answered: true,
        }
    }

    /// No targeted source answered
    pub fn all_failed(&self) -> bool {
        !self.answered
    }

    /// The merged results, or [`Error::Aggregation`] when every source failed
    pub fn into_results(self) -> Result<Vec<SearchResult>> {
        if self.answered {
            return Ok(self.results);
        }
        Err(Error::Aggregation {
            attempted: self.failures.len(),
            failures: self.failures.iter().map(ToString::to_string).collect(),
        })
    }
}

/// Runs a [`SearchQuery`] against the registered adapters
#[derive(Clone, Default)]
pub struct QueryCoordinator {
    adapters: Vec<Arc<dyn EntitySearchAdapter>>,
}

impl QueryCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter, replacing any earlier one for the same entity type
    pub fn with_adapter(mut self, adapter: Arc<dyn EntitySearchAdapter>) -> Self {
        self.adapters
            .retain(|a| a.entity_type() != adapter.entity_type());
        self.adapters.push(adapter);
        self
    }

    /// Coordinator over the three standard record stores
    pub fn from_stores(
        content: Arc<dyn RecordStore<ContentRecord>>,
        groups: Arc<dyn RecordStore<GroupRecord>>,
        profiles: Arc<dyn RecordStore<ProfileRecord>>,
    ) -> Self {
        Self::new()
            .with_adapter(Arc::new(StoreAdapter::new(content)))
            .with_adapter(Arc::new(StoreAdapter::new(groups)))
            .with_adapter(Arc::new(StoreAdapter::new(profiles)))
    }

    /// Adapter registered for an entity type
    pub fn adapter(&self, entity_type: EntityType) -> Option<&Arc<dyn EntitySearchAdapter>> {
        self.adapters.iter().find(|a| a.entity_type() == entity_type)
    }

    /// Adapters for the given types, in the order the types are listed
    pub fn adapters_for(&self, targets: &[EntityType]) -> Vec<Arc<dyn EntitySearchAdapter>> {
        targets
            .iter()
            .filter_map(|t| self.adapter(*t).cloned())
            .collect()
    }

    /// Run a search and return the merged results
    ///
    /// Fails only with [`Error::Aggregation`] when no targeted source
    /// answered, or [`Error::InvalidInput`] for a malformed cursor.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        self.search_detailed(query).await?.into_results()
    }

    /// Like [`search`](Self::search), but keeps the per-source failures
    ///
    /// A total failure is not an error here; check
    /// [`CoordinatedSearch::all_failed`] or call
    /// [`CoordinatedSearch::into_results`].
    pub async fn search_detailed(&self, query: &SearchQuery) -> Result<CoordinatedSearch> {
        let Some(term) = query.normalized_term() else {
            debug!("Empty search term, skipping sources");
            return Ok(CoordinatedSearch::skipped());
        };

        let window = Window::new(query.effective_page_size(), query.offset()?);
        let adapters = self.adapters_for(&query.search_type.targets());

        let calls = adapters.iter().map(|adapter| {
            adapter.find_candidates(term, &query.filters, query.sort_by, window)
        });
        let outcomes = join_all(calls).await;

        let attempted = outcomes.len();
        let mut lists = Vec::with_capacity(attempted);
        let mut failures = Vec::new();

        for (adapter, outcome) in adapters.iter().zip(outcomes) {
            match outcome {
                Ok(results) => lists.push(results),
                Err(e) => {
                    warn!(
                        entity_type = %adapter.entity_type(),
                        error = %e,
                        "Search source failed, continuing without it"
                    );
                    failures.push(e);
                }
            }
        }

        if lists.is_empty() {
            warn!(attempted, "Every search source failed");
            return Ok(CoordinatedSearch {
                results: Vec::new(),
                failures,
                answered: false,
            });
        }

        let results = merge_and_sort(lists, query.sort_by);

        info!(
            term,
            search_type = %query.search_type,
            sort_by = %query.sort_by,
            results = results.len(),
            failed_sources = failures.len(),
            "Search completed"
        );

        Ok(CoordinatedSearch {
            results,
            failures,
            answered: true,
        })
    }
}

impl std::fmt::Debug for QueryCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let types: Vec<EntityType> = self.adapters.iter().map(|a| a.entity_type()).collect();
        f.debug_struct("QueryCoordinator")
            .field("adapters", &types)
            .finish()
    }
}
