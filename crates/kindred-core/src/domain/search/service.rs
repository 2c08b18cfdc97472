//! Search service
//!
//! The engine's public surface: search, suggest and search tracking, with
//! telemetry published off the critical path.

use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::warn;

use crate::config::Config;
use crate::domain::events::EventPublisher;
use crate::error::Result;

use super::coordinator::QueryCoordinator;
use super::entity::{EntityType, SearchQuery, SearchResult};
use super::event::SearchEvent;
use super::records::{ContentRecord, GroupRecord, ProfileRecord};
use super::repository::{SearchEventRepository, SqliteRecordStore};
use super::suggestion::SuggestionEngine;

/// Service for searching the community corpus
#[derive(Clone)]
pub struct SearchService {
    coordinator: QueryCoordinator,
    suggestions: SuggestionEngine,
    telemetry: Option<Arc<dyn EventPublisher>>,
}

impl std::fmt::Debug for SearchService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchService")
            .field("coordinator", &self.coordinator)
            .field("suggestions", &self.suggestions)
            .field("telemetry", &self.telemetry.is_some())
            .finish()
    }
}

impl SearchService {
    /// Create a service without telemetry
    pub fn new(coordinator: QueryCoordinator) -> Self {
        Self {
            suggestions: SuggestionEngine::new(coordinator.clone()),
            coordinator,
            telemetry: None,
        }
    }

    /// Service over the SQLite document store, logging events to it
    pub fn sqlite(pool: SqlitePool) -> Self {
        Self::from_config(pool, &Config::default())
    }

    /// SQLite-backed service tuned by `config`
    pub fn from_config(pool: SqlitePool, config: &Config) -> Self {
        let coordinator = QueryCoordinator::from_stores(
            Arc::new(SqliteRecordStore::<ContentRecord>::new(pool.clone())),
            Arc::new(SqliteRecordStore::<GroupRecord>::new(pool.clone())),
            Arc::new(SqliteRecordStore::<ProfileRecord>::new(pool.clone())),
        );
        let suggestions = SuggestionEngine::new(coordinator.clone())
            .with_min_chars(config.suggestions.min_chars)
            .with_sample_size(config.suggestions.sample_size)
            .with_max_suggestions(config.suggestions.max_results);

        Self::new(coordinator)
            .with_suggestion_engine(suggestions)
            .with_telemetry(Arc::new(SearchEventRepository::new(pool)))
    }

    pub fn with_suggestion_engine(mut self, suggestions: SuggestionEngine) -> Self {
        self.suggestions = suggestions;
        self
    }

    /// Publish search events to `publisher`
    pub fn with_telemetry(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.telemetry = Some(publisher);
        self
    }

    pub fn coordinator(&self) -> &QueryCoordinator {
        &self.coordinator
    }

    /// Run a search
    ///
    /// Only a total failure of every targeted source is returned as an error.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchResult>> {
        let outcome = self.coordinator.search_detailed(query).await?;

        for failure in &outcome.failures {
            if let crate::Error::SourceUnavailable {
                entity_type,
                reason,
            } = failure
            {
                self.publish(SearchEvent::source_failed(*entity_type, reason));
            }
        }
        if let (false, Some(term)) = (outcome.all_failed(), query.normalized_term()) {
            self.publish(SearchEvent::search_executed(
                term,
                query.search_type,
                query.sort_by,
                outcome.results.len(),
            ));
        }

        outcome.into_results()
    }

    /// Autocomplete suggestions; never fails
    pub async fn suggest(&self, partial_term: &str, entity_type: Option<EntityType>) -> Vec<String> {
        self.suggestions.suggest(partial_term, entity_type).await
    }

    /// Record a user's search without waiting for the sink
    pub fn track_search(&self, user_id: &str, term: &str, result_count: usize) {
        self.publish(SearchEvent::search_tracked(user_id, term, result_count));
    }

    fn publish(&self, event: SearchEvent) {
        let Some(publisher) = self.telemetry.clone() else {
            return;
        };
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(event_type = %event.event_type, "No runtime for telemetry, event dropped");
            return;
        };

        handle.spawn(async move {
            if let Err(e) = publisher.publish(&event).await {
                warn!(event_type = %event.event_type, error = %e, "Failed to publish search event");
            }
        });
    }
}
