//! Interactive search session
//!
//! Holds the state a search box renders: current results, suggestions,
//! loading flag and error message. Each search and each suggestion request
//! is tagged with a generation; a response commits to the state only while
//! its generation is still the latest of its kind.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::Config;

use super::cache::ResultCache;
use super::entity::{EntityType, SearchQuery, SearchResult};
use super::generation::{Generation, GenerationCounter};
use super::recent::RecentQueryStore;
use super::service::SearchService;

/// Default pause before a suggestion request is sent
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// What a session renders
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionState {
    /// Query whose results are shown
    pub query: Option<SearchQuery>,
    pub results: Vec<SearchResult>,
    pub suggestions: Vec<String>,
    /// Generic message shown when the last search failed
    pub error: Option<String>,
    pub loading: bool,
}

/// Whether a response was committed to the session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    Applied,
    /// A newer request was issued first; the response was dropped
    Stale,
}

impl UpdateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, Self::Applied)
    }
}

/// One user's search box
pub struct SearchSession {
    service: Arc<SearchService>,
    recent: Option<RecentQueryStore>,
    cache: Option<Arc<ResultCache>>,
    user_id: Option<String>,
    debounce: Duration,
    searches: GenerationCounter,
    suggestions: GenerationCounter,
    state: Mutex<SessionState>,
}

impl std::fmt::Debug for SearchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSession")
            .field("user_id", &self.user_id)
            .field("debounce", &self.debounce)
            .field("latest_search", &self.searches.latest())
            .field("latest_suggestion", &self.suggestions.latest())
            .finish_non_exhaustive()
    }
}

impl SearchSession {
    pub fn new(service: Arc<SearchService>) -> Self {
        Self {
            service,
            recent: None,
            cache: None,
            user_id: None,
            debounce: DEFAULT_DEBOUNCE,
            searches: GenerationCounter::new(),
            suggestions: GenerationCounter::new(),
            state: Mutex::new(SessionState::default()),
        }
    }

    /// Session with the configured debounce and, when enabled, a result cache
    pub fn from_config(service: Arc<SearchService>, config: &Config) -> Self {
        let session = Self::new(service).with_debounce(config.debounce());
        if config.cache.enabled {
            session.with_cache(Arc::new(ResultCache::new(
                config.cache.capacity,
                config.cache_ttl(),
            )))
        } else {
            session
        }
    }

    /// Remember successful search terms in `recent`
    pub fn with_recent(mut self, recent: RecentQueryStore) -> Self {
        self.recent = Some(recent);
        self
    }

    pub fn with_cache(mut self, cache: Arc<ResultCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Track searches against this user
    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Snapshot of the current state
    pub fn state(&self) -> SessionState {
        self.lock_state().clone()
    }

    pub fn recent(&self) -> Option<&RecentQueryStore> {
        self.recent.as_ref()
    }

    /// Recent terms, or nothing when none are kept or they cannot be read
    pub async fn recent_searches(&self) -> Vec<String> {
        let Some(recent) = &self.recent else {
            return Vec::new();
        };
        recent.list().await.unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read recent searches");
            Vec::new()
        })
    }

    pub fn clear_suggestions(&self) {
        // Supersede anything in flight as well
        self.suggestions.begin();
        self.lock_state().suggestions.clear();
    }

    /// Run a search and commit its outcome unless a newer search was issued
    pub async fn search(&self, query: SearchQuery) -> UpdateOutcome {
        let generation = self.searches.begin();
        {
            let mut state = self.lock_state();
            state.loading = true;
            state.error = None;
        }

        let cached = match &self.cache {
            Some(cache) => cache.get(&query).await,
            None => None,
        };
        let outcome = match &cached {
            Some(results) => Ok(Vec::clone(results)),
            None => self.service.search(&query).await,
        };

        let saved_term = {
            let mut state = self.lock_state();
            if !self.searches.is_current(generation) {
                drop(state);
                return self.discard("search", generation);
            }

            state.loading = false;
            let saved_term = match &outcome {
                Ok(results) => {
                    state.results = results.clone();
                    state.error = None;
                    query.normalized_term().map(str::to_string)
                }
                Err(e) => {
                    state.results.clear();
                    state.error = Some(e.user_message());
                    None
                }
            };
            state.query = Some(query.clone());
            saved_term
        };

        if let (Some(cache), Ok(results)) = (&self.cache, &outcome) {
            if cached.is_none() && query.normalized_term().is_some() {
                cache.insert(&query, Arc::new(results.clone())).await;
            }
        }

        if let Some(term) = saved_term {
            if let Some(recent) = &self.recent {
                if let Err(e) = recent.save(&term).await {
                    warn!(error = %e, "Failed to save recent search");
                }
            }
            if let (Some(user_id), Ok(results)) = (&self.user_id, &outcome) {
                self.service.track_search(user_id, &term, results.len());
            }
        }

        UpdateOutcome::Applied
    }

    /// Debounced suggestion request
    ///
    /// Waits out the debounce interval first; a request superseded during
    /// the wait never reaches the stores.
    pub async fn suggest(&self, partial_term: &str, entity_type: Option<EntityType>) -> UpdateOutcome {
        let generation = self.suggestions.begin();

        if !self.debounce.is_zero() {
            tokio::time::sleep(self.debounce).await;
            if !self.suggestions.is_current(generation) {
                return self.discard("suggestion", generation);
            }
        }

        let suggestions = self.service.suggest(partial_term, entity_type).await;

        let mut state = self.lock_state();
        if !self.suggestions.is_current(generation) {
            drop(state);
            return self.discard("suggestion", generation);
        }
        state.suggestions = suggestions;
        UpdateOutcome::Applied
    }

    fn discard(&self, kind: &str, generation: Generation) -> UpdateOutcome {
        debug!(kind, %generation, "Discarding stale response");
        UpdateOutcome::Stale
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
