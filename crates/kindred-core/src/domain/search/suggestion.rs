//! Autocomplete suggestions
//!
//! Suggestions are drawn from a small sample of each store, not from a full
//! match. Failures never surface; the worst case is an empty list.

use futures_util::future::join_all;
use tracing::{debug, warn};

use super::coordinator::QueryCoordinator;
use super::entity::{EntityType, SearchType};

/// Shortest partial term that produces suggestions; the default and the floor
pub const MIN_CHARS: usize = 2;

/// Most records sampled per entity type; the default and the ceiling
pub const MAX_SAMPLE_SIZE: u32 = 10;

/// Most suggestions returned; the default and the ceiling
pub const MAX_SUGGESTIONS: usize = 10;

/// Suggests titles containing a partial term
#[derive(Debug, Clone)]
pub struct SuggestionEngine {
    coordinator: QueryCoordinator,
    min_chars: usize,
    sample_size: u32,
    max_suggestions: usize,
}

impl SuggestionEngine {
    pub fn new(coordinator: QueryCoordinator) -> Self {
        Self {
            coordinator,
            min_chars: MIN_CHARS,
            sample_size: MAX_SAMPLE_SIZE,
            max_suggestions: MAX_SUGGESTIONS,
        }
    }

    /// Raise the minimum input length; never below [`MIN_CHARS`]
    pub fn with_min_chars(mut self, min_chars: usize) -> Self {
        self.min_chars = min_chars.max(MIN_CHARS);
        self
    }

    pub fn with_sample_size(mut self, sample_size: u32) -> Self {
        self.sample_size = sample_size.clamp(1, MAX_SAMPLE_SIZE);
        self
    }

    pub fn with_max_suggestions(mut self, max_suggestions: usize) -> Self {
        self.max_suggestions = max_suggestions.clamp(1, MAX_SUGGESTIONS);
        self
    }

    /// Titles from the sampled stores containing `partial_term`,
    /// case-insensitively, deduplicated in sample order
    pub async fn suggest(&self, partial_term: &str, entity_type: Option<EntityType>) -> Vec<String> {
        let needle = partial_term.trim().to_lowercase();
        if needle.chars().count() < self.min_chars {
            return Vec::new();
        }

        let targets = entity_type.map_or(SearchType::All, SearchType::from).targets();
        let adapters = self.coordinator.adapters_for(&targets);

        let samples = join_all(
            adapters
                .iter()
                .map(|adapter| adapter.sample_titles(self.sample_size)),
        )
        .await;

        let mut suggestions: Vec<String> = Vec::new();
        for (adapter, sample) in adapters.iter().zip(samples) {
            let titles = match sample {
                Ok(titles) => titles,
                Err(e) => {
                    warn!(
                        entity_type = %adapter.entity_type(),
                        error = %e,
                        "Suggestion sample failed"
                    );
                    continue;
                }
            };

            for title in titles {
                if suggestions.len() >= self.max_suggestions {
                    break;
                }
                if title.to_lowercase().contains(&needle) && !suggestions.contains(&title) {
                    suggestions.push(title);
                }
            }
        }

        debug!(partial = %needle, count = suggestions.len(), "Suggestions ready");
        suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::memory::InMemoryRecordStore;
    use crate::domain::search::records::{ContentRecord, GroupRecord, ProfileRecord};
    use std::sync::Arc;

    fn engine() -> SuggestionEngine {
        let posts = InMemoryRecordStore::with_records(vec![
            ContentRecord::new("p1", "React Hooks in depth", "u1"),
            ContentRecord::new("p2", "Cooking for one", "u1"),
            ContentRecord::new("p3", "React Hooks in depth", "u2"),
        ]);
        let groups = InMemoryRecordStore::with_records(vec![GroupRecord::new(
            "g1",
            "Reactive programming",
            "u1",
        )]);
        let profiles = InMemoryRecordStore::with_records(vec![ProfileRecord::new("u1", "Ada")]);

        SuggestionEngine::new(QueryCoordinator::from_stores(
            Arc::new(posts),
            Arc::new(groups),
            Arc::new(profiles),
        ))
    }

    #[tokio::test]
    async fn test_short_input_is_noop() {
        let engine = engine();
        assert!(engine.suggest("a", None).await.is_empty());
        assert!(engine.suggest(" r ", None).await.is_empty());
        assert!(engine.suggest("", None).await.is_empty());
    }

    #[tokio::test]
    async fn test_matches_are_deduplicated() {
        let suggestions = engine().suggest("REACT", None).await;
        assert_eq!(
            suggestions,
            vec!["React Hooks in depth", "Reactive programming"]
        );
    }

    #[tokio::test]
    async fn test_type_restricts_sources() {
        let suggestions = engine().suggest("react", Some(EntityType::Group)).await;
        assert_eq!(suggestions, vec!["Reactive programming"]);
    }

    #[tokio::test]
    async fn test_capped() {
        let posts = InMemoryRecordStore::with_records(
            (0..10)
                .map(|i| ContentRecord::new(format!("p{i}"), format!("rust {i}"), "u1"))
                .collect(),
        );
        let groups = InMemoryRecordStore::with_records(vec![GroupRecord::new(
            "g1", "rust club", "u1",
        )]);
        let engine = SuggestionEngine::new(QueryCoordinator::from_stores(
            Arc::new(posts),
            Arc::new(groups),
            Arc::new(InMemoryRecordStore::<ProfileRecord>::new()),
        ))
        .with_max_suggestions(4);

        let suggestions = engine.suggest("rust", None).await;
        assert_eq!(suggestions, vec!["rust 0", "rust 1", "rust 2", "rust 3"]);
    }

    #[tokio::test]
    async fn test_sample_window_is_bounded() {
        // The 11th record matches but sits outside the sampled window
        let posts = InMemoryRecordStore::with_records(
            (0..11)
                .map(|i| {
                    let title = match i {
                        10 => "Mentoring basics".to_string(),
                        _ => format!("Cooking {i}"),
                    };
                    ContentRecord::new(format!("p{i}"), title, "u1")
                })
                .collect(),
        );
        let engine = SuggestionEngine::new(QueryCoordinator::from_stores(
            Arc::new(posts),
            Arc::new(InMemoryRecordStore::<GroupRecord>::new()),
            Arc::new(InMemoryRecordStore::<ProfileRecord>::new()),
        ))
        .with_sample_size(10);

        assert!(engine.suggest("mentor", None).await.is_empty());
        assert_eq!(engine.suggest("cooking 9", None).await, vec!["Cooking 9"]);
    }

    #[tokio::test]
    async fn test_settings_clamped_to_limits() {
        let posts = InMemoryRecordStore::with_records(
            (0..20)
                .map(|i| ContentRecord::new(format!("p{i}"), format!("rust {i}"), "u1"))
                .collect(),
        );
        let engine = SuggestionEngine::new(QueryCoordinator::from_stores(
            Arc::new(posts),
            Arc::new(InMemoryRecordStore::<GroupRecord>::new()),
            Arc::new(InMemoryRecordStore::<ProfileRecord>::new()),
        ))
        .with_min_chars(1)
        .with_sample_size(100)
        .with_max_suggestions(50);

        assert!(engine.suggest("r", None).await.is_empty());
        let suggestions = engine.suggest("rust", None).await;
        assert_eq!(suggestions.len(), MAX_SUGGESTIONS);
        // nothing past the sampled window
        assert!(!suggestions.contains(&"rust 10".to_string()));
    }

    #[tokio::test]
    async fn test_no_sources_is_empty() {
        let engine = SuggestionEngine::new(QueryCoordinator::new());
        assert!(engine.suggest("rust", None).await.is_empty());
    }
}
