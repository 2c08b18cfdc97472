//! Search domain module
//!
//! Federated search over the community corpus: content posts, groups and
//! member profiles.
//!
//! # Architecture
//!
//! - **Entities**: `SearchQuery`, `SearchFilters`, `SearchResult`
//! - **Records**: `ContentRecord`, `GroupRecord`, `ProfileRecord` as stored
//! - **Repository**: `RecordStore` trait with SQLite and in-memory stores
//! - **Adapters**: one `EntitySearchAdapter` per entity type
//! - **Coordinator**: concurrent fan-out, partial-failure tolerance, merge
//! - **Service**: `SearchService` with telemetry
//! - **Session**: generation-guarded state for an interactive search box
//!
//! # Known limitation
//!
//! Each adapter fetches one bounded window of records before scoring. There
//! is no inverted index, so a relevant record outside the window is missed.
//!
//! # Example
//!
//! ```ignore
//! use kindred_core::domain::search::{SearchQuery, SearchService, SortBy};
//!
//! let service = SearchService::sqlite(db.pool().clone());
//! let results = service
//!     .search(&SearchQuery::new("rust").with_sort(SortBy::Popular))
//!     .await?;
//! ```

pub mod adapter;
pub mod cache;
pub mod coordinator;
pub mod entity;
pub mod event;
pub mod filter;
pub mod generation;
pub mod memory;
pub mod ranking;
pub mod recent;
pub mod records;
pub mod repository;
pub mod repository_trait;
pub mod scorer;
pub mod service;
pub mod session;
pub mod specification;
pub mod suggestion;

// Re-export main types
pub use adapter::{EntitySearchAdapter, StoreAdapter};
pub use cache::ResultCache;
pub use coordinator::{CoordinatedSearch, QueryCoordinator};
pub use entity::{
    Cursor, DateRange, EntityType, SearchFilters, SearchQuery, SearchResult, SearchType, SortBy,
};
pub use event::{SearchEvent, SearchEventType};
pub use filter::{Constraint, FilterEngine, FilterPlan, OrderBy, StoreField, Window};
pub use generation::{Generation, GenerationCounter};
pub use memory::InMemoryRecordStore;
pub use ranking::merge_and_sort;
pub use recent::{InMemoryKeyValueStore, JsonFileKeyValueStore, KeyValueStore, RecentQueryStore};
pub use records::{ContentRecord, GroupRecord, ProfileRecord, RecordTimestamp, SearchableRecord};
pub use repository::{SearchEventRepository, SqliteRecordStore};
pub use repository_trait::RecordStore;
pub use scorer::RelevanceScorer;
pub use service::SearchService;
pub use session::{SearchSession, SessionState, UpdateOutcome};
pub use specification::{DateRangeSpec, PostFilter, TagIntersectionSpec};
pub use suggestion::SuggestionEngine;
