//! Kindred Core Library
//!
//! This crate provides the search engine behind Kindred's community search:
//! - Federated search over posts, groups and member profiles
//! - Relevance scoring, filtering and stable merge ordering
//! - Autocomplete suggestions and recent searches
//! - Generation-guarded interactive search sessions
//! - Storage (SQLite document store)
//! - Configuration

pub mod config;
pub mod domain;
pub mod error;
pub mod storage;

pub use error::{Error, Result};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::Config;
    pub use crate::domain::search::{
        EntityType, SearchFilters, SearchQuery, SearchResult, SearchService, SearchSession,
        SearchType, SortBy,
    };
    pub use crate::error::{Error, Result};
    pub use crate::storage::Database;
}
