//! Search entity and related types
//!
//! Defines the query, filter and result shapes shared by every search source.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{Error, Result};

/// Default candidate window per entity type
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// Smallest accepted candidate window
pub const MIN_PAGE_SIZE: u32 = 1;

/// Largest accepted candidate window
pub const MAX_PAGE_SIZE: u32 = 100;

const CURSOR_PREFIX: &str = "offset:";

/// Record types that can be searched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    /// Posts and other authored content
    Content,
    /// Communities
    Group,
    /// User profiles (mentors and mentees)
    Profile,
}

impl EntityType {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Group => "group",
            Self::Profile => "profile",
        }
    }

    /// Create from string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "content" | "post" | "posts" => Some(Self::Content),
            "group" | "community" | "communities" => Some(Self::Group),
            "profile" | "user" | "users" => Some(Self::Profile),
            _ => None,
        }
    }

    /// All entity types, in fan-out order
    pub fn all() -> Vec<Self> {
        vec![Self::Content, Self::Group, Self::Profile]
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Which entity types a query targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchType {
    Content,
    Group,
    Profile,
    #[default]
    All,
}

impl SearchType {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Group => "group",
            Self::Profile => "profile",
            Self::All => "all",
        }
    }

    /// Create from string representation
    pub fn from_str(s: &str) -> Option<Self> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        EntityType::from_str(s).map(Self::from)
    }

    /// Entity types to fan out to
    pub fn targets(&self) -> Vec<EntityType> {
        match self {
            Self::Content => vec![EntityType::Content],
            Self::Group => vec![EntityType::Group],
            Self::Profile => vec![EntityType::Profile],
            Self::All => EntityType::all(),
        }
    }
}

impl From<EntityType> for SearchType {
    fn from(entity_type: EntityType) -> Self {
        match entity_type {
            EntityType::Content => Self::Content,
            EntityType::Group => Self::Group,
            EntityType::Profile => Self::Profile,
        }
    }
}

impl fmt::Display for SearchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Ordering applied to the merged result list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    /// Descending relevance score
    #[default]
    Relevance,
    /// Descending creation time
    Newest,
    /// Descending popularity metric
    Popular,
}

impl SortBy {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::Newest => "newest",
            Self::Popular => "popular",
        }
    }

    /// Create from string representation
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "relevance" => Some(Self::Relevance),
            "newest" | "recent" => Some(Self::Newest),
            "popular" | "popularity" => Some(Self::Popular),
            _ => None,
        }
    }
}

impl fmt::Display for SortBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Inclusive time range filter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Create a new range; bounds are swapped if given out of order
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Check whether an epoch-millisecond timestamp falls inside the range
    pub fn contains_millis(&self, millis: i64) -> bool {
        self.start.timestamp_millis() <= millis && millis <= self.end.timestamp_millis()
    }
}

/// Optional user filters; absent fields mean "no constraint"
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchFilters {
    /// Community the candidate belongs to
    pub scope_id: Option<String>,

    /// Creation time window
    pub date_range: Option<DateRange>,

    /// Candidate must share at least one tag
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,

    /// Author (content) or owner (group)
    pub author_id: Option<String>,

    /// Popularity threshold (inclusive)
    pub min_popularity: Option<i64>,
}

impl SearchFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_scope(mut self, scope_id: impl Into<String>) -> Self {
        self.scope_id = Some(scope_id.into());
        self
    }

    pub fn with_date_range(mut self, range: DateRange) -> Self {
        self.date_range = Some(range);
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tags.insert(tag.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.extend(tags.into_iter().map(Into::into));
        self
    }

    pub fn with_author(mut self, author_id: impl Into<String>) -> Self {
        self.author_id = Some(author_id.into());
        self
    }

    pub fn with_min_popularity(mut self, min_popularity: i64) -> Self {
        self.min_popularity = Some(min_popularity);
        self
    }

    /// True when no filter is set
    pub fn is_empty(&self) -> bool {
        self.scope_id.is_none()
            && self.date_range.is_none()
            && self.tags.is_empty()
            && self.author_id.is_none()
            && self.min_popularity.is_none()
    }
}

/// Opaque paging token
///
/// Encodes the candidate-window offset; callers should only obtain cursors
/// from [`SearchQuery::next_page`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub(crate) fn from_offset(offset: u32) -> Self {
        Self(format!("{CURSOR_PREFIX}{offset}"))
    }

    /// Wrap a token previously handed out to a caller
    pub fn from_token(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub(crate) fn offset(&self) -> Result<u32> {
        self.0
            .strip_prefix(CURSOR_PREFIX)
            .and_then(|n| n.parse().ok())
            .ok_or_else(|| Error::InvalidInput(format!("Malformed search cursor '{}'", self.0)))
    }
}

/// A search query with all parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text search term
    pub search_term: String,

    /// Entity types to search
    pub search_type: SearchType,

    /// Optional filters
    #[serde(default)]
    pub filters: SearchFilters,

    /// Ordering of the merged list
    #[serde(default)]
    pub sort_by: SortBy,

    /// Candidate window per entity type, clamped to [1, 100]
    pub page_size: u32,

    /// Paging token
    pub cursor: Option<Cursor>,
}

impl SearchQuery {
    /// Create a new query across all entity types with default settings
    pub fn new(search_term: impl Into<String>) -> Self {
        Self {
            search_term: search_term.into(),
            search_type: SearchType::All,
            filters: SearchFilters::default(),
            sort_by: SortBy::Relevance,
            page_size: DEFAULT_PAGE_SIZE,
            cursor: None,
        }
    }

    pub fn with_type(mut self, search_type: SearchType) -> Self {
        self.search_type = search_type;
        self
    }

    pub fn with_filters(mut self, filters: SearchFilters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_sort(mut self, sort_by: SortBy) -> Self {
        self.sort_by = sort_by;
        self
    }

    /// Set the page size, clamped to the accepted bounds
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE);
        self
    }

    pub fn with_cursor(mut self, cursor: Cursor) -> Self {
        self.cursor = Some(cursor);
        self
    }

    /// Trimmed search term, or `None` when nothing is left to search for
    pub fn normalized_term(&self) -> Option<&str> {
        let term = self.search_term.trim();
        (!term.is_empty()).then_some(term)
    }

    /// Effective window size, re-clamped for queries built by field access
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.clamp(MIN_PAGE_SIZE, MAX_PAGE_SIZE)
    }

    /// Window offset decoded from the cursor
    pub fn offset(&self) -> Result<u32> {
        self.cursor.as_ref().map_or(Ok(0), Cursor::offset)
    }

    /// The same query advanced by one candidate window
    pub fn next_page(&self) -> Result<Self> {
        let offset = self
            .offset()?
            .checked_add(self.effective_page_size())
            .ok_or_else(|| Error::InvalidInput("Search cursor is past the last page".into()))?;
        Ok(self.clone().with_cursor(Cursor::from_offset(offset)))
    }
}

/// A single search result in the common cross-entity shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    /// Identifier of the matched record
    pub id: String,

    /// Type of record that matched
    #[serde(rename = "type")]
    pub entity_type: EntityType,

    /// Title or display name
    pub title: String,

    /// Short description
    pub description: String,

    /// Type-specific metadata
    #[serde(default)]
    pub metadata: serde_json::Map<String, serde_json::Value>,

    /// Textual relevance (never 0 in engine output)
    pub relevance_score: u32,

    /// Canonical creation time in epoch milliseconds
    pub created_at: i64,

    /// Canonical popularity scalar
    pub popularity: f64,
}

impl SearchResult {
    /// Create a new search result
    pub fn new(
        id: impl Into<String>,
        entity_type: EntityType,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            entity_type,
            title: title.into(),
            description: description.into(),
            metadata: serde_json::Map::new(),
            relevance_score: 0,
            created_at: 0,
            popularity: 0.0,
        }
    }

    pub fn with_score(mut self, score: u32) -> Self {
        self.relevance_score = score;
        self
    }

    pub fn with_created_at(mut self, created_at_ms: i64) -> Self {
        self.created_at = created_at_ms;
        self
    }

    /// Set popularity; mirrored into metadata
    pub fn with_popularity(mut self, popularity: f64) -> Self {
        self.popularity = popularity;
        self.metadata
            .insert("popularity".to_string(), serde_json::json!(popularity));
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Map<String, serde_json::Value>) -> Self {
        self.metadata.extend(metadata);
        self
    }
}
