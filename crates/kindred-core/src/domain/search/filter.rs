//! Filter planning
//!
//! Splits user filters into constraints the document store can evaluate and
//! predicates that must run after the fetch. Which filters apply depends on
//! the entity type; filters that make no sense for a type are dropped, not
//! rejected.

use std::fmt;

use tracing::trace;

use super::entity::{EntityType, SearchFilters, SortBy};
use super::records::{PUBLIC_VISIBILITY, SearchableRecord};
use super::specification::{DateRangeSpec, PostFilter, TagIntersectionSpec};

/// Fields the document store indexes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreField {
    ScopeId,
    AuthorId,
    Visibility,
    Popularity,
    CreatedAt,
}

impl StoreField {
    /// Column name in the `records` table
    pub fn column(&self) -> &'static str {
        match self {
            Self::ScopeId => "scope_id",
            Self::AuthorId => "author_id",
            Self::Visibility => "visibility",
            Self::Popularity => "popularity",
            Self::CreatedAt => "created_at",
        }
    }
}

impl fmt::Display for StoreField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.column())
    }
}

/// A store-side constraint
#[derive(Debug, Clone, PartialEq)]
pub enum Constraint {
    /// Text field equals value
    Equals(StoreField, String),
    /// Numeric field is at least value
    AtLeast(StoreField, f64),
}

impl Constraint {
    pub fn field(&self) -> StoreField {
        match self {
            Self::Equals(field, _) | Self::AtLeast(field, _) => *field,
        }
    }
}

/// Store-native ordering, always descending
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: StoreField,
}

impl OrderBy {
    pub fn descending(field: StoreField) -> Self {
        Self { field }
    }

    /// Store ordering for a requested sort; relevance has none
    pub fn for_sort(sort_by: SortBy) -> Option<Self> {
        match sort_by {
            SortBy::Relevance => None,
            SortBy::Newest => Some(Self::descending(StoreField::CreatedAt)),
            SortBy::Popular => Some(Self::descending(StoreField::Popularity)),
        }
    }
}

/// Bounded fetch window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Window {
    pub limit: u32,
    pub offset: u32,
}

impl Window {
    pub fn new(limit: u32, offset: u32) -> Self {
        Self { limit, offset }
    }

    pub fn first(limit: u32) -> Self {
        Self { limit, offset: 0 }
    }
}

/// Output of filter planning for one entity type
pub struct FilterPlan<R> {
    /// Constraints pushed down to the store
    pub constraints: Vec<Constraint>,
    /// Predicates applied to fetched candidates
    pub post_filter: PostFilter<R>,
}

impl<R> fmt::Debug for FilterPlan<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterPlan")
            .field("constraints", &self.constraints)
            .field("post_filters", &self.post_filter.len())
            .finish()
    }
}

/// Translates [`SearchFilters`] into a [`FilterPlan`]
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterEngine;

impl FilterEngine {
    pub fn new() -> Self {
        Self
    }

    /// Plan filters for record type `R`
    pub fn plan<R: SearchableRecord>(&self, filters: &SearchFilters) -> FilterPlan<R> {
        let constraints = self.store_constraints(R::ENTITY_TYPE, filters);

        let mut post_filter = PostFilter::new();
        if !filters.tags.is_empty() {
            post_filter.push(TagIntersectionSpec::new(filters.tags.iter().cloned()));
        }
        if let Some(range) = filters.date_range {
            post_filter.push(DateRangeSpec::new(range));
        }

        trace!(
            entity_type = %R::ENTITY_TYPE,
            constraints = constraints.len(),
            post_filters = post_filter.len(),
            "Planned search filters"
        );

        FilterPlan {
            constraints,
            post_filter,
        }
    }

    /// Store-expressible constraints for an entity type
    pub fn store_constraints(
        &self,
        entity_type: EntityType,
        filters: &SearchFilters,
    ) -> Vec<Constraint> {
        let mut constraints = Vec::new();

        match entity_type {
            EntityType::Content => {
                if let Some(scope_id) = &filters.scope_id {
                    constraints.push(Constraint::Equals(StoreField::ScopeId, scope_id.clone()));
                }
                if let Some(author_id) = &filters.author_id {
                    constraints.push(Constraint::Equals(StoreField::AuthorId, author_id.clone()));
                }
            }
            EntityType::Group => {
                constraints.push(Constraint::Equals(
                    StoreField::Visibility,
                    PUBLIC_VISIBILITY.to_string(),
                ));
                if let Some(owner_id) = &filters.author_id {
                    constraints.push(Constraint::Equals(StoreField::AuthorId, owner_id.clone()));
                }
            }
            EntityType::Profile => {}
        }

        if let Some(min) = filters.min_popularity {
            constraints.push(Constraint::AtLeast(StoreField::Popularity, min as f64));
        }

        constraints
    }
}
