//! Search domain events
//!
//! Telemetry facts emitted around searches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::events::DomainEvent;

use super::entity::{EntityType, SearchType, SortBy};

/// Type of search event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchEventType {
    /// A search completed and returned results
    SearchExecuted,
    /// A caller recorded a search against a user
    SearchTracked,
    /// One search source failed while others were still used
    SourceFailed,
}

impl SearchEventType {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SearchExecuted => "search_executed",
            Self::SearchTracked => "search_tracked",
            Self::SourceFailed => "source_failed",
        }
    }
}

impl std::fmt::Display for SearchEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A search domain event
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchEvent {
    pub id: Uuid,
    pub event_type: SearchEventType,
    pub user_id: Option<String>,
    pub data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl SearchEvent {
    fn new(
        event_type: SearchEventType,
        user_id: Option<String>,
        data: serde_json::Value,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            user_id,
            data: Some(data),
            created_at: Utc::now(),
        }
    }

    /// A search finished
    pub fn search_executed(
        term: &str,
        search_type: SearchType,
        sort_by: SortBy,
        result_count: usize,
    ) -> Self {
        let data = serde_json::json!({
            "term": term,
            "type": search_type.as_str(),
            "sort_by": sort_by.as_str(),
            "result_count": result_count,
        });
        Self::new(SearchEventType::SearchExecuted, None, data)
    }

    /// A user's search, recorded by the caller
    pub fn search_tracked(user_id: impl Into<String>, term: &str, result_count: usize) -> Self {
        let data = serde_json::json!({
            "term": term,
            "result_count": result_count,
        });
        Self::new(SearchEventType::SearchTracked, Some(user_id.into()), data)
    }

    /// A single source failed during a search
    pub fn source_failed(entity_type: EntityType, reason: &str) -> Self {
        let data = serde_json::json!({
            "entity_type": entity_type.as_str(),
            "reason": reason,
        });
        Self::new(SearchEventType::SourceFailed, None, data)
    }
}

impl DomainEvent for SearchEvent {
    fn event_id(&self) -> Uuid {
        self.id
    }

    fn event_type(&self) -> &str {
        self.event_type.as_str()
    }

    fn actor_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    fn timestamp(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }
}
