//! Domain event infrastructure
//!
//! Events are immutable facts about searches that already happened. The
//! [`EventPublisher`] trait is the telemetry sink; publishing is always off
//! the critical path of a search.

use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::error::Result;

/// Base trait for all domain events
pub trait DomainEvent: Send + Sync {
    /// Unique event identifier
    fn event_id(&self) -> Uuid;

    /// Get the event type as a string
    fn event_type(&self) -> &str;

    /// User who triggered the event, when known
    fn actor_id(&self) -> Option<&str>;

    /// Get the timestamp when this event occurred
    fn timestamp(&self) -> DateTime<Utc>;

    /// Get optional event data as JSON
    fn data(&self) -> Option<&serde_json::Value>;
}

/// Publisher trait for emitting domain events
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publish a domain event
    async fn publish(&self, event: &dyn DomainEvent) -> Result<()>;
}

/// A stored event record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: Uuid,
    pub event_type: String,
    pub actor_id: Option<String>,
    pub data: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

impl StoredEvent {
    /// Create from a domain event
    pub fn from_event(event: &dyn DomainEvent) -> Self {
        Self {
            id: event.event_id(),
            event_type: event.event_type().to_string(),
            actor_id: event.actor_id().map(str::to_string),
            data: event.data().cloned(),
            created_at: event.timestamp(),
        }
    }
}

/// A simple in-memory event store for recording events
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    events: RwLock<Vec<StoredEvent>>,
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store an event
    pub fn store(&self, event: StoredEvent) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    /// Get all events
    pub fn all_events(&self) -> Vec<StoredEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Get events by type
    pub fn events_by_type(&self, event_type: &str) -> Vec<StoredEvent> {
        self.events
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|e| e.event_type == event_type)
            .cloned()
            .collect()
    }

    /// Clear all events
    pub fn clear(&self) {
        self.events
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventStore {
    async fn publish(&self, event: &dyn DomainEvent) -> Result<()> {
        self.store(StoredEvent::from_event(event));
        Ok(())
    }
}

/// Publisher that only writes events to the tracing log
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventPublisher;

#[async_trait]
impl EventPublisher for TracingEventPublisher {
    async fn publish(&self, event: &dyn DomainEvent) -> Result<()> {
        info!(
            event_type = event.event_type(),
            actor = event.actor_id().unwrap_or("-"),
            data = %event.data().cloned().unwrap_or_default(),
            "Search event"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestEvent {
        id: Uuid,
        event_type: String,
        timestamp: DateTime<Utc>,
    }

    impl DomainEvent for TestEvent {
        fn event_id(&self) -> Uuid {
            self.id
        }

        fn event_type(&self) -> &str {
            &self.event_type
        }

        fn actor_id(&self) -> Option<&str> {
            Some("u1")
        }

        fn timestamp(&self) -> DateTime<Utc> {
            self.timestamp
        }

        fn data(&self) -> Option<&serde_json::Value> {
            None
        }
    }

    fn event(event_type: &str) -> TestEvent {
        TestEvent {
            id: Uuid::new_v4(),
            event_type: event_type.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_in_memory_publisher() {
        let store = InMemoryEventStore::new();
        store.publish(&event("type_a")).await.unwrap();
        store.publish(&event("type_b")).await.unwrap();
        store.publish(&event("type_a")).await.unwrap();

        assert_eq!(store.all_events().len(), 3);
        assert_eq!(store.events_by_type("type_a").len(), 2);
        assert_eq!(store.all_events()[0].actor_id.as_deref(), Some("u1"));

        store.clear();
        assert!(store.all_events().is_empty());
    }

    #[tokio::test]
    async fn test_tracing_publisher_never_fails() {
        TracingEventPublisher.publish(&event("any")).await.unwrap();
    }
}
