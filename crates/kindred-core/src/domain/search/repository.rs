//! SQLite-backed search persistence
//!
//! `SqliteRecordStore` serves one collection out of the shared `records`
//! document table. `SearchEventRepository` persists search telemetry.

use std::marker::PhantomData;

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::domain::events::{DomainEvent, EventPublisher, StoredEvent};
use crate::error::Result;

use super::filter::{Constraint, OrderBy, StoreField, Window};
use super::records::SearchableRecord;
use super::repository_trait::RecordStore;

/// Record store for collection `R::COLLECTION`
#[derive(Debug, Clone)]
pub struct SqliteRecordStore<R> {
    pool: SqlitePool,
    _record: PhantomData<fn() -> R>,
}

impl<R: SearchableRecord> SqliteRecordStore<R> {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            _record: PhantomData,
        }
    }

    /// Insert or replace a single record
    pub async fn upsert(&self, record: &R) -> Result<()> {
        let mut conn = self.pool.acquire().await?;
        write_record(&mut conn, record).await
    }

    /// Insert or replace many records in one transaction
    pub async fn upsert_all(&self, records: &[R]) -> Result<usize> {
        let mut tx = self.pool.begin().await?;
        for record in records {
            write_record(&mut tx, record).await?;
        }
        tx.commit().await?;

        debug!(
            collection = R::COLLECTION,
            count = records.len(),
            "Upserted records"
        );
        Ok(records.len())
    }

    /// Number of records in this collection
    pub async fn count(&self) -> Result<i64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM records WHERE collection = ?")
            .bind(R::COLLECTION)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }
}

async fn write_record<R: SearchableRecord>(conn: &mut SqliteConnection, record: &R) -> Result<()> {
    let body = serde_json::to_string(record)?;

    sqlx::query(
        r#"
        INSERT INTO records (
            collection, id, scope_id, author_id, visibility, popularity, created_at, body
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(collection, id) DO UPDATE SET
            scope_id = excluded.scope_id,
            author_id = excluded.author_id,
            visibility = excluded.visibility,
            popularity = excluded.popularity,
            created_at = excluded.created_at,
            body = excluded.body
        "#,
    )
    .bind(R::COLLECTION)
    .bind(record.id())
    .bind(record.text_field(StoreField::ScopeId))
    .bind(record.text_field(StoreField::AuthorId))
    .bind(record.text_field(StoreField::Visibility))
    .bind(record.popularity())
    .bind(record.created_at().to_epoch_millis())
    .bind(body)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

#[async_trait]
impl<R: SearchableRecord> RecordStore<R> for SqliteRecordStore<R> {
    async fn query(
        &self,
        constraints: &[Constraint],
        order_by: Option<OrderBy>,
        window: Window,
    ) -> Result<Vec<R>> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new("SELECT body FROM records WHERE collection = ");
        builder.push_bind(R::COLLECTION);

        for constraint in constraints {
            match constraint {
                Constraint::Equals(field, value) => {
                    builder.push(format!(" AND {} = ", field.column()));
                    builder.push_bind(value.clone());
                }
                Constraint::AtLeast(field, min) => {
                    builder.push(format!(" AND {} >= ", field.column()));
                    builder.push_bind(*min);
                }
            }
        }

        // rowid keeps ties (and unordered fetches) in insertion order
        match order_by {
            Some(order) => {
                builder.push(format!(" ORDER BY {} DESC, rowid ASC", order.field.column()));
            }
            None => {
                builder.push(" ORDER BY rowid ASC");
            }
        }

        builder.push(" LIMIT ");
        builder.push_bind(i64::from(window.limit));
        builder.push(" OFFSET ");
        builder.push_bind(i64::from(window.offset));

        let rows: Vec<(String,)> = builder.build_query_as().fetch_all(&self.pool).await?;

        rows.into_iter()
            .map(|(body,)| serde_json::from_str(&body).map_err(Into::into))
            .collect()
    }
}

/// Persists search telemetry to the `search_events` table
#[derive(Debug, Clone)]
pub struct SearchEventRepository {
    pool: SqlitePool,
}

impl SearchEventRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Most recent events of one type, newest first
    pub async fn recent_events(&self, event_type: &str, limit: u32) -> Result<Vec<StoredEvent>> {
        let rows: Vec<(String, String, Option<String>, Option<String>, String)> = sqlx::query_as(
            r#"
            SELECT id, event_type, user_id, data, created_at
            FROM search_events
            WHERE event_type = ?
            ORDER BY created_at DESC
            LIMIT ?
            "#,
        )
        .bind(event_type)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(id, event_type, user_id, data, created_at)| {
                Ok(StoredEvent {
                    id: id
                        .parse()
                        .map_err(|e| crate::Error::Other(format!("Bad event id: {e}")))?,
                    event_type,
                    actor_id: user_id,
                    data: data.map(|d| serde_json::from_str(&d)).transpose()?,
                    created_at: chrono::DateTime::parse_from_rfc3339(&created_at)
                        .map_err(|e| crate::Error::Other(format!("Bad event time: {e}")))?
                        .with_timezone(&chrono::Utc),
                })
            })
            .collect()
    }
}

#[async_trait]
impl EventPublisher for SearchEventRepository {
    async fn publish(&self, event: &dyn DomainEvent) -> Result<()> {
        let data = event.data().map(serde_json::to_string).transpose()?;

        sqlx::query(
            r#"
            INSERT INTO search_events (id, event_type, user_id, data, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(event.event_id().to_string())
        .bind(event.event_type())
        .bind(event.actor_id())
        .bind(data)
        .bind(event.timestamp().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::event::SearchEvent;
    use crate::domain::search::records::{ContentRecord, GroupRecord, RecordTimestamp};
    use crate::storage::Database;

    async fn create_test_pool() -> SqlitePool {
        let db = Database::in_memory()
            .await
            .expect("Failed to create test database");
        db.pool().clone()
    }

    async fn seeded_posts(pool: &SqlitePool) -> SqliteRecordStore<ContentRecord> {
        let store = SqliteRecordStore::new(pool.clone());
        store
            .upsert_all(&[
                ContentRecord::new("p1", "Rust ownership", "u1")
                    .with_community("c1")
                    .with_votes(10)
                    .with_created_at(RecordTimestamp::EpochMillis(1_000)),
                ContentRecord::new("p2", "Rust lifetimes", "u2")
                    .with_community("c2")
                    .with_votes(3)
                    .with_created_at(RecordTimestamp::Native {
                        seconds: 3,
                        nanoseconds: 0,
                    }),
                ContentRecord::new("p3", "Async Rust", "u1")
                    .with_community("c1")
                    .with_votes(7)
                    .with_created_at(RecordTimestamp::EpochMillis(2_000)),
            ])
            .await
            .unwrap();
        store
    }

    fn ids(records: &[ContentRecord]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_unordered_query_uses_insertion_order() {
        let pool = create_test_pool().await;
        let store = seeded_posts(&pool).await;

        let records = store.query(&[], None, Window::first(10)).await.unwrap();
        assert_eq!(ids(&records), vec!["p1", "p2", "p3"]);
        assert_eq!(store.count().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_constraints_push_down() {
        let pool = create_test_pool().await;
        let store = seeded_posts(&pool).await;

        let records = store
            .query(
                &[
                    Constraint::Equals(StoreField::AuthorId, "u1".into()),
                    Constraint::AtLeast(StoreField::Popularity, 8.0),
                ],
                None,
                Window::first(10),
            )
            .await
            .unwrap();
        assert_eq!(ids(&records), vec!["p1"]);
    }

    #[tokio::test]
    async fn test_ordered_and_windowed_query() {
        let pool = create_test_pool().await;
        let store = seeded_posts(&pool).await;

        let newest = store
            .query(&[], Some(OrderBy::descending(StoreField::CreatedAt)), Window::first(2))
            .await
            .unwrap();
        assert_eq!(ids(&newest), vec!["p2", "p3"]);

        let popular = store
            .query(&[], Some(OrderBy::descending(StoreField::Popularity)), Window::new(2, 1))
            .await
            .unwrap();
        assert_eq!(ids(&popular), vec!["p3", "p2"]);
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let pool = create_test_pool().await;
        let _posts = seeded_posts(&pool).await;
        let groups: SqliteRecordStore<GroupRecord> = SqliteRecordStore::new(pool.clone());
        groups
            .upsert(&GroupRecord::new("g1", "Rustaceans", "u1").with_members(40))
            .await
            .unwrap();

        let records = groups.query(&[], None, Window::first(10)).await.unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].member_count, 40);
    }

    #[tokio::test]
    async fn test_upsert_replaces_existing() {
        let pool = create_test_pool().await;
        let store = seeded_posts(&pool).await;
        store
            .upsert(&ContentRecord::new("p1", "Rust ownership, revised", "u1").with_votes(11))
            .await
            .unwrap();

        assert_eq!(store.count().await.unwrap(), 3);
        let records = store.query(&[], None, Window::first(1)).await.unwrap();
        assert_eq!(records[0].title, "Rust ownership, revised");
    }

    #[tokio::test]
    async fn test_event_repository_round_trip() {
        let pool = create_test_pool().await;
        let repo = SearchEventRepository::new(pool);

        repo.publish(&SearchEvent::search_tracked("u1", "rust", 4))
            .await
            .unwrap();

        let events = repo.recent_events("search_tracked", 10).await.unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].actor_id.as_deref(), Some("u1"));
        assert_eq!(events[0].data.as_ref().unwrap()["term"], "rust");
    }
}
