//! In-memory record store
//!
//! Evaluates the same constraint and ordering contract as the SQLite store
//! over a vector kept in insertion order. Used for fixtures and tests.

use std::cmp::Ordering as CmpOrdering;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use crate::error::Result;

use super::filter::{Constraint, OrderBy, StoreField, Window};
use super::records::SearchableRecord;
use super::repository_trait::RecordStore;

/// Record store backed by a `Vec`
#[derive(Debug)]
pub struct InMemoryRecordStore<R> {
    records: RwLock<Vec<R>>,
    queries: AtomicUsize,
}

impl<R: SearchableRecord> InMemoryRecordStore<R> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<R>) -> Self {
        Self {
            records: RwLock::new(records),
            queries: AtomicUsize::new(0),
        }
    }

    /// Insert or replace a record by id, keeping its original position
    pub fn upsert(&self, record: R) {
        let mut records = self.records.write().unwrap_or_else(PoisonError::into_inner);
        match records.iter_mut().find(|r| r.id() == record.id()) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
    }

    pub fn len(&self) -> usize {
        self.records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of queries served so far
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl<R: SearchableRecord> Default for InMemoryRecordStore<R> {
    fn default() -> Self {
        Self::new()
    }
}

fn satisfies<R: SearchableRecord>(record: &R, constraint: &Constraint) -> bool {
    match constraint {
        Constraint::Equals(field, expected) => record.text_field(*field) == Some(expected.as_str()),
        Constraint::AtLeast(StoreField::Popularity, min) => record.popularity() >= *min,
        Constraint::AtLeast(StoreField::CreatedAt, min) => {
            record.created_at().to_epoch_millis() as f64 >= *min
        }
        Constraint::AtLeast(..) => false,
    }
}

fn compare_desc<R: SearchableRecord>(a: &R, b: &R, field: StoreField) -> CmpOrdering {
    match field {
        StoreField::Popularity => b.popularity().total_cmp(&a.popularity()),
        StoreField::CreatedAt => b
            .created_at()
            .to_epoch_millis()
            .cmp(&a.created_at().to_epoch_millis()),
        text => b.text_field(text).cmp(&a.text_field(text)),
    }
}

#[async_trait]
impl<R: SearchableRecord> RecordStore<R> for InMemoryRecordStore<R> {
    async fn query(
        &self,
        constraints: &[Constraint],
        order_by: Option<OrderBy>,
        window: Window,
    ) -> Result<Vec<R>> {
        self.queries.fetch_add(1, Ordering::SeqCst);

        let mut matched: Vec<R> = self
            .records
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|record| constraints.iter().all(|c| satisfies(*record, c)))
            .cloned()
            .collect();

        if let Some(order) = order_by {
            matched.sort_by(|a, b| compare_desc(a, b, order.field));
        }

        Ok(matched
            .into_iter()
            .skip(window.offset as usize)
            .take(window.limit as usize)
            .collect())
    }
}
