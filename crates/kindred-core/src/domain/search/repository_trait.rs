//! Repository trait for searchable record stores
//!
//! The document store is an external collaborator; this trait is the whole
//! of the contract search needs from it: filtered, optionally ordered,
//! bounded reads.

use async_trait::async_trait;

use crate::error::Result;

use super::filter::{Constraint, OrderBy, Window};
use super::records::SearchableRecord;

/// Read-only access to one collection of records
#[async_trait]
pub trait RecordStore<R: SearchableRecord>: Send + Sync {
    /// Fetch at most `window.limit` records satisfying every constraint,
    /// skipping `window.offset`, in `order_by` order when given and in
    /// store-native order otherwise
    async fn query(
        &self,
        constraints: &[Constraint],
        order_by: Option<OrderBy>,
        window: Window,
    ) -> Result<Vec<R>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::search::records::ContentRecord;

    // Verify trait is object-safe
    fn _assert_object_safe(_: &dyn RecordStore<ContentRecord>) {}
}
