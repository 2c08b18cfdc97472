//! Post-fetch search specifications
//!
//! Filters the document store cannot evaluate, applied to fetched candidates.

use std::collections::BTreeSet;

use crate::domain::specification::Specification;

use super::entity::DateRange;
use super::records::SearchableRecord;

/// Candidate shares at least one tag with the filter (case-insensitive)
pub struct TagIntersectionSpec {
    tags: BTreeSet<String>,
}

impl TagIntersectionSpec {
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            tags: tags
                .into_iter()
                .map(|t| t.as_ref().trim().to_lowercase())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }
}

impl<R: SearchableRecord> Specification<R> for TagIntersectionSpec {
    fn is_satisfied_by(&self, record: &R) -> bool {
        if self.tags.is_empty() {
            return true;
        }
        record
            .tags()
            .iter()
            .any(|tag| self.tags.contains(&tag.trim().to_lowercase()))
    }
}

/// Candidate creation time lies within an inclusive range
pub struct DateRangeSpec {
    range: DateRange,
}

impl DateRangeSpec {
    pub fn new(range: DateRange) -> Self {
        Self { range }
    }
}

impl<R: SearchableRecord> Specification<R> for DateRangeSpec {
    fn is_satisfied_by(&self, record: &R) -> bool {
        self.range
            .contains_millis(record.created_at().to_epoch_millis())
    }
}

/// Conjunction of post-fetch specifications; empty means "accept all"
pub struct PostFilter<R> {
    spec: Option<Box<dyn Specification<R>>>,
    len: usize,
}

impl<R: SearchableRecord> PostFilter<R> {
    pub fn new() -> Self {
        Self { spec: None, len: 0 }
    }

    /// Add a specification to the conjunction
    pub fn push<S: Specification<R> + 'static>(&mut self, spec: S) {
        self.spec = Some(match self.spec.take() {
            Some(existing) => Box::new(existing.and(spec)),
            None => Box::new(spec),
        });
        self.len += 1;
    }

    pub fn matches(&self, record: &R) -> bool {
        self.spec
            .as_ref()
            .is_none_or(|spec| spec.is_satisfied_by(record))
    }
}

impl<R: SearchableRecord> Default for PostFilter<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R> PostFilter<R> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
