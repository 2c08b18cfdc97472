//! Merge and sort of per-entity result lists

use std::cmp::Ordering;

use super::entity::{SearchResult, SortBy};

/// Concatenate adapter outputs in the order given and sort the merged list.
///
/// The sort is stable, so results with equal keys keep their emission order.
pub fn merge_and_sort(lists: Vec<Vec<SearchResult>>, sort_by: SortBy) -> Vec<SearchResult> {
    let mut merged: Vec<SearchResult> = lists.into_iter().flatten().collect();
    sort_results(&mut merged, sort_by);
    merged
}

/// Sort in place, descending on the key `sort_by` selects
pub fn sort_results(results: &mut [SearchResult], sort_by: SortBy) {
    results.sort_by(|a, b| compare(a, b, sort_by));
}

fn compare(a: &SearchResult, b: &SearchResult, sort_by: SortBy) -> Ordering {
    match sort_by {
        SortBy::Relevance => b.relevance_score.cmp(&a.relevance_score),
        SortBy::Newest => b.created_at.cmp(&a.created_at),
        SortBy::Popular => b.popularity.total_cmp(&a.popularity),
    }
}
