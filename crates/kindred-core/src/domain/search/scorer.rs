//! Textual relevance scoring
//!
//! Tiered match (exact, prefix, substring) plus a per-word bonus. Scores are
//! plain integers so ranking is reproducible across runs and platforms.

/// Score for a case-insensitive exact match; also the ceiling
pub const EXACT_MATCH_SCORE: u32 = 100;

/// Score when the text starts with the term
pub const PREFIX_MATCH_SCORE: u32 = 50;

/// Score when the term appears anywhere in the text
pub const SUBSTRING_MATCH_SCORE: u32 = 25;

/// Bonus per query word found in the text
pub const WORD_MATCH_BONUS: u32 = 5;

/// Pure relevance scorer
#[derive(Debug, Clone, Copy, Default)]
pub struct RelevanceScorer;

impl RelevanceScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score `text` against `term`; 0 means no match
    pub fn score(&self, term: &str, text: &str) -> u32 {
        score(term, text)
    }
}

/// Score `text` against `term`; 0 means no match
pub fn score(term: &str, text: &str) -> u32 {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return 0;
    }
    let text = text.to_lowercase();

    let base = if text == term {
        EXACT_MATCH_SCORE
    } else if text.starts_with(&term) {
        PREFIX_MATCH_SCORE
    } else if text.contains(&term) {
        SUBSTRING_MATCH_SCORE
    } else {
        0
    };

    let word_bonus: u32 = term
        .split_whitespace()
        .filter(|word| text.contains(word))
        .map(|_| WORD_MATCH_BONUS)
        .sum();

    (base + word_bonus).min(EXACT_MATCH_SCORE)
}
