//! Request generations
//!
//! Every request takes a strictly increasing [`Generation`] when issued. A
//! response may only update shared state while its generation is still the
//! latest one issued; anything older is stale and dropped.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Sequence number of one request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues generations and answers whether one is still current
///
/// Clones share the same counter.
#[derive(Debug, Clone, Default)]
pub struct GenerationCounter {
    latest: Arc<AtomicU64>,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next generation, superseding all earlier ones
    pub fn begin(&self) -> Generation {
        Generation(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Latest generation issued, if any
    pub fn latest(&self) -> Option<Generation> {
        match self.latest.load(Ordering::SeqCst) {
            0 => None,
            n => Some(Generation(n)),
        }
    }

    /// Whether no newer generation has been issued since `generation`
    pub fn is_current(&self, generation: Generation) -> bool {
        self.latest.load(Ordering::SeqCst) == generation.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generations_increase() {
        let counter = GenerationCounter::new();
        assert_eq!(counter.latest(), None);

        let first = counter.begin();
        let second = counter.begin();
        assert!(second > first);
        assert_eq!(counter.latest(), Some(second));
        assert_eq!(second.to_string(), "#2");
    }

    #[test]
    fn test_only_latest_is_current() {
        let counter = GenerationCounter::new();
        let a = counter.begin();
        assert!(counter.is_current(a));

        let b = counter.begin();
        assert!(!counter.is_current(a));
        assert!(counter.is_current(b));
    }

    #[test]
    fn test_clones_share_counter() {
        let counter = GenerationCounter::new();
        let clone = counter.clone();
        let a = counter.begin();
        clone.begin();
        assert!(!counter.is_current(a));
    }
}
