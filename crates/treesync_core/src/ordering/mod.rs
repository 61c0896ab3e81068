//! Fractional ordering of user-sortable records.
//!
//! Records carry a floating-point `position`; ascending position is display
//! order. Positions need not be integers or contiguous, so a move only ever
//! rewrites the moved record:
//!
//! ```text
//! before:  A(100)  B(300)  C(500)
//! move C to the front:
//! after:   C(-100) A(100)  B(300)
//! ```
//!
//! [`PositionAllocator`] is the pure arithmetic. [`OrderStore`] is the
//! persistence collaborator and [`OrderedCollection`] combines the two.

mod collection;
mod store;

#[cfg(feature = "sqlite")]
mod sqlite_store;

pub use collection::OrderedCollection;
pub use store::{
    Collection, ListFilter, MemoryOrderStore, OrderStore, OrderableRecord, RecordDraft,
    sort_records,
};

#[cfg(feature = "sqlite")]
pub use sqlite_store::SqliteOrderStore;

use crate::config::EngineConfig;

/// Default spacing between appended positions.
pub const POSITION_GAP: f64 = 200.0;

/// Computes positions for appends and single-record moves.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionAllocator {
    gap: f64,
}

impl Default for PositionAllocator {
    fn default() -> Self {
        Self { gap: POSITION_GAP }
    }
}

impl PositionAllocator {
    /// Allocator with a custom gap. Non-positive or non-finite gaps fall back
    /// to [`POSITION_GAP`].
    pub fn new(gap: f64) -> Self {
        if gap.is_finite() && gap > 0.0 {
            Self { gap }
        } else {
            Self::default()
        }
    }

    pub fn from_config(config: &EngineConfig) -> Self {
        Self::new(config.gap())
    }

    pub fn gap(&self) -> f64 {
        self.gap
    }

    /// Position for a record appended after `existing`: `max + gap`, or `gap`
    /// for an empty sequence. Negative maxima are kept, so an all-negative
    /// sequence appends below zero.
    pub fn next_position<I>(&self, existing: I) -> f64
    where
        I: IntoIterator<Item = f64>,
    {
        existing.into_iter().reduce(f64::max).unwrap_or(0.0) + self.gap
    }

    /// Position that places a record at `index` among `others`, the ascending
    /// positions of the sequence with the moved record removed.
    ///
    /// Returns `None` when the two neighbours are too close for a
    /// representable midpoint; the caller should renormalize and retry.
    pub fn reordered_position(&self, others: &[f64], index: usize) -> Option<f64> {
        let index = index.min(others.len());
        match (index.checked_sub(1).map(|i| others[i]), others.get(index)) {
            (None, None) => Some(self.gap),
            (None, Some(&first)) => Some(first - self.gap),
            (Some(last), None) => Some(last + self.gap),
            (Some(before), Some(&after)) => {
                let mid = before + (after - before) / 2.0;
                (before < mid && mid < after).then_some(mid)
            }
        }
    }

    /// Evenly spaced positions `gap, 2·gap, …` for `count` records.
    pub fn renormalized(&self, count: usize) -> Vec<f64> {
        (1..=count).map(|i| i as f64 * self.gap).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_position() {
        let alloc = PositionAllocator::default();
        assert_eq!(alloc.next_position([]), 200.0);
        assert_eq!(alloc.next_position([100.0, 300.0, 500.0]), 700.0);
        assert_eq!(alloc.next_position([500.0, 100.0]), 700.0);
        // Only an empty sequence starts from zero
        assert_eq!(alloc.next_position([-300.0, -100.0]), 100.0);
    }

    #[test]
    fn test_reordered_position_ends_and_middle() {
        let alloc = PositionAllocator::default();
        let others = [100.0, 300.0];
        assert_eq!(alloc.reordered_position(&others, 0), Some(-100.0));
        assert_eq!(alloc.reordered_position(&others, 1), Some(200.0));
        assert_eq!(alloc.reordered_position(&others, 2), Some(500.0));
        assert_eq!(alloc.reordered_position(&others, 99), Some(500.0));
        assert_eq!(alloc.reordered_position(&[], 0), Some(200.0));
    }

    #[test]
    fn test_reordered_position_exhausted() {
        let alloc = PositionAllocator::default();
        let a = 1.0_f64;
        let b = f64::from_bits(a.to_bits() + 1);
        assert_eq!(alloc.reordered_position(&[a, b], 1), None);
    }

    #[test]
    fn test_repeated_midpoint_insertion_stays_ordered() {
        let alloc = PositionAllocator::default();
        let mut positions = vec![100.0, 300.0];
        for _ in 0..50 {
            let p = alloc.reordered_position(&positions, 1).unwrap();
            assert!(positions[0] < p && p < positions[1]);
            positions[1] = p;
        }
    }

    #[test]
    fn test_renormalized() {
        let alloc = PositionAllocator::new(10.0);
        assert_eq!(alloc.renormalized(3), vec![10.0, 20.0, 30.0]);
        assert!(alloc.renormalized(0).is_empty());
    }

    #[test]
    fn test_invalid_gap_falls_back() {
        assert_eq!(PositionAllocator::new(0.0).gap(), POSITION_GAP);
        assert_eq!(PositionAllocator::new(f64::NAN).gap(), POSITION_GAP);
    }
}
