//! # Ordering
//!
//! Scoped position assignment for modules (per course) and contents (per module).
//!
//! A record created without an explicit position is placed after the last
//! record of its scope: `max(existing) + 1`, or `0` when the scope is empty.
//! Positions are never compacted, so gaps left by deletions stay and the next
//! insert still lands after the current maximum. An explicit position is kept
//! as given, even if another record already holds it.

use crate::primitives::MAX_REORDER_ENTRIES;
use crate::types::EducaError;
use std::collections::BTreeMap;

/// Position assigner bound to one scope.
///
/// Built from the positions currently present in the scope (all modules of one
/// course, or all contents of one module). Records of other scopes must not be
/// passed in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OrderField {
    last: Option<u32>,
}

impl OrderField {
    /// Collect the positions of a scope.
    pub fn from_existing<I>(orders: I) -> Self
    where
        I: IntoIterator<Item = u32>,
    {
        Self {
            last: orders.into_iter().max(),
        }
    }

    /// Position for a record appended to the scope.
    #[must_use]
    pub fn next(&self) -> u32 {
        match self.last {
            Some(last) => last.saturating_add(1),
            None => 0,
        }
    }

    /// Keep an explicit position, otherwise append.
    #[must_use]
    pub fn resolve(&self, requested: Option<u32>) -> u32 {
        requested.unwrap_or_else(|| self.next())
    }

    /// Record that `order` is now taken in this scope.
    pub fn observe(&mut self, order: u32) {
        self.last = Some(self.last.map_or(order, |last| last.max(order)));
    }
}

/// Sort records of one scope by `(order, id)`.
pub fn sort_by_order<T, K: Ord>(items: &mut [T], key: impl Fn(&T) -> (u32, K)) {
    items.sort_by(|a, b| key(a).cmp(&key(b)));
}

/// A batch of `id -> position` assignments, as posted by the drag-and-drop
/// reordering of modules and contents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reorder<Id: Ord> {
    entries: BTreeMap<Id, u32>,
}

impl<Id: Ord + Copy> Reorder<Id> {
    /// Validate and wrap a batch.
    pub fn new(entries: BTreeMap<Id, u32>) -> Result<Self, EducaError> {
        if entries.len() > MAX_REORDER_ENTRIES {
            return Err(EducaError::Validation(format!(
                "reorder batch of {} entries exceeds maximum {}",
                entries.len(),
                MAX_REORDER_ENTRIES
            )));
        }
        Ok(Self { entries })
    }

    /// Iterate assignments in id order.
    pub fn iter(&self) -> impl Iterator<Item = (Id, u32)> + '_ {
        self.entries.iter().map(|(id, order)| (*id, *order))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_scope_starts_at_zero() {
        assert_eq!(OrderField::from_existing([]).next(), 0);
    }

    #[test]
    fn appends_after_maximum_not_count() {
        // Gap left by a deleted record: {0, 2} -> next is 3, not 2.
        assert_eq!(OrderField::from_existing([0, 2]).next(), 3);
        assert_eq!(OrderField::from_existing([5, 1, 3]).next(), 6);
    }

    #[test]
    fn explicit_order_is_kept() {
        let field = OrderField::from_existing([0, 1, 2]);
        assert_eq!(field.resolve(Some(1)), 1);
        assert_eq!(field.resolve(None), 3);
    }

    #[test]
    fn observe_tracks_new_maximum() {
        let mut field = OrderField::default();
        field.observe(4);
        assert_eq!(field.next(), 5);
        field.observe(2);
        assert_eq!(field.next(), 5);
    }

    #[test]
    fn saturates_at_u32_max() {
        assert_eq!(OrderField::from_existing([u32::MAX]).next(), u32::MAX);
    }

    #[test]
    fn sort_breaks_ties_by_id() {
        let mut items = vec![(3u64, 1u32), (1, 1), (2, 0)];
        sort_by_order(&mut items, |(id, order)| (*order, *id));
        assert_eq!(items, vec![(2, 0), (1, 1), (3, 1)]);
    }

    #[test]
    fn reorder_rejects_oversized_batches() {
        let entries: BTreeMap<u64, u32> = (0..=MAX_REORDER_ENTRIES as u64).map(|i| (i, 0)).collect();
        assert!(Reorder::new(entries).is_err());
    }
}
