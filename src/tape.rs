//! Creation-ordered record of every node in a context.
//!
//! A node's position on the tape is its creation index. Nodes are pushed only
//! once their operands exist, so tape order is a topological order of the
//! expression graph and [`Tape::backward_view`] is reverse-topological: by the
//! time a node is visited it has received every adjoint contribution it will
//! ever get.

use std::iter::Rev;
use std::ops::Range;

use crate::arena::Slot;

/// Append-only list of node slots in creation order.
#[derive(Debug, Default)]
pub struct Tape {
    entries: Vec<Slot>,
}

impl Tape {
    /// Create an empty tape.
    pub fn new() -> Self {
        Tape {
            entries: Vec::new(),
        }
    }

    /// Create an empty tape with room for `capacity` entries.
    pub fn with_capacity(capacity: usize) -> Self {
        Tape {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Append a node. Returns its position.
    #[inline]
    pub fn push(&mut self, slot: Slot) -> u32 {
        let position = self.entries.len();
        assert!(
            position < u32::MAX as usize,
            "tape exceeded {} nodes",
            u32::MAX
        );
        self.entries.push(slot);
        position as u32
    }

    /// Number of recorded nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no nodes are recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Arena slot of the node at `position`, if it exists.
    #[inline]
    pub fn slot(&self, position: u32) -> Option<Slot> {
        self.entries.get(position as usize).copied()
    }

    /// Positions from the current tail down to 0, strictly decreasing.
    pub fn backward_view(&self) -> BackwardView {
        BackwardView {
            inner: (0..self.entries.len() as u32).rev(),
        }
    }

    /// Positions from `position` (inclusive) down to 0.
    pub fn backward_from(&self, position: u32) -> BackwardView {
        let end = (position as usize + 1).min(self.entries.len()) as u32;
        BackwardView {
            inner: (0..end).rev(),
        }
    }

    /// Discard every entry pushed after the first `mark` entries.
    pub fn truncate_to(&mut self, mark: usize) {
        self.entries.truncate(mark);
    }

    /// Discard every entry, keeping capacity.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Lazy reverse-creation-order iterator over tape positions.
///
/// Borrows nothing from the tape, so the caller may mutate node storage while
/// walking it. A fresh view always starts from the tail it was created at.
#[derive(Clone, Debug)]
pub struct BackwardView {
    inner: Rev<Range<u32>>,
}

impl Iterator for BackwardView {
    type Item = u32;

    #[inline]
    fn next(&mut self) -> Option<u32> {
        self.inner.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for BackwardView {}

#[cfg(test)]
mod tests {
    use super::*;

    fn slot(i: u32) -> Slot {
        Slot {
            block: 0,
            offset: i,
        }
    }

    #[test]
    fn positions_follow_push_order() {
        let mut tape = Tape::new();
        assert_eq!(tape.push(slot(10)), 0);
        assert_eq!(tape.push(slot(11)), 1);
        assert_eq!(tape.slot(1), Some(slot(11)));
        assert_eq!(tape.slot(2), None);
    }

    #[test]
    fn backward_view_is_strictly_decreasing() {
        let mut tape = Tape::new();
        for i in 0..5 {
            tape.push(slot(i));
        }
        let order: Vec<u32> = tape.backward_view().collect();
        assert_eq!(order, vec![4, 3, 2, 1, 0]);
        assert_eq!(tape.backward_view().len(), 5);
    }

    #[test]
    fn backward_from_clamps_to_tail() {
        let mut tape = Tape::new();
        for i in 0..3 {
            tape.push(slot(i));
        }
        assert_eq!(tape.backward_from(1).collect::<Vec<_>>(), vec![1, 0]);
        assert_eq!(tape.backward_from(99).collect::<Vec<_>>(), vec![2, 1, 0]);
    }

    #[test]
    fn truncate_discards_suffix() {
        let mut tape = Tape::new();
        for i in 0..4 {
            tape.push(slot(i));
        }
        tape.truncate_to(2);
        assert_eq!(tape.len(), 2);
        assert_eq!(tape.backward_view().collect::<Vec<_>>(), vec![1, 0]);
    }
}
