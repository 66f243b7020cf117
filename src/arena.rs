//! Block arena for graph nodes and their auxiliary buffers.
//!
//! Items are bump-allocated into a growing list of blocks. Nothing is ever
//! freed individually: a whole suffix of the arena is released at once with
//! [`Arena::recover_to`], and [`Arena::recover_all`] empties it while keeping
//! the blocks around for the next computation. Blocks never reallocate, so a
//! [`Slot`] or [`Span`] stays valid until the region holding it is recovered.
//!
//! `T: Copy` is what makes bulk release sound without running destructors:
//! arena items are plain data and indices into the same context.

use std::mem;

/// Handle to a single arena item.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Slot {
    pub(crate) block: u32,
    pub(crate) offset: u32,
}

/// Handle to a contiguous run of arena items. Never straddles two blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Span {
    pub(crate) block: u32,
    pub(crate) start: u32,
    pub(crate) len: u32,
}

impl Span {
    /// The zero-length span; allocates nothing.
    pub const EMPTY: Span = Span {
        block: 0,
        start: 0,
        len: 0,
    };

    /// Number of items in the span.
    #[inline]
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// Whether the span is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// High-water mark of an arena, used to release everything allocated later.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ArenaMark {
    block: usize,
    len: usize,
}

/// Bump allocator over doubling blocks.
///
/// Invariant: every block after `current` is empty.
pub struct Arena<T: Copy> {
    blocks: Vec<Vec<T>>,
    current: usize,
    initial_len: usize,
}

impl<T: Copy> Arena<T> {
    /// Create an empty arena whose first block will hold `initial_len` items.
    /// No memory is reserved until the first allocation.
    pub fn new(initial_len: usize) -> Self {
        Arena {
            blocks: Vec::new(),
            current: 0,
            initial_len: initial_len.max(1),
        }
    }

    /// Index of a block with room for `n` more items, making it current.
    fn reserve(&mut self, n: usize) -> usize {
        if self.blocks.is_empty() {
            self.blocks
                .push(Vec::with_capacity(self.initial_len.max(n)));
            self.current = 0;
            return 0;
        }

        let cur = &self.blocks[self.current];
        if cur.capacity() - cur.len() >= n {
            return self.current;
        }

        let next = self.current + 1;
        if next < self.blocks.len() && self.blocks[next].capacity() >= n {
            self.current = next;
            return next;
        }

        let largest = self
            .blocks
            .iter()
            .map(Vec::capacity)
            .max()
            .unwrap_or(self.initial_len);
        let capacity = largest.saturating_mul(2).max(n);
        log::debug!(
            "arena: adding block {} with room for {} items ({} bytes)",
            next,
            capacity,
            capacity * mem::size_of::<T>()
        );
        self.blocks.insert(next, Vec::with_capacity(capacity));
        self.current = next;
        next
    }

    /// Allocate one item.
    #[inline]
    pub fn alloc(&mut self, item: T) -> Slot {
        let b = self.reserve(1);
        let block = &mut self.blocks[b];
        let offset = block.len();
        block.push(item);
        Slot {
            block: b as u32,
            offset: offset as u32,
        }
    }

    /// Allocate a contiguous copy of `items`.
    #[inline]
    pub fn alloc_slice(&mut self, items: &[T]) -> Span {
        self.alloc_iter(items.iter().copied())
    }

    /// Allocate a contiguous run filled from an exact-size iterator.
    pub fn alloc_iter<I>(&mut self, items: I) -> Span
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        let iter = items.into_iter();
        let n = iter.len();
        if n == 0 {
            return Span::EMPTY;
        }
        let b = self.reserve(n);
        let block = &mut self.blocks[b];
        let start = block.len();
        block.extend(iter);
        debug_assert_eq!(block.len() - start, n, "iterator lied about its length");
        Span {
            block: b as u32,
            start: start as u32,
            len: n as u32,
        }
    }

    /// Read one item.
    #[inline]
    pub fn get(&self, slot: Slot) -> &T {
        &self.blocks[slot.block as usize][slot.offset as usize]
    }

    /// Mutate one item in place.
    #[inline]
    pub fn get_mut(&mut self, slot: Slot) -> &mut T {
        &mut self.blocks[slot.block as usize][slot.offset as usize]
    }

    /// Read a contiguous run.
    #[inline]
    pub fn slice(&self, span: Span) -> &[T] {
        if span.len == 0 {
            return &[];
        }
        let start = span.start as usize;
        &self.blocks[span.block as usize][start..start + span.len as usize]
    }

    /// Whether `slot` refers to a live item.
    #[inline]
    pub fn contains(&self, slot: Slot) -> bool {
        self.blocks
            .get(slot.block as usize)
            .is_some_and(|b| (slot.offset as usize) < b.len())
    }

    /// Record the current high-water mark.
    pub fn mark(&self) -> ArenaMark {
        match self.blocks.get(self.current) {
            Some(block) => ArenaMark {
                block: self.current,
                len: block.len(),
            },
            None => ArenaMark { block: 0, len: 0 },
        }
    }

    /// Release everything allocated after `mark`. Blocks are kept for reuse.
    pub fn recover_to(&mut self, mark: ArenaMark) {
        for block in self.blocks.iter_mut().skip(mark.block + 1) {
            block.clear();
        }
        if let Some(block) = self.blocks.get_mut(mark.block) {
            block.truncate(mark.len);
        }
        self.current = mark.block;
    }

    /// Release every item. Blocks are kept for reuse.
    pub fn recover_all(&mut self) {
        self.recover_to(ArenaMark { block: 0, len: 0 });
    }

    /// Release every item and return all blocks but the first to the system.
    pub fn free_all(&mut self) {
        self.blocks.truncate(1);
        self.recover_all();
    }

    /// Number of live items.
    pub fn len(&self) -> usize {
        self.blocks.iter().map(Vec::len).sum()
    }

    /// Whether no items are live.
    pub fn is_empty(&self) -> bool {
        self.blocks.iter().all(Vec::is_empty)
    }

    /// Bytes occupied by live items.
    pub fn bytes_used(&self) -> usize {
        self.len() * mem::size_of::<T>()
    }

    /// Bytes reserved from the system across all blocks.
    pub fn bytes_reserved(&self) -> usize {
        self.blocks.iter().map(Vec::capacity).sum::<usize>() * mem::size_of::<T>()
    }

    /// Number of blocks currently held.
    pub fn num_blocks(&self) -> usize {
        self.blocks.len()
    }
}
