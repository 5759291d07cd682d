//! Min-heap of bins keyed by their cached merge cost.
//!
//! Entries carry the cost that was current when they were pushed. The
//! clusterer rechecks freshness when an entry reaches the top, so stale
//! keys are tolerated here.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug, Clone, Copy)]
struct HeapEntry {
    err: f64,
    bin: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    // Reversed: BinaryHeap is a max-heap.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .err
            .total_cmp(&self.err)
            .then_with(|| other.bin.cmp(&self.bin))
    }
}

#[derive(Debug, Default)]
pub(crate) struct MergeHeap {
    heap: BinaryHeap<HeapEntry>,
}

impl MergeHeap {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: BinaryHeap::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, bin: usize, err: f64) {
        self.heap.push(HeapEntry { err, bin });
    }

    /// Bin with the least cost, without removing it.
    pub fn peek(&self) -> Option<usize> {
        self.heap.peek().map(|e| e.bin)
    }

    pub fn pop(&mut self) -> Option<usize> {
        self.heap.pop().map(|e| e.bin)
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }
}
