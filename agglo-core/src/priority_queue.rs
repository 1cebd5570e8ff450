//! Lazy merge priority queue.
//!
//! A binary min-heap over edges ordered by merge cost. Entries live in a
//! storage vector that outlives the heap's ordering; each edge carries a
//! back-reference (`qloc`) into that vector so an entry can be invalidated
//! in O(1) when a merge makes it stale. Consumers must treat extracted
//! entries whose `valid` flag is cleared, or whose endpoints no longer name
//! a live edge, as no-ops.

use crate::{ordered_pair, Label, Rag};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// One scheduled edge visit.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    /// Merge cost at the time the entry was pushed
    pub weight: f64,
    /// Region labels at the time the entry was pushed
    pub endpoints: (Label, Label),
    /// Cleared by lazy invalidation
    pub valid: bool,
}

/// Heap key: weight ascending, then canonical endpoint pair, then slot.
/// The tie-break keeps extraction order deterministic.
#[derive(Debug, Clone, PartialEq)]
struct HeapKey {
    weight: f64,
    pair: (Label, Label),
    slot: usize,
}

impl Eq for HeapKey {}

impl PartialOrd for HeapKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.weight
            .total_cmp(&other.weight)
            .then_with(|| self.pair.cmp(&other.pair))
            .then_with(|| self.slot.cmp(&other.slot))
    }
}

/// Min-heap with lazy deletion over RAG edges.
#[derive(Debug, Default)]
pub struct MergePriorityQueue {
    storage: Vec<QueueEntry>,
    heap: BinaryHeap<Reverse<HeapKey>>,
}

impl MergePriorityQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no entry, valid or stale, remains to extract
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Number of entries ever pushed
    pub fn storage_len(&self) -> usize {
        self.storage.len()
    }

    /// Number of entries still marked valid
    pub fn num_valid(&self) -> usize {
        self.storage.iter().filter(|qe| qe.valid).count()
    }

    /// Append a valid entry and record its slot on the carrying edge.
    pub fn push(&mut self, rag: &mut Rag, endpoints: (Label, Label), weight: f64) {
        let slot = self.storage.len();
        self.storage.push(QueueEntry {
            weight,
            endpoints,
            valid: true,
        });
        if let Some(edge) = rag.find_edge_mut(endpoints.0, endpoints.1) {
            edge.qloc = Some(slot);
        }
        self.heap.push(Reverse(HeapKey {
            weight,
            pair: ordered_pair(endpoints.0, endpoints.1),
            slot,
        }));
    }

    /// Mark a stored entry stale without touching the heap. O(1).
    pub fn invalidate_slot(&mut self, slot: usize) {
        if let Some(qe) = self.storage.get_mut(slot) {
            qe.valid = false;
        }
    }

    /// Invalidate the entry referenced by the edge's `qloc`, if any.
    pub fn invalidate_edge(&mut self, rag: &Rag, endpoints: (Label, Label)) {
        if let Some(slot) = rag
            .find_edge(endpoints.0, endpoints.1)
            .and_then(|e| e.qloc)
        {
            self.invalidate_slot(slot);
        }
    }

    /// Invalidate the edge's prior entry and push a fresh one at the new
    /// weight.
    pub fn reinsert(&mut self, rag: &mut Rag, endpoints: (Label, Label), weight: f64) {
        self.invalidate_edge(rag, endpoints);
        self.push(rag, endpoints, weight);
    }

    /// Pop the least-weight entry. The caller must check `valid` and confirm
    /// the endpoints still name a live edge.
    pub fn extract_min(&mut self) -> Option<QueueEntry> {
        self.heap
            .pop()
            .map(|Reverse(key)| self.storage[key.slot].clone())
    }

    /// Peek at the least-weight entry that is valid and backed by a live
    /// edge, discarding stale entries along the way.
    pub fn peek_valid(&mut self, rag: &Rag) -> Option<QueueEntry> {
        while let Some(Reverse(key)) = self.heap.peek() {
            let qe = &self.storage[key.slot];
            if qe.valid && rag.find_edge(qe.endpoints.0, qe.endpoints.1).is_some() {
                return Some(qe.clone());
            }
            self.heap.pop();
        }
        None
    }
}
