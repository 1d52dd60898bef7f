//! Candidate queue: a min-heap of potential merges ordered by cost delta.
//!
//! The engine never re-sorts candidates. New ones are pushed as they are
//! discovered, the cheapest is popped each iteration, and entries that
//! reference a box retired by an earlier merge are discarded lazily when
//! they surface. Ids are never reused within a run, so the retired set only
//! grows and a stale entry can never be mistaken for a live one.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

use rustc_hash::FxHashSet;

use prismerge_types::bounds::Bounds;

/// Total order over f64 built on `total_cmp`.
///
/// Unlike NotNan this doesn't reject NaN, it just orders it consistently;
/// candidate deltas are finite for valid inputs anyway.
#[derive(Debug, Clone, Copy, PartialEq)]
struct OrdF64(f64);

impl Eq for OrdF64 {}

impl PartialOrd for OrdF64 {
    #[inline]
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OrdF64 {
    #[inline]
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// A potential merge of two active boxes.
///
/// `box_a` and `box_b` are held in canonical order (`box_a < box_b`), so a
/// pair discovered from either side produces the same candidate.
/// `candidate_id` is the id the merged box will take if this candidate is
/// ever applied.
#[derive(Debug, Clone, PartialEq)]
pub struct MergeCandidate {
    pub box_a: u64,
    pub box_b: u64,
    pub candidate_id: u64,
    pub merged: Bounds,
    pub delta_c: f64,
}

impl MergeCandidate {
    pub fn new(box_a: u64, box_b: u64, candidate_id: u64, merged: Bounds, delta_c: f64) -> Self {
        let (box_a, box_b) = if box_a <= box_b {
            (box_a, box_b)
        } else {
            (box_b, box_a)
        };
        Self {
            box_a,
            box_b,
            candidate_id,
            merged,
            delta_c,
        }
    }

    /// The symmetric pair key: two candidates over the same boxes compare
    /// equal here regardless of discovery order.
    #[inline]
    pub fn pair(&self) -> (u64, u64) {
        (self.box_a, self.box_b)
    }
}

#[derive(Debug, Clone)]
struct QueueEntry(MergeCandidate);

impl QueueEntry {
    /// Heap ordering: ascending delta, then the pair ids ascending. The id
    /// tail makes equal-cost pops deterministic.
    #[inline]
    fn key(&self) -> (OrdF64, u64, u64) {
        (OrdF64(self.0.delta_c), self.0.box_a, self.0.box_b)
    }
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

/// Min-heap of merge candidates with lazy invalidation.
#[derive(Debug, Default)]
pub struct CandidateQueue {
    heap: BinaryHeap<Reverse<QueueEntry>>,
    retired: FxHashSet<u64>,
}

impl CandidateQueue {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            retired: FxHashSet::default(),
        }
    }

    pub fn push(&mut self, candidate: MergeCandidate) {
        self.heap.push(Reverse(QueueEntry(candidate)));
    }

    pub fn extend(&mut self, candidates: impl IntoIterator<Item = MergeCandidate>) {
        self.heap
            .extend(candidates.into_iter().map(|c| Reverse(QueueEntry(c))));
    }

    /// Mark a box id as retired. Any queued candidate touching it is dead
    /// and will be dropped when it reaches the top of the heap.
    pub fn retire(&mut self, id: u64) {
        self.retired.insert(id);
    }

    /// Pop the cheapest candidate whose boxes are both still live.
    pub fn pop_min(&mut self) -> Option<MergeCandidate> {
        while let Some(Reverse(entry)) = self.heap.pop() {
            let candidate = entry.0;
            if self.retired.contains(&candidate.box_a) || self.retired.contains(&candidate.box_b) {
                continue;
            }
            return Some(candidate);
        }
        None
    }

    /// Number of queued entries. Stale candidates are counted until they
    /// surface, so this is an upper bound on live candidates.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}
