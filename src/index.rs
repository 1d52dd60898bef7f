//! 3D spatial index over box bounds, backed by an R-tree.
//!
//! The merge engine asks one question of this index, many times: which
//! active boxes overlap a given query window? Entries are stored under
//! their raw bounds; any widening of the search (the padding coefficient)
//! happens in the window the caller passes, never in the stored geometry.

use rstar::{AABB, RTree, RTreeObject};
use smallvec::SmallVec;

use crate::error::{EngineError, EngineResult};
use prismerge_types::bounds::Bounds;

/// An index entry: a box id paired with its raw bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndexedBox {
    pub id: u64,
    pub bounds: Bounds,
}

impl RTreeObject for IndexedBox {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bounds.min_corner(), self.bounds.max_corner())
    }
}

/// Overlap query results. Hit lists are short for typical merge workloads,
/// so small batches stay off the heap.
pub type IndexHits = SmallVec<[IndexedBox; 8]>;

/// Spatial index over the engine's active boxes.
///
/// Insertions and removals always travel in (id, bounds) pairs; a removal
/// that does not find its exact entry is an internal invariant violation
/// and surfaces as [`EngineError::IndexConsistency`].
#[derive(Debug, Default)]
pub struct BoxIndex {
    tree: RTree<IndexedBox>,
}

impl BoxIndex {
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Build an index from a set of boxes in one pass.
    pub fn bulk_load(entries: Vec<IndexedBox>) -> Self {
        Self {
            tree: RTree::bulk_load(entries),
        }
    }

    /// Insert a box under its id.
    pub fn insert(&mut self, id: u64, bounds: Bounds) {
        self.tree.insert(IndexedBox { id, bounds });
    }

    /// Remove the exact (id, bounds) entry.
    ///
    /// # Errors
    ///
    /// [`EngineError::IndexConsistency`] if the entry is not present: the
    /// caller believed a box was active that the index does not hold.
    pub fn remove(&mut self, id: u64, bounds: &Bounds) -> EngineResult<()> {
        let entry = IndexedBox {
            id,
            bounds: *bounds,
        };
        match self.tree.remove(&entry) {
            Some(_) => Ok(()),
            None => Err(EngineError::IndexConsistency(format!(
                "removal of box {} found no index entry at {:?}",
                id, bounds
            ))),
        }
    }

    /// All entries whose bounds overlap `window` on every axis, excluding
    /// the entry with id `excluding`.
    ///
    /// Intervals are closed: boxes that only share a face are hits. Results
    /// come back sorted by id; the underlying tree iterates in an
    /// unspecified order, and downstream candidate generation needs a
    /// stable one.
    pub fn query_overlap(&self, window: &Bounds, excluding: u64) -> IndexHits {
        let envelope = AABB::from_corners(window.min_corner(), window.max_corner());
        let mut hits: IndexHits = self
            .tree
            .locate_in_envelope_intersecting(&envelope)
            .filter(|entry| entry.id != excluding)
            .copied()
            .collect();
        hits.sort_unstable_by_key(|entry| entry.id);
        hits
    }

    pub fn len(&self) -> usize {
        self.tree.size()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }
}
