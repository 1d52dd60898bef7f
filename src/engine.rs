//! Greedy merge engine.
//!
//! Takes a set of 3D boxes and repeatedly merges the pair whose combined
//! hull is cheapest, until no merge is worth its cost. Each iteration pops
//! the cheapest candidate from the queue, replaces its two boxes with their
//! hull, and generates fresh candidates between the hull and its neighbors
//! from the spatial index. The run ends when the queue is exhausted or the
//! cheapest remaining candidate would add volume beyond the allowed slack.
//!
//! A run is fully deterministic for a fixed input and id sequence: index
//! hits are consumed in id order, and equal-cost candidates are broken by
//! their pair ids.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::cost::{delta_c, padded_bounds};
use crate::error::{EngineError, EngineResult};
use crate::ids::{IdSource, UuidIds};
use crate::index::{BoxIndex, IndexedBox};
use crate::queue::{CandidateQueue, MergeCandidate};
use prismerge_types::bounds::Bounds;
use prismerge_types::prism::Prism;

/// A box as the engine sees it: bounds plus identity and provenance.
///
/// Input boxes carry their label and no parents; boxes created by merging
/// carry the pair of ids they replaced and no label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryBox {
    pub id: u64,
    pub bounds: Bounds,
    pub label: Option<String>,
    /// The two boxes merged to produce this one, `None` for inputs.
    pub parents: Option<(u64, u64)>,
}

impl QueryBox {
    /// An input box: known bounds, optional label, no provenance.
    pub fn new(id: u64, bounds: Bounds, label: Option<String>) -> Self {
        Self {
            id,
            bounds,
            label,
            parents: None,
        }
    }

    /// Convert an ingested prism to its engine-side box.
    pub fn from_prism(prism: &Prism) -> Self {
        Self {
            id: prism.uuid,
            bounds: prism.bounds(),
            label: Some(prism.name.clone()),
            parents: None,
        }
    }
}

/// Registry entry for a box that was active at some point during a run.
#[derive(Debug, Clone, Copy)]
struct BoxNode {
    bounds: Bounds,
    parents: Option<(u64, u64)>,
}

/// Result of a merge run: the surviving boxes plus the full merge tree.
///
/// Surviving boxes keep input order, with merged boxes appended in
/// creation order. The registry holds every box that was ever active, so
/// the provenance of any result can be walked back to the original inputs.
#[derive(Debug)]
pub struct MergeOutcome {
    boxes: Vec<QueryBox>,
    duplicates_removed: usize,
    merges_applied: usize,
    registry: FxHashMap<u64, BoxNode>,
}

impl MergeOutcome {
    /// The surviving boxes, in deterministic output order.
    pub fn boxes(&self) -> &[QueryBox] {
        &self.boxes
    }

    pub fn into_boxes(self) -> Vec<QueryBox> {
        self.boxes
    }

    /// How many exact-duplicate input boxes were collapsed before merging.
    pub fn duplicates_removed(&self) -> usize {
        self.duplicates_removed
    }

    /// How many merges the run applied.
    pub fn merges_applied(&self) -> usize {
        self.merges_applied
    }

    /// Bounds of any box that was ever active, surviving or merged away.
    pub fn node_bounds(&self, id: u64) -> Option<Bounds> {
        self.registry.get(&id).map(|node| node.bounds)
    }

    /// The pair of boxes merged into `id`, if `id` was created by a merge.
    pub fn parents(&self, id: u64) -> Option<(u64, u64)> {
        self.registry.get(&id).and_then(|node| node.parents)
    }

    /// Every id transitively merged into `id`, intermediates included.
    ///
    /// The order is the post-order walk of the merge tree: each node's
    /// lineage is its first parent's lineage, then its second parent's,
    /// then the pair itself. Input boxes have an empty lineage.
    pub fn lineage(&self, id: u64) -> Vec<u64> {
        enum Step {
            Visit(u64),
            Emit(u64, u64),
        }

        let mut out = Vec::new();
        let mut stack = vec![Step::Visit(id)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Visit(node_id) => {
                    if let Some((a, b)) = self.parents(node_id) {
                        stack.push(Step::Emit(a, b));
                        stack.push(Step::Visit(b));
                        stack.push(Step::Visit(a));
                    }
                }
                Step::Emit(a, b) => {
                    out.push(a);
                    out.push(b);
                }
            }
        }
        out
    }

    /// The original input boxes merged into `id`, in lineage order.
    pub fn leaves(&self, id: u64) -> Vec<u64> {
        self.lineage(id)
            .into_iter()
            .filter(|ancestor| self.parents(*ancestor).is_none())
            .collect()
    }
}

/// The greedy merger. Configure, then consume with [`GreedyMerger::run`];
/// a finished run cannot be resumed or rerun.
///
/// # Examples
///
/// ```rust
/// use prismerge::engine::{GreedyMerger, QueryBox};
/// use prismerge::ids::SequentialIds;
/// use prismerge_types::bounds::Bounds;
///
/// let boxes = vec![
///     QueryBox::new(1, Bounds::new(0.0, 0.0, 0.0, 1.0, 1.0, 1.0), None),
///     QueryBox::new(2, Bounds::new(0.0, 0.0, 0.0, 1.0, 1.0, 1.0), None),
/// ];
/// let outcome = GreedyMerger::new()
///     .with_ids(SequentialIds::starting_at(100))
///     .run(boxes)
///     .unwrap();
/// assert_eq!(outcome.boxes().len(), 1);
/// ```
pub struct GreedyMerger {
    coef: f64,
    ids: Box<dyn IdSource>,
}

impl GreedyMerger {
    /// A merger with zero slack and random ids.
    pub fn new() -> Self {
        Self {
            coef: 0.0,
            ids: Box::new(UuidIds::new()),
        }
    }

    /// Set the slack coefficient. Must be finite and non-negative; checked
    /// when the run starts.
    pub fn with_coef(mut self, coef: f64) -> Self {
        self.coef = coef;
        self
    }

    /// Replace the id source, typically with [`crate::ids::SequentialIds`]
    /// for reproducible runs.
    pub fn with_ids(mut self, ids: impl IdSource + 'static) -> Self {
        self.ids = Box::new(ids);
        self
    }

    /// Run the merge to completion over `boxes`.
    ///
    /// # Errors
    ///
    /// [`EngineError::InvalidInput`] for a bad coefficient, invalid bounds,
    /// or a repeated box id; [`EngineError::DegeneratePadding`] when a
    /// nonzero coefficient meets a zero-length axis;
    /// [`EngineError::IndexConsistency`] if internal bookkeeping and the
    /// index ever disagree.
    pub fn run(mut self, boxes: Vec<QueryBox>) -> EngineResult<MergeOutcome> {
        if !self.coef.is_finite() || self.coef < 0.0 {
            return Err(EngineError::InvalidInput(format!(
                "slack coefficient must be finite and non-negative, got {}",
                self.coef
            )));
        }
        for b in &boxes {
            b.bounds
                .validate()
                .map_err(|e| EngineError::InvalidInput(format!("box {}: {}", b.id, e)))?;
        }

        let total = boxes.len();
        let mut registry: FxHashMap<u64, BoxNode> = FxHashMap::default();
        if total < 2 {
            for b in &boxes {
                registry.insert(
                    b.id,
                    BoxNode {
                        bounds: b.bounds,
                        parents: b.parents,
                    },
                );
            }
            return Ok(MergeOutcome {
                boxes,
                duplicates_removed: 0,
                merges_applied: 0,
                registry,
            });
        }

        // Slot arena: survivors keep their input position, merged boxes
        // append. Tombstones never get reused, which is what makes the
        // output order reproducible.
        let mut arena: Vec<Option<QueryBox>> = Vec::with_capacity(total);
        let mut slots: FxHashMap<u64, usize> = FxHashMap::default();
        let mut seen_bounds: FxHashSet<[u64; 6]> = FxHashSet::default();
        let mut duplicates = 0usize;

        for b in boxes {
            if slots.contains_key(&b.id) {
                return Err(EngineError::InvalidInput(format!(
                    "box id {} appears more than once",
                    b.id
                )));
            }
            if !seen_bounds.insert(bounds_key(&b.bounds)) {
                duplicates += 1;
                continue;
            }
            registry.insert(
                b.id,
                BoxNode {
                    bounds: b.bounds,
                    parents: b.parents,
                },
            );
            slots.insert(b.id, arena.len());
            arena.push(Some(b));
        }
        log::info!("collapsed {} duplicate boxes", duplicates);

        log::info!("indexing {} boxes", arena.len());
        let entries: Vec<IndexedBox> = arena
            .iter()
            .flatten()
            .map(|b| IndexedBox {
                id: b.id,
                bounds: b.bounds,
            })
            .collect();
        let mut index = BoxIndex::bulk_load(entries);

        // Seed one candidate per overlapping pair. Both members of a pair
        // can discover each other, so pairs are deduplicated before an id
        // is drawn for them.
        let mut queue = CandidateQueue::new();
        let mut seen_pairs: FxHashSet<(u64, u64)> = FxHashSet::default();
        for slot in 0..arena.len() {
            let Some(b) = &arena[slot] else { continue };
            let (id, bounds) = (b.id, b.bounds);
            let window = padded_bounds(&bounds, self.coef)?;
            for hit in index.query_overlap(&window, id) {
                let pair = if id <= hit.id { (id, hit.id) } else { (hit.id, id) };
                if !seen_pairs.insert(pair) {
                    continue;
                }
                let merged = bounds.combined(&hit.bounds);
                let dc = delta_c(&bounds, &hit.bounds, &merged, self.coef);
                queue.push(MergeCandidate::new(
                    id,
                    hit.id,
                    self.ids.next_id(),
                    merged,
                    dc,
                ));
            }
        }
        log::info!("seeded {} merge candidates", queue.len());

        let mut merges = 0usize;
        while let Some(candidate) = queue.pop_min() {
            if candidate.delta_c > 0.0 {
                break;
            }

            let slot_a = *slots.get(&candidate.box_a).ok_or_else(|| {
                EngineError::IndexConsistency(format!(
                    "live candidate references unknown box {}",
                    candidate.box_a
                ))
            })?;
            let slot_b = *slots.get(&candidate.box_b).ok_or_else(|| {
                EngineError::IndexConsistency(format!(
                    "live candidate references unknown box {}",
                    candidate.box_b
                ))
            })?;
            let a = arena[slot_a].take().ok_or_else(|| {
                EngineError::IndexConsistency(format!("box {} already vacated", candidate.box_a))
            })?;
            let b = arena[slot_b].take().ok_or_else(|| {
                EngineError::IndexConsistency(format!("box {} already vacated", candidate.box_b))
            })?;

            index.remove(a.id, &a.bounds)?;
            index.remove(b.id, &b.bounds)?;
            slots.remove(&a.id);
            slots.remove(&b.id);
            queue.retire(a.id);
            queue.retire(b.id);

            log::debug!(
                "merging {} + {} -> {} (delta_c {})",
                a.id,
                b.id,
                candidate.candidate_id,
                candidate.delta_c
            );

            let merged = QueryBox {
                id: candidate.candidate_id,
                bounds: candidate.merged,
                label: None,
                parents: Some((candidate.box_a, candidate.box_b)),
            };
            registry.insert(
                merged.id,
                BoxNode {
                    bounds: merged.bounds,
                    parents: merged.parents,
                },
            );
            index.insert(merged.id, merged.bounds);
            slots.insert(merged.id, arena.len());
            let (merged_id, merged_bounds) = (merged.id, merged.bounds);
            arena.push(Some(merged));

            let window = padded_bounds(&merged_bounds, self.coef)?;
            for hit in index.query_overlap(&window, merged_id) {
                let hull = merged_bounds.combined(&hit.bounds);
                let dc = delta_c(&merged_bounds, &hit.bounds, &hull, self.coef);
                queue.push(MergeCandidate::new(
                    merged_id,
                    hit.id,
                    self.ids.next_id(),
                    hull,
                    dc,
                ));
            }

            merges += 1;
        }

        let surviving: Vec<QueryBox> = arena.into_iter().flatten().collect();
        log::info!(
            "merge finished: {} merges applied, {} boxes in the final search space",
            merges,
            surviving.len()
        );

        Ok(MergeOutcome {
            boxes: surviving,
            duplicates_removed: duplicates,
            merges_applied: merges,
            registry,
        })
    }
}

impl Default for GreedyMerger {
    fn default() -> Self {
        Self::new()
    }
}

/// Exact-equality key for duplicate detection. Adding 0.0 folds -0.0 into
/// +0.0 so the two zero encodings compare equal.
fn bounds_key(b: &Bounds) -> [u64; 6] {
    [
        (b.xmin + 0.0).to_bits(),
        (b.ymin + 0.0).to_bits(),
        (b.tmin + 0.0).to_bits(),
        (b.xmax + 0.0).to_bits(),
        (b.ymax + 0.0).to_bits(),
        (b.tmax + 0.0).to_bits(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequentialIds;

    fn unit_box(id: u64, origin: f64) -> QueryBox {
        QueryBox::new(
            id,
            Bounds::new(
                origin,
                origin,
                origin,
                origin + 1.0,
                origin + 1.0,
                origin + 1.0,
            ),
            None,
        )
    }

    fn merger() -> GreedyMerger {
        GreedyMerger::new().with_ids(SequentialIds::starting_at(1000))
    }

    #[test]
    fn test_empty_input_gives_empty_outcome() {
        let outcome = merger().run(Vec::new()).unwrap();
        assert!(outcome.boxes().is_empty());
        assert_eq!(outcome.duplicates_removed(), 0);
        assert_eq!(outcome.merges_applied(), 0);
    }

    #[test]
    fn test_single_box_passes_through() {
        let outcome = merger().run(vec![unit_box(1, 0.0)]).unwrap();
        assert_eq!(outcome.boxes().len(), 1);
        assert_eq!(outcome.boxes()[0].id, 1);
        assert_eq!(outcome.merges_applied(), 0);
        assert!(outcome.lineage(1).is_empty());
    }

    #[test]
    fn test_duplicates_collapse_to_first() {
        let boxes = vec![unit_box(1, 0.0), unit_box(2, 0.0), unit_box(3, 0.0)];
        let outcome = merger().run(boxes).unwrap();
        assert_eq!(outcome.duplicates_removed(), 2);
        assert_eq!(outcome.boxes().len(), 1);
        assert_eq!(outcome.boxes()[0].id, 1);
        assert_eq!(outcome.merges_applied(), 0);
    }

    #[test]
    fn test_negative_coef_rejected() {
        let result = merger().with_coef(-1.0).run(vec![unit_box(1, 0.0)]);
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_non_finite_coef_rejected() {
        let result = merger().with_coef(f64::NAN).run(Vec::new());
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_invalid_bounds_rejected() {
        let bad = QueryBox::new(1, Bounds::new(2.0, 0.0, 0.0, 1.0, 1.0, 1.0), None);
        let result = merger().run(vec![bad]);
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_repeated_id_rejected() {
        let boxes = vec![unit_box(5, 0.0), unit_box(5, 10.0)];
        let result = merger().run(boxes);
        assert!(matches!(result, Err(EngineError::InvalidInput(_))));
    }

    #[test]
    fn test_two_overlapping_boxes_merge_with_lineage() {
        let a = QueryBox::new(1, Bounds::new(0.0, 0.0, 0.0, 2.0, 2.0, 2.0), None);
        let b = QueryBox::new(2, Bounds::new(1.0, 1.0, 1.0, 2.0, 2.0, 2.0), None);
        let outcome = merger().run(vec![a, b]).unwrap();

        assert_eq!(outcome.boxes().len(), 1);
        let merged = &outcome.boxes()[0];
        assert_eq!(merged.id, 1000);
        assert_eq!(merged.bounds, Bounds::new(0.0, 0.0, 0.0, 2.0, 2.0, 2.0));
        assert_eq!(merged.parents, Some((1, 2)));
        assert_eq!(outcome.lineage(merged.id), vec![1, 2]);
        assert_eq!(outcome.leaves(merged.id), vec![1, 2]);
    }

    #[test]
    fn test_chained_merge_lineage_includes_intermediates() {
        // Three nested boxes collapse pairwise; the final lineage walks
        // through the intermediate merge id.
        let boxes = vec![
            QueryBox::new(1, Bounds::new(0.0, 0.0, 0.0, 4.0, 4.0, 4.0), None),
            QueryBox::new(2, Bounds::new(0.0, 0.0, 0.0, 3.0, 4.0, 4.0), None),
            QueryBox::new(3, Bounds::new(0.0, 0.0, 0.0, 4.0, 4.0, 3.0), None),
        ];
        let outcome = merger().run(boxes).unwrap();

        assert_eq!(outcome.boxes().len(), 1);
        let root = outcome.boxes()[0].id;
        let lineage = outcome.lineage(root);
        assert_eq!(lineage.len(), 4);
        let leaves = outcome.leaves(root);
        assert_eq!(leaves.len(), 3);
        for id in [1, 2, 3] {
            assert!(leaves.contains(&id));
        }
        // One intermediate node: in the lineage, absent from the leaves.
        assert_eq!(
            lineage.iter().filter(|id| !leaves.contains(id)).count(),
            1
        );
    }

    #[test]
    fn test_registry_keeps_merged_away_bounds() {
        let a = QueryBox::new(1, Bounds::new(0.0, 0.0, 0.0, 2.0, 2.0, 2.0), None);
        let b = QueryBox::new(2, Bounds::new(1.0, 1.0, 1.0, 3.0, 3.0, 3.0), None);
        let outcome = merger().run(vec![a, b]).unwrap();

        assert_eq!(
            outcome.node_bounds(1),
            Some(Bounds::new(0.0, 0.0, 0.0, 2.0, 2.0, 2.0))
        );
        assert_eq!(
            outcome.node_bounds(2),
            Some(Bounds::new(1.0, 1.0, 1.0, 3.0, 3.0, 3.0))
        );
        assert!(outcome.node_bounds(999).is_none());
    }

    #[test]
    fn test_label_survives_on_unmerged_box() {
        let a = QueryBox::new(1, Bounds::new(0.0, 0.0, 0.0, 1.0, 1.0, 1.0), Some("kept".into()));
        let b = QueryBox::new(2, Bounds::new(50.0, 50.0, 50.0, 51.0, 51.0, 51.0), Some("also".into()));
        let outcome = merger().run(vec![a, b]).unwrap();

        assert_eq!(outcome.boxes().len(), 2);
        assert_eq!(outcome.boxes()[0].label.as_deref(), Some("kept"));
        assert_eq!(outcome.boxes()[1].label.as_deref(), Some("also"));
    }

    #[test]
    fn test_degenerate_padding_surfaces() {
        let flat = QueryBox::new(1, Bounds::new(0.0, 0.0, 0.0, 1.0, 1.0, 0.0), None);
        let other = QueryBox::new(2, Bounds::new(0.0, 0.0, 0.0, 1.0, 1.0, 1.0), None);
        let result = merger().with_coef(1.0).run(vec![flat, other]);
        assert!(matches!(result, Err(EngineError::DegeneratePadding(_))));
    }
}
