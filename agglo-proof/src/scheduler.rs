//! Interactive edge priority scheduler.
//!
//! Presents RAG edges for human review in order of priority to confirm:
//! edges whose weight falls inside the `[min_val, max_val]` window, closest
//! to the `start_val` cursor first. The scheduler borrows the feature
//! aggregator and classifier the same way the training iterator does, so
//! review-time merges fold feature state and refresh merge probabilities
//! exactly like training-time merges. Every destructive action checkpoints
//! enough state, the affected nodes, their edge lists and the feature
//! state, to reconstruct the pre-action session, so `undo` restores it
//! exactly.

use crate::{ProofError, ProofResult};
use agglo_core::graph_io::{read_graph, write_graph};
use agglo_core::priority_queue::MergePriorityQueue;
use agglo_core::{Label, NodeCombineAlg, Rag, RagEdge, RagError, RagNode};
use agglo_train::{CentroidClassifier, EdgeClassifier, FeatureAggregator, MomentFeatures};
use std::collections::BTreeSet;
use std::path::Path;

/// Reject bounds outside `0 <= min <= start <= max <= 1`.
pub fn validate_bounds(min_val: f64, max_val: f64, start_val: f64) -> ProofResult<()> {
    let ok = min_val >= 0.0 && start_val >= min_val && max_val >= start_val && max_val <= 1.0;
    if ok {
        Ok(())
    } else {
        Err(ProofError::InvalidBounds {
            min: min_val,
            max: max_val,
            start: start_val,
        })
    }
}

/// One reviewed edge decision.
#[derive(Debug, Clone, Copy)]
struct Decision {
    /// Edge weight at decision time
    weight: f64,
    /// True when the user merged the two bodies
    merged: bool,
}

/// Checkpoint taken before a destructive action.
#[derive(Debug, Clone)]
enum HistoryRecord<F> {
    /// Node join: both node states, every edge incident to either node,
    /// and the feature state as it stood before the merge
    Merge {
        keep: RagNode,
        remove: RagNode,
        edges: Vec<(Label, Label, RagEdge)>,
        features: F,
    },
    /// Edge marked do-not-merge
    Preserve { endpoints: (Label, Label) },
}

/// Scheduler session over one RAG.
///
/// Generic over the feature aggregator and classifier exactly like
/// `StackController<F, C>`; the pair is taken by value at construction
/// (the ambient process-wide session must own its state) and borrowed
/// mutably by the merge callbacks.
pub struct EdgePriorityScheduler<F, C> {
    rag: Rag,
    features: F,
    classifier: C,
    queue: MergePriorityQueue,
    min_val: f64,
    max_val: f64,
    start_val: f64,
    /// `range` pair from the loaded graph file, echoed back on export
    file_range: Option<[f64; 2]>,
    history: Vec<HistoryRecord<F>>,
    decisions: Vec<Decision>,
    estimated_remaining: u32,
}

impl<F, C> EdgePriorityScheduler<F, C>
where
    F: FeatureAggregator + Clone,
    C: EdgeClassifier,
{
    /// Start a session over an in-memory graph with the given feature
    /// aggregator and classifier.
    pub fn new(
        rag: Rag,
        features: F,
        classifier: C,
        min_val: f64,
        max_val: f64,
        start_val: f64,
    ) -> ProofResult<Self> {
        validate_bounds(min_val, max_val, start_val)?;
        let mut scheduler = Self {
            rag,
            features,
            classifier,
            queue: MergePriorityQueue::new(),
            min_val,
            max_val,
            start_val,
            file_range: None,
            history: Vec::new(),
            decisions: Vec::new(),
            estimated_remaining: 0,
        };
        scheduler.update_priority();
        Ok(scheduler)
    }

    /// Start a session from a graph file. Caller bounds are validated
    /// first; a `range` pair embedded in the file overrides them and
    /// resets the cursor to its lower bound.
    pub fn from_graph_file_with(
        path: &Path,
        features: F,
        classifier: C,
        min_val: f64,
        max_val: f64,
        start_val: f64,
    ) -> ProofResult<Self> {
        validate_bounds(min_val, max_val, start_val)?;
        let (rag, file_range) = read_graph(path)?;
        let (min_val, max_val, start_val) = match file_range {
            Some([lo, hi]) => (lo, hi, lo),
            None => (min_val, max_val, start_val),
        };
        let mut scheduler = Self {
            rag,
            features,
            classifier,
            queue: MergePriorityQueue::new(),
            min_val,
            max_val,
            start_val,
            file_range,
            history: Vec::new(),
            decisions: Vec::new(),
            estimated_remaining: 0,
        };
        scheduler.update_priority();
        Ok(scheduler)
    }

    /// Recompute the review ordering from the current graph.
    pub fn update_priority(&mut self) {
        let mut queue = MergePriorityQueue::new();
        let mut count = 0u32;
        for (u, v) in self.rag.edge_pairs() {
            if !self.in_window(u, v) {
                continue;
            }
            let priority = self.priority_of(u, v);
            queue.push(&mut self.rag, (u, v), priority);
            count += 1;
        }
        self.queue = queue;
        self.estimated_remaining = count;
    }

    /// Distance of the edge weight from the review cursor.
    fn priority_of(&self, u: Label, v: Label) -> f64 {
        self.rag
            .find_edge(u, v)
            .map(|e| (e.weight - self.start_val).abs())
            .unwrap_or(f64::INFINITY)
    }

    fn in_window(&self, u: Label, v: Label) -> bool {
        match self.rag.find_edge(u, v) {
            Some(e) => !e.is_filtered() && e.weight >= self.min_val && e.weight <= self.max_val,
            None => false,
        }
    }

    /// Refresh or retire the queue entry of one edge without recomputing
    /// its weight; used when undo has restored checkpointed weights.
    fn requeue_edge(&mut self, pair: (Label, Label)) {
        if self.in_window(pair.0, pair.1) {
            let priority = self.priority_of(pair.0, pair.1);
            self.queue.reinsert(&mut self.rag, pair, priority);
        } else {
            self.queue.invalidate_edge(&self.rag, pair);
        }
    }

    /// True when no edge remains inside the review window.
    pub fn is_finished(&mut self) -> bool {
        self.queue.peek_valid(&self.rag).is_none()
    }

    /// Highest-priority edge and a representative boundary location.
    /// Does not mutate the session.
    pub fn get_top_edge(&mut self) -> Option<(Label, Label, [u32; 3])> {
        let entry = self.queue.peek_valid(&self.rag)?;
        let (u, v) = entry.endpoints;
        let location = self
            .rag
            .find_edge(u, v)
            .and_then(|e| e.location)
            .unwrap_or([0, 0, 0]);
        Some((u, v, location))
    }

    /// Estimated number of edges still awaiting review. Decreases by one
    /// per decision and grows back on undo.
    pub fn num_remaining(&self) -> u32 {
        self.estimated_remaining
    }

    /// Apply a review decision to the edge `(u, v)`: join the two bodies
    /// when `merge` is true, otherwise mark the edge do-not-merge. The
    /// inverse action is pushed onto the undo stack.
    pub fn remove_edge(&mut self, pair: (Label, Label), merge: bool) -> ProofResult<()> {
        let (u, v) = pair;
        let weight = self
            .rag
            .find_edge(u, v)
            .map(|e| e.weight)
            .ok_or_else(|| {
                ProofError::Rag(RagError::InvariantViolation(format!(
                    "no edge between {} and {}",
                    u, v
                )))
            })?;

        if merge {
            let record = self.checkpoint_merge(u, v)?;
            let mut alg = WindowCombine {
                features: &mut self.features,
                classifier: &self.classifier,
                queue: &mut self.queue,
                min_val: self.min_val,
                max_val: self.max_val,
                start_val: self.start_val,
            };
            self.rag.join_nodes(u, v, &mut alg)?;
            self.history.push(record);
        } else {
            if let Some(edge) = self.rag.find_edge_mut(u, v) {
                edge.preserve = true;
            }
            self.queue.invalidate_edge(&self.rag, pair);
            self.history.push(HistoryRecord::Preserve { endpoints: pair });
        }

        self.decisions.push(Decision { weight, merged: merge });
        self.estimated_remaining = self.estimated_remaining.saturating_sub(1);
        Ok(())
    }

    /// Revert the most recent decision. Returns false when nothing remains
    /// to undo.
    pub fn undo(&mut self) -> ProofResult<bool> {
        let record = match self.history.pop() {
            Some(record) => record,
            None => return Ok(false),
        };

        match record {
            HistoryRecord::Preserve { endpoints } => {
                if let Some(edge) = self.rag.find_edge_mut(endpoints.0, endpoints.1) {
                    edge.preserve = false;
                }
                self.requeue_edge(endpoints);
            }
            HistoryRecord::Merge {
                keep,
                remove,
                edges,
                features,
            } => {
                // retire the merged node's current edges, then rebuild the
                // pre-merge neighborhood and feature state from the
                // checkpoint
                for (u, v) in self.rag.incident_edges(keep.id) {
                    self.queue.invalidate_edge(&self.rag, (u, v));
                    self.rag.remove_edge(u, v);
                }
                let keep_id = keep.id;
                self.rag.remove_isolated_node(keep_id)?;
                self.rag.insert_node(keep)?;
                self.rag.insert_node(remove)?;
                let mut restored = Vec::with_capacity(edges.len());
                for (u, v, edge) in edges {
                    self.rag.insert_edge(u, v, edge)?;
                    restored.push((u, v));
                }
                self.features = features;
                for pair in restored {
                    self.requeue_edge(pair);
                }
            }
        }

        self.decisions.pop();
        self.estimated_remaining = self.estimated_remaining.saturating_add(1);
        Ok(true)
    }

    /// Mean per-decision error of the stored predictions: the weight when
    /// the user merged, its complement when the user kept the boundary.
    pub fn average_prediction_error(&self) -> f64 {
        if self.decisions.is_empty() {
            return 0.0;
        }
        let total: f64 = self
            .decisions
            .iter()
            .map(|d| if d.merged { d.weight } else { 1.0 - d.weight })
            .sum();
        total / self.decisions.len() as f64
    }

    /// Percentage of decisions where the stored prediction side of 0.5
    /// agreed with the user.
    pub fn percent_prediction_correct(&self) -> f64 {
        if self.decisions.is_empty() {
            return 0.0;
        }
        let correct = self
            .decisions
            .iter()
            .filter(|d| (d.weight <= 0.5) == d.merged)
            .count();
        100.0 * correct as f64 / self.decisions.len() as f64
    }

    /// Write the current graph, echoing back any `range` pair the source
    /// file carried.
    pub fn export(&self, path: &Path) -> ProofResult<()> {
        write_graph(path, &self.rag, self.file_range)?;
        Ok(())
    }

    /// Session bounds `(min, max, start)`
    pub fn bounds(&self) -> (f64, f64, f64) {
        (self.min_val, self.max_val, self.start_val)
    }

    /// The underlying graph
    pub fn rag(&self) -> &Rag {
        &self.rag
    }

    /// The feature aggregator carried by this session
    pub fn features(&self) -> &F {
        &self.features
    }

    /// The classifier carried by this session
    pub fn classifier(&self) -> &C {
        &self.classifier
    }

    fn checkpoint_merge(&self, u: Label, v: Label) -> ProofResult<HistoryRecord<F>> {
        let missing =
            |id: Label| ProofError::Rag(RagError::InvariantViolation(format!("unknown node {}", id)));
        let keep = self.rag.node(u).cloned().ok_or_else(|| missing(u))?;
        let remove = self.rag.node(v).cloned().ok_or_else(|| missing(v))?;

        let mut pairs: BTreeSet<(Label, Label)> = BTreeSet::new();
        pairs.extend(self.rag.incident_edges(u));
        pairs.extend(self.rag.incident_edges(v));
        let edges = pairs
            .into_iter()
            .filter_map(|(a, b)| self.rag.find_edge(a, b).map(|e| (a, b, e.clone())))
            .collect();

        Ok(HistoryRecord::Merge {
            keep,
            remove,
            edges,
            features: self.features.clone(),
        })
    }
}

impl EdgePriorityScheduler<MomentFeatures, CentroidClassifier> {
    /// Start a session from a graph file with the built-in geometry
    /// aggregator and an untrained classifier, so merge probabilities fall
    /// back to the weights stored in the file.
    pub fn from_graph_file(
        path: &Path,
        min_val: f64,
        max_val: f64,
        start_val: f64,
    ) -> ProofResult<Self> {
        Self::from_graph_file_with(
            path,
            MomentFeatures::new(),
            CentroidClassifier::new(),
            min_val,
            max_val,
            start_val,
        )
    }
}

/// Combine strategy for review-time merges: feature state folds exactly as
/// during training, surviving edges get a freshly computed probability and
/// are reinserted at window priority.
struct WindowCombine<'a, F: FeatureAggregator, C: EdgeClassifier> {
    features: &'a mut F,
    classifier: &'a C,
    queue: &'a mut MergePriorityQueue,
    min_val: f64,
    max_val: f64,
    start_val: f64,
}

impl<F: FeatureAggregator, C: EdgeClassifier> WindowCombine<'_, F, C> {
    fn requeue(&mut self, rag: &mut Rag, pair: (Label, Label)) {
        if rag.find_edge(pair.0, pair.1).is_none() {
            return;
        }
        let prob = self.features.get_prob(rag, pair, self.classifier);
        if let Some(edge) = rag.find_edge_mut(pair.0, pair.1) {
            edge.weight = prob;
        }
        let in_window = rag
            .find_edge(pair.0, pair.1)
            .map(|e| !e.is_filtered() && e.weight >= self.min_val && e.weight <= self.max_val)
            .unwrap_or(false);
        if in_window {
            let priority = (prob - self.start_val).abs();
            self.queue.reinsert(rag, pair, priority);
        } else {
            self.queue.invalidate_edge(rag, pair);
        }
    }
}

impl<F: FeatureAggregator, C: EdgeClassifier> NodeCombineAlg for WindowCombine<'_, F, C> {
    fn post_edge_join(&mut self, rag: &mut Rag, existing: (Label, Label), removed: (Label, Label)) {
        self.queue.invalidate_edge(rag, removed);
        self.features.merge_features(rag, existing, removed);
        self.requeue(rag, existing);
    }

    fn post_edge_move(&mut self, rag: &mut Rag, moved: (Label, Label), prior: (Label, Label)) {
        self.features.move_features(prior, moved);
        self.requeue(rag, moved);
    }

    fn post_node_join(&mut self, _rag: &mut Rag, keep: Label, remove: Label) {
        self.features.merge_node_features(keep, remove);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agglo_core::graph_io::rag_to_json;
    use agglo_core::ordered_pair;
    use std::collections::HashMap;

    fn sample_rag() -> Rag {
        let mut rag = Rag::new();
        for (id, size, boundary) in [(1, 30, 20), (2, 20, 18), (3, 25, 16), (4, 10, 9)] {
            rag.add_node(id, size).unwrap();
            rag.node_mut(id).unwrap().boundary_size = boundary;
        }
        for (u, v, size, w) in [
            (1, 2, 4, 0.45),
            (1, 3, 3, 0.9),
            (2, 3, 5, 0.52),
            (3, 4, 2, 0.2),
        ] {
            rag.add_edge(u, v, size).unwrap();
            let e = rag.find_edge_mut(u, v).unwrap();
            e.weight = w;
            e.location = Some([u, v, 0]);
        }
        rag
    }

    fn scheduler() -> EdgePriorityScheduler<MomentFeatures, CentroidClassifier> {
        EdgePriorityScheduler::new(
            sample_rag(),
            MomentFeatures::new(),
            CentroidClassifier::new(),
            0.0,
            1.0,
            0.5,
        )
        .unwrap()
    }

    /// Aggregator with observable per-edge and per-node state, for
    /// checking that review-time merges fold it and undo restores it.
    #[derive(Debug, Clone, Default, PartialEq)]
    struct TagFeatures {
        edge_tags: HashMap<(Label, Label), u64>,
        node_tags: HashMap<Label, u64>,
    }

    impl TagFeatures {
        fn seed(rag: &Rag) -> Self {
            let mut tags = Self::default();
            for (u, v) in rag.edge_pairs() {
                tags.edge_tags.insert((u, v), (u * 10 + v) as u64);
            }
            for id in rag.node_labels() {
                tags.node_tags.insert(id, id as u64);
            }
            tags
        }
    }

    impl FeatureAggregator for TagFeatures {
        fn compute_all_features(&self, rag: &Rag, edge: (Label, Label)) -> Vec<f64> {
            vec![rag
                .find_edge(edge.0, edge.1)
                .map(|e| e.size as f64)
                .unwrap_or(0.0)]
        }

        fn merge_features(&mut self, _rag: &Rag, keep: (Label, Label), removed: (Label, Label)) {
            if let Some(tag) = self.edge_tags.remove(&ordered_pair(removed.0, removed.1)) {
                *self
                    .edge_tags
                    .entry(ordered_pair(keep.0, keep.1))
                    .or_insert(0) += tag;
            }
        }

        fn move_features(&mut self, prior: (Label, Label), moved: (Label, Label)) {
            if let Some(tag) = self.edge_tags.remove(&ordered_pair(prior.0, prior.1)) {
                *self
                    .edge_tags
                    .entry(ordered_pair(moved.0, moved.1))
                    .or_insert(0) += tag;
            }
        }

        fn merge_node_features(&mut self, keep: Label, remove: Label) {
            if let Some(tag) = self.node_tags.remove(&remove) {
                *self.node_tags.entry(keep).or_insert(0) += tag;
            }
        }
    }

    fn tag_scheduler() -> EdgePriorityScheduler<TagFeatures, CentroidClassifier> {
        let rag = sample_rag();
        let features = TagFeatures::seed(&rag);
        EdgePriorityScheduler::new(rag, features, CentroidClassifier::new(), 0.0, 1.0, 0.5)
            .unwrap()
    }

    #[test]
    fn test_bounds_validation() {
        assert!(validate_bounds(0.0, 1.0, 0.5).is_ok());
        assert!(matches!(
            validate_bounds(-0.1, 1.0, 0.0),
            Err(ProofError::InvalidBounds { .. })
        ));
        assert!(validate_bounds(0.0, 1.1, 0.5).is_err());
        assert!(validate_bounds(0.6, 1.0, 0.5).is_err());
        assert!(validate_bounds(0.0, 0.4, 0.5).is_err());
        assert!(validate_bounds(f64::NAN, 1.0, 0.5).is_err());
    }

    #[test]
    fn test_top_edge_closest_to_cursor() {
        let mut s = scheduler();
        // |0.52 - 0.5| is the smallest distance
        let (u, v, location) = s.get_top_edge().unwrap();
        assert_eq!((u, v), (2, 3));
        assert_eq!(location, [2, 3, 0]);
        assert_eq!(s.num_remaining(), 4);
    }

    #[test]
    fn test_window_excludes_edges() {
        let mut s = EdgePriorityScheduler::new(
            sample_rag(),
            MomentFeatures::new(),
            CentroidClassifier::new(),
            0.4,
            0.6,
            0.5,
        )
        .unwrap();
        assert_eq!(s.num_remaining(), 2);
        let mut seen = Vec::new();
        while let Some((u, v, _)) = s.get_top_edge() {
            seen.push((u, v));
            s.remove_edge((u, v), false).unwrap();
        }
        assert_eq!(seen, vec![(2, 3), (1, 2)]);
        assert!(s.is_finished());
    }

    #[test]
    fn test_preserved_edge_leaves_window() {
        let mut s = scheduler();
        s.remove_edge((2, 3), false).unwrap();
        assert!(s.rag().find_edge(2, 3).unwrap().preserve);
        let (u, v, _) = s.get_top_edge().unwrap();
        assert_eq!((u, v), (1, 2));
        assert_eq!(s.num_remaining(), 3);
    }

    #[test]
    fn test_merge_updates_review_queue() {
        let mut s = scheduler();
        s.remove_edge((2, 3), true).unwrap();
        assert!(!s.rag().has_node(3));
        // former (1,3) collapsed into (1,2); (3,4) moved to (2,4)
        assert_eq!(s.rag().find_edge(1, 2).unwrap().size, 7);
        assert!(s.rag().find_edge(2, 4).is_some());
        // every surfaced edge is live
        while let Some((u, v, _)) = s.get_top_edge() {
            assert!(s.rag().find_edge(u, v).is_some());
            s.remove_edge((u, v), false).unwrap();
        }
    }

    #[test]
    fn test_merge_folds_feature_state() {
        let mut s = tag_scheduler();
        s.remove_edge((2, 3), true).unwrap();

        // (1,3) collapsed into (1,2); (3,4) re-keyed to (2,4); node 3
        // folded into node 2
        assert_eq!(s.features().edge_tags.get(&(1, 2)), Some(&25));
        assert_eq!(s.features().edge_tags.get(&(2, 4)), Some(&34));
        assert_eq!(s.features().edge_tags.get(&(1, 3)), None);
        assert_eq!(s.features().edge_tags.get(&(3, 4)), None);
        assert_eq!(s.features().node_tags.get(&2), Some(&5));
        assert_eq!(s.features().node_tags.get(&3), None);
    }

    #[test]
    fn test_undo_restores_feature_state() {
        let mut s = tag_scheduler();
        let before = s.features().clone();
        s.remove_edge((2, 3), true).unwrap();
        assert_ne!(*s.features(), before);
        assert!(s.undo().unwrap());
        assert_eq!(*s.features(), before);
    }

    #[test]
    fn test_unknown_edge_rejected() {
        let mut s = scheduler();
        assert!(s.remove_edge((1, 4), true).is_err());
    }

    #[test]
    fn test_undo_empty_stack() {
        let mut s = scheduler();
        assert!(!s.undo().unwrap());
    }

    #[test]
    fn test_undo_preserve_roundtrip() {
        let mut s = scheduler();
        let before = rag_to_json(s.rag(), None).unwrap();
        s.remove_edge((1, 2), false).unwrap();
        assert!(s.undo().unwrap());
        assert_eq!(rag_to_json(s.rag(), None).unwrap(), before);
        assert_eq!(s.num_remaining(), 4);
    }

    #[test]
    fn test_undo_merge_roundtrip() {
        let mut s = scheduler();
        let before = rag_to_json(s.rag(), None).unwrap();
        s.remove_edge((2, 3), true).unwrap();
        assert!(s.undo().unwrap());
        assert_eq!(rag_to_json(s.rag(), None).unwrap(), before);
        // review continues over the restored graph
        assert_eq!(s.get_top_edge().unwrap().0, 2);
    }

    #[test]
    fn test_undo_sequence_roundtrip() {
        let mut s = tag_scheduler();
        let before_graph = rag_to_json(s.rag(), None).unwrap();
        let before_features = s.features().clone();
        s.remove_edge((2, 3), true).unwrap();
        s.remove_edge((1, 2), false).unwrap();
        s.remove_edge((2, 4), true).unwrap();
        while s.undo().unwrap() {}
        assert_eq!(rag_to_json(s.rag(), None).unwrap(), before_graph);
        assert_eq!(*s.features(), before_features);
    }

    #[test]
    fn test_remaining_monotonic_per_decision() {
        let mut s = scheduler();
        let mut last = s.num_remaining();
        for pair in [(2, 3), (1, 2)] {
            s.remove_edge(pair, false).unwrap();
            assert!(s.num_remaining() < last);
            last = s.num_remaining();
        }
    }

    #[test]
    fn test_prediction_statistics() {
        let mut s = scheduler();
        // weight 0.52 kept: error 0.48, prediction (keep) agrees
        s.remove_edge((2, 3), false).unwrap();
        // weight 0.2 merged: error 0.2, prediction (merge) agrees
        s.remove_edge((3, 4), true).unwrap();
        assert!((s.average_prediction_error() - 0.34).abs() < 1e-9);
        assert_eq!(s.percent_prediction_correct(), 100.0);

        // weight 0.45 kept: prediction said merge, disagrees
        s.remove_edge((1, 2), false).unwrap();
        assert!((s.percent_prediction_correct() - 200.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_stats_empty_session() {
        let s = scheduler();
        assert_eq!(s.average_prediction_error(), 0.0);
        assert_eq!(s.percent_prediction_correct(), 0.0);
    }

    #[test]
    fn test_undo_pops_statistics() {
        let mut s = scheduler();
        s.remove_edge((3, 4), true).unwrap();
        assert!(s.average_prediction_error() > 0.0);
        s.undo().unwrap();
        assert_eq!(s.average_prediction_error(), 0.0);
    }

    #[test]
    fn test_range_override_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("graph.json");
        write_graph(&path, &sample_rag(), Some([0.4, 0.6])).unwrap();

        let s = EdgePriorityScheduler::from_graph_file(&path, 0.0, 1.0, 0.9).unwrap();
        assert_eq!(s.bounds(), (0.4, 0.6, 0.4));
    }

    #[test]
    fn test_finishes_when_window_empty() {
        let mut rag = Rag::new();
        rag.add_node(1, 5).unwrap();
        rag.add_node(2, 5).unwrap();
        rag.add_edge(1, 2, 1).unwrap();
        rag.find_edge_mut(1, 2).unwrap().weight = 0.95;
        let mut s = EdgePriorityScheduler::new(
            rag,
            MomentFeatures::new(),
            CentroidClassifier::new(),
            0.0,
            0.5,
            0.25,
        )
        .unwrap();
        assert!(s.is_finished());
        assert!(s.get_top_edge().is_none());
    }
}
