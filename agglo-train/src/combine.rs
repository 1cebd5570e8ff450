//! Combine strategies that keep external state coherent during node joins.
//!
//! [`FeatureCombine`] folds feature accumulators only and is used before a
//! merge queue exists (inclusion removal). [`PriorityQCombine`] additionally
//! maintains the lazy merge queue: stale entries are invalidated and every
//! surviving edge incident to the join is reinserted at a freshly computed
//! probability.

use crate::classifier::EdgeClassifier;
use crate::features::FeatureAggregator;
use agglo_core::priority_queue::MergePriorityQueue;
use agglo_core::{Label, NodeCombineAlg, Rag};

/// Feature folding only; no queue involved.
pub struct FeatureCombine<'a, F: FeatureAggregator> {
    features: &'a mut F,
}

impl<'a, F: FeatureAggregator> FeatureCombine<'a, F> {
    pub fn new(features: &'a mut F) -> Self {
        Self { features }
    }
}

impl<F: FeatureAggregator> NodeCombineAlg for FeatureCombine<'_, F> {
    fn post_edge_join(&mut self, rag: &mut Rag, existing: (Label, Label), removed: (Label, Label)) {
        self.features.merge_features(rag, existing, removed);
    }

    fn post_edge_move(&mut self, _rag: &mut Rag, moved: (Label, Label), prior: (Label, Label)) {
        self.features.move_features(prior, moved);
    }

    fn post_node_join(&mut self, _rag: &mut Rag, keep: Label, remove: Label) {
        self.features.merge_node_features(keep, remove);
    }
}

/// Feature folding plus lazy queue maintenance.
pub struct PriorityQCombine<'a, F: FeatureAggregator, C: EdgeClassifier> {
    features: &'a mut F,
    classifier: &'a C,
    queue: &'a mut MergePriorityQueue,
}

impl<'a, F: FeatureAggregator, C: EdgeClassifier> PriorityQCombine<'a, F, C> {
    pub fn new(
        features: &'a mut F,
        classifier: &'a C,
        queue: &'a mut MergePriorityQueue,
    ) -> Self {
        Self {
            features,
            classifier,
            queue,
        }
    }

    /// Refresh the queue entry for a surviving edge. Filtered edges are
    /// only invalidated so they never enter the traversal.
    fn requeue(&mut self, rag: &mut Rag, pair: (Label, Label)) {
        let filtered = rag
            .find_edge(pair.0, pair.1)
            .map(|e| e.is_filtered())
            .unwrap_or(true);
        if filtered {
            self.queue.invalidate_edge(rag, pair);
            return;
        }
        let prob = self.features.get_prob(rag, pair, self.classifier);
        if let Some(edge) = rag.find_edge_mut(pair.0, pair.1) {
            edge.weight = prob;
        }
        self.queue.reinsert(rag, pair, prob);
    }
}

impl<F: FeatureAggregator, C: EdgeClassifier> NodeCombineAlg for PriorityQCombine<'_, F, C> {
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
