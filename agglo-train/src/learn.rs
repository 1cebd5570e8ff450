//! Classifier training loops.
//!
//! Three entry points share one skeleton: prepare the stack (build RAG,
//! remove inclusions, derive the ground-truth assignment), walk edges,
//! fit the classifier on the collected rows.
//!
//! - **flat**: one pass over all edges in snapshot order, no merges
//! - **queue**: agglomeration order; with `accumulate_all` every decidable
//!   edge contributes a row, otherwise only hard examples where a trained
//!   classifier disagrees with ground truth
//! - **LASH**: queue traversal that starts from a fresh row set and
//!   accumulates everything
//!
//! Edges marked `preserve` or `false_edge` never participate. A label of
//! `-1` (same body) triggers the merge; `+1` leaves the graph untouched.

use crate::classifier::EdgeClassifier;
use crate::combine::PriorityQCombine;
use crate::features::FeatureAggregator;
use crate::oracle::EdgeLabel;
use crate::stack::StackController;
use crate::unique::UniqueRowSet;
use crate::TrainResult;
use agglo_core::priority_queue::MergePriorityQueue;
use log::{debug, info};
use rayon::prelude::*;

/// Outcome of a training pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingReport {
    /// Unique rows the classifier was fit on
    pub rows: usize,
    /// Agreement between the trained classifier and its own training rows,
    /// in percent; informational only
    pub accuracy: f64,
}

/// Single pass over all edges in snapshot order; no merges are performed.
pub fn learn_edge_classifier_flat<F, C>(
    stack: &mut StackController<F, C>,
    use_mito: bool,
    rows: &mut UniqueRowSet,
) -> TrainResult<TrainingReport>
where
    F: FeatureAggregator + Sync,
    C: EdgeClassifier + Sync,
{
    stack.preprocess(use_mito)?;

    let pairs = stack.rag.edge_pairs();
    let rag = &stack.rag;
    let feature_mgr = &stack.feature_mgr;
    let oracle = &stack.oracle;
    let collected: Vec<Vec<f64>> = pairs
        .par_iter()
        .filter_map(|&(u, v)| {
            let edge = rag.find_edge(u, v)?;
            if edge.is_filtered() {
                return None;
            }
            let label = oracle.edge_label(u, v)?;
            let mut row = feature_mgr.compute_all_features(rag, (u, v));
            row.push(label.as_f64());
            Some(row)
        })
        .collect();
    for row in collected {
        rows.insert(row);
    }

    fit_and_report(stack, rows)
}

/// Agglomeration-ordered pass. Edges come off a lazy min-heap by current
/// merge probability; ground-truth merges are applied as they are visited
/// so later features see the evolving graph.
pub fn learn_edge_classifier_queue<F, C>(
    stack: &mut StackController<F, C>,
    threshold: f64,
    use_mito: bool,
    accumulate_all: bool,
    rows: &mut UniqueRowSet,
) -> TrainResult<TrainingReport>
where
    F: FeatureAggregator,
    C: EdgeClassifier,
{
    stack.preprocess(use_mito)?;

    let mut queue = MergePriorityQueue::new();
    for (u, v) in stack.rag.edge_pairs() {
        let filtered = match stack.rag.find_edge(u, v) {
            Some(edge) => edge.is_filtered(),
            None => true,
        };
        if filtered {
            continue;
        }
        let prob = stack
            .feature_mgr
            .get_prob(&stack.rag, (u, v), &stack.classifier);
        if let Some(edge) = stack.rag.find_edge_mut(u, v) {
            edge.weight = prob;
        }
        queue.push(&mut stack.rag, (u, v), prob);
    }
    debug!("seeded merge queue with {} edges", queue.storage_len());

    while let Some(entry) = queue.extract_min() {
        let (l1, l2) = entry.endpoints;
        // stale entries are no-ops, not errors
        if !entry.valid || stack.rag.find_edge(l1, l2).is_none() {
            continue;
        }
        let Some(edge_label) = stack.oracle.edge_label(l1, l2) else {
            continue;
        };

        let feature = stack.feature_mgr.compute_all_features(&stack.rag, (l1, l2));
        if accumulate_all {
            let mut row = feature;
            row.push(edge_label.as_f64());
            rows.insert(row);
        } else if stack.classifier.is_trained() {
            // hard-example mining: keep only rows the current model gets wrong
            let predicted = EdgeLabel::from_prob(stack.classifier.predict(&feature), threshold);
            if predicted != edge_label {
                let mut row = feature;
                row.push(edge_label.as_f64());
                rows.insert(row);
            }
        }

        if edge_label == EdgeLabel::Merge {
            let mut alg = PriorityQCombine::new(
                &mut stack.feature_mgr,
                &stack.classifier,
                &mut queue,
            );
            stack.rag.join_nodes(l1, l2, &mut alg)?;
        }
    }

    fit_and_report(stack, rows)
}

/// Queue traversal that records every decidable edge, starting from a
/// fresh row set.
pub fn learn_edge_classifier_lash<F, C>(
    stack: &mut StackController<F, C>,
    use_mito: bool,
    rows: &mut UniqueRowSet,
) -> TrainResult<TrainingReport>
where
    F: FeatureAggregator,
    C: EdgeClassifier,
{
    rows.clear();
    learn_edge_classifier_queue(stack, 0.0, use_mito, true, rows)
}

/// Fit the classifier and report its agreement with the training rows.
/// The accuracy pass is informational and never alters control flow.
fn fit_and_report<F, C>(
    stack: &mut StackController<F, C>,
    rows: &UniqueRowSet,
) -> TrainResult<TrainingReport>
where
    F: FeatureAggregator,
    C: EdgeClassifier,
{
    let (features, labels) = rows.feature_label_matrix()?;
    info!("features generated: {} unique rows", labels.len());
    if labels.is_empty() {
        return Ok(TrainingReport {
            rows: 0,
            accuracy: 0.0,
        });
    }

    stack.classifier.learn(features.view(), &labels)?;
    info!("classifier learned");

    let mut errors = 0usize;
    for (row, &label) in features.rows().into_iter().zip(&labels) {
        let prob = stack.classifier.predict(&row.to_vec());
        let predicted = if prob > 0.5 { 1 } else { -1 };
        if predicted != label {
            errors += 1;
        }
    }
    let accuracy = 100.0 * (1.0 - errors as f64 / labels.len() as f64);
    info!("accuracy = {:.3}", accuracy);

    Ok(TrainingReport {
        rows: labels.len(),
        accuracy,
    })
}
