//! Per-edge feature aggregation.
//!
//! The training loops consume features through the [`FeatureAggregator`]
//! trait; [`MomentFeatures`] is the built-in implementation, keeping
//! running intensity moments per edge and per node that fold when regions
//! merge. External extractors plug in through the same trait.

use crate::classifier::EdgeClassifier;
use crate::{TrainError, TrainResult};
use agglo_core::{ordered_pair, Label, Rag};
use ndarray::Array3;
use std::collections::HashMap;

/// Number of columns produced by [`MomentFeatures::compute_all_features`].
pub const MOMENT_FEATURE_WIDTH: usize = 8;

/// Feature state consumed by the training loops and combine strategies.
///
/// `compute_all_features` must be a deterministic function of the current
/// edge and node state so that identical traversals produce identical
/// training sets. The mutating hooks keep any running state coherent as
/// the graph merges; they default to no-ops for stateless aggregators.
pub trait FeatureAggregator {
    /// Feature vector for the edge between two live regions
    fn compute_all_features(&self, rag: &Rag, edge: (Label, Label)) -> Vec<f64>;

    /// Current merge cost for the edge: the classifier prediction once a
    /// model is trained, otherwise the weight stored on the edge.
    fn get_prob(&self, rag: &Rag, edge: (Label, Label), classifier: &dyn EdgeClassifier) -> f64 {
        if classifier.is_trained() {
            classifier.predict(&self.compute_all_features(rag, edge))
        } else {
            rag.find_edge(edge.0, edge.1).map(|e| e.weight).unwrap_or(0.0)
        }
    }

    /// Fold the state of `removed` into `keep` when two parallel edges
    /// collapse during a node join.
    fn merge_features(&mut self, rag: &Rag, keep: (Label, Label), removed: (Label, Label)) {
        let _ = (rag, keep, removed);
    }

    /// Re-key edge state when a join re-endpoints an edge.
    fn move_features(&mut self, prior: (Label, Label), moved: (Label, Label)) {
        let _ = (prior, moved);
    }

    /// Fold node-level state when `remove` is absorbed into `keep`.
    fn merge_node_features(&mut self, keep: Label, remove: Label) {
        let _ = (keep, remove);
    }
}

// ============================================================================
// Running Moments
// ============================================================================

/// Running first and second moments with extrema.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentStats {
    pub count: f64,
    pub sum: f64,
    pub sum_sq: f64,
    pub min: f64,
    pub max: f64,
}

impl Default for MomentStats {
    fn default() -> Self {
        Self {
            count: 0.0,
            sum: 0.0,
            sum_sq: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl MomentStats {
    /// Accumulate one sample
    pub fn accumulate(&mut self, value: f64) {
        self.count += 1.0;
        self.sum += value;
        self.sum_sq += value * value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    /// Fold another accumulator into this one
    pub fn fold(&mut self, other: &MomentStats) {
        self.count += other.count;
        self.sum += other.sum;
        self.sum_sq += other.sum_sq;
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0.0 {
            0.0
        } else {
            self.sum / self.count
        }
    }

    pub fn stddev(&self) -> f64 {
        if self.count == 0.0 {
            return 0.0;
        }
        let mean = self.mean();
        (self.sum_sq / self.count - mean * mean).max(0.0).sqrt()
    }
}

// ============================================================================
// Moment Features
// ============================================================================

/// Geometry plus running intensity moments per edge and per node.
#[derive(Debug, Clone, Default)]
pub struct MomentFeatures {
    edge_stats: HashMap<(Label, Label), MomentStats>,
    node_stats: HashMap<Label, MomentStats>,
}

impl MomentFeatures {
    /// Geometry-only aggregator with no intensity state
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed intensity moments from a label volume and a matching gray
    /// volume: per-node moments over region voxels, per-edge moments over
    /// the voxels on either side of each boundary face.
    pub fn from_volumes(labels: &Array3<u32>, gray: &Array3<f64>) -> TrainResult<Self> {
        if labels.dim() != gray.dim() {
            return Err(TrainError::DimensionMismatch {
                expected: labels.dim(),
                found: gray.dim(),
            });
        }
        let mut state = Self::default();
        let (nx, ny, nz) = labels.dim();
        for x in 0..nx {
            for y in 0..ny {
                for z in 0..nz {
                    let l = labels[[x, y, z]];
                    if l != 0 {
                        state.node_stats.entry(l).or_default().accumulate(gray[[x, y, z]]);
                    }
                    for (xx, yy, zz) in forward_neighbors(x, y, z, nx, ny, nz) {
                        let m = labels[[xx, yy, zz]];
                        if l != 0 && m != 0 && l != m {
                            let stats = state.edge_stats.entry(ordered_pair(l, m)).or_default();
                            stats.accumulate(gray[[x, y, z]]);
                            stats.accumulate(gray[[xx, yy, zz]]);
                        }
                    }
                }
            }
        }
        Ok(state)
    }

    /// Edge accumulator, zeroed when no intensity data exists
    pub fn edge_stats(&self, edge: (Label, Label)) -> MomentStats {
        self.edge_stats
            .get(&ordered_pair(edge.0, edge.1))
            .copied()
            .unwrap_or_default()
    }

    /// Node accumulator, zeroed when no intensity data exists
    pub fn node_stats(&self, id: Label) -> MomentStats {
        self.node_stats.get(&id).copied().unwrap_or_default()
    }
}

/// In-bounds forward neighbors along +x, +y, +z.
pub(crate) fn forward_neighbors(
    x: usize,
    y: usize,
    z: usize,
    nx: usize,
    ny: usize,
    nz: usize,
) -> impl Iterator<Item = (usize, usize, usize)> {
    let mut out = Vec::with_capacity(3);
    if x + 1 < nx {
        out.push((x + 1, y, z));
    }
    if y + 1 < ny {
        out.push((x, y + 1, z));
    }
    if z + 1 < nz {
        out.push((x, y, z + 1));
    }
    out.into_iter()
}

impl FeatureAggregator for MomentFeatures {
    fn compute_all_features(&self, rag: &Rag, edge: (Label, Label)) -> Vec<f64> {
        let key = ordered_pair(edge.0, edge.1);
        let (e, n1, n2) = match (rag.find_edge(key.0, key.1), rag.node(key.0), rag.node(key.1)) {
            (Some(e), Some(n1), Some(n2)) => (e, n1, n2),
            _ => return vec![0.0; MOMENT_FEATURE_WIDTH],
        };

        let small = n1.size.min(n2.size) as f64;
        let large = n1.size.max(n2.size) as f64;
        let min_boundary = n1.boundary_size.min(n2.boundary_size).max(1) as f64;
        let es = self.edge_stats(key);
        let d1 = self.node_stats(key.0);
        let d2 = self.node_stats(key.1);

        vec![
            e.size as f64,
            small,
            large,
            e.size as f64 / min_boundary,
            es.mean(),
            es.stddev(),
            (d1.mean() - d2.mean()).abs(),
            d1.stddev() + d2.stddev(),
        ]
    }

    fn merge_features(&mut self, _rag: &Rag, keep: (Label, Label), removed: (Label, Label)) {
        if let Some(stats) = self.edge_stats.remove(&ordered_pair(removed.0, removed.1)) {
            self.edge_stats
                .entry(ordered_pair(keep.0, keep.1))
                .or_default()
                .fold(&stats);
        }
    }

    fn move_features(&mut self, prior: (Label, Label), moved: (Label, Label)) {
        if let Some(stats) = self.edge_stats.remove(&ordered_pair(prior.0, prior.1)) {
            self.edge_stats
                .entry(ordered_pair(moved.0, moved.1))
                .or_default()
                .fold(&stats);
        }
    }

    fn merge_node_features(&mut self, keep: Label, remove: Label) {
        if let Some(stats) = self.node_stats.remove(&remove) {
            self.node_stats.entry(keep).or_default().fold(&stats);
        }
    }
}
