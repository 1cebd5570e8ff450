//! Stack controller.
//!
//! Owns the in-memory volumes, the RAG built from them, the feature
//! aggregator and the classifier. Raster decoding stays external: volumes
//! arrive as `ndarray` arrays, interpreted as `(x, y, z)`. Label 0 marks
//! boundary voxels and belongs to no region.

use crate::classifier::EdgeClassifier;
use crate::combine::FeatureCombine;
use crate::features::{forward_neighbors, FeatureAggregator};
use crate::oracle::GroundTruthOracle;
use crate::{TrainError, TrainResult};
use agglo_core::{ordered_pair, Label, Rag};
use log::info;
use ndarray::Array3;
use std::collections::{HashMap, HashSet};

/// Segmentation label field
pub type LabelVolume = Array3<u32>;
/// Grayscale intensity field
pub type GrayVolume = Array3<f64>;

/// Owner of the agglomeration state for one segmentation stack.
pub struct StackController<F, C> {
    labels: LabelVolume,
    groundtruth: Option<LabelVolume>,
    pub rag: Rag,
    pub feature_mgr: F,
    pub classifier: C,
    pub oracle: GroundTruthOracle,
    mito_regions: HashSet<Label>,
    rag_built: bool,
    assignment_done: bool,
}

impl<F: FeatureAggregator, C: EdgeClassifier> StackController<F, C> {
    /// Create a controller over a label volume.
    pub fn new(labels: LabelVolume, feature_mgr: F, classifier: C) -> TrainResult<Self> {
        if labels.is_empty() {
            return Err(TrainError::MissingVolume("label"));
        }
        Ok(Self {
            labels,
            groundtruth: None,
            rag: Rag::new(),
            feature_mgr,
            classifier,
            oracle: GroundTruthOracle::default(),
            mito_regions: HashSet::new(),
            rag_built: false,
            assignment_done: false,
        })
    }

    /// Wrap an externally built RAG, e.g. one loaded from a graph file.
    pub fn from_rag(rag: Rag, feature_mgr: F, classifier: C) -> Self {
        Self {
            labels: LabelVolume::zeros((0, 0, 0)),
            groundtruth: None,
            rag,
            feature_mgr,
            classifier,
            oracle: GroundTruthOracle::default(),
            mito_regions: HashSet::new(),
            rag_built: true,
            assignment_done: false,
        }
    }

    /// Attach the ground-truth label volume. Shapes must match.
    pub fn set_groundtruth(&mut self, groundtruth: LabelVolume) -> TrainResult<()> {
        if !self.labels.is_empty() && groundtruth.dim() != self.labels.dim() {
            return Err(TrainError::DimensionMismatch {
                expected: self.labels.dim(),
                found: groundtruth.dim(),
            });
        }
        self.groundtruth = Some(groundtruth);
        Ok(())
    }

    /// Supply a precomputed oracle instead of overlap counting.
    pub fn set_oracle(&mut self, oracle: GroundTruthOracle) {
        self.oracle = oracle;
        self.assignment_done = true;
    }

    /// Regions classified as mitochondria, used by the oracle override.
    pub fn set_mito_regions(&mut self, regions: HashSet<Label>) {
        self.mito_regions = regions;
    }

    /// Number of live regions
    pub fn num_labels(&self) -> usize {
        self.rag.node_count()
    }

    /// Release the RAG, feature aggregator and classifier, e.g. to hand
    /// them to a proofreading scheduler after training.
    pub fn into_parts(self) -> (Rag, F, C) {
        (self.rag, self.feature_mgr, self.classifier)
    }

    /// Build the RAG from the label volume: node sizes from voxel counts,
    /// edge sizes and boundary sizes from face counts over the
    /// 6-neighborhood, plus a representative boundary location per edge.
    pub fn build_rag(&mut self) -> TrainResult<()> {
        if self.rag_built {
            return Ok(());
        }
        if self.labels.is_empty() {
            return Err(TrainError::MissingVolume("label"));
        }

        let mut sizes: HashMap<Label, u64> = HashMap::new();
        let mut boundaries: HashMap<Label, u64> = HashMap::new();
        let mut faces: HashMap<(Label, Label), (u64, [u32; 3])> = HashMap::new();

        let (nx, ny, nz) = self.labels.dim();
        for x in 0..nx {
            for y in 0..ny {
                for z in 0..nz {
                    let l = self.labels[[x, y, z]];
                    if l != 0 {
                        *sizes.entry(l).or_insert(0) += 1;
                    }
                    for (xx, yy, zz) in forward_neighbors(x, y, z, nx, ny, nz) {
                        let m = self.labels[[xx, yy, zz]];
                        if m == l {
                            continue;
                        }
                        if l != 0 {
                            *boundaries.entry(l).or_insert(0) += 1;
                        }
                        if m != 0 {
                            *boundaries.entry(m).or_insert(0) += 1;
                        }
                        if l != 0 && m != 0 {
                            let face = faces
                                .entry(ordered_pair(l, m))
                                .or_insert((0, [x as u32, y as u32, z as u32]));
                            face.0 += 1;
                        }
                    }
                }
            }
        }

        let mut labels: Vec<Label> = sizes.keys().copied().collect();
        labels.sort_unstable();
        for id in labels {
            self.rag.add_node(id, sizes[&id])?;
            if let Some(node) = self.rag.node_mut(id) {
                node.boundary_size = boundaries.get(&id).copied().unwrap_or(0);
            }
        }

        let mut pairs: Vec<(Label, Label)> = faces.keys().copied().collect();
        pairs.sort_unstable();
        for (u, v) in pairs {
            let (size, location) = faces[&(u, v)];
            self.rag.add_edge(u, v, size)?;
            if let Some(edge) = self.rag.find_edge_mut(u, v) {
                edge.location = Some(location);
            }
        }

        self.rag_built = true;
        info!("RAG built with {} nodes", self.rag.node_count());
        Ok(())
    }

    /// Merge every enclosed region into its surrounding one.
    pub fn remove_inclusions(&mut self) -> TrainResult<()> {
        let mut alg = FeatureCombine::new(&mut self.feature_mgr);
        self.rag.remove_inclusions(&mut alg)?;
        info!("inclusion removal done with {} nodes", self.rag.node_count());
        Ok(())
    }

    /// Count region overlaps against the ground-truth volume and derive
    /// the dominant-body assignment.
    pub fn compute_groundtruth_assignment(&mut self) -> TrainResult<()> {
        let groundtruth = self
            .groundtruth
            .as_ref()
            .ok_or(TrainError::MissingVolume("ground-truth"))?;

        let mut overlaps: HashMap<Label, HashMap<u32, u64>> = HashMap::new();
        for (l, g) in self.labels.iter().zip(groundtruth.iter()) {
            if *l != 0 {
                *overlaps.entry(*l).or_default().entry(*g).or_insert(0) += 1;
            }
        }
        self.oracle = GroundTruthOracle::from_overlaps(&overlaps);
        self.assignment_done = true;
        Ok(())
    }

    /// Standard preparation before a training pass: build the RAG, remove
    /// inclusions, derive the ground-truth assignment, and optionally arm
    /// the mitochondrial override.
    pub fn preprocess(&mut self, use_mito: bool) -> TrainResult<()> {
        self.build_rag()?;
        self.remove_inclusions()?;
        if !self.assignment_done {
            self.compute_groundtruth_assignment()?;
        }
        if use_mito {
            self.oracle.enable_mito_override(self.mito_regions.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::CentroidClassifier;
    use crate::features::MomentFeatures;
    use crate::oracle::EdgeLabel;
    use ndarray::arr3;

    fn controller(labels: LabelVolume) -> StackController<MomentFeatures, CentroidClassifier> {
        StackController::new(labels, MomentFeatures::new(), CentroidClassifier::new()).unwrap()
    }

    #[test]
    fn test_empty_label_volume_rejected() {
        let labels = LabelVolume::zeros((0, 0, 0));
        assert!(matches!(
            StackController::new(labels, MomentFeatures::new(), CentroidClassifier::new()),
            Err(TrainError::MissingVolume("label"))
        ));
    }

    #[test]
    fn test_build_rag_counts_faces() {
        // 4x1x1 row: [1, 1, 2, 2]
        let mut stack = controller(arr3(&[[[1u32]], [[1]], [[2]], [[2]]]));
        stack.build_rag().unwrap();

        assert_eq!(stack.num_labels(), 2);
        assert_eq!(stack.rag.node(1).unwrap().size, 2);
        assert_eq!(stack.rag.node(2).unwrap().size, 2);
        let edge = stack.rag.find_edge(1, 2).unwrap();
        assert_eq!(edge.size, 1);
        assert_eq!(edge.location, Some([1, 0, 0]));
        assert_eq!(stack.rag.node(1).unwrap().boundary_size, 1);
    }

    #[test]
    fn test_build_rag_counts_background_faces() {
        // [1, 0, 2]: no edge across the boundary voxel, but boundary sizes
        // count the faces against it
        let mut stack = controller(arr3(&[[[1u32]], [[0]], [[2]]]));
        stack.build_rag().unwrap();

        assert_eq!(stack.rag.edge_count(), 0);
        assert_eq!(stack.rag.node(1).unwrap().boundary_size, 1);
        assert_eq!(stack.rag.node(2).unwrap().boundary_size, 1);
    }

    #[test]
    fn test_boundary_invariant_from_volume() {
        let mut stack = controller(arr3(&[
            [[1u32, 1], [3, 3]],
            [[1, 2], [3, 3]],
            [[2, 2], [3, 0]],
        ]));
        stack.build_rag().unwrap();

        for id in stack.rag.node_labels() {
            let incident: u64 = stack
                .rag
                .incident_edges(id)
                .iter()
                .map(|&(u, v)| stack.rag.find_edge(u, v).unwrap().size)
                .sum();
            assert!(
                stack.rag.node(id).unwrap().boundary_size >= incident,
                "node {}",
                id
            );
        }
    }

    #[test]
    fn test_groundtruth_requires_volume() {
        let mut stack = controller(arr3(&[[[1u32]], [[2]]]));
        assert!(matches!(
            stack.compute_groundtruth_assignment(),
            Err(TrainError::MissingVolume("ground-truth"))
        ));
    }

    #[test]
    fn test_groundtruth_shape_mismatch() {
        let mut stack = controller(arr3(&[[[1u32]], [[2]]]));
        assert!(stack.set_groundtruth(arr3(&[[[1u32]]])).is_err());
    }

    #[test]
    fn test_assignment_from_overlaps() {
        let labels = arr3(&[[[1u32]], [[1]], [[2]], [[3]]]);
        let gt = arr3(&[[[7u32]], [[7]], [[7]], [[9]]]);
        let mut stack = controller(labels);
        stack.set_groundtruth(gt).unwrap();
        stack.compute_groundtruth_assignment().unwrap();

        assert_eq!(stack.oracle.edge_label(1, 2), Some(EdgeLabel::Merge));
        assert_eq!(stack.oracle.edge_label(2, 3), Some(EdgeLabel::Keep));
    }

    #[test]
    fn test_into_parts_releases_components() {
        let mut stack = controller(arr3(&[[[1u32]], [[1]], [[2]], [[2]]]));
        stack.build_rag().unwrap();
        let (rag, _features, _classifier) = stack.into_parts();
        assert_eq!(rag.node_count(), 2);
    }

    #[test]
    fn test_preprocess_arms_mito_override() {
        let labels = arr3(&[[[1u32]], [[1]], [[2]], [[2]]]);
        let gt = arr3(&[[[7u32]], [[7]], [[7]], [[7]]]);
        let mut stack = controller(labels);
        stack.set_groundtruth(gt).unwrap();
        stack.set_mito_regions([2].into_iter().collect());

        stack.preprocess(false).unwrap();
        assert_eq!(stack.oracle.edge_label(1, 2), Some(EdgeLabel::Merge));

        stack.preprocess(true).unwrap();
        assert_eq!(stack.oracle.edge_label(1, 2), Some(EdgeLabel::Keep));
    }
}
