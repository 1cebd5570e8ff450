//! # agglo-train
//!
//! Edge classifier training for region agglomeration.
//!
//! This crate provides:
//! - Feature aggregation over RAG edges (`features`) and the classifier
//!   seam (`classifier`)
//! - The ground-truth oracle mapping label pairs to edge labels (`oracle`)
//! - Deduplicated training row collection (`unique`)
//! - Combine strategies that keep features and the merge queue coherent
//!   while nodes join (`combine`)
//! - The stack controller owning volumes, RAG, features and classifier
//!   (`stack`)
//! - The flat / priority-queue / LASH training iterations (`learn`)
//!
//! Label convention, preserved for compatibility with stored models:
//! `-1` means "same body, merge correct"; `+1` means "different bodies,
//! keep apart"; `0` means undecidable and is skipped.

use thiserror::Error;

pub mod classifier;
pub mod combine;
pub mod features;
pub mod learn;
pub mod oracle;
pub mod stack;
pub mod unique;

pub use classifier::{CentroidClassifier, EdgeClassifier};
pub use combine::{FeatureCombine, PriorityQCombine};
pub use features::{FeatureAggregator, MomentFeatures, MomentStats};
pub use learn::{
    learn_edge_classifier_flat, learn_edge_classifier_lash, learn_edge_classifier_queue,
    TrainingReport,
};
pub use oracle::{EdgeLabel, GroundTruthOracle};
pub use stack::{GrayVolume, LabelVolume, StackController};
pub use unique::UniqueRowSet;

/// Errors in stack preparation and training
#[derive(Error, Debug)]
pub enum TrainError {
    #[error("stack lacks {0} volume")]
    MissingVolume(&'static str),
    #[error("volume shape mismatch: expected {expected:?}, found {found:?}")]
    DimensionMismatch {
        expected: (usize, usize, usize),
        found: (usize, usize, usize),
    },
    #[error("classifier error: {0}")]
    Classifier(String),
    #[error(transparent)]
    Rag(#[from] agglo_core::RagError),
}

/// Result type for training operations
pub type TrainResult<T> = Result<T, TrainError>;
